//! Prompt construction for the metadata extraction request.

/// Maximum number of characters of document text embedded in the prompt.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 3000;

const INSTRUCTIONS: &str = r#"Extract the article title and author names from this academic paper text.
Return ONLY a JSON object with this exact format:
{
    "title": "article title here",
    "authors": ["author1", "author2", "author3"]
}

Paper text:
"#;

/// Return at most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Build the extraction prompt for a document's leading text.
pub fn build_prompt(text: &str, max_chars: usize) -> String {
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + max_chars.min(text.len()) + 1);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str(truncate_chars(text, max_chars));
    prompt.push('\n');
    prompt
}
