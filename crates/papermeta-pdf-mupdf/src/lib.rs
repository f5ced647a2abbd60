use std::path::Path;

use mupdf::{Document, TextPageFlags};

use papermeta_core::{BackendError, PdfBackend};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate isolates the mupdf dependency (which is AGPL-3.0) so that the
/// rest of the pipeline does not transitively depend on it.
///
/// Text is read line by line from each page's text blocks, and pages are
/// concatenated in order without a separator.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

fn page_text(page: &mupdf::Page) -> Result<String, BackendError> {
    let text_page = page
        .to_text_page(TextPageFlags::empty())
        .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

    let mut text = String::new();
    for block in text_page.blocks() {
        for line in block.lines() {
            let line_text: String = line
                .chars()
                .map(|c| c.char().unwrap_or('\u{FFFD}'))
                .collect();
            text.push_str(&line_text);
            text.push('\n');
        }
    }
    Ok(text)
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path, max_pages: usize) -> Result<String, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        // Dropped at the end of this scope on every path, which closes the file.
        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut text = String::new();
        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
            .take(max_pages)
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            text.push_str(&page_text(&page)?);
        }

        if text.is_empty() {
            return Err(BackendError::EmptyText(max_pages));
        }
        Ok(text)
    }
}
