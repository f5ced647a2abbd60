//! Best-effort recovery of the JSON object embedded in model output.
//!
//! The object is taken to span from the first `{` to the last `}` in the
//! text. Several objects, stray braces in surrounding prose, or braces inside
//! string literals after the target object all defeat this heuristic.

use thiserror::Error;

use crate::ArticleMetadata;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJsonObject,
    #[error("invalid JSON in model output: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Slice from the first `{` to the last `}`, inclusive.
pub fn find_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Decode the title/authors object out of raw model output.
pub fn parse_response(raw: &str) -> Result<ArticleMetadata, ParseError> {
    let json = find_json_object(raw).ok_or(ParseError::NoJsonObject)?;
    Ok(serde_json::from_str(json)?)
}
