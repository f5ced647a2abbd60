use std::path::Path;

use thiserror::Error;

/// Number of leading pages read from each document by default.
pub const DEFAULT_MAX_PAGES: usize = 2;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("no text found in the first {0} page(s)")]
    EmptyText(usize),
}

/// Trait for PDF text extraction backends.
///
/// Implementors read the first `min(max_pages, page_count)` pages and return
/// their text concatenated in page order. The document must be closed before
/// returning, on success and on error alike.
pub trait PdfBackend: Send + Sync {
    /// Extract text from the leading pages of a PDF file.
    fn extract_text(&self, path: &Path, max_pages: usize) -> Result<String, BackendError>;
}
