//! JSON artifacts written into the output directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::ArticleRecord;

/// File name of the combined array written at the end of a batch.
pub const COMBINED_FILENAME: &str = "all_articles.json";

const RECORD_SUFFIX: &str = "_info.json";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Output file name for a source PDF: `paper.pdf` -> `paper_info.json`.
pub fn record_filename(source_file: &Path) -> String {
    let stem = source_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{stem}{RECORD_SUFFIX}")
}

/// Write one record as `<stem>_info.json`, returning the path written.
pub fn write_record(
    output_dir: &Path,
    source_file: &Path,
    record: &ArticleRecord,
) -> Result<PathBuf, OutputError> {
    let path = output_dir.join(record_filename(source_file));
    write_json_atomic(&path, record)?;
    Ok(path)
}

/// Write the full batch as a JSON array in `all_articles.json`.
pub fn write_combined(
    output_dir: &Path,
    records: &[ArticleRecord],
) -> Result<PathBuf, OutputError> {
    let path = output_dir.join(COMBINED_FILENAME);
    write_json_atomic(&path, &records)?;
    Ok(path)
}

/// Pretty-print `value` into a temp file beside `path`, then rename it over
/// `path`. Readers never observe a partially written file.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), OutputError> {
    let content = serde_json::to_string_pretty(value).map_err(|source| OutputError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    let write_err = |source: std::io::Error| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
