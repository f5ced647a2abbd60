use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::backend::PdfBackend;
use crate::ollama::MetadataExtractor;
use crate::output::{write_combined, write_record};
use crate::parse::parse_response;
use crate::prompt::truncate_chars;
use crate::{ArticleRecord, BatchEvent, BatchSummary, Config, FileFailure, Stage};

/// Characters of raw model output kept when reporting a parse failure.
const RAW_EXCERPT_CHARS: usize = 200;

/// Conditions that abort a batch. Per-file failures never do.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("cannot create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write combined output: {0}")]
    WriteCombined(#[source] crate::output::OutputError),
}

/// List `*.pdf` files directly inside `input_dir`, sorted by path.
///
/// A missing or unlistable directory yields an empty list. Like a shell
/// glob, the extension match is case-sensitive and dotfiles are skipped.
pub fn discover_pdfs(input_dir: &Path) -> Vec<PathBuf> {
    if !input_dir.exists() {
        return vec![];
    }
    let entries = match std::fs::read_dir(input_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                input_dir = %input_dir.display(),
                error = %e,
                "cannot list input directory"
            );
            return vec![];
        }
    };

    let mut pdfs = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(
                    input_dir = %input_dir.display(),
                    error = %e,
                    "skipping unreadable entry"
                );
                continue;
            }
        };
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("pdf") {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    pdfs
}

/// Run one batch: every discovered PDF goes through read -> infer -> parse ->
/// write, strictly one file at a time.
pub async fn run_batch(
    config: &Config,
    backend: &dyn PdfBackend,
    extractor: &MetadataExtractor,
    progress: impl Fn(BatchEvent),
) -> Result<BatchSummary, BatchError> {
    let pdfs = discover_pdfs(&config.input_dir);
    let total = pdfs.len();

    if total == 0 {
        tracing::info!(input_dir = %config.input_dir.display(), "no PDF files found");
        progress(BatchEvent::NoInputs {
            input_dir: config.input_dir.clone(),
        });
        return Ok(BatchSummary::default());
    }

    progress(BatchEvent::Discovered { total });

    std::fs::create_dir_all(&config.output_dir).map_err(|source| {
        BatchError::CreateOutputDir {
            path: config.output_dir.clone(),
            source,
        }
    })?;

    let mut summary = BatchSummary {
        discovered: total,
        ..Default::default()
    };

    for (index, path) in pdfs.iter().enumerate() {
        let file = file_name(path);
        progress(BatchEvent::Processing {
            index,
            total,
            file: file.clone(),
        });

        match process_file(config, backend, extractor, path, &file, &progress).await {
            Ok((record, output_path)) => {
                progress(BatchEvent::Saved {
                    index,
                    total,
                    file: file.clone(),
                    output_path,
                    title: record.title.clone(),
                    author_count: record.authors.len(),
                });
                summary.records.push(record);
            }
            Err(failure) => {
                tracing::warn!(
                    file = %failure.file,
                    stage = %failure.stage,
                    error = %failure.message,
                    "skipping file"
                );
                progress(BatchEvent::Skipped {
                    index,
                    total,
                    failure: failure.clone(),
                });
                summary.failures.push(failure);
            }
        }
    }

    if summary.records.is_empty() {
        progress(BatchEvent::NothingProcessed);
        return Ok(summary);
    }

    let combined_path =
        write_combined(&config.output_dir, &summary.records).map_err(BatchError::WriteCombined)?;
    tracing::info!(
        path = %combined_path.display(),
        processed = summary.records.len(),
        failed = summary.failures.len(),
        "batch complete"
    );
    progress(BatchEvent::Finished {
        processed: summary.records.len(),
        output_dir: config.output_dir.clone(),
        combined_path,
    });

    Ok(summary)
}

async fn process_file(
    config: &Config,
    backend: &dyn PdfBackend,
    extractor: &MetadataExtractor,
    path: &Path,
    file: &str,
    progress: &impl Fn(BatchEvent),
) -> Result<(ArticleRecord, PathBuf), FileFailure> {
    let text = backend
        .extract_text(path, config.max_pages)
        .map_err(|e| FileFailure::new(file, Stage::Read, e))?;
    progress(BatchEvent::TextExtracted {
        file: file.to_string(),
        chars: text.chars().count(),
    });

    let raw = extractor
        .extract(&text)
        .await
        .map_err(|e| FileFailure::new(file, Stage::Inference, e))?;

    let metadata = parse_response(&raw).map_err(|e| {
        FileFailure::new(file, Stage::Parse, e)
            .with_raw_excerpt(truncate_chars(&raw, RAW_EXCERPT_CHARS))
    })?;

    let record = metadata.into_record(file);
    let output_path = write_record(&config.output_dir, path, &record)
        .map_err(|e| FileFailure::new(file, Stage::Write, e))?;

    tracing::debug!(file, output = %output_path.display(), "record saved");
    Ok((record, output_path))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
