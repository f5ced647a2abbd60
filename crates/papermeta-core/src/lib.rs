use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

pub mod backend;
pub mod batch;
pub mod config_file;
pub mod ollama;
pub mod output;
pub mod parse;
pub mod prompt;

// Re-export for convenience
pub use backend::{BackendError, DEFAULT_MAX_PAGES, PdfBackend};
pub use batch::{BatchError, run_batch};
pub use ollama::{InferenceError, MetadataExtractor, OllamaClient};
pub use output::OutputError;
pub use parse::{ParseError, parse_response};
pub use prompt::DEFAULT_MAX_PROMPT_CHARS;

/// Title and authors as reported by the model, before the source file is known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArticleMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub authors: Vec<String>,
}

/// Models sometimes answer `"authors": null`; treat it like a missing key.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ArticleMetadata {
    pub fn into_record(self, source_file: impl Into<String>) -> ArticleRecord {
        ArticleRecord {
            title: self.title,
            authors: self.authors,
            source_file: source_file.into(),
        }
    }
}

/// Metadata extracted for one PDF, as persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub source_file: String,
}

/// Pipeline stage at which a file was dropped from the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Inference,
    Parse,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Read => "read",
            Stage::Inference => "inference",
            Stage::Parse => "parse",
            Stage::Write => "write",
        };
        f.write_str(s)
    }
}

/// A file that was skipped, with the stage and reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: String,
    pub stage: Stage,
    pub message: String,
    /// Leading characters of the model output, for parse failures.
    pub raw_excerpt: Option<String>,
}

impl FileFailure {
    pub fn new(file: impl Into<String>, stage: Stage, err: impl fmt::Display) -> Self {
        Self {
            file: file.into(),
            stage,
            message: err.to_string(),
            raw_excerpt: None,
        }
    }

    pub fn with_raw_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.raw_excerpt = Some(excerpt.into());
        self
    }
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    NoInputs {
        input_dir: PathBuf,
    },
    Discovered {
        total: usize,
    },
    Processing {
        index: usize,
        total: usize,
        file: String,
    },
    TextExtracted {
        file: String,
        chars: usize,
    },
    Saved {
        index: usize,
        total: usize,
        file: String,
        output_path: PathBuf,
        title: Option<String>,
        author_count: usize,
    },
    Skipped {
        index: usize,
        total: usize,
        failure: FileFailure,
    },
    Finished {
        processed: usize,
        output_dir: PathBuf,
        combined_path: PathBuf,
    },
    NothingProcessed,
}

/// Outcome of a complete batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub discovered: usize,
    /// Successfully processed files, in processing order.
    pub records: Vec<ArticleRecord>,
    pub failures: Vec<FileFailure>,
}

/// Configuration for a batch run.
///
/// Built by the caller (CLI flags, environment, config file) and passed down
/// explicitly; nothing in this crate reads the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the Ollama server, e.g. `http://localhost:11434`.
    pub ollama_host: String,
    pub model: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub max_pages: usize,
    pub max_prompt_chars: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("ollama_host", &self.ollama_host)
            .field("model", &self.model)
            .field("input_dir", &self.input_dir.display())
            .field("output_dir", &self.output_dir.display())
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_pages", &self.max_pages)
            .field("max_prompt_chars", &self.max_prompt_chars)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_host: ollama::DEFAULT_OLLAMA_HOST.to_string(),
            model: ollama::DEFAULT_MODEL.to_string(),
            input_dir: PathBuf::from("/app/pdfs"),
            output_dir: PathBuf::from("/app/output"),
            request_timeout_secs: ollama::DEFAULT_TIMEOUT_SECS,
            max_pages: DEFAULT_MAX_PAGES,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }
}
