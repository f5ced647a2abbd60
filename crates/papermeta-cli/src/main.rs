use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use papermeta_core::config_file::{self, ConfigFile};
use papermeta_core::{Config, MetadataExtractor, run_batch};
use papermeta_pdf_mupdf::MupdfBackend;
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Extract titles and authors from a folder of academic PDFs with a local Ollama model
#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory scanned for *.pdf files
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory receiving <name>_info.json and all_articles.json
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Ollama model name
    #[arg(long)]
    model: Option<String>,

    /// Ollama base URL (default: $OLLAMA_HOST or http://localhost:11434)
    #[arg(long)]
    ollama_host: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli, config_file::load_config(), |k| std::env::var(k).ok());
    tracing::debug!(?config, "resolved configuration");

    let color = ColorMode(!cli.no_color && std::io::stdout().is_terminal());
    let writer: Mutex<Box<dyn Write + Send>> = Mutex::new(Box::new(std::io::stdout()));
    let progress = |event: papermeta_core::BatchEvent| {
        if let Ok(mut w) = writer.lock() {
            let _ = output::print_event(&mut *w, &event, color);
            let _ = w.flush();
        }
    };

    let backend = MupdfBackend::new();
    let extractor = MetadataExtractor::from_config(&config);
    run_batch(&config, &backend, &extractor, progress).await?;

    Ok(())
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn resolve_config(
    cli: &Cli,
    file: ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> Config {
    let mut config = Config::default();
    file.apply_to(&mut config);

    if let Some(host) = env("OLLAMA_HOST").filter(|h| !h.is_empty()) {
        config.ollama_host = host;
    }
    if let Some(model) = env("PAPERMETA_MODEL").filter(|m| !m.is_empty()) {
        config.model = model;
    }

    if let Some(ref host) = cli.ollama_host {
        config.ollama_host = host.clone();
    }
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    if let Some(ref dir) = cli.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(ref dir) = cli.output_dir {
        config.output_dir = dir.clone();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use papermeta_core::config_file::OllamaConfig;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn no_flags_no_env_uses_defaults() {
        let config = resolve_config(&Cli::default(), ConfigFile::default(), no_env);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn ollama_host_env_overrides_file() {
        let file = ConfigFile {
            ollama: Some(OllamaConfig {
                host: Some("http://from-file:11434".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = resolve_config(&Cli::default(), file, |k| {
            (k == "OLLAMA_HOST").then(|| "http://ollama:11434".to_string())
        });
        assert_eq!(config.ollama_host, "http://ollama:11434");
    }

    #[test]
    fn flags_override_env() {
        let cli = Cli {
            ollama_host: Some("http://flag:1".into()),
            model: Some("mistral".into()),
            output_dir: Some(PathBuf::from("/tmp/out")),
            ..Default::default()
        };
        let config = resolve_config(&cli, ConfigFile::default(), |k| match k {
            "OLLAMA_HOST" => Some("http://env:2".into()),
            "PAPERMETA_MODEL" => Some("phi3".into()),
            _ => None,
        });
        assert_eq!(config.ollama_host, "http://flag:1");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.input_dir, Config::default().input_dir);
    }

    #[test]
    fn parses_without_arguments() {
        let cli = Cli::try_parse_from(["papermeta"]).unwrap();
        assert!(cli.input_dir.is_none());
        assert!(!cli.no_color);
    }
}
