use std::io::Write;

use owo_colors::OwoColorize;
use papermeta_core::{BatchEvent, FileFailure, Stage};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn rule(w: &mut dyn Write, ch: &str) -> std::io::Result<()> {
    writeln!(w, "{}", ch.repeat(50))
}

/// Print a real-time batch progress event.
pub fn print_event(
    w: &mut dyn Write,
    event: &BatchEvent,
    color: ColorMode,
) -> std::io::Result<()> {
    match event {
        BatchEvent::NoInputs { input_dir } => {
            writeln!(w, "No PDF files found in {}", input_dir.display())?;
        }
        BatchEvent::Discovered { total } => {
            writeln!(w, "Found {} PDF file(s)", total)?;
            rule(w, "-")?;
        }
        BatchEvent::Processing { index, total, file } => {
            writeln!(w)?;
            if color.enabled() {
                writeln!(w, "[{}/{}] Processing: {}", index + 1, total, file.bold())?;
            } else {
                writeln!(w, "[{}/{}] Processing: {}", index + 1, total, file)?;
            }
        }
        BatchEvent::TextExtracted { chars, .. } => {
            writeln!(w, "Read {} characters", chars)?;
            writeln!(w, "Extracting information with Ollama...")?;
        }
        BatchEvent::Saved {
            output_path,
            title,
            author_count,
            ..
        } => {
            let saved_as = output_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| output_path.display().to_string());
            if color.enabled() {
                writeln!(w, "{} {}", "Saved to:".green(), saved_as)?;
            } else {
                writeln!(w, "Saved to: {}", saved_as)?;
            }
            writeln!(w, "  Title: {}", title.as_deref().unwrap_or("N/A"))?;
            writeln!(w, "  Authors: {} author(s)", author_count)?;
        }
        BatchEvent::Skipped { failure, .. } => print_failure(w, failure, color)?,
        BatchEvent::Finished {
            processed,
            output_dir,
            combined_path,
        } => {
            writeln!(w)?;
            rule(w, "=")?;
            let line = format!("Successfully processed {} article(s)", processed);
            if color.enabled() {
                writeln!(w, "{}", line.green().bold())?;
            } else {
                writeln!(w, "{}", line)?;
            }
            writeln!(w, "Individual files saved in: {}", output_dir.display())?;
            let combined = combined_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            writeln!(w, "Combined file: {}", combined)?;
            rule(w, "=")?;
        }
        BatchEvent::NothingProcessed => {
            writeln!(w)?;
            if color.enabled() {
                writeln!(w, "{}", "No articles were successfully processed".red())?;
            } else {
                writeln!(w, "No articles were successfully processed")?;
            }
        }
    }
    Ok(())
}

fn print_failure(
    w: &mut dyn Write,
    failure: &FileFailure,
    color: ColorMode,
) -> std::io::Result<()> {
    let reason = match failure.stage {
        Stage::Read => "couldn't read file",
        Stage::Inference => "Ollama error",
        Stage::Parse => "couldn't parse model output",
        Stage::Write => "couldn't write output",
    };
    let line = format!("Skipping {} - {}: {}", failure.file, reason, failure.message);
    if color.enabled() {
        writeln!(w, "{}", line.yellow())?;
    } else {
        writeln!(w, "{}", line)?;
    }
    if let Some(ref excerpt) = failure.raw_excerpt {
        if color.enabled() {
            writeln!(w, "{}", format!("Raw response: {}...", excerpt).dimmed())?;
        } else {
            writeln!(w, "Raw response: {}...", excerpt)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn render(event: BatchEvent) -> String {
        let mut buf = Vec::new();
        print_event(&mut buf, &event, ColorMode(false)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn saved_reports_title_and_author_count() {
        let out = render(BatchEvent::Saved {
            index: 0,
            total: 1,
            file: "paper.pdf".into(),
            output_path: PathBuf::from("/app/output/paper_info.json"),
            title: None,
            author_count: 3,
        });
        assert!(out.contains("Saved to: paper_info.json"));
        assert!(out.contains("Title: N/A"));
        assert!(out.contains("Authors: 3 author(s)"));
    }

    #[test]
    fn parse_failure_shows_raw_excerpt() {
        let failure =
            FileFailure::new("p.pdf", Stage::Parse, "no JSON object found in model output")
                .with_raw_excerpt("I cannot help");
        let out = render(BatchEvent::Skipped {
            index: 0,
            total: 1,
            failure,
        });
        assert!(out.contains("Skipping p.pdf - couldn't parse model output"));
        assert!(out.contains("Raw response: I cannot help..."));
    }

    #[test]
    fn finished_names_combined_file() {
        let out = render(BatchEvent::Finished {
            processed: 2,
            output_dir: PathBuf::from("/app/output"),
            combined_path: PathBuf::from("/app/output/all_articles.json"),
        });
        assert!(out.contains("Successfully processed 2 article(s)"));
        assert!(out.contains("Individual files saved in: /app/output"));
        assert!(out.contains("Combined file: all_articles.json"));
    }

    #[test]
    fn no_inputs_names_directory() {
        let out = render(BatchEvent::NoInputs {
            input_dir: PathBuf::from("/app/pdfs"),
        });
        assert_eq!(out, "No PDF files found in /app/pdfs\n");
    }
}
