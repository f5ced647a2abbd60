use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Config;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub ollama: Option<OllamaConfig>,
    pub paths: Option<PathsConfig>,
    pub extraction: Option<ExtractionConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub host: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub max_pages: Option<usize>,
    pub max_prompt_chars: Option<usize>,
}

/// Platform config directory path: `<config_dir>/papermeta/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("papermeta").join("config.toml"))
}

/// Load config by cascading CWD `.papermeta.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".papermeta.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let bo = base.ollama.unwrap_or_default();
    let oo = overlay.ollama.unwrap_or_default();
    let bp = base.paths.unwrap_or_default();
    let op = overlay.paths.unwrap_or_default();
    let be = base.extraction.unwrap_or_default();
    let oe = overlay.extraction.unwrap_or_default();

    ConfigFile {
        ollama: Some(OllamaConfig {
            host: oo.host.or(bo.host),
            model: oo.model.or(bo.model),
            timeout_secs: oo.timeout_secs.or(bo.timeout_secs),
        }),
        paths: Some(PathsConfig {
            input_dir: op.input_dir.or(bp.input_dir),
            output_dir: op.output_dir.or(bp.output_dir),
        }),
        extraction: Some(ExtractionConfig {
            max_pages: oe.max_pages.or(be.max_pages),
            max_prompt_chars: oe.max_prompt_chars.or(be.max_prompt_chars),
        }),
    }
}

impl ConfigFile {
    /// Lay the file's values over `config`, leaving unset fields untouched.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref o) = self.ollama {
            if let Some(ref host) = o.host {
                config.ollama_host = host.clone();
            }
            if let Some(ref model) = o.model {
                config.model = model.clone();
            }
            if let Some(secs) = o.timeout_secs {
                config.request_timeout_secs = secs;
            }
        }
        if let Some(ref p) = self.paths {
            if let Some(ref dir) = p.input_dir {
                config.input_dir = PathBuf::from(dir);
            }
            if let Some(ref dir) = p.output_dir {
                config.output_dir = PathBuf::from(dir);
            }
        }
        if let Some(ref e) = self.extraction {
            if let Some(pages) = e.max_pages {
                config.max_pages = pages;
            }
            if let Some(chars) = e.max_prompt_chars {
                config.max_prompt_chars = chars;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_parses() {
        let toml_str = "[ollama]\nmodel = \"mistral\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let ollama = parsed.ollama.unwrap();
        assert_eq!(ollama.model.as_deref(), Some("mistral"));
        assert!(ollama.host.is_none());
        assert!(parsed.paths.is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            ollama: Some(OllamaConfig {
                host: Some("http://base:11434".to_string()),
                model: Some("base-model".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            ollama: Some(OllamaConfig {
                model: Some("overlay-model".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).ollama.unwrap();
        assert_eq!(merged.model.as_deref(), Some("overlay-model"));
        assert_eq!(merged.host.as_deref(), Some("http://base:11434"));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            paths: Some(PathsConfig {
                output_dir: Some("/base/out".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(
            merged.paths.unwrap().output_dir.as_deref(),
            Some("/base/out")
        );
    }

    #[test]
    fn apply_only_touches_set_fields() {
        let file = ConfigFile {
            paths: Some(PathsConfig {
                input_dir: Some("/data/papers".to_string()),
                ..Default::default()
            }),
            extraction: Some(ExtractionConfig {
                max_pages: Some(1),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut config = Config::default();
        file.apply_to(&mut config);

        assert_eq!(config.input_dir, PathBuf::from("/data/papers"));
        assert_eq!(config.max_pages, 1);
        assert_eq!(config.output_dir, Config::default().output_dir);
        assert_eq!(config.model, Config::default().model);
    }

    #[test]
    fn load_from_path_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(load_from_path(&path).is_none());
        assert!(load_from_path(&dir.path().join("missing.toml")).is_none());
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[ollama]\nhost = \"http://gpu-box:11434\"\ntimeout_secs = 120\n",
        )
        .unwrap();
        let loaded = load_from_path(&path).unwrap().ollama.unwrap();
        assert_eq!(loaded.host.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(loaded.timeout_secs, Some(120));
    }
}
