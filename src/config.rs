use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::providers::gemini::DEFAULT_BASE_URL;

/// Main configuration structure for spec_generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Gemini service configuration
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// UI display configuration
    #[serde(default)]
    pub ui: UIConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API root, without the `/models/...` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable the API key is read from on every request
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UIConfig {
    /// Enable colorful output
    #[serde(default = "default_colorful")]
    pub colorful: bool,

    /// Log destination while the interactive UI owns the terminal
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

// Default value functions
fn default_model() -> String { "gemini-1.5-flash".to_string() }
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_api_key_env() -> String { "GEMINI_API_KEY".to_string() }
fn default_colorful() -> bool { true }
fn default_log_file() -> String { "~/.cache/spec_generator/spec_generator.log".to_string() }

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for UIConfig {
    fn default() -> Self {
        UIConfig {
            colorful: default_colorful(),
            log_file: default_log_file(),
        }
    }
}

impl UIConfig {
    /// Log file path with `~` expanded.
    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).as_ref())
    }
}

/// Result of `Config::load`, kept until the logger is up to report it.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the configuration was read from; `None` means built-in defaults.
    pub source: Option<PathBuf>,
    /// Files that exist at default locations but failed to read or parse.
    pub skipped: Vec<(PathBuf, anyhow::Error)>,
}

fn default_locations() -> Vec<PathBuf> {
    [
        "spec_generator.toml",
        ".spec_generator.toml",
        "~/.config/spec_generator/config.toml",
    ]
    .iter()
    .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
    .collect()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))
    }

    /// Load `explicit` if given, otherwise the first default location that parses.
    pub fn load(explicit: Option<&str>) -> Result<LoadedConfig> {
        match explicit {
            Some(path) => {
                let path = PathBuf::from(shellexpand::tilde(path).as_ref());
                Ok(LoadedConfig {
                    config: Self::from_file(&path)?,
                    source: Some(path),
                    skipped: Vec::new(),
                })
            }
            None => Ok(Self::load_first(&default_locations())),
        }
    }

    /// First candidate that exists and parses wins; broken ones are recorded, not fatal.
    pub fn load_first(candidates: &[PathBuf]) -> LoadedConfig {
        let mut skipped = Vec::new();
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::from_file(path) {
                Ok(config) => {
                    return LoadedConfig {
                        config,
                        source: Some(path.clone()),
                        skipped,
                    };
                }
                Err(e) => skipped.push((path.clone(), e)),
            }
        }
        LoadedConfig {
            config: Self::default(),
            source: None,
            skipped,
        }
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
            }
        }

        fs::write(path.as_ref(), contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Merge with command-line arguments (CLI args take precedence)
    pub fn merge_with_args(&mut self, model: Option<&str>) {
        if let Some(model) = model {
            self.gemini.model = model.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str("[gemini]\nmodel = \"gemini-2.0-flash\"\n").unwrap();
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.gemini.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.gemini.base_url, DEFAULT_BASE_URL);
        assert!(config.ui.colorful);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("spec_generator_config_{}", std::process::id()))
            .join("config.toml");
        let mut config = Config::default();
        config.ui.colorful = false;
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_broken_default_is_skipped_for_next_candidate() {
        let dir = std::env::temp_dir().join(format!("spec_generator_candidates_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let missing = dir.join("missing.toml");
        let broken = dir.join("broken.toml");
        let good = dir.join("good.toml");
        fs::write(&broken, "[gemini\nmodel = ").unwrap();
        fs::write(&good, "[gemini]\nmodel = \"gemini-2.0-flash\"\n").unwrap();

        let loaded = Config::load_first(&[missing, broken.clone(), good.clone()]);
        assert_eq!(loaded.config.gemini.model, "gemini-2.0-flash");
        assert_eq!(loaded.source, Some(good));
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].0, broken);

        let loaded = Config::load_first(&[dir.join("nothing.toml")]);
        assert_eq!(loaded.config, Config::default());
        assert!(loaded.source.is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_explicit_path_must_load() {
        assert!(Config::load(Some("/nonexistent/spec_generator.toml")).is_err());
    }

    #[test]
    fn test_cli_model_overrides_file() {
        let mut config = Config::default();
        config.merge_with_args(Some("gemini-1.5-pro"));
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        config.merge_with_args(None);
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
    }
}
