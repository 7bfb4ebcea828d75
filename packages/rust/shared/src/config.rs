//! Application configuration for living-doc.
//!
//! User config lives at `~/.living-doc/living-doc.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LivingDocError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "living-doc.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".living-doc";

// ---------------------------------------------------------------------------
// Config structs (matching living-doc.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Normalization tuning.
    #[serde(default)]
    pub normalize: NormalizeConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Adapter selection: `auto` or an adapter name.
    #[serde(default = "default_source")]
    pub source: String,

    /// Document version used when none is given on the command line.
    #[serde(default = "default_document_version")]
    pub document_version: String,

    /// Prefix of the derived document title.
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            document_version: default_document_version(),
            title_prefix: default_title_prefix(),
        }
    }
}

fn default_source() -> String {
    "auto".into()
}
fn default_document_version() -> String {
    "1.0.0".into()
}
fn default_title_prefix() -> String {
    "Living Documentation".into()
}

/// `[normalize]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Maximum items normalized concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Item count from which normalization moves to the blocking pool.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

fn default_concurrency() -> u32 {
    4
}
fn default_parallel_threshold() -> usize {
    64
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.living-doc/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LivingDocError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.living-doc/living-doc.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LivingDocError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        LivingDocError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    if config.normalize.concurrency == 0 {
        return Err(LivingDocError::config(format!(
            "{}: normalize.concurrency must be at least 1",
            path.display()
        )));
    }

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LivingDocError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LivingDocError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LivingDocError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("document_version"));
        assert!(toml_str.contains("parallel_threshold"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.source, "auto");
        assert_eq!(parsed.defaults.document_version, "1.0.0");
        assert_eq!(parsed.normalize.concurrency, 4);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
document_version = "2.3.0"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.document_version, "2.3.0");
        assert_eq!(config.defaults.title_prefix, "Living Documentation");
        assert_eq!(config.normalize.parallel_threshold, 64);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let path = std::env::temp_dir().join(format!(
            "living-doc-config-test-{}.toml",
            uuid::Uuid::now_v7()
        ));
        std::fs::write(&path, "[normalize]\nconcurrency = 0\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("concurrency"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/living-doc.toml")).unwrap_err();
        assert!(matches!(err, LivingDocError::FileIo { .. }));
    }
}
