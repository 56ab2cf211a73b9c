//! Configuration file loading and environment overrides
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority, handled by the binary)
//! 2. Environment variable (`SONGTAG_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the loader reports it as absent and
//! the compiled defaults apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "SONGTAG_";

/// Settings read from the TOML configuration file
///
/// Every field is optional; absent fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Folder scanned for audio files
    #[serde(default)]
    pub input_dir: Option<PathBuf>,

    /// Folder receiving tagged copies
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Inference backend name ("openai" or "ollama")
    #[serde(default)]
    pub backend: Option<String>,

    /// Model identifier passed to the backend
    #[serde(default)]
    pub model: Option<String>,

    /// Backend base address
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key for hosted backends
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Files between progress log lines
    #[serde(default)]
    pub batch_size: Option<usize>,

    /// Pause between files in milliseconds
    #[serde(default)]
    pub delay_ms: Option<u64>,

    /// Replace metadata that is already present
    #[serde(default)]
    pub overwrite: Option<bool>,

    /// Ask before each write
    #[serde(default)]
    pub interactive: Option<bool>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path, appended to across runs
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("songtag.log"))
}

/// Compiled defaults used when no other source provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub backend: String,
    pub openai_model: String,
    pub ollama_model: String,
    pub openai_base_url: String,
    pub ollama_base_url: String,
    pub ollama_timeout_secs: u64,
    pub batch_size: usize,
    pub delay_ms: u64,
    pub overwrite: bool,
    pub interactive: bool,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            backend: "openai".to_string(),
            openai_model: "gpt-4o".to_string(),
            ollama_model: "llama3".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_timeout_secs: 60,
            batch_size: 10,
            delay_ms: 1000,
            overwrite: true,
            interactive: false,
        }
    }
}

/// Default configuration file path for the platform
///
/// `~/.config/songtag/config.toml` on Linux, the platform config dir elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("songtag").join("config.toml"))
}

/// Load the TOML configuration file
///
/// A missing file yields `Ok(None)` so the caller can report it once logging
/// is up. A file that exists but cannot be read or parsed is a configuration
/// error.
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)?;

    debug!(path = %path.display(), "Loaded TOML config");
    Ok(Some(config))
}

/// Read an environment override `SONGTAG_<NAME>`
///
/// Unset or empty variables yield `Ok(None)`; a value that does not parse is
/// a configuration error naming the variable.
pub fn env_override<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let var = format!("{}{}", ENV_PREFIX, name);
    match std::env::var(&var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{} has invalid value '{}': {}", var, value, e))),
        _ => Ok(None),
    }
}
