//! Run configuration for songtag-ai
//!
//! Resolves every setting with CLI → ENV (`SONGTAG_*`) → TOML → compiled
//! default priority and builds the inference transport the run will use.

use crate::services::filename_normalizer::NormalizeMode;
use crate::services::transport::{
    InferenceTransport, OllamaTransport, OpenAiTransport, TransportError,
};
use clap::{Parser, ValueEnum};
use songtag_common::config::{env_override, CompiledDefaults, TomlConfig};
use songtag_common::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Inference backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// OpenAI-compatible hosted API
    #[value(name = "openai")]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!(
                "unknown backend '{}' (expected openai or ollama)",
                other
            )),
        }
    }
}

/// Command-line arguments
#[derive(Debug, Default, Parser)]
#[command(version, about = "Tag audio files with metadata inferred from their filenames")]
pub struct CliArgs {
    /// Folder scanned (recursively) for .mp3 and .opus files
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Folder receiving tagged copies
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Inference backend
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Backend base address
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key for the hosted backend
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Log progress every N files
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Pause between files in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Keep files that already have a title or artist untouched
    #[arg(long)]
    pub no_overwrite: bool,

    /// Confirm each write
    #[arg(long)]
    pub interactive: bool,

    /// Keep "Artist - Title" dashes in the query key
    #[arg(long)]
    pub keep_dash: bool,

    /// Do not send existing tags to the backend
    #[arg(long)]
    pub no_context: bool,

    /// Skip the backend reachability check at startup
    #[arg(long)]
    pub skip_health_check: bool,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log file (appended to)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub backend: Backend,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// `None` leaves requests unbounded
    pub timeout: Option<Duration>,
    pub batch_size: usize,
    pub delay: Duration,
    pub overwrite: bool,
    pub interactive: bool,
    pub normalize_mode: NormalizeMode,
    pub use_existing_context: bool,
    pub health_check: bool,
}

impl RunConfig {
    /// Defaults for `input_dir`/`output_dir`, OpenAI backend
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let defaults = CompiledDefaults::default();
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            backend: Backend::OpenAi,
            model: defaults.openai_model,
            base_url: defaults.openai_base_url,
            api_key: None,
            timeout: None,
            batch_size: defaults.batch_size,
            delay: Duration::from_millis(defaults.delay_ms),
            overwrite: defaults.overwrite,
            interactive: defaults.interactive,
            normalize_mode: NormalizeMode::Collapse,
            use_existing_context: true,
            health_check: true,
        }
    }

    /// Merge CLI arguments, environment and TOML into a run configuration
    pub fn resolve(args: &CliArgs, toml: &TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::default();

        let backend = match args.backend {
            Some(backend) => backend,
            None => {
                let name = env_override::<String>("BACKEND")?
                    .or_else(|| toml.backend.clone())
                    .unwrap_or_else(|| defaults.backend.clone());
                name.parse::<Backend>().map_err(Error::Config)?
            }
        };

        let (default_model, default_base_url, default_timeout) = match backend {
            Backend::OpenAi => (
                defaults.openai_model.clone(),
                defaults.openai_base_url.clone(),
                None,
            ),
            Backend::Ollama => (
                defaults.ollama_model.clone(),
                defaults.ollama_base_url.clone(),
                Some(defaults.ollama_timeout_secs),
            ),
        };

        let timeout_secs = match args.timeout_secs {
            Some(secs) => Some(secs),
            None => env_override::<u64>("TIMEOUT_SECS")?
                .or(toml.timeout_secs)
                .or(default_timeout),
        };

        let batch_size = pick(
            args.batch_size,
            env_override("BATCH_SIZE")?,
            toml.batch_size,
            defaults.batch_size,
        );
        let delay_ms = pick(
            args.delay_ms,
            env_override("DELAY_MS")?,
            toml.delay_ms,
            defaults.delay_ms,
        );

        let overwrite = if args.no_overwrite {
            false
        } else {
            env_override::<bool>("OVERWRITE")?
                .or(toml.overwrite)
                .unwrap_or(defaults.overwrite)
        };

        let interactive = args.interactive
            || env_override::<bool>("INTERACTIVE")?
                .or(toml.interactive)
                .unwrap_or(defaults.interactive);

        let config = Self {
            input_dir: pick(
                args.input.clone(),
                env_override("INPUT_DIR")?,
                toml.input_dir.clone(),
                defaults.input_dir,
            ),
            output_dir: pick(
                args.output.clone(),
                env_override("OUTPUT_DIR")?,
                toml.output_dir.clone(),
                defaults.output_dir,
            ),
            backend,
            model: pick(
                args.model.clone(),
                env_override("MODEL")?,
                toml.model.clone(),
                default_model,
            ),
            base_url: pick(
                args.base_url.clone(),
                env_override("BASE_URL")?,
                toml.base_url.clone(),
                default_base_url,
            ),
            api_key: args
                .api_key
                .clone()
                .or(env_override("API_KEY")?)
                .or_else(|| toml.api_key.clone()),
            timeout: timeout_secs.map(Duration::from_secs),
            batch_size,
            delay: Duration::from_millis(delay_ms),
            overwrite,
            interactive,
            normalize_mode: if args.keep_dash {
                NormalizeMode::KeepDash
            } else {
                NormalizeMode::Collapse
            },
            use_existing_context: !args.no_context,
            health_check: !args.skip_health_check,
        };

        info!(
            backend = ?config.backend,
            model = %config.model,
            input = %config.input_dir.display(),
            output = %config.output_dir.display(),
            overwrite = config.overwrite,
            interactive = config.interactive,
            "Resolved run configuration"
        );

        Ok(config)
    }

    /// Startup checks that must pass before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch size must be at least 1".to_string()));
        }
        if !self.input_dir.is_dir() {
            return Err(Error::Config(format!(
                "Input folder not found: {}",
                self.input_dir.display()
            )));
        }
        Ok(())
    }

    /// Build the transport for the selected backend
    pub fn build_transport(
        &self,
    ) -> std::result::Result<Arc<dyn InferenceTransport>, TransportError> {
        let default_timeout = Duration::from_secs(CompiledDefaults::default().ollama_timeout_secs);
        let transport: Arc<dyn InferenceTransport> = match self.backend {
            Backend::OpenAi => Arc::new(OpenAiTransport::new(
                self.base_url.clone(),
                self.api_key.clone().unwrap_or_default(),
                self.timeout,
            )?),
            Backend::Ollama => Arc::new(OllamaTransport::new(
                self.base_url.clone(),
                self.timeout.unwrap_or(default_timeout),
            )?),
        };
        Ok(transport)
    }
}

fn pick<T>(cli: Option<T>, env: Option<T>, toml: Option<T>, default: T) -> T {
    cli.or(env).or(toml).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("OpenAI".parse::<Backend>(), Ok(Backend::OpenAi));
        assert_eq!(" ollama ".parse::<Backend>(), Ok(Backend::Ollama));
        assert!("gemini".parse::<Backend>().is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let args = CliArgs::parse_from([
            "songtag-ai",
            "--input",
            "in",
            "--backend",
            "ollama",
            "--no-overwrite",
            "--keep-dash",
        ]);
        assert_eq!(args.input, Some(PathBuf::from("in")));
        assert_eq!(args.backend, Some(Backend::Ollama));
        assert!(args.no_overwrite);
        assert!(args.keep_dash);
        assert!(!args.interactive);
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = RunConfig::new("in", "out");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.delay, Duration::from_secs(1));
        assert!(config.overwrite);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_validate_missing_input() {
        let config = RunConfig::new("/nonexistent/songtag/input", "out");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = RunConfig::new(temp_dir.path(), "out");
        assert!(config.validate().is_ok());

        config.batch_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_openai_transport_needs_key() {
        let config = RunConfig::new("in", "out");
        assert!(matches!(
            config.build_transport(),
            Err(TransportError::Configuration(_))
        ));
    }
}
