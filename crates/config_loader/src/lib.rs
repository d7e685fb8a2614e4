//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Expand `$VAR` / `${VAR}` references in the raw file text
//! - Parse JSON/TOML destination lists
//! - Validate configuration legality
//! - Produce `MuxConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("logmux.json")).unwrap();
//! println!("Destinations: {}", config.destinations.len());
//! ```

mod parser;
mod validator;

pub use contracts::MuxConfig;
pub use parser::ConfigFormat;

use contracts::{ConfigSource, ContractError, DestinationConfig};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Detects format from file extension (.toml / .json); anything else is
    /// read as JSON.
    ///
    /// # Errors
    /// - File read failure
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<MuxConfig, ContractError> {
        let format = Self::detect_format(path);
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<MuxConfig, ContractError> {
        let expanded = expand_env(content);
        Self::parse_and_validate(&expanded, format)
    }

    /// Serialize MuxConfig to TOML string
    pub fn to_toml(config: &MuxConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize MuxConfig to JSON string
    pub fn to_json(config: &MuxConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> ConfigFormat {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(ConfigFormat::from_extension)
            .unwrap_or(ConfigFormat::Json)
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        std::fs::read_to_string(path).map_err(|e| ContractError::ConfigParse {
            message: format!("cannot read {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<MuxConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

/// Replace `$VAR` and `${VAR}` with their environment values
///
/// Unset variables expand to the empty string.
pub fn expand_env(content: &str) -> Cow<'_, str> {
    shellexpand::env_with_context_no_errors(content, |name| {
        Some(std::env::var(name).unwrap_or_default())
    })
}

/// Config source backed by a file, re-read on every load
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    async fn load(&self) -> Result<Vec<DestinationConfig>, ContractError> {
        let path = self.path.clone();
        let config = tokio::task::spawn_blocking(move || ConfigLoader::load_from_path(&path))
            .await
            .map_err(|e| ContractError::Other(format!("config load task failed: {e}")))??;
        debug!(
            path = %self.path.display(),
            destinations = config.destinations.len(),
            "Configuration loaded"
        );
        Ok(config.destinations)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
