//! Layered error definitions
//!
//! Categorized by source: config / connect / write

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Delivery Errors =====
    /// Dial, handshake or file-open failure
    #[error("destination '{destination}' connect error: {source}")]
    Connect {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    /// Transport write failure
    #[error("destination '{destination}' write error: {source}")]
    Write {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    /// Transport accepted fewer bytes than requested
    #[error("destination '{destination}' short write: {written} of {expected} bytes")]
    ShortWrite {
        destination: String,
        written: usize,
        expected: usize,
    },

    /// Write attempted after an explicit close
    #[error("destination '{destination}' is closed")]
    DestinationClosed { destination: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create connect error
    pub fn connect(destination: impl Into<String>, source: std::io::Error) -> Self {
        Self::Connect {
            destination: destination.into(),
            source,
        }
    }

    /// Create write error
    pub fn write(destination: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            destination: destination.into(),
            source,
        }
    }

    /// Create short write error
    pub fn short_write(destination: impl Into<String>, written: usize, expected: usize) -> Self {
        Self::ShortWrite {
            destination: destination.into(),
            written,
            expected,
        }
    }

    /// True for errors raised while reading or validating configuration
    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigParse { .. } | Self::ConfigValidation { .. })
    }

    /// True for per-destination connect/write failures
    pub fn is_delivery(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::Write { .. }
                | Self::ShortWrite { .. }
                | Self::DestinationClosed { .. }
        )
    }
}
