//! DestinationConfig - Config Loader output
//!
//! One record per output target, in configuration order.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{ContractError, Endpoint};

/// Complete multiplexer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct MuxConfig {
    /// Output destinations, in fan-out order
    #[serde(default)]
    #[validate(nested)]
    pub destinations: Vec<DestinationConfig>,
}

/// A single output destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DestinationConfig {
    /// Target URL; the scheme selects the transport
    #[validate(length(min = 1, message = "destination url cannot be empty"))]
    pub url: String,

    /// Literal prefix prepended to every line
    #[serde(default)]
    pub prefix: String,

    /// Accept unverified TLS certificates (tls/ssl only)
    #[serde(default)]
    pub allow_self_signed_cert: bool,
}

impl DestinationConfig {
    /// Create a config with an empty prefix
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: String::new(),
            allow_self_signed_cert: false,
        }
    }

    /// Set the line prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Allow self-signed TLS certificates
    pub fn allow_self_signed(mut self, allow: bool) -> Self {
        self.allow_self_signed_cert = allow;
        self
    }

    /// Parse the target URL
    pub fn endpoint(&self) -> Result<Endpoint, ContractError> {
        Endpoint::parse(&self.url)
    }
}
