//! ConfigSource trait - where a reload gets its destinations from

use crate::{ContractError, DestinationConfig};

/// Configuration provider
///
/// Every call to `load` must read fresh configuration so a reload observes
/// the current state of the source. Implementations that touch the
/// filesystem must not block the runtime.
#[trait_variant::make(ConfigSource: Send)]
pub trait LocalConfigSource {
    /// Load the ordered destination list
    async fn load(&self) -> Result<Vec<DestinationConfig>, ContractError>;

    /// Human-readable origin, for logs
    fn describe(&self) -> String;
}

/// Fixed in-memory configuration
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    destinations: Vec<DestinationConfig>,
}

impl StaticConfigSource {
    pub fn new(destinations: Vec<DestinationConfig>) -> Self {
        Self { destinations }
    }
}

impl ConfigSource for StaticConfigSource {
    async fn load(&self) -> Result<Vec<DestinationConfig>, ContractError> {
        Ok(self.destinations.clone())
    }

    fn describe(&self) -> String {
        format!("static({} destinations)", self.destinations.len())
    }
}
