//! LineSink trait - Dispatcher output interface
//!
//! Capability interface shared by real destinations and test doubles.

use crate::{ConnectionStatus, ContractError};

/// Outcome of a write that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Bytes written, prefix included
    Written(usize),
    /// The line was skipped and the reconnect attempt succeeded
    Reconnected,
}

/// Line output trait
///
/// All destination implementations must implement this trait.
#[trait_variant::make(LineSink: Send)]
pub trait LocalLineSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Current connection status
    fn status(&self) -> ConnectionStatus;

    /// Write one line, trailing newline included
    ///
    /// # Errors
    /// Returns connect/write error (should include the destination name)
    async fn write(&mut self, line: &[u8]) -> Result<Delivery, ContractError>;

    /// Close sink; safe to call more than once
    async fn close(&mut self) -> Result<(), ContractError>;
}
