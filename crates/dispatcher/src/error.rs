//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Reading the line source failed; unrecoverable
    #[error("input read error: {0}")]
    Input(#[source] std::io::Error),

    /// Destination set construction failed (from contract)
    #[error("failed to build destinations: {0}")]
    Build(#[from] contracts::ContractError),
}
