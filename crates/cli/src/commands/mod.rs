//! Command implementations.

mod reload;
mod run;
mod validate;

pub use run::run_mux;
pub use validate::run_validate;
