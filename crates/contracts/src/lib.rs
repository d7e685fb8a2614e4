//! # Contracts
//!
//! Frozen interface contracts shared by every logmux crate.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Line Model
//! - A line is raw bytes including its trailing `\n`; no UTF-8 requirement
//! - Each destination prepends its own prefix before writing

mod destination;
mod endpoint;
mod error;
mod sink;
mod source;
mod status;

pub use destination::*;
pub use endpoint::{AddressFamily, Endpoint, EndpointKind};
pub use error::*;
pub use sink::*;
pub use source::{ConfigSource, LocalConfigSource, StaticConfigSource};
pub use status::{ConnectionStatus, LinkEvent};
