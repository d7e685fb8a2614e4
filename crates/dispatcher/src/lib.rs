//! # Dispatcher
//!
//! 行分发模块。
//!
//! 负责：
//! - 读取输入行并 fan-out 到所有目的地
//! - 目的地断线时按需重连，单个失败不影响其他目的地
//! - 持有当前生效的目的地集合，支持热重载

pub mod destination;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod reload;
pub mod set;
pub mod transport;

#[cfg(test)]
mod mock;

pub use contracts::{ConnectionStatus, Delivery, DestinationConfig, LineSink};
pub use destination::Destination;
pub use dispatcher::{create_coordinator, DispatchStats, Dispatcher};
pub use error::DispatcherError;
pub use metrics::{DestinationMetrics, MetricsSnapshot};
pub use reload::ReloadCoordinator;
pub use set::DestinationSet;
pub use transport::{ConnectOptions, Connection, DEFAULT_DIAL_TIMEOUT};
