//! DestinationSet - ordered destinations written in sequence
//!
//! Each entry sits behind its own mutex so a write through a shared
//! reference can still mutate the destination's status and handle.

use contracts::{ConnectionStatus, ContractError, Delivery, DestinationConfig, LineSink};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::destination::Destination;
use crate::metrics::MetricsSnapshot;
use crate::transport::ConnectOptions;

pub struct DestinationSet<S = Destination> {
    entries: Vec<Mutex<S>>,
}

impl<S> Default for DestinationSet<S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S> DestinationSet<S> {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Wrap already built sinks, keeping their order
    pub fn from_sinks(sinks: impl IntoIterator<Item = S>) -> Self {
        Self {
            entries: sinks.into_iter().map(Mutex::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: LineSink> DestinationSet<S> {
    /// Write one line to every destination in order
    ///
    /// A failing destination never stops the others. Returns one error per
    /// failing destination; an empty vector means full success.
    pub async fn write_all(&self, line: &[u8]) -> Vec<ContractError> {
        let mut errors = Vec::new();
        for entry in &self.entries {
            let mut sink = entry.lock().await;
            match sink.write(line).await {
                Ok(Delivery::Written(_)) => {}
                Ok(Delivery::Reconnected) => {
                    debug!(destination = sink.name(), "Line skipped while reconnecting");
                }
                Err(e) => errors.push(e),
            }
        }
        errors
    }

    /// Close every destination, best effort
    #[instrument(name = "destination_set_close_all", skip(self), fields(count = self.len()))]
    pub async fn close_all(&self) {
        for entry in &self.entries {
            let mut sink = entry.lock().await;
            if let Err(e) = sink.close().await {
                warn!(destination = sink.name(), error = %e, "Close failed");
            }
        }
    }

    /// `(name, status)` for every destination, in order
    pub async fn statuses(&self) -> Vec<(String, ConnectionStatus)> {
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let sink = entry.lock().await;
            out.push((sink.name().to_string(), sink.status()));
        }
        out
    }
}

impl DestinationSet<Destination> {
    /// Build destinations from configuration
    ///
    /// Every URL is parsed before anything is dialed, so an invalid entry
    /// fails the whole set without opening connections. Unreachable
    /// destinations are kept in `NotConnected`.
    ///
    /// # Errors
    /// `ConfigValidation` naming the offending entry.
    #[instrument(name = "destination_set_connect", skip_all, fields(count = configs.len()))]
    pub async fn connect(
        configs: Vec<DestinationConfig>,
        options: &ConnectOptions,
    ) -> Result<Self, ContractError> {
        let mut parsed = Vec::with_capacity(configs.len());
        for (idx, config) in configs.into_iter().enumerate() {
            let endpoint = config.endpoint().map_err(|e| {
                ContractError::config_validation(format!("destinations[{idx}].url"), e.to_string())
            })?;
            parsed.push((config, endpoint));
        }

        let mut destinations = Vec::with_capacity(parsed.len());
        for (config, endpoint) in parsed {
            destinations.push(Destination::from_endpoint(config, endpoint, options.clone()).await);
        }
        Ok(Self::from_sinks(destinations))
    }

    /// Per-destination metrics snapshots
    pub async fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let destination = entry.lock().await;
            out.push((
                destination.name().to_string(),
                destination.metrics().snapshot(),
            ));
        }
        out
    }
}
