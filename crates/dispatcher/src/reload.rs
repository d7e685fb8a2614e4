//! ReloadCoordinator - the single active destination set
//!
//! Readers hold the read lock for one whole line. A reload builds its new
//! set off the lock and only takes the write lock to close the old set and
//! swap in the new one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use contracts::{ConfigSource, ConnectionStatus, ContractError, LineSink};
use observability::{record_active_destinations, record_reload};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::destination::Destination;
use crate::set::DestinationSet;
use crate::transport::ConnectOptions;

pub struct ReloadCoordinator<S = Destination> {
    active: RwLock<DestinationSet<S>>,
    generation: AtomicU64,
    /// Set by `shutdown`, checked under the write lock
    closed: AtomicBool,
    options: ConnectOptions,
}

impl<S: LineSink> ReloadCoordinator<S> {
    pub fn new(set: DestinationSet<S>) -> Self {
        Self::with_options(set, ConnectOptions::default())
    }

    /// Install the initial set at generation 0
    ///
    /// `options` are reused for every set built by a later reload.
    pub fn with_options(set: DestinationSet<S>, options: ConnectOptions) -> Self {
        record_active_destinations(set.len());
        Self {
            active: RwLock::new(set),
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            options,
        }
    }

    /// Number of successful swaps so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub async fn len(&self) -> usize {
        self.active.read().await.len()
    }

    /// Fan one line out to the active set
    ///
    /// The read lock is held for the whole fan-out, so every destination of
    /// a line belongs to the same generation.
    pub async fn write_line(&self, line: &[u8]) -> Vec<ContractError> {
        let active = self.active.read().await;
        active.write_all(line).await
    }

    /// Close the active set and replace it
    ///
    /// After `shutdown` the incoming set is closed instead and `false` is
    /// returned.
    #[instrument(name = "reload_install", skip_all, fields(count = set.len()))]
    pub async fn install(&self, set: DestinationSet<S>) -> bool {
        let count = set.len();
        let mut active = self.active.write().await;
        if self.closed.load(Ordering::Acquire) {
            drop(active);
            set.close_all().await;
            warn!(destinations = count, "Coordinator shut down, new set discarded");
            return false;
        }
        active.close_all().await;
        let previous = std::mem::replace(&mut *active, set);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        drop(active);

        record_active_destinations(count);
        info!(
            generation,
            previous = previous.len(),
            destinations = count,
            "Destination set replaced"
        );
        true
    }

    /// Final teardown: close the active set and refuse later installs
    #[instrument(name = "reload_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        let active = self.active.write().await;
        self.closed.store(true, Ordering::Release);
        active.close_all().await;
        record_active_destinations(0);
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub async fn statuses(&self) -> Vec<(String, ConnectionStatus)> {
        self.active.read().await.statuses().await
    }
}

impl ReloadCoordinator<Destination> {
    /// Load a new configuration and swap it in
    ///
    /// Loading and dialing happen before the write lock is taken. On any
    /// failure the active set is left untouched and the load or build error
    /// is returned.
    ///
    /// # Returns
    /// The number of destinations in the new set.
    ///
    /// # Errors
    /// The load or build error, or `ContractError::Other` once the
    /// coordinator has been shut down.
    #[instrument(name = "reload_trigger", skip_all, fields(source = %source.describe()))]
    pub async fn trigger_reload<C: ConfigSource>(
        &self,
        source: &C,
    ) -> Result<usize, ContractError> {
        let result = self.build_from(source).await;
        record_reload(result.is_ok());

        match result {
            Ok(set) => {
                let count = set.len();
                if self.install(set).await {
                    Ok(count)
                } else {
                    Err(ContractError::Other(
                        "reload after shutdown, destinations stay closed".to_string(),
                    ))
                }
            }
            Err(e) => {
                warn!(error = %e, "Reload declined, keeping current destinations");
                Err(e)
            }
        }
    }

    async fn build_from<C: ConfigSource>(
        &self,
        source: &C,
    ) -> Result<DestinationSet, ContractError> {
        let configs = source.load().await?;
        DestinationSet::connect(configs, &self.options).await
    }
}
