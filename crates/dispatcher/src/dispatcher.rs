//! Dispatcher - main loop reading lines and fanning them out

use std::fmt;
use std::sync::Arc;

use contracts::{DestinationConfig, LineSink};
use observability::{record_line_read, RunningStats};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::destination::Destination;
use crate::error::DispatcherError;
use crate::reload::ReloadCoordinator;
use crate::set::DestinationSet;
use crate::transport::ConnectOptions;

/// Totals for one dispatcher run
#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    /// Lines read, trailing fragment included
    pub lines: u64,
    /// Bytes read
    pub bytes: u64,
    /// Lines where at least one destination failed
    pub lines_with_errors: u64,
    /// Destination errors over all lines
    pub destination_errors: u64,
    /// Line length distribution in bytes
    pub line_sizes: RunningStats,
}

impl DispatchStats {
    fn record(&mut self, len: usize, errors: usize) {
        self.lines += 1;
        self.bytes += len as u64;
        self.line_sizes.push(len as f64);
        if errors > 0 {
            self.lines_with_errors += 1;
            self.destination_errors += errors as u64;
        }
    }
}

impl fmt::Display for DispatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lines={} bytes={} lines_with_errors={} destination_errors={} line_size: {}",
            self.lines,
            self.bytes,
            self.lines_with_errors,
            self.destination_errors,
            self.line_sizes.summary()
        )
    }
}

/// Reads lines from `input` and writes each to the active destination set
pub struct Dispatcher<R, S = Destination> {
    input: R,
    coordinator: Arc<ReloadCoordinator<S>>,
}

impl<R, S> Dispatcher<R, S>
where
    R: AsyncBufRead + Unpin,
    S: LineSink,
{
    pub fn new(input: R, coordinator: Arc<ReloadCoordinator<S>>) -> Self {
        Self { input, coordinator }
    }

    pub fn coordinator(&self) -> &Arc<ReloadCoordinator<S>> {
        &self.coordinator
    }

    /// Run until end of input
    ///
    /// Destination failures are counted and never stop the loop. The active
    /// set is closed before returning, on success and on input failure.
    ///
    /// # Errors
    /// `DispatcherError::Input` when reading the input fails.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> Result<DispatchStats, DispatcherError> {
        let destinations = self.coordinator.len().await;
        info!(destinations, "Dispatcher started");

        let mut stats = DispatchStats::default();
        let mut line = Vec::new();

        let outcome = loop {
            line.clear();
            match self.input.read_until(b'\n', &mut line).await {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    record_line_read(n);
                    let errors = self.coordinator.write_line(&line).await;
                    for e in &errors {
                        if e.is_delivery() {
                            debug!(error = %e, "Destination write failed");
                        } else {
                            warn!(error = %e, "Unexpected destination error");
                        }
                    }
                    stats.record(n, errors.len());

                    if stats.lines.is_multiple_of(1000) {
                        debug!(lines = stats.lines, "Dispatcher progress");
                    }
                }
                Err(e) => break Err(DispatcherError::Input(e)),
            }
        };

        match &outcome {
            Ok(()) => info!(lines = stats.lines, "Input closed, shutting down"),
            Err(e) => error!(error = %e, "Input failed, shutting down"),
        }
        self.coordinator.shutdown().await;
        info!("Dispatcher shutdown complete");

        outcome.map(|()| stats)
    }
}

impl<R, S> Dispatcher<R, S>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    S: LineSink + 'static,
{
    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<Result<DispatchStats, DispatcherError>> {
        tokio::spawn(self.run())
    }
}

/// Build destinations from configuration and wrap them in a coordinator
///
/// Unreachable destinations do not fail this call; an unparseable URL does.
#[instrument(name = "dispatcher_create_coordinator", skip_all, fields(count = configs.len()))]
pub async fn create_coordinator(
    configs: Vec<DestinationConfig>,
    options: ConnectOptions,
) -> Result<Arc<ReloadCoordinator>, DispatcherError> {
    let set = DestinationSet::connect(configs, &options).await?;
    Ok(Arc::new(ReloadCoordinator::with_options(set, options)))
}
