//! SIGUSR2 reload listener.

use std::path::PathBuf;
use std::sync::Arc;

use config_loader::FileConfigSource;
use dispatcher::ReloadCoordinator;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Reload `config` into `coordinator` every time SIGUSR2 arrives
///
/// A failed reload is logged and the previous destinations stay active.
#[cfg(unix)]
pub fn spawn_reload_listener(
    coordinator: Arc<ReloadCoordinator>,
    config: PathBuf,
) -> JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut signals = match signal(SignalKind::user_defined2()) {
            Ok(signals) => signals,
            Err(e) => {
                error!(error = %e, "Failed to install SIGUSR2 handler, reload disabled");
                return;
            }
        };

        let source = FileConfigSource::new(config);
        while signals.recv().await.is_some() {
            if coordinator.is_shut_down() {
                break;
            }
            info!(config = %source.path().display(), "SIGUSR2 received, reloading");
            match coordinator.trigger_reload(&source).await {
                Ok(count) => info!(
                    destinations = count,
                    generation = coordinator.generation(),
                    "Configuration reloaded"
                ),
                Err(e) => warn!(error = %e, "Reload failed, previous configuration kept"),
            }
        }
    })
}

#[cfg(not(unix))]
pub fn spawn_reload_listener(
    _coordinator: Arc<ReloadCoordinator>,
    _config: PathBuf,
) -> JoinHandle<()> {
    warn!("Signal-triggered reload is only available on Unix");
    tokio::spawn(async {})
}
