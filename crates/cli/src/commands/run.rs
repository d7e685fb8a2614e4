//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::io::BufReader;
use tracing::info;

use contracts::MuxConfig;
use dispatcher::{create_coordinator, ConnectOptions, Dispatcher};

use super::reload::spawn_reload_listener;
use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_mux(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        destinations = config.destinations.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_destination_table(&config);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let options = ConnectOptions {
        dial_timeout: Duration::from_secs(args.dial_timeout),
    };
    let coordinator = create_coordinator(config.destinations, options)
        .await
        .context("Failed to build destinations")?;

    let listener = spawn_reload_listener(coordinator.clone(), args.config.clone());

    let input = BufReader::new(tokio::io::stdin());
    let result = Dispatcher::new(input, coordinator).run().await;
    listener.abort();

    let stats = result.context("Line dispatch failed")?;
    info!(
        lines = stats.lines,
        bytes = stats.bytes,
        lines_with_errors = stats.lines_with_errors,
        destination_errors = stats.destination_errors,
        line_size = %stats.line_sizes.summary(),
        "Input exhausted, logmux finished"
    );
    Ok(())
}

/// Print the destination table for dry-run mode
fn print_destination_table(config: &MuxConfig) {
    println!("\n=== Destinations ({}) ===\n", config.destinations.len());
    for (i, destination) in config.destinations.iter().enumerate() {
        let (kind, address) = match destination.endpoint() {
            Ok(endpoint) => (endpoint.kind.to_string(), endpoint.address),
            Err(_) => ("?".to_string(), destination.url.clone()),
        };
        let self_signed = if destination.allow_self_signed_cert {
            " (self-signed allowed)"
        } else {
            ""
        };
        println!(
            "  {}. [{}] {} prefix={:?}{}",
            i + 1,
            kind,
            address,
            destination.prefix,
            self_signed
        );
    }
    println!();
}
