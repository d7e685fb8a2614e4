//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use contracts::{EndpointKind, MuxConfig};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    destinations: Option<Vec<DestinationSummary>>,
}

#[derive(Serialize)]
struct DestinationSummary {
    kind: String,
    address: String,
    prefix: String,
    allow_self_signed_cert: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(&args.config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(path: &Path) -> ValidationResult {
    let config_path = path.display().to_string();

    if !path.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", path.display())),
            warnings: None,
            destinations: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(path) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                destinations: Some(summarize(&config)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            destinations: None,
        },
    }
}

fn summarize(config: &MuxConfig) -> Vec<DestinationSummary> {
    config
        .destinations
        .iter()
        .filter_map(|d| {
            // Loaded configs are validated, so every endpoint parses
            let endpoint = d.endpoint().ok()?;
            Some(DestinationSummary {
                kind: endpoint.kind.to_string(),
                address: endpoint.address,
                prefix: d.prefix.clone(),
                allow_self_signed_cert: d.allow_self_signed_cert,
            })
        })
        .collect()
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &MuxConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.destinations.is_empty() {
        warnings.push("No destinations configured - input lines will be discarded".to_string());
    }

    for (idx, destination) in config.destinations.iter().enumerate() {
        let Ok(endpoint) = destination.endpoint() else {
            continue;
        };
        if destination.allow_self_signed_cert && endpoint.kind != EndpointKind::Tls {
            warnings.push(format!(
                "destinations[{idx}] ({}): allow_self_signed_cert has no effect on a {} destination",
                destination.url, endpoint.kind
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref destinations) = result.destinations {
            println!("\n  Destinations: {}", destinations.len());
            for d in destinations {
                println!("  - [{}] {} prefix={:?}", d.kind, d.address, d.prefix);
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
