//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::NodeBlueprint;

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
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    node: String,
    num_out_ports: usize,
    split_registration: bool,
    stream_count: usize,
    queue_capacity: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

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

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    node: blueprint.node.name.clone(),
                    num_out_ports: blueprint.distributor.num_out_ports,
                    split_registration: blueprint.distributor.split_registration,
                    stream_count: blueprint.distributor.shape.stream_count(),
                    queue_capacity: blueprint.ports.queue_capacity,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &NodeBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let distributor = &blueprint.distributor;

    if distributor.num_out_ports == 0 {
        warnings.push(
            "num_out_ports is 0 - every message on dist_random will be rejected".to_string(),
        );
    }

    if distributor.num_out_ports == 1 {
        warnings.push(
            "single output port - random dispatch always selects dist_out".to_string(),
        );
    }

    if distributor.seed.is_some() {
        warnings.push("seed is fixed - port selection is reproducible across runs".to_string());
    }

    if distributor.shape.stream_count() == 0 {
        warnings.push("no sample streams configured - transfer calls carry no data".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Node: {}", summary.node);
            println!("  Output ports: {}", summary.num_out_ports);
            println!("  Split registration: {}", summary.split_registration);
            println!("  Sample streams: {}", summary.stream_count);
            println!("  Queue capacity: {}", summary.queue_capacity);
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
