//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use contracts::NodeBlueprint;

use crate::cli::RunArgs;
use crate::simulation::{Simulation, SimulationConfig};

/// Execute the `run` command
pub async fn run_simulation(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(seed) = args.seed {
        info!(seed, "Overriding random seed from CLI");
        blueprint.distributor.seed = Some(seed);
    }

    info!(
        node = %blueprint.node.name,
        outputs = blueprint.distributor.num_out_ports,
        split_registration = blueprint.distributor.split_registration,
        streams = blueprint.distributor.shape.stream_count(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let simulation = Simulation::new(SimulationConfig {
        blueprint,
        events: args.events,
        registrations: args.registrations,
        items_per_block: args.items,
        blocks: args.blocks,
        buffer_size: args.buffer_size,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    });

    let shutdown_signal = setup_shutdown_signal();

    tokio::select! {
        result = simulation.run() => {
            let stats = result.context("Simulation failed")?;
            info!(
                distributed = stats.report.counters.events_distributed,
                registered = stats.report.counters.events_registered,
                duration_secs = stats.duration.as_secs_f64(),
                throughput = format!("{:.0}", stats.throughput()),
                "Simulation completed"
            );

            if args.json {
                let balance = stats.balance();
                let output = serde_json::json!({
                    "stats": stats,
                    "imbalance": balance.imbalance,
                });
                let json = serde_json::to_string_pretty(&output)
                    .context("Failed to serialize run report")?;
                println!("{}", json);
            } else {
                stats.print_summary();
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping simulation...");
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &NodeBlueprint) {
    let distributor = &blueprint.distributor;
    println!("\n=== Configuration Summary ===\n");
    println!("Node: {}", blueprint.node.name);
    println!(
        "Inputs: {}",
        distributor
            .in_ports()
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "Outputs: {}",
        distributor
            .out_port_names()
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if let Some(seed) = distributor.seed {
        println!("Seed: {}", seed);
    }
    println!();
}
