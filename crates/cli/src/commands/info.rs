//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::NodeBlueprint;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct NodeInfo {
    version: String,
    node: String,
    input_ports: Vec<String>,
    output_ports: Vec<String>,
    split_registration: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    streams: Vec<StreamInfo>,
    queue_capacity: usize,
}

#[derive(Serialize)]
struct StreamInfo {
    index: usize,
    item_size: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let node_info = build_node_info(&blueprint);
    if args.json {
        let json =
            serde_json::to_string_pretty(&node_info).context("Failed to serialize node info")?;
        println!("{}", json);
    } else {
        print_node_info(&node_info);
    }

    Ok(())
}

fn build_node_info(blueprint: &NodeBlueprint) -> NodeInfo {
    let distributor = &blueprint.distributor;
    NodeInfo {
        version: format!("{:?}", blueprint.version),
        node: blueprint.node.name.clone(),
        input_ports: distributor
            .in_ports()
            .iter()
            .map(|p| p.name().to_string())
            .collect(),
        output_ports: distributor
            .out_port_names()
            .iter()
            .map(|p| p.to_string())
            .collect(),
        split_registration: distributor.split_registration,
        seed: distributor.seed,
        streams: distributor
            .shape
            .item_sizes
            .iter()
            .enumerate()
            .map(|(index, &item_size)| StreamInfo { index, item_size })
            .collect(),
        queue_capacity: blueprint.ports.queue_capacity,
    }
}

fn print_node_info(info: &NodeInfo) {
    println!("=== Distributor Node: {} ===\n", info.node);
    println!("Version: {}", info.version);
    println!(
        "Registration: {}",
        if info.split_registration {
            "split (dist_all)"
        } else {
            "combined (dist_random)"
        }
    );
    match info.seed {
        Some(seed) => println!("Seed: {}", seed),
        None => println!("Seed: (system entropy)"),
    }

    println!("\nInput ports ({}):", info.input_ports.len());
    for port in &info.input_ports {
        println!("  - {}", port);
    }

    println!("\nOutput ports ({}):", info.output_ports.len());
    for port in &info.output_ports {
        println!("  - {}", port);
    }
    println!("  queue capacity: {}", info.queue_capacity);

    if info.streams.is_empty() {
        println!("\nSample streams: none");
    } else {
        println!("\nSample streams ({}):", info.streams.len());
        for stream in &info.streams {
            println!("  - #{}: {} bytes/item", stream.index, stream.item_size);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_build_node_info_split() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[node]
name = "dist0"

[distributor]
num_out_ports = 2
split_registration = true

[distributor.shape]
item_sizes = [4, 8]
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let info = build_node_info(&blueprint);
        assert_eq!(info.input_ports, vec!["dist_random", "dist_all"]);
        assert_eq!(info.output_ports, vec!["dist_out0", "dist_out1"]);
        assert_eq!(info.streams.len(), 2);
        assert_eq!(info.streams[1].item_size, 8);
    }

    #[test]
    fn test_single_port_name() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[node]
name = "dist0"

[distributor]
num_out_ports = 1
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let info = build_node_info(&blueprint);
        assert_eq!(info.input_ports, vec!["dist_random"]);
        assert_eq!(info.output_ports, vec!["dist_out"]);
    }
}
