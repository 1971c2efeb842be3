//! # ES Distributor CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 端口名称查看
//! - 合成流量驱动分发节点并输出统计

mod cli;
mod commands;
mod simulation;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_simulation, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Metrics exporter is installed by `run` only
    observability::init_with_config(cli.observability_config())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "ES Distributor CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_simulation(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
