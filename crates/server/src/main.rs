//! ledger-node entry point.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use ledger_server::{node, router, Cli, NodeConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = NodeConfig::from(Cli::parse());

    if let Err(e) = run(config).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter).context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
    Ok(())
}

async fn run(config: NodeConfig) -> Result<()> {
    init_tracing(&config.log)?;

    let blockchain = node::start(&config).await?;
    let is_validator = blockchain.is_validator()?;

    println!("{}", "ledger node".bold().cyan());
    println!("  Identity:  {}", blockchain.identity().bright_yellow());
    println!("  Address:   {}", config.advertise.bright_cyan());
    println!(
        "  Validator: {}",
        if is_validator {
            "yes".green().bold()
        } else {
            "no".bright_black()
        }
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    info!(addr = %config.listen_addr(), "listening");

    axum::serve(listener, router(blockchain))
        .await
        .context("server error")
}
