//! Localdeploy CLI
//!
//! Runs compiled templates locally against the bundled providers.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use localdeploy_deploy::DeployConfig;
use tracing_subscriber::{EnvFilter, fmt};

/// Run compiled infrastructure templates locally.
#[derive(Parser, Debug)]
#[command(name = "localdeploy", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        env = "LOCALDEPLOY_CONFIG",
        default_value = "localdeploy.toml",
        global = true
    )]
    config: PathBuf,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy a compiled template.
    Deploy(commands::deploy::DeployArgs),
    /// List the providers available to templates.
    Providers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DeployConfig::load(&cli.config)?;

    match cli.command {
        Command::Deploy(args) => commands::deploy::run(config, &args, &cli.format).await,
        Command::Providers => commands::providers::run(&config, &cli.format),
    }
}
