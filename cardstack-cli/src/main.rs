use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

use commands::{ConfigCommand, IdCommand, PackageCommand};
use config::{Config, DEFAULT_LOG_LEVEL};

#[derive(Parser)]
#[command(name = "cardstack")]
#[command(version)]
#[command(about = "Inspect cardstack document IDs and package files", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode and decode document IDs
    Id(IdCommand),

    /// Validate and summarize package files
    Package(PackageCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Save config path for init command
    let cli_config_path = cli.config.clone();

    let config = Config::load(cli.config)?;
    init_logging(&config);

    if let Some(path) = &config.config_file {
        tracing::debug!("Loaded configuration from {}", path.display());
    }

    match &cli.command {
        Some(Commands::Id(cmd)) => cmd.run(&config)?,
        Some(Commands::Package(cmd)) => cmd.run(&config)?,
        Some(Commands::Config(cmd)) => cmd.run(&config, cli_config_path)?,
        None => println!("Use --help to see available commands"),
    }

    Ok(())
}

/// Log to stderr, filtered by RUST_LOG or else the configured level.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level.value))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
