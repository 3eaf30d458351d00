use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{Config, OutputFormat};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# cardstack configuration

# Log filter for diagnostics on stderr (overridden by RUST_LOG)
log_level: warn

# Output format for commands: text or json
format: text
"#;

impl ConfigCommand {
    pub fn run(&self, config: &Config, config_path: Option<PathBuf>) -> Result<(), ConfigCmdError> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format.unwrap_or(config.format.value) {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("log_level: {}", config.log_level.value);
                        println!("  source: {}", config.log_level.source);
                        println!();

                        println!("format: {}", config.format.value);
                        println!("  source: {}", config.format.source);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = config_path.unwrap_or_else(Config::default_config_path);
                if init_config(&config_path)? {
                    println!("Created config file: {}", config_path.display());
                    println!("\nEdit this file to customize your settings.");
                } else {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'cardstack config show' to view current configuration.");
                }
                Ok(())
            }
        }
    }
}

/// Write the default config file; returns false if one already exists.
fn init_config(path: &Path) -> Result<bool, std::io::Error> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(DEFAULT_CONFIG.as_bytes())?;
    Ok(true)
}

/// Errors from config command
#[derive(Debug)]
pub enum ConfigCmdError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigCmdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigCmdError::Io(e) => write!(f, "Failed to write config file: {}", e),
            ConfigCmdError::Json(e) => write!(f, "Failed to format configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigCmdError {}

impl From<std::io::Error> for ConfigCmdError {
    fn from(e: std::io::Error) -> Self {
        ConfigCmdError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigCmdError {
    fn from(e: serde_json::Error) -> Self {
        ConfigCmdError::Json(e)
    }
}
