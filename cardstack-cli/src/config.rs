use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// How commands print their results
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Tracing filter directive, e.g. "warn" or "cardstack_core=debug"
    pub log_level: ConfigValue<String>,
    /// Default output format for commands
    pub format: ConfigValue<OutputFormat>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    log_level: Option<String>,
    format: Option<OutputFormat>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut log_level = ConfigValue::new(DEFAULT_LOG_LEVEL.to_string(), ConfigSource::Default);
        let mut format = ConfigValue::new(OutputFormat::default(), ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(level) = file_config.log_level {
                log_level = ConfigValue::new(level, ConfigSource::File);
            }
            if let Some(file_format) = file_config.format {
                format = ConfigValue::new(file_format, ConfigSource::File);
            }
        }

        if let Ok(level) = std::env::var("CARDSTACK_LOG_LEVEL") {
            log_level = ConfigValue::new(level, ConfigSource::Environment);
        }
        if let Ok(raw) = std::env::var("CARDSTACK_FORMAT") {
            let env_format = raw
                .parse()
                .map_err(|e| ConfigError::InvalidValue("CARDSTACK_FORMAT".to_string(), e))?;
            format = ConfigValue::new(env_format, ConfigSource::Environment);
        }

        Ok(Self {
            log_level,
            format,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/cardstack/
    /// - macOS: ~/Library/Application Support/cardstack/
    /// - Windows: %APPDATA%/cardstack/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cardstack")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, e) => write!(f, "Invalid value for {}: {}", key, e),
        }
    }
}

impl std::error::Error for ConfigError {}
