use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use config::{Config as ConfigBuilder, Environment, File, FileFormat};

use super::{LoggingConfig, PortConfig, StressConfig};
use crate::{AppError, ConfigValidationError};

/// Main application configuration
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Serial port configuration
    #[serde(default)]
    pub port: PortConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Line-fault scenario configuration
    #[serde(default)]
    pub stress: StressConfig,
}

impl Config {
    /// Default configuration directory
    pub const CONFIG_DIR: &'static str = "config";

    /// Environment variable prefix
    const ENV_PREFIX: &'static str = "SERIAL_INTERFACE";

    /// Build configuration using the following priority (highest to lowest):
    /// 1. Environment variables (SERIAL_INTERFACE_<SECTION>__<KEY>)
    /// 2. Local configuration file (config/local.yaml)
    /// 3. Environment specific file (config/{RUN_MODE}.yaml)
    /// 4. Default configuration (config/default.yaml)
    /// 5. Built-in defaults
    pub fn new() -> Result<Self, AppError> {
        let environment = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = ConfigBuilder::builder()
            .add_source(
                File::new(&format!("{}/default", Self::CONFIG_DIR), FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                File::new(
                    &format!("{}/{}", Self::CONFIG_DIR, environment),
                    FileFormat::Yaml,
                )
                .required(false),
            )
            .add_source(
                File::new(&format!("{}/local", Self::CONFIG_DIR), FileFormat::Yaml).required(false),
            )
            .add_source(Self::environment())
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file, environment variables still override it
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .add_source(Self::environment())
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Uses `path` when it exists, otherwise falls back to the layered lookup
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Self::new(),
        }
    }

    fn environment() -> Environment {
        Environment::with_prefix(Self::ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.port.validate()?;
        self.logging.validate()?;
        self.stress.validate()?;

        let mismatched = self
            .port
            .baud_rate
            .saturating_sub(self.stress.framing_baud_offset);
        if mismatched < PortConfig::MIN_BAUD_RATE {
            return Err(ConfigValidationError::stress(format!(
                "framing_baud_offset {} leaves baud rate {} below {}",
                self.stress.framing_baud_offset,
                mismatched,
                PortConfig::MIN_BAUD_RATE
            )));
        }

        Ok(())
    }
}
