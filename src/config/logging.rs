use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::ConfigValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Directory for daily rolling log files, console only when unset
    pub log_dir: Option<String>,

    /// Enable trace-level logging of every byte sent and received
    pub trace_bytes: bool,

    /// Minimum log level
    pub level: String,

    /// Log format (pretty or json)
    pub format: String,

    /// Whether to include source code location in logs
    pub include_location: bool,

    /// Whether to include thread IDs in logs
    pub thread_ids: bool,

    /// Whether to include thread names in logs
    pub thread_names: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: None,
            trace_bytes: false,
            level: "info".to_string(),
            format: "pretty".to_string(),
            include_location: false,
            thread_ids: false,
            thread_names: false,
        }
    }
}

impl Config {
    const LEVELS: [&'static str; 5] = ["error", "warn", "info", "debug", "trace"];
    const FORMATS: [&'static str; 2] = ["pretty", "json"];

    pub fn get_level_filter(&self) -> LevelFilter {
        match self.level.to_lowercase().as_str() {
            "error" => LevelFilter::ERROR,
            "warn" => LevelFilter::WARN,
            "info" => LevelFilter::INFO,
            "debug" => LevelFilter::DEBUG,
            "trace" => LevelFilter::TRACE,
            _ => LevelFilter::INFO, // Fallback to INFO if invalid
        }
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let level = self.level.to_lowercase();
        if !Self::LEVELS.contains(&level.as_str()) {
            return Err(ConfigValidationError::logging(format!(
                "unknown log level '{}', expected one of {:?}",
                self.level,
                Self::LEVELS
            )));
        }

        let format = self.format.to_lowercase();
        if !Self::FORMATS.contains(&format.as_str()) {
            return Err(ConfigValidationError::logging(format!(
                "unknown log format '{}', expected one of {:?}",
                self.format,
                Self::FORMATS
            )));
        }

        if let Some(dir) = &self.log_dir {
            if dir.trim().is_empty() {
                return Err(ConfigValidationError::logging("log_dir must not be empty"));
            }
        }

        Ok(())
    }
}
