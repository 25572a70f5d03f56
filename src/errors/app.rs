use thiserror::Error;

use super::{ConfigValidationError, InitializationError, SerialError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Serial error: {0}")]
    Serial(#[from] SerialError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigValidationError),

    #[error("Initialization error: {0}")]
    Init(#[from] InitializationError),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl AppError {
    pub fn input(details: impl Into<String>) -> Self {
        Self::Input(details.into())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(ConfigValidationError::config(err.to_string()))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(ConfigValidationError::config(err.to_string()))
    }
}

impl From<hex::FromHexError> for AppError {
    fn from(err: hex::FromHexError) -> Self {
        Self::Input(format!("Invalid hex payload: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineFault, SerialResult};

    #[test]
    fn test_serial_error_conversion() {
        let err: AppError = SerialError::line_fault("ttyS1", LineFault::Overrun).into();
        match err {
            AppError::Serial(inner) => assert_eq!(inner.result(), SerialResult::OverRun),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    #[test]
    fn test_hex_error_conversion() {
        let err: AppError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, AppError::Input(_)));
        assert!(err.to_string().contains("Invalid hex payload"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: AppError = config::ConfigError::Message("missing device".into()).into();
        assert!(err.to_string().contains("missing device"));
    }
}
