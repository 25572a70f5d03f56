use thiserror::Error;

use super::SerialError;

#[derive(Error, Debug)]
pub enum ConfigValidationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid port configuration: {0}")]
    Port(#[source] SerialError),

    #[error("Invalid logging configuration: {0}")]
    Logging(String),

    #[error("Invalid stress configuration: {0}")]
    Stress(String),
}

impl ConfigValidationError {
    pub fn config(details: impl Into<String>) -> Self {
        Self::Config(details.into())
    }

    pub fn logging(details: impl Into<String>) -> Self {
        Self::Logging(details.into())
    }

    pub fn stress(details: impl Into<String>) -> Self {
        Self::Stress(details.into())
    }
}

impl From<SerialError> for ConfigValidationError {
    fn from(err: SerialError) -> Self {
        Self::Port(err)
    }
}
