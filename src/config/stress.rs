use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigValidationError;

/// Parameters for the line-fault provocation scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Bytes blasted at the device in the overrun scenario
    pub overrun_bytes: usize,

    /// Byte value used for the overrun blast
    pub overrun_fill: u8,

    /// How long to listen for faults after the blast
    #[serde(with = "humantime_serde")]
    pub listen_duration: Duration,

    /// Reopen cycles at the configured and at the offset baud rate
    pub framing_cycles: u32,

    /// Baud rate subtracted for the mismatched half of the framing scenario
    pub framing_baud_offset: u32,

    /// Payload written on every framing cycle
    pub payload: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overrun_bytes: 1000,
            overrun_fill: b'e',
            listen_duration: Duration::from_secs(5),
            framing_cycles: 50,
            framing_baud_offset: 100,
            payload: "error".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.overrun_bytes == 0 {
            return Err(ConfigValidationError::stress("overrun_bytes must be non-zero"));
        }
        if self.framing_cycles == 0 {
            return Err(ConfigValidationError::stress("framing_cycles must be non-zero"));
        }
        if self.payload.is_empty() {
            return Err(ConfigValidationError::stress("payload must not be empty"));
        }
        Ok(())
    }
}
