use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{DataBits, FlowControl, Parity, StopBits};
use crate::{ParameterKind, SerialError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub device: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,

    /// How long a request waits for its reply frame
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,

    /// Upper bound for a single write to complete
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// Size of the receive FIFO
    pub rx_buffer_capacity: usize,

    /// Largest buffer accepted by a single write
    pub max_write_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            flow_control: FlowControl::default(),
            read_timeout: Duration::from_millis(100),
            write_timeout: Duration::from_secs(1),
            rx_buffer_capacity: 256,
            max_write_len: 4096,
        }
    }
}

impl Config {
    pub const MIN_BAUD_RATE: u32 = 50;
    pub const MAX_BAUD_RATE: u32 = 4_000_000;
    pub const MAX_RX_BUFFER_CAPACITY: usize = 65_536;

    pub fn with_device(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    pub fn serial_port_info(&self) -> String {
        format!(
            "{} ({} baud, {} data bits, {} parity, {} stop bits, {} flow control)",
            self.device,
            self.baud_rate,
            self.data_bits,
            self.parity,
            self.stop_bits,
            self.flow_control
        )
    }

    /// Line gap that ends a received frame: 3.5 character times, at least 1ms.
    pub fn inter_byte_timeout(&self) -> Duration {
        let parity_bits = match self.parity {
            Parity::None => 0,
            Parity::Odd | Parity::Even => 1,
        };
        let char_bits =
            1 + u32::from(self.data_bits.get()) + parity_bits + u32::from(u8::from(self.stop_bits));
        let gap = Duration::from_secs_f64(3.5 * f64::from(char_bits) / f64::from(self.baud_rate.max(1)));
        gap.max(Duration::from_millis(1))
    }

    /// Checks every value a port relies on before touching the device.
    pub fn validate(&self) -> Result<(), SerialError> {
        if self.device.trim().is_empty() {
            return Err(SerialError::invalid(
                ParameterKind::Device,
                "device must not be empty",
            ));
        }

        if !(Self::MIN_BAUD_RATE..=Self::MAX_BAUD_RATE).contains(&self.baud_rate) {
            return Err(SerialError::invalid(
                ParameterKind::BaudRate,
                format!(
                    "{} is outside {}..={}",
                    self.baud_rate,
                    Self::MIN_BAUD_RATE,
                    Self::MAX_BAUD_RATE
                ),
            ));
        }

        if self.read_timeout.is_zero() || self.write_timeout.is_zero() {
            return Err(SerialError::invalid(
                ParameterKind::Timeout,
                "read and write timeouts must be non-zero",
            ));
        }

        if self.rx_buffer_capacity == 0 || self.rx_buffer_capacity > Self::MAX_RX_BUFFER_CAPACITY {
            return Err(SerialError::invalid(
                ParameterKind::Capacity,
                format!(
                    "rx_buffer_capacity {} is outside 1..={}",
                    self.rx_buffer_capacity,
                    Self::MAX_RX_BUFFER_CAPACITY
                ),
            ));
        }

        if self.max_write_len == 0 {
            return Err(SerialError::invalid(
                ParameterKind::Buffer,
                "max_write_len must be non-zero",
            ));
        }

        Ok(())
    }
}
