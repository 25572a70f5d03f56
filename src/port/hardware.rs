use std::io::{Read, Write};

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

#[cfg(unix)]
use serialport::TTYPort;

use serialport::SerialPort;
use tracing::{debug, info, trace, warn};

#[cfg(unix)]
use super::counters::{read_counters, FaultCounters};
use crate::{
    interface::{check_read_buffer, check_write_buffer},
    line_status::LineStatus,
    IoOperation, PortConfig, SerialError, SerialInterface,
};

struct OpenPort {
    port: Box<dyn SerialPort>,
    config: PortConfig,

    #[cfg(unix)]
    raw_fd: i32,
    /// Last counter snapshot, `None` when the driver keeps no counters
    #[cfg(unix)]
    counters: Option<FaultCounters>,
}

/// Serial channel backed by an operating system device.
pub struct HardwarePort {
    name: String,
    open: Option<OpenPort>,
    status: LineStatus,
}

impl std::fmt::Debug for HardwarePort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwarePort")
            .field("name", &self.name)
            .field("open", &self.open.is_some())
            .field("status", &self.status)
            .finish()
    }
}

impl HardwarePort {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            name: device.into(),
            open: None,
            status: LineStatus::default(),
        }
    }

    /// Configuration the port was opened with.
    pub fn config(&self) -> Option<&PortConfig> {
        self.open.as_ref().map(|open| &open.config)
    }

    fn builder(config: &PortConfig) -> serialport::SerialPortBuilder {
        serialport::new(&config.device, config.baud_rate)
            .data_bits(config.data_bits.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .flow_control(config.flow_control.into())
            .timeout(config.write_timeout)
    }

    #[cfg(unix)]
    fn open_device(config: &PortConfig) -> Result<OpenPort, SerialError> {
        let tty_port: TTYPort = Self::builder(config)
            .open_native()
            .map_err(|e| SerialError::from_serialport(&config.device, e))?;

        let raw_fd = tty_port.as_raw_fd();
        let counters = match read_counters(raw_fd) {
            Ok(counters) => Some(counters),
            Err(e) => {
                debug!(
                    "{}: line fault counters unavailable ({}), fault detection disabled",
                    config.device, e
                );
                None
            }
        };

        Ok(OpenPort {
            port: Box::new(tty_port),
            config: config.clone(),
            raw_fd,
            counters,
        })
    }

    #[cfg(not(unix))]
    fn open_device(config: &PortConfig) -> Result<OpenPort, SerialError> {
        let port = Self::builder(config)
            .open()
            .map_err(|e| SerialError::from_serialport(&config.device, e))?;

        Ok(OpenPort {
            port,
            config: config.clone(),
        })
    }

    /// Latches faults the driver counted since the previous poll.
    #[cfg(unix)]
    fn poll_faults(&mut self) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let Some(previous) = open.counters else {
            return;
        };

        match read_counters(open.raw_fd) {
            Ok(current) => {
                for fault in current.faults_since(&previous) {
                    warn!("{}: {} detected", self.name, fault);
                    self.status.latch(fault);
                }
                open.counters = Some(current);
            }
            Err(e) => {
                warn!("{}: failed to read line fault counters: {}", self.name, e);
            }
        }
    }

    #[cfg(not(unix))]
    fn poll_faults(&mut self) {}

    fn open_port(&mut self) -> Result<&mut OpenPort, SerialError> {
        match self.open.as_mut() {
            Some(open) => Ok(open),
            None => Err(SerialError::closed(&self.name)),
        }
    }

    fn bytes_to_read(name: &str, open: &OpenPort) -> Result<usize, SerialError> {
        open.port
            .bytes_to_read()
            .map(|count| count as usize)
            .map_err(|e| SerialError::Fail {
                operation: IoOperation::Read,
                port: name.to_string(),
                details: format!("failed to query pending bytes: {}", e.description),
                source: None,
            })
    }
}

impl SerialInterface for HardwarePort {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn open(&mut self, config: &PortConfig) -> Result<(), SerialError> {
        config.validate()?;

        if self.open.is_some() {
            return Err(SerialError::fail(
                IoOperation::Open,
                &self.name,
                "port is already open",
            ));
        }

        info!("Opening serial port {}", config.serial_port_info());
        let open = Self::open_device(config)?;

        self.name = config.device.clone();
        self.status.clear();
        self.open = Some(open);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SerialError> {
        let Some(open) = self.open.take() else {
            return Err(SerialError::closed(&self.name));
        };

        // The device is released when `open` drops, even if clearing fails
        let cleared = open.port.clear(serialport::ClearBuffer::All);
        drop(open);
        self.status.clear();
        info!("Closed serial port {}", self.name);

        cleared.map_err(|e| {
            warn!("{}: failed to clear buffers on close: {}", self.name, e);
            SerialError::fail(
                IoOperation::Close,
                &self.name,
                format!("failed to discard buffers: {}", e.description),
            )
        })
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        self.open_port()?;
        check_read_buffer(buf)?;

        self.poll_faults();
        if let Some(fault) = self.status.take() {
            return Err(SerialError::line_fault(&self.name, fault));
        }

        let name = self.name.clone();
        let open = self.open_port()?;
        let pending = Self::bytes_to_read(&name, open)?;
        if pending == 0 {
            return Err(SerialError::no_data(name));
        }

        let wanted = pending.min(buf.len());
        match open.port.read(&mut buf[..wanted]) {
            Ok(0) => Err(SerialError::no_data(name)),
            Ok(count) => {
                trace!("{} RX: {} bytes: {}", name, count, hex::encode(&buf[..count]));
                Ok(count)
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(SerialError::no_data(name)),
            Err(e) => Err(SerialError::io(IoOperation::Read, name, e)),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), SerialError> {
        let name = self.name.clone();
        let open = self.open_port()?;
        check_write_buffer(buf, open.config.max_write_len)?;

        trace!("{} TX: {} bytes: {}", name, buf.len(), hex::encode(buf));
        open.port.write_all(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                SerialError::Fail {
                    operation: IoOperation::Write,
                    port: name.clone(),
                    details: format!("write not completed within {:?}", open.config.write_timeout),
                    source: Some(e),
                }
            } else {
                SerialError::io(IoOperation::Write, name.clone(), e)
            }
        })?;

        open.port
            .flush()
            .map_err(|e| SerialError::io(IoOperation::Flush, name, e))
    }

    fn has_data(&mut self) -> Result<bool, SerialError> {
        self.open_port()?;
        self.poll_faults();

        let name = self.name.clone();
        let open = self.open_port()?;
        Ok(Self::bytes_to_read(&name, open)? > 0)
    }
}
