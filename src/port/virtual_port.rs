use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, trace, warn};

use crate::{
    fifo::Fifo,
    interface::{check_read_buffer, check_write_buffer},
    line_status::LineStatus,
    IoOperation, LineFault, PortConfig, SerialError, SerialInterface,
};

#[derive(Debug)]
struct Line {
    open: bool,
    loopback: bool,
    reject_writes: bool,
    max_write_len: usize,
    rx: Fifo<u8>,
    status: LineStatus,
    transmitted: Vec<u8>,
}

impl Line {
    fn receive(&mut self, name: &str, bytes: &[u8]) {
        let mut dropped = 0usize;
        for byte in bytes {
            if self.rx.push(*byte).is_err() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!("{}: receive FIFO full, dropped {} bytes", name, dropped);
            self.status.latch(LineFault::Overrun);
        }
    }
}

/// In-memory serial channel.
///
/// The paired [`VirtualLine`] plays the remote end: it feeds received bytes
/// and line faults in and collects what the port transmitted.
#[derive(Debug)]
pub struct VirtualPort {
    name: String,
    line: Arc<Mutex<Line>>,
}

/// Remote end of a [`VirtualPort`].
#[derive(Debug, Clone)]
pub struct VirtualLine {
    name: String,
    line: Arc<Mutex<Line>>,
}

fn lock(line: &Mutex<Line>) -> MutexGuard<'_, Line> {
    line.lock().unwrap_or_else(PoisonError::into_inner)
}

impl VirtualPort {
    pub fn new(name: impl Into<String>) -> (Self, VirtualLine) {
        let name = name.into();
        let defaults = PortConfig::default();
        let line = Arc::new(Mutex::new(Line {
            open: false,
            loopback: false,
            reject_writes: false,
            max_write_len: defaults.max_write_len,
            rx: Fifo::with_capacity(defaults.rx_buffer_capacity),
            status: LineStatus::default(),
            transmitted: Vec::new(),
        }));

        let port = Self {
            name: name.clone(),
            line: Arc::clone(&line),
        };
        (port, VirtualLine { name, line })
    }

    /// Port whose transmitted bytes are received back on itself.
    pub fn loopback(name: impl Into<String>) -> (Self, VirtualLine) {
        let (port, line) = Self::new(name);
        line.set_loopback(true);
        (port, line)
    }
}

impl SerialInterface for VirtualPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        lock(&self.line).open
    }

    fn open(&mut self, config: &PortConfig) -> Result<(), SerialError> {
        config.validate()?;

        let mut line = lock(&self.line);
        if line.open {
            return Err(SerialError::fail(
                IoOperation::Open,
                &self.name,
                "port is already open",
            ));
        }

        line.rx = Fifo::with_capacity(config.rx_buffer_capacity);
        line.status.clear();
        line.max_write_len = config.max_write_len;
        line.open = true;

        info!("Opened virtual port {}", config.serial_port_info());
        Ok(())
    }

    fn close(&mut self) -> Result<(), SerialError> {
        let mut line = lock(&self.line);
        if !line.open {
            return Err(SerialError::closed(&self.name));
        }

        line.open = false;
        line.rx.clear();
        line.status.clear();

        info!("Closed virtual port {}", self.name);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        let mut line = lock(&self.line);
        if !line.open {
            return Err(SerialError::closed(&self.name));
        }
        check_read_buffer(buf)?;

        if let Some(fault) = line.status.take() {
            debug!("{}: reporting {}", self.name, fault);
            return Err(SerialError::line_fault(&self.name, fault));
        }

        if line.rx.is_empty() {
            return Err(SerialError::no_data(&self.name));
        }

        let count = line.rx.drain_into(buf);
        trace!("{} RX: {} bytes: {:02X?}", self.name, count, &buf[..count]);
        Ok(count)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), SerialError> {
        let mut line = lock(&self.line);
        if !line.open {
            return Err(SerialError::closed(&self.name));
        }
        check_write_buffer(buf, line.max_write_len)?;

        if line.reject_writes {
            return Err(SerialError::fail(
                IoOperation::Write,
                &self.name,
                "transmitter rejected the write",
            ));
        }

        trace!("{} TX: {} bytes: {:02X?}", self.name, buf.len(), buf);
        line.transmitted.extend_from_slice(buf);
        if line.loopback {
            line.receive(&self.name, buf);
        }
        Ok(())
    }

    fn has_data(&mut self) -> Result<bool, SerialError> {
        let line = lock(&self.line);
        if !line.open {
            return Err(SerialError::closed(&self.name));
        }
        Ok(!line.rx.is_empty())
    }
}

impl VirtualLine {
    /// Delivers bytes to the port. Bytes that do not fit latch an overrun.
    /// Nothing is delivered while the port is closed.
    pub fn inject(&self, bytes: &[u8]) {
        let mut line = lock(&self.line);
        if !line.open {
            debug!("{}: port closed, dropping {} injected bytes", self.name, bytes.len());
            return;
        }
        line.receive(&self.name, bytes);
    }

    pub fn inject_fault(&self, fault: LineFault) {
        let mut line = lock(&self.line);
        if !line.open {
            debug!("{}: port closed, dropping injected {}", self.name, fault);
            return;
        }
        line.status.latch(fault);
    }

    /// Returns and forgets everything the port has transmitted so far.
    pub fn take_transmitted(&self) -> Vec<u8> {
        std::mem::take(&mut lock(&self.line).transmitted)
    }

    pub fn set_loopback(&self, enabled: bool) {
        lock(&self.line).loopback = enabled;
    }

    /// Makes every following write fail until switched off again.
    pub fn set_reject_writes(&self, enabled: bool) {
        lock(&self.line).reject_writes = enabled;
    }

    pub fn is_open(&self) -> bool {
        lock(&self.line).open
    }

    pub fn pending_rx(&self) -> usize {
        lock(&self.line).rx.len()
    }
}
