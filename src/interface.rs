//! The channel contract shared by every port implementation.
//!
//! A channel is either closed or open. `open` moves it to open, `close` back
//! to closed, and `read`/`write` only succeed while it is open. Every call
//! produces exactly one outcome; [`SerialResult::from`] turns any return value
//! into its result code.
//!
//! `read` never blocks: with nothing pending it fails with
//! [`SerialError::NoData`]. `write` blocks until the bytes are handed to the
//! transmitter or the configured write timeout elapses.
//!
//! Line faults are latched when detected and reported once, by the next
//! `read`, before any buffered data.
//!
//! [`SerialResult::from`]: crate::SerialResult

use crate::{ParameterKind, PortConfig, SerialError};

pub trait SerialInterface: Send + std::fmt::Debug {
    /// Device name or path of this channel.
    fn name(&self) -> &str;

    fn is_open(&self) -> bool;

    /// Fails with `InvalidParameter` for an out-of-range configuration and
    /// with `Fail` when the channel is already open or the device refuses.
    fn open(&mut self, config: &PortConfig) -> Result<(), SerialError>;

    /// Fails with `Closed` when the channel is not open.
    fn close(&mut self) -> Result<(), SerialError>;

    /// Copies pending bytes into `buf` and returns how many were copied.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError>;

    fn write(&mut self, buf: &[u8]) -> Result<(), SerialError>;

    /// Whether received bytes are waiting. Pending line faults do not count.
    fn has_data(&mut self) -> Result<bool, SerialError>;

    fn send_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        self.write(&[byte])
    }

    fn send_array(&mut self, data: &[u8]) -> Result<(), SerialError> {
        self.write(data)
    }

    /// Sends the bytes of `text` up to the first NUL.
    fn send_string(&mut self, text: &str) -> Result<(), SerialError> {
        let bytes = text.as_bytes();
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        if end == 0 {
            return Err(SerialError::invalid(
                ParameterKind::Buffer,
                "string to send is empty",
            ));
        }
        self.write(&bytes[..end])
    }

    fn get_byte(&mut self) -> Result<u8, SerialError> {
        let mut byte = [0u8; 1];
        self.read(&mut byte)?;
        Ok(byte[0])
    }
}

impl<T: SerialInterface + ?Sized> SerialInterface for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn open(&mut self, config: &PortConfig) -> Result<(), SerialError> {
        (**self).open(config)
    }

    fn close(&mut self) -> Result<(), SerialError> {
        (**self).close()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), SerialError> {
        (**self).write(buf)
    }

    fn has_data(&mut self) -> Result<bool, SerialError> {
        (**self).has_data()
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        (**self).send_byte(byte)
    }

    fn send_array(&mut self, data: &[u8]) -> Result<(), SerialError> {
        (**self).send_array(data)
    }

    fn send_string(&mut self, text: &str) -> Result<(), SerialError> {
        (**self).send_string(text)
    }

    fn get_byte(&mut self) -> Result<u8, SerialError> {
        (**self).get_byte()
    }
}

/// Argument checks shared by the port implementations.
pub(crate) fn check_read_buffer(buf: &[u8]) -> Result<(), SerialError> {
    if buf.is_empty() {
        return Err(SerialError::invalid(
            ParameterKind::Buffer,
            "read buffer is empty",
        ));
    }
    Ok(())
}

pub(crate) fn check_write_buffer(buf: &[u8], max_len: usize) -> Result<(), SerialError> {
    if buf.is_empty() {
        return Err(SerialError::invalid(
            ParameterKind::Buffer,
            "write buffer is empty",
        ));
    }
    if buf.len() > max_len {
        return Err(SerialError::invalid(
            ParameterKind::Buffer,
            format!("write of {} bytes exceeds limit of {}", buf.len(), max_len),
        ));
    }
    Ok(())
}
