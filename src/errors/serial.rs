use std::time::Duration;

use thiserror::Error;

use super::{IoOperation, LineFault, ParameterKind};
use crate::SerialResult;

/// Error returned by every failing operation on a serial channel.
///
/// Each variant maps to exactly one non-success [`SerialResult`].
#[derive(Error, Debug)]
pub enum SerialError {
    #[error("Serial failure: {operation} on {port} - {details}")]
    Fail {
        operation: IoOperation,
        port: String,
        details: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Serial port {port} is closed")]
    Closed { port: String },

    #[error("No data available on {port}")]
    NoData { port: String },

    #[error("Line fault on {port}: {fault}")]
    LineFault { port: String, fault: LineFault },

    #[error("Invalid parameter: {kind} - {details}")]
    InvalidParameter { kind: ParameterKind, details: String },

    #[error("Timeout on {port} after {elapsed:?}, limit was {limit:?}")]
    Timeout {
        port: String,
        elapsed: Duration,
        limit: Duration,
    },
}

impl SerialError {
    pub fn fail(operation: IoOperation, port: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Fail {
            operation,
            port: port.into(),
            details: details.into(),
            source: None,
        }
    }

    pub fn io(operation: IoOperation, port: impl Into<String>, source: std::io::Error) -> Self {
        Self::Fail {
            operation,
            port: port.into(),
            details: source.to_string(),
            source: Some(source),
        }
    }

    pub fn closed(port: impl Into<String>) -> Self {
        Self::Closed { port: port.into() }
    }

    pub fn no_data(port: impl Into<String>) -> Self {
        Self::NoData { port: port.into() }
    }

    pub fn line_fault(port: impl Into<String>, fault: LineFault) -> Self {
        Self::LineFault {
            port: port.into(),
            fault,
        }
    }

    pub fn invalid(kind: ParameterKind, details: impl Into<String>) -> Self {
        Self::InvalidParameter {
            kind,
            details: details.into(),
        }
    }

    /// Maps a `serialport` failure raised while opening or configuring `port`.
    pub fn from_serialport(port: impl Into<String>, err: serialport::Error) -> Self {
        let port = port.into();
        match err.kind {
            serialport::ErrorKind::InvalidInput => {
                Self::invalid(ParameterKind::Device, format!("{}: {}", port, err.description))
            }
            serialport::ErrorKind::NoDevice => Self::fail(
                IoOperation::Open,
                port,
                format!("Device not found: {}", err.description),
            ),
            serialport::ErrorKind::Io(kind) => Self::io(
                IoOperation::Configure,
                port,
                std::io::Error::new(kind, err.description),
            ),
            serialport::ErrorKind::Unknown => Self::fail(IoOperation::Open, port, err.description),
        }
    }

    pub fn result(&self) -> SerialResult {
        match self {
            Self::Fail { .. } | Self::Timeout { .. } => SerialResult::Fail,
            Self::Closed { .. } => SerialResult::Closed,
            Self::NoData { .. } => SerialResult::NoData,
            Self::LineFault { fault, .. } => fault.result(),
            Self::InvalidParameter { .. } => SerialResult::InvalidParameter,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}

impl From<&SerialError> for SerialResult {
    fn from(err: &SerialError) -> Self {
        err.result()
    }
}

impl<T> From<&Result<T, SerialError>> for SerialResult {
    fn from(result: &Result<T, SerialError>) -> Self {
        match result {
            Ok(_) => SerialResult::Success,
            Err(err) => err.result(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_maps_to_a_non_success_code() {
        let errors = [
            SerialError::fail(IoOperation::Write, "ttyS0", "boom"),
            SerialError::closed("ttyS0"),
            SerialError::no_data("ttyS0"),
            SerialError::line_fault("ttyS0", LineFault::Parity),
            SerialError::invalid(ParameterKind::BaudRate, "0"),
            SerialError::Timeout {
                port: "ttyS0".into(),
                elapsed: Duration::from_millis(10),
                limit: Duration::from_millis(5),
            },
        ];

        for err in &errors {
            assert_ne!(err.result(), SerialResult::Success);
        }
        assert_eq!(errors[3].result(), SerialResult::ParityError);
        assert_eq!(errors[5].result(), SerialResult::Fail);
    }

    #[test]
    fn test_line_faults_map_one_to_one() {
        for fault in LineFault::ALL {
            let err = SerialError::line_fault("ttyS0", fault);
            assert_eq!(LineFault::from_result(err.result()), Some(fault));
        }
        assert_eq!(LineFault::from_result(SerialResult::Fail), None);
    }

    #[test]
    fn test_result_of_operation() {
        let ok: Result<usize, SerialError> = Ok(3);
        assert_eq!(SerialResult::from(&ok), SerialResult::Success);

        let err: Result<usize, SerialError> = Err(SerialError::no_data("ttyS0"));
        assert_eq!(SerialResult::from(&err), SerialResult::NoData);
    }

    #[test]
    fn test_error_display() {
        let err = SerialError::closed("/dev/ttyUSB0");
        assert_eq!(err.to_string(), "Serial port /dev/ttyUSB0 is closed");

        let err = SerialError::line_fault("/dev/ttyUSB0", LineFault::LineBreak);
        assert_eq!(err.to_string(), "Line fault on /dev/ttyUSB0: Line break");

        let err = SerialError::invalid(ParameterKind::BaudRate, "0 baud");
        assert_eq!(err.to_string(), "Invalid parameter: Invalid baud rate - 0 baud");
    }

    #[test]
    fn test_from_serialport_error() {
        let err = SerialError::from_serialport(
            "/dev/ttyUSB9",
            serialport::Error::new(serialport::ErrorKind::NoDevice, "Device not found"),
        );
        assert_eq!(err.result(), SerialResult::Fail);

        let err = SerialError::from_serialport(
            "/dev/ttyUSB9",
            serialport::Error::new(serialport::ErrorKind::InvalidInput, "bad baud"),
        );
        assert_eq!(err.result(), SerialResult::InvalidParameter);

        let err = SerialError::from_serialport(
            "/dev/ttyUSB9",
            serialport::Error::new(
                serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied),
                "denied",
            ),
        );
        assert!(matches!(
            err,
            SerialError::Fail {
                operation: IoOperation::Configure,
                source: Some(_),
                ..
            }
        ));
    }
}
