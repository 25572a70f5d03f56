pub mod channel;
pub mod config;
pub mod errors;
pub mod fifo;
pub mod interface;
pub mod line_status;
pub mod logging;
pub mod port;
pub mod result;
pub mod stats;
pub mod tester;

pub use channel::SerialChannel;
pub use config::{
    AppConfig, DataBits, FlowControl, LoggingConfig, Parity, PortConfig, StopBits, StressConfig,
};
pub use errors::{
    AppError, ConfigValidationError, InitializationError, IoOperation, LineFault, ParameterKind,
    SerialError, UnknownResultName,
};
pub use fifo::Fifo;
pub use interface::SerialInterface;
pub use line_status::LineStatus;
pub use logging::setup_logging;
pub use port::{list_ports, FaultCounters, HardwarePort, PortInfo, VirtualLine, VirtualPort};
pub use result::{ResultCategory, SerialResult};
pub use stats::ResultStats;
pub use tester::{FramingReport, LineTester, ListenReport};
