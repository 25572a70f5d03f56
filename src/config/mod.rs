mod app;
mod logging;
mod port;
mod stress;
mod types;

pub use app::Config as AppConfig;
pub use logging::Config as LoggingConfig;
pub use port::Config as PortConfig;
pub use stress::Config as StressConfig;
pub use types::{DataBits, FlowControl, Parity, StopBits};
