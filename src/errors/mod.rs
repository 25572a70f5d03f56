mod app;
mod config;
mod init;
mod io_operation;
mod kinds;
mod result_name;
mod serial;

pub use kinds::LineFault;
pub use kinds::ParameterKind;

pub use app::AppError;
pub use config::ConfigValidationError;
pub use init::InitializationError;
pub use io_operation::IoOperation;
pub use result_name::UnknownResultName;
pub use serial::SerialError;
