mod line_fault;
mod parameter;

pub use line_fault::LineFault;
pub use parameter::ParameterKind;
