mod data_bits;
mod flow_control;
mod parity;
mod stop_bits;

pub use data_bits::*;
pub use flow_control::*;
pub use parity::*;
pub use stop_bits::*;
