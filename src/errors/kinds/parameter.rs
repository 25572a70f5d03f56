#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    BaudRate,
    DataBits,
    Device,
    Buffer,
    Capacity,
    Timeout,
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BaudRate => write!(f, "Invalid baud rate"),
            Self::DataBits => write!(f, "Invalid data bits"),
            Self::Device => write!(f, "Invalid device"),
            Self::Buffer => write!(f, "Invalid buffer"),
            Self::Capacity => write!(f, "Invalid buffer capacity"),
            Self::Timeout => write!(f, "Invalid timeout"),
        }
    }
}
