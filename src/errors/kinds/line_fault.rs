use crate::SerialResult;

/// Physical-layer fault detected on the receive line.
///
/// Declaration order is the reporting priority when several faults are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineFault {
    Overrun,
    Framing,
    Parity,
    Noise,
    LineBreak,
}

impl LineFault {
    pub const ALL: [LineFault; 5] = [
        Self::Overrun,
        Self::Framing,
        Self::Parity,
        Self::Noise,
        Self::LineBreak,
    ];

    pub fn result(&self) -> SerialResult {
        match self {
            Self::Overrun => SerialResult::OverRun,
            Self::Framing => SerialResult::FramingError,
            Self::Parity => SerialResult::ParityError,
            Self::Noise => SerialResult::NoiseError,
            Self::LineBreak => SerialResult::LineBreakError,
        }
    }

    pub fn from_result(result: SerialResult) -> Option<Self> {
        Self::ALL.into_iter().find(|fault| fault.result() == result)
    }

    pub(crate) fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl std::fmt::Display for LineFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overrun => write!(f, "Receive overrun"),
            Self::Framing => write!(f, "Framing error"),
            Self::Parity => write!(f, "Parity error"),
            Self::Noise => write!(f, "Noise error"),
            Self::LineBreak => write!(f, "Line break"),
        }
    }
}
