use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownResultName;

/// Outcome of a single operation on a serial channel.
///
/// The numeric codes are stable and follow declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum SerialResult {
    Success = 0,
    Fail = 1,
    Closed = 2,
    NoData = 3,
    OverRun = 4,
    FramingError = 5,
    ParityError = 6,
    NoiseError = 7,
    LineBreakError = 8,
    InvalidParameter = 9,
}

/// Coarse grouping of result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCategory {
    Success,
    Failure,
    Lifecycle,
    FlowControl,
    LineFault,
    CallerContract,
}

impl SerialResult {
    pub const ALL: [SerialResult; 10] = [
        Self::Success,
        Self::Fail,
        Self::Closed,
        Self::NoData,
        Self::OverRun,
        Self::FramingError,
        Self::ParityError,
        Self::NoiseError,
        Self::LineBreakError,
        Self::InvalidParameter,
    ];

    const NAME_PREFIX: &'static str = "SERIAL_";

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|result| result.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "SERIAL_SUCCESS",
            Self::Fail => "SERIAL_FAIL",
            Self::Closed => "SERIAL_CLOSED",
            Self::NoData => "SERIAL_NO_DATA",
            Self::OverRun => "SERIAL_OVER_RUN",
            Self::FramingError => "SERIAL_FRAMING_ERROR",
            Self::ParityError => "SERIAL_PARITY_ERROR",
            Self::NoiseError => "SERIAL_NOISE_ERROR",
            Self::LineBreakError => "SERIAL_LINE_BREAK_ERROR",
            Self::InvalidParameter => "SERIAL_INVALID_PARAMETER",
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    pub fn category(self) -> ResultCategory {
        match self {
            Self::Success => ResultCategory::Success,
            Self::Fail => ResultCategory::Failure,
            Self::Closed => ResultCategory::Lifecycle,
            Self::NoData => ResultCategory::FlowControl,
            Self::OverRun
            | Self::FramingError
            | Self::ParityError
            | Self::NoiseError
            | Self::LineBreakError => ResultCategory::LineFault,
            Self::InvalidParameter => ResultCategory::CallerContract,
        }
    }

    /// Whether the code signals a fault. `NoData` is a flow-control signal, not an error.
    pub fn is_error(self) -> bool {
        !matches!(
            self.category(),
            ResultCategory::Success | ResultCategory::FlowControl
        )
    }
}

impl std::fmt::Display for SerialResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<SerialResult> for i32 {
    fn from(result: SerialResult) -> Self {
        result.code()
    }
}

impl TryFrom<i32> for SerialResult {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

impl FromStr for SerialResult {
    type Err = UnknownResultName;

    /// Accepts `SERIAL_NO_DATA`, `NO_DATA` and `no_data` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix(Self::NAME_PREFIX).unwrap_or(&upper);

        Self::ALL
            .into_iter()
            .find(|result| &result.name()[Self::NAME_PREFIX.len()..] == bare)
            .ok_or_else(|| UnknownResultName(s.to_string()))
    }
}
