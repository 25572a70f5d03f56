use serde::{Deserialize, Serialize};

use crate::{ParameterKind, SerialError};

/// Character width, 5 to 8 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DataBits(u8);

impl DataBits {
    pub fn new(bits: u8) -> Option<Self> {
        match bits {
            5..=8 => Some(Self(bits)),
            _ => None,
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for DataBits {
    fn default() -> Self {
        Self(8)
    }
}

impl TryFrom<u8> for DataBits {
    type Error = SerialError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::new(bits).ok_or_else(|| {
            SerialError::invalid(
                ParameterKind::DataBits,
                format!("data bits must be 5..=8, got {}", bits),
            )
        })
    }
}

impl From<DataBits> for u8 {
    fn from(data_bits: DataBits) -> Self {
        data_bits.0
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(data_bits: DataBits) -> Self {
        match data_bits.0 {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            8 => serialport::DataBits::Eight,
            _ => unreachable!("DataBits constructor ensures valid values"),
        }
    }
}

impl std::fmt::Display for DataBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_bits_range() {
        assert!(DataBits::new(4).is_none());
        assert!(DataBits::new(9).is_none());
        assert_eq!(DataBits::new(7).map(|b| b.get()), Some(7));
        assert_eq!(DataBits::default().get(), 8);
    }

    #[test]
    fn test_data_bits_deserialize_rejects_out_of_range() {
        let bits: DataBits = serde_json::from_str("6").unwrap();
        assert_eq!(bits.get(), 6);
        assert!(serde_json::from_str::<DataBits>("9").is_err());
    }

    #[test]
    fn test_out_of_range_is_invalid_parameter() {
        let err = DataBits::try_from(4).unwrap_err();
        assert_eq!(err.result(), crate::SerialResult::InvalidParameter);
        assert!(matches!(
            err,
            SerialError::InvalidParameter {
                kind: ParameterKind::DataBits,
                ..
            }
        ));
    }
}
