use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown serial result name: {0}")]
pub struct UnknownResultName(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SerialResult;

    #[test]
    fn test_parse_error_names_the_input() {
        let err = "SERIAL_TIMEOUT".parse::<SerialResult>().unwrap_err();
        assert_eq!(err, UnknownResultName("SERIAL_TIMEOUT".to_string()));
        assert_eq!(err.to_string(), "Unknown serial result name: SERIAL_TIMEOUT");
    }
}
