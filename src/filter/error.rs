use thiserror::Error;

/// Errors that can occur when parsing a period token such as `2w`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodParseError {
    #[error("Malformed period '{0}'. Expected <number><d|w|m|y>, e.g. 7d, 2w, 1m, 1y")]
    Malformed(String),

    #[error("Period '{0}' is out of range")]
    Overflow(String),
}
