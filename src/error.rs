//! Error types for styledtext.

use std::fmt;

/// Result type alias for styledtext operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for styledtext operations.
///
/// Every operation in this crate is pure in-memory computation, so there are
/// no retryable failures. Errors are raised at the point of detection and
/// never logged or swallowed internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Offset, index, or length outside the valid range. Recoverable by the
    /// caller re-validating its input.
    OutOfRange { index: usize, max: usize },
    /// Malformed argument (e.g. a bad hex color string).
    InvalidArgument(String),
    /// Internal consistency failure. A programming defect: fatal to the
    /// operation that detected it, but other state remains usable.
    InvariantViolated(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, max } => {
                write!(f, "index {index} out of range (valid up to {max})")
            }
            Self::InvalidArgument(s) => write!(f, "invalid argument: {s}"),
            Self::InvariantViolated(what) => write!(f, "invariant violated: {what}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::OutOfRange { index: 12, max: 5 };
        assert!(err.to_string().contains("12"));
        assert!(err.to_string().contains('5'));

        let err = Error::InvalidArgument("bad percent array".to_string());
        assert!(err.to_string().contains("invalid argument"));

        let err = Error::InvariantViolated("line table out of sync");
        assert!(err.to_string().contains("invariant violated"));
    }
}
