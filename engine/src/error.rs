//! Error types for the Inlet engine.
//!
//! Recoverable errors only exist at the model parsing boundary. The read
//! path itself reports absence through document variants and treats caller
//! contract violations as fatal.

use thiserror::Error;

/// All possible errors from the Inlet engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid resource path: {0}")]
    InvalidResourcePath(String),

    #[error("invalid document key: {0}")]
    InvalidDocumentKey(String),

    #[error("invalid field path: {0}")]
    InvalidFieldPath(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::InvalidResourcePath("a//b".into());
        assert_eq!(err.to_string(), "invalid resource path: a//b");

        let err = Error::InvalidDocumentKey("rooms".into());
        assert_eq!(err.to_string(), "invalid document key: rooms");

        let err = Error::InvalidFieldPath("a..b".into());
        assert_eq!(err.to_string(), "invalid field path: a..b");
    }
}
