//! Errors raised while parsing the fundamental types from text.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

impl From<hex::FromHexError> for TypeError {
    fn from(e: hex::FromHexError) -> Self {
        TypeError::InvalidHex(e.to_string())
    }
}
