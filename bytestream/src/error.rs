//! Error types for byte cursor operations.

use std::fmt;

/// Result type for byte cursor operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors that can occur while reading encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Attempted to read past the end of the buffer.
    UnexpectedEof {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// A varint ran past its maximum encoded length.
    InvalidVarint,

    /// A decoded value does not fit the requested integer width.
    ValueOutOfRange {
        /// The value that was out of range.
        value: u64,
        /// Number of bits available.
        bits: u8,
    },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof {
                requested,
                available,
            } => {
                write!(
                    f,
                    "attempted to read {requested} bytes but only {available} bytes available"
                )
            }
            Self::InvalidVarint => write!(f, "invalid varint"),
            Self::ValueOutOfRange { value, bits } => {
                write!(f, "value {value} cannot be represented in {bits} bits")
            }
        }
    }
}

impl std::error::Error for StreamError {}
