//! Error types for server operations.

use std::fmt;

use crate::session::ClientId;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors surfaced to the code driving a [`crate::FrameServer`].
///
/// Backpressure, unknown acknowledgments and skipped clients are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServerError {
    /// No session exists for the client.
    UnknownClient { client: ClientId },

    /// A configuration value is out of range.
    InvalidConfig { reason: &'static str },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownClient { client } => write!(f, "unknown client {client}"),
            Self::InvalidConfig { reason } => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for ServerError {}
