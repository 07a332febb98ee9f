//! Error types for wire format operations.

use std::fmt;

use bytestream::StreamError;

/// Result type for wire format operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// High-level decode errors for frame framing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The first byte is not a frame marker.
    InvalidMarker { found: u8 },

    /// Unknown delta type code in a record header.
    UnknownDeltaType { code: u8 },

    /// A resent record carried resend id zero.
    ZeroResendId { set: u8 },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// The underlying byte cursor failed.
    Stream(StreamError),
}

/// Specific wire limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    FrameBytes,
    RecordCount,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMarker { found } => {
                write!(f, "invalid frame marker: 0x{found:02X}")
            }
            Self::UnknownDeltaType { code } => {
                write!(f, "unknown delta type code: {code}")
            }
            Self::ZeroResendId { set } => {
                write!(f, "resent record in set {set} has resend id 0")
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::Stream(err) => write!(f, "stream error: {err}"),
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FrameBytes => "frame bytes",
            Self::RecordCount => "record count",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Stream(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StreamError> for DecodeError {
    fn from(err: StreamError) -> Self {
        Self::Stream(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display_invalid_marker() {
        let err = DecodeError::InvalidMarker { found: 0xAB };
        assert!(err.to_string().contains("AB"));
    }

    #[test]
    fn decode_error_display_limits_exceeded() {
        let err = DecodeError::LimitsExceeded {
            kind: LimitKind::RecordCount,
            limit: 4,
            actual: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("record count"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn stream_error_converts() {
        let err: DecodeError = StreamError::InvalidVarint.into();
        assert!(matches!(err, DecodeError::Stream(StreamError::InvalidVarint)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
