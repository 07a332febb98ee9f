//! Configurable limits for bounded decoding.

use crate::record::MIN_RECORD_BYTES;

const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;

/// Wire-level limits for frame decoding.
///
/// These limits are enforced during decoding to prevent resource exhaustion
/// and ensure bounded memory usage on the receiving side.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limits {
    /// Maximum frame size in bytes.
    pub max_frame_bytes: usize,

    /// Maximum number of delta records in a frame.
    pub max_records: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // First frames carry a whole map baseline.
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            max_records: DEFAULT_MAX_FRAME_BYTES / MIN_RECORD_BYTES,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_frame_bytes: 4096,
            max_records: 64,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_frame_bytes: usize::MAX,
            max_records: usize::MAX,
        }
    }
}
