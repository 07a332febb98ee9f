//! Frame header types and constants.

use bytestream::{ByteReader, ByteWriter};

use crate::error::{DecodeError, WireResult};

/// Marker byte of the first frame after a join or map change.
pub const FIRST_FRAME_MARKER: u8 = 0x3C;

/// Marker byte of every other frame.
pub const FRAME_MARKER: u8 = 0x3D;

/// Header size in bytes (6 total).
pub const FRAME_HEADER_SIZE: usize = 1 + 4 + 1;

/// Transport delivery mode a frame is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    /// Reliable, in-order delivery.
    Ordered,
    /// Best-effort delivery; loss is repaired by delta resends.
    Unordered,
}

/// Which kind of frame a header introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameKind {
    /// Carries the initial world baseline; sent reliably.
    First,
    /// Ordinary incremental frame.
    Regular,
}

impl FrameKind {
    /// Returns the marker byte for this kind.
    #[must_use]
    pub const fn marker(self) -> u8 {
        match self {
            Self::First => FIRST_FRAME_MARKER,
            Self::Regular => FRAME_MARKER,
        }
    }

    /// Parses a marker byte.
    #[must_use]
    pub const fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            FIRST_FRAME_MARKER => Some(Self::First),
            FRAME_MARKER => Some(Self::Regular),
            _ => None,
        }
    }

    /// Returns the delivery channel frames of this kind must use.
    #[must_use]
    pub const fn channel(self) -> Channel {
        match self {
            Self::First => Channel::Ordered,
            Self::Regular => Channel::Unordered,
        }
    }
}

/// Frame header.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameHeader {
    /// Frame kind.
    pub kind: FrameKind,
    /// Game time in seconds this frame represents.
    pub game_time: f32,
    /// Set number shared by every delta first sent in this frame.
    pub set: u8,
}

impl FrameHeader {
    /// Creates a header for a first frame.
    #[must_use]
    pub const fn first(game_time: f32, set: u8) -> Self {
        Self {
            kind: FrameKind::First,
            game_time,
            set,
        }
    }

    /// Creates a header for a regular frame.
    #[must_use]
    pub const fn regular(game_time: f32, set: u8) -> Self {
        Self {
            kind: FrameKind::Regular,
            game_time,
            set,
        }
    }
}

/// Writes a frame header.
pub fn encode_frame_header(header: &FrameHeader, writer: &mut ByteWriter) {
    writer.write_u8(header.kind.marker());
    writer.write_f32(header.game_time);
    writer.write_u8(header.set);
}

/// Reads a frame header.
pub fn decode_frame_header(reader: &mut ByteReader<'_>) -> WireResult<FrameHeader> {
    let marker = reader.read_u8()?;
    let kind = FrameKind::from_marker(marker).ok_or(DecodeError::InvalidMarker { found: marker })?;
    let game_time = reader.read_f32()?;
    let set = reader.read_u8()?;
    Ok(FrameHeader {
        kind,
        game_time,
        set,
    })
}
