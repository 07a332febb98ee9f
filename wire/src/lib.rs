//! Frame and delta record framing for the svframe replication protocol.
//!
//! This crate handles the binary wire format: the frame header, the frame-kind
//! markers and their delivery channels, and the header that precedes every
//! delta record. It does not know what a mobj or a sector looks like, only how
//! records are delimited and tagged.
//!
//! # Design Principles
//!
//! - **Stable wire format** - Markers and type codes never change meaning.
//! - **Bounded decoding** - Limits are checked before a frame is walked.
//! - **No domain knowledge** - Record bodies belong to the codec.

mod error;
mod header;
mod limits;
mod record;

pub use error::{DecodeError, LimitKind, WireResult};
pub use header::{
    decode_frame_header, encode_frame_header, Channel, FrameHeader, FrameKind,
    FIRST_FRAME_MARKER, FRAME_HEADER_SIZE, FRAME_MARKER,
};
pub use limits::Limits;
pub use record::{
    decode_record_header, encode_record_header, DeltaType, RecordHeader, ResendTag,
    MIN_RECORD_BYTES, RESENT_BIT,
};
