//! Delta record encoding/decoding for the svframe replication protocol.
//!
//! This crate ties together bytestream, wire, and model: it turns typed
//! deltas into record bodies and back, decodes whole frames, and provides the
//! client-side receiver that filters duplicate retransmissions and reports
//! acknowledgments.
//!
//! # Features
//!
//! - Per-type record bodies for all ten delta types
//! - Normalization on encode, denormalization on decode
//! - Frame decoding with wire limits
//! - Receive history and ack reports for clients
//!
//! # Design Principles
//!
//! - **No partial records** - Invalid deltas are rejected before any byte is written.
//! - **Bounded decoding** - Frame size and record count are checked.
//! - **Deterministic** - Same inputs produce same outputs.

mod error;
mod frame;
mod receiver;
mod record;

pub use error::{CodecError, CodecResult};
pub use frame::{decode_frame, encode_frame, DecodedFrame};
pub use receiver::{AckReport, FrameReceiver, ReceiveHistory, ReceivedFrame, DEFAULT_HISTORY};
pub use record::{decode_record, encode_record, max_id, DeltaRecord};
pub use wire::Limits as WireLimits;
