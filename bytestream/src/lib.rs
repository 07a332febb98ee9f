//! Byte cursor primitives for the svframe replication protocol.
//!
//! This crate provides [`ByteWriter`] and [`ByteReader`] for byte-oriented encoding and decoding.
//! It is designed for bounded, panic-free operation with explicit error handling.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked.
//! - **No domain knowledge** - This crate knows nothing about deltas, mobjs or frames.
//! - **Explicit errors** - All failures return structured errors, never panic.
//! - **Rollback** - A writer can be truncated back to an earlier offset, which is how a frame
//!   drops a delta that overflowed its budget.
//!
//! # Example
//!
//! ```
//! use bytestream::{ByteReader, ByteWriter};
//!
//! let mut writer = ByteWriter::new();
//! writer.write_u8(7);
//! writer.write_varu32(300);
//!
//! let bytes = writer.finish();
//!
//! let mut reader = ByteReader::new(&bytes);
//! assert_eq!(reader.read_u8().unwrap(), 7);
//! assert_eq!(reader.read_varu32().unwrap(), 300);
//! ```

mod error;
mod reader;
mod writer;

pub use error::{StreamError, StreamResult};
pub use reader::ByteReader;
pub use writer::{varu32_len, ByteWriter, MAX_VARU32_LEN};
