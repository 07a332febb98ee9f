//! Whole-frame encoding and decoding.

use bytestream::{ByteReader, ByteWriter};
use wire::{decode_frame_header, encode_frame_header, DecodeError, FrameHeader, LimitKind, Limits};

use crate::error::CodecResult;
use crate::record::{decode_record, encode_record, DeltaRecord};

/// A fully decoded frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedFrame {
    pub header: FrameHeader,
    pub records: Vec<DeltaRecord>,
}

/// Decodes a frame, enforcing wire limits.
pub fn decode_frame(bytes: &[u8], limits: &Limits) -> CodecResult<DecodedFrame> {
    if bytes.len() > limits.max_frame_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::FrameBytes,
            limit: limits.max_frame_bytes,
            actual: bytes.len(),
        }
        .into());
    }

    let mut reader = ByteReader::new(bytes);
    let header = decode_frame_header(&mut reader)?;
    let mut records = Vec::new();
    while !reader.is_empty() {
        if records.len() >= limits.max_records {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::RecordCount,
                limit: limits.max_records,
                actual: records.len() + 1,
            }
            .into());
        }
        records.push(decode_record(&mut reader)?);
    }
    Ok(DecodedFrame { header, records })
}

/// Encodes a complete frame without any budget.
///
/// The server builds frames incrementally against a byte budget; this is the
/// unbounded form for tools, tests and captures.
pub fn encode_frame(header: &FrameHeader, records: &[DeltaRecord]) -> CodecResult<Vec<u8>> {
    let mut writer = ByteWriter::new();
    encode_frame_header(header, &mut writer);
    for record in records {
        encode_record(&record.delta, record.resent, &mut writer)?;
    }
    Ok(writer.finish())
}
