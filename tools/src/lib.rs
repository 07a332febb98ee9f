//! Introspection and debugging tools for svframe frames.
//!
//! This crate provides utilities for inspecting captured frames:
//!
//! - Summarize a frame by record type and byte size
//! - Decode every record into structured JSON
//! - Pretty-print a decoded frame for humans
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to understand what the encoder did.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use bytestream::ByteReader;
use codec::{decode_record, CodecError, CodecResult};
use model::{Delta, DeltaType};
use serde::Serialize;
use wire::{decode_frame_header, DecodeError, FrameHeader, LimitKind, Limits, ResendTag};

/// Count and total size of one record type in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub delta_type: DeltaType,
    pub records: usize,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    pub header: FrameHeader,
    pub total_bytes: usize,
    pub records: usize,
    pub resent: usize,
    /// Per-type totals in type-code order.
    pub by_type: Vec<TypeSummary>,
}

/// One decoded record with its position and size in the frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDump {
    pub index: usize,
    pub offset: usize,
    pub bytes: usize,
    pub delta_type: DeltaType,
    pub resent: Option<ResendTag>,
    pub delta: Delta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameDump {
    pub header: FrameHeader,
    pub total_bytes: usize,
    pub records: Vec<RecordDump>,
}

/// Decodes a frame, keeping each record's offset and size.
pub fn dump_frame(bytes: &[u8], limits: &Limits) -> CodecResult<FrameDump> {
    if bytes.len() > limits.max_frame_bytes {
        return Err(CodecError::Wire(DecodeError::LimitsExceeded {
            kind: LimitKind::FrameBytes,
            limit: limits.max_frame_bytes,
            actual: bytes.len(),
        }));
    }

    let mut reader = ByteReader::new(bytes);
    let header = decode_frame_header(&mut reader)?;
    let mut records = Vec::new();
    while !reader.is_empty() {
        if records.len() >= limits.max_records {
            return Err(CodecError::Wire(DecodeError::LimitsExceeded {
                kind: LimitKind::RecordCount,
                limit: limits.max_records,
                actual: records.len() + 1,
            }));
        }
        let offset = reader.position();
        let record = decode_record(&mut reader)?;
        records.push(RecordDump {
            index: records.len(),
            offset,
            bytes: reader.position() - offset,
            delta_type: record.delta.delta_type(),
            resent: record.resent,
            delta: record.delta,
        });
    }

    Ok(FrameDump {
        header,
        total_bytes: bytes.len(),
        records,
    })
}

pub fn inspect_frame(bytes: &[u8], limits: &Limits) -> CodecResult<InspectReport> {
    let dump = dump_frame(bytes, limits)?;
    let mut by_type: BTreeMap<u8, TypeSummary> = BTreeMap::new();
    for record in &dump.records {
        let entry = by_type
            .entry(record.delta_type.code())
            .or_insert(TypeSummary {
                delta_type: record.delta_type,
                records: 0,
                bytes: 0,
            });
        entry.records += 1;
        entry.bytes += record.bytes;
    }

    Ok(InspectReport {
        header: dump.header,
        total_bytes: dump.total_bytes,
        records: dump.records.len(),
        resent: dump.records.iter().filter(|r| r.resent.is_some()).count(),
        by_type: by_type.into_values().collect(),
    })
}

/// Human-readable rendering of a decoded frame.
#[must_use]
pub fn format_dump_pretty(dump: &FrameDump) -> String {
    let mut out = String::new();
    let header = dump.header;
    let _ = writeln!(
        out,
        "{:?} frame, set {}, game time {:.3}s, {} bytes",
        header.kind, header.set, header.game_time, dump.total_bytes
    );
    for record in &dump.records {
        let resent = record
            .resent
            .map(|tag| format!(" resent(set {}, id {})", tag.set, tag.resend))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  [{}] @{} {:?} {}{} ({} bytes)",
            record.index,
            record.offset,
            record.delta_type,
            record.delta.id,
            resent,
            record.bytes
        );
        let _ = writeln!(out, "      {:?}", record.delta.body);
    }
    out
}
