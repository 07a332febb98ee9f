//! Error types for codec operations.

use std::fmt;

use bytestream::StreamError;
use model::{DeltaType, EntityId};
use wire::DecodeError;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding delta records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Wire format error, including truncated input.
    Wire(DecodeError),

    /// The delta carries no sub-fields after normalization.
    EmptyDelta { delta_type: DeltaType, id: EntityId },

    /// The id does not fit the record type's id field.
    IdOutOfRange {
        delta_type: DeltaType,
        id: EntityId,
        max: u32,
    },

    /// A field value does not fit its packed wire encoding.
    FieldOutOfRange {
        delta_type: DeltaType,
        id: EntityId,
        field: &'static str,
        value: u32,
        max: u32,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(err) => write!(f, "wire error: {err}"),
            Self::EmptyDelta { delta_type, id } => {
                write!(f, "{delta_type:?} delta for {id} has no fields")
            }
            Self::IdOutOfRange {
                delta_type,
                id,
                max,
            } => {
                write!(f, "{delta_type:?} id {id} exceeds maximum {max}")
            }
            Self::FieldOutOfRange {
                delta_type,
                id,
                field,
                value,
                max,
            } => {
                write!(
                    f,
                    "{delta_type:?} delta for {id}: {field} {value} exceeds maximum {max}"
                )
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DecodeError> for CodecError {
    fn from(err: DecodeError) -> Self {
        Self::Wire(err)
    }
}

impl From<StreamError> for CodecError {
    fn from(err: StreamError) -> Self {
        Self::Wire(DecodeError::Stream(err))
    }
}
