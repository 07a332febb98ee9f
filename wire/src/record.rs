//! Delta record headers.

use std::num::NonZeroU8;

use bytestream::{ByteReader, ByteWriter};

use crate::error::{DecodeError, WireResult};

/// High bit of the type byte: the record is a retransmission.
pub const RESENT_BIT: u8 = 0x80;

/// Smallest possible record: a type byte and a two-byte null mobj id.
pub const MIN_RECORD_BYTES: usize = 3;

/// Delta record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DeltaType {
    Mobj = 0,
    Player = 1,
    Sector = 2,
    Side = 3,
    Poly = 4,
    Sound = 5,
    MobjSound = 6,
    SectorSound = 7,
    PolySound = 8,
    /// A mobj left the simulation. Carries only the id.
    NullMobj = 9,
}

impl DeltaType {
    /// Every delta type, in code order.
    pub const ALL: [Self; 10] = [
        Self::Mobj,
        Self::Player,
        Self::Sector,
        Self::Side,
        Self::Poly,
        Self::Sound,
        Self::MobjSound,
        Self::SectorSound,
        Self::PolySound,
        Self::NullMobj,
    ];

    /// Parses a type code (resent bit already stripped).
    pub fn parse(code: u8) -> Result<Self, DecodeError> {
        match code {
            0 => Ok(Self::Mobj),
            1 => Ok(Self::Player),
            2 => Ok(Self::Sector),
            3 => Ok(Self::Side),
            4 => Ok(Self::Poly),
            5 => Ok(Self::Sound),
            6 => Ok(Self::MobjSound),
            7 => Ok(Self::SectorSound),
            8 => Ok(Self::PolySound),
            9 => Ok(Self::NullMobj),
            _ => Err(DecodeError::UnknownDeltaType { code }),
        }
    }

    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the four sound record types.
    #[must_use]
    pub const fn is_sound(self) -> bool {
        matches!(
            self,
            Self::Sound | Self::MobjSound | Self::SectorSound | Self::PolySound
        )
    }
}

/// Identifies one retransmitted delta instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResendTag {
    /// Set the delta was first sent in.
    pub set: u8,
    /// Pool-unique resend id.
    pub resend: NonZeroU8,
}

/// The bytes preceding every delta record body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordHeader {
    pub delta_type: DeltaType,
    /// Present when the record is a retransmission.
    pub resent: Option<ResendTag>,
}

impl RecordHeader {
    /// Creates a header for a first transmission.
    #[must_use]
    pub const fn new(delta_type: DeltaType) -> Self {
        Self {
            delta_type,
            resent: None,
        }
    }

    /// Creates a header for a retransmission.
    #[must_use]
    pub const fn resent(delta_type: DeltaType, tag: ResendTag) -> Self {
        Self {
            delta_type,
            resent: Some(tag),
        }
    }

    /// Encoded size of this header in bytes.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        if self.resent.is_some() {
            3
        } else {
            1
        }
    }
}

/// Writes a record header.
pub fn encode_record_header(header: &RecordHeader, writer: &mut ByteWriter) {
    match header.resent {
        Some(tag) => {
            writer.write_u8(header.delta_type.code() | RESENT_BIT);
            writer.write_u8(tag.set);
            writer.write_u8(tag.resend.get());
        }
        None => writer.write_u8(header.delta_type.code()),
    }
}

/// Reads a record header.
pub fn decode_record_header(reader: &mut ByteReader<'_>) -> WireResult<RecordHeader> {
    let raw = reader.read_u8()?;
    let delta_type = DeltaType::parse(raw & !RESENT_BIT)?;
    if raw & RESENT_BIT == 0 {
        return Ok(RecordHeader::new(delta_type));
    }
    let set = reader.read_u8()?;
    let resend = NonZeroU8::new(reader.read_u8()?).ok_or(DecodeError::ZeroResendId { set })?;
    Ok(RecordHeader::resent(delta_type, ResendTag { set, resend }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(set: u8, resend: u8) -> ResendTag {
        ResendTag {
            set,
            resend: NonZeroU8::new(resend).unwrap(),
        }
    }

    #[test]
    fn type_codes_roundtrip() {
        for ty in DeltaType::ALL {
            assert_eq!(DeltaType::parse(ty.code()).unwrap(), ty);
        }
    }

    #[test]
    fn type_codes_fit_below_resent_bit() {
        for ty in DeltaType::ALL {
            assert_eq!(ty.code() & RESENT_BIT, 0);
        }
    }

    #[test]
    fn unknown_type_rejected() {
        assert_eq!(
            DeltaType::parse(10),
            Err(DecodeError::UnknownDeltaType { code: 10 })
        );
    }

    #[test]
    fn sound_types() {
        assert!(DeltaType::Sound.is_sound());
        assert!(DeltaType::PolySound.is_sound());
        assert!(!DeltaType::Mobj.is_sound());
        assert!(!DeltaType::NullMobj.is_sound());
    }

    #[test]
    fn plain_header_is_one_byte() {
        let mut writer = ByteWriter::new();
        encode_record_header(&RecordHeader::new(DeltaType::Sector), &mut writer);
        assert_eq!(writer.finish(), vec![2]);
    }

    #[test]
    fn resent_header_layout() {
        let header = RecordHeader::resent(DeltaType::Mobj, tag(7, 3));
        let mut writer = ByteWriter::new();
        encode_record_header(&header, &mut writer);
        let bytes = writer.finish();

        assert_eq!(bytes, vec![RESENT_BIT, 7, 3]);
        assert_eq!(bytes.len(), header.encoded_len());

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(decode_record_header(&mut reader).unwrap(), header);
    }

    #[test]
    fn zero_resend_rejected() {
        let bytes = [RESENT_BIT | 1, 4, 0];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(
            decode_record_header(&mut reader),
            Err(DecodeError::ZeroResendId { set: 4 })
        );
    }

    #[test]
    fn truncated_resent_header() {
        let bytes = [RESENT_BIT | 1, 4];
        let mut reader = ByteReader::new(&bytes);
        assert!(matches!(
            decode_record_header(&mut reader),
            Err(DecodeError::Stream(_))
        ));
    }
}
