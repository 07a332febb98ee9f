//! Byte-level reader with bounded operations.

use crate::error::{StreamError, StreamResult};
use crate::writer::MAX_VARU32_LEN;

/// A byte reader for decoding frames.
///
/// All read operations are bounds-checked and return errors on failure.
/// The reader never panics on malformed input.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a new `ByteReader` from a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the number of bytes remaining to read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Returns `true` if there are no more bytes to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Reads a `u8`.
    pub fn read_u8(&mut self) -> StreamResult<u8> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    /// Reads an `i8`.
    pub fn read_i8(&mut self) -> StreamResult<i8> {
        Ok(i8::from_le_bytes(self.read_array::<1>()?))
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16(&mut self) -> StreamResult<u16> {
        Ok(u16::from_le_bytes(self.read_array::<2>()?))
    }

    /// Reads a little-endian `i16`.
    pub fn read_i16(&mut self) -> StreamResult<i16> {
        Ok(i16::from_le_bytes(self.read_array::<2>()?))
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self) -> StreamResult<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Reads a little-endian `i32`.
    pub fn read_i32(&mut self) -> StreamResult<i32> {
        Ok(i32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Reads a little-endian IEEE-754 `f32`.
    pub fn read_f32(&mut self) -> StreamResult<f32> {
        Ok(f32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Reads an unsigned LEB128 varint.
    pub fn read_varu32(&mut self) -> StreamResult<u32> {
        let mut result = 0u32;
        for index in 0..MAX_VARU32_LEN {
            let byte = self.read_u8()?;
            let chunk = u32::from(byte & 0x7F);
            // The fifth byte may only carry the top four bits.
            if index == MAX_VARU32_LEN - 1 && chunk > 0x0F {
                return Err(StreamError::InvalidVarint);
            }
            result |= chunk << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(StreamError::InvalidVarint)
    }

    /// Reads a varint that must fit in 16 bits.
    pub fn read_varu16(&mut self) -> StreamResult<u16> {
        let value = self.read_varu32()?;
        u16::try_from(value).map_err(|_| StreamError::ValueOutOfRange {
            value: u64::from(value),
            bits: 16,
        })
    }

    /// Borrows the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> StreamResult<&'a [u8]> {
        self.ensure(len)?;
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn ensure(&self, len: usize) -> StreamResult<()> {
        let available = self.remaining();
        if len > available {
            return Err(StreamError::UnexpectedEof {
                requested: len,
                available,
            });
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> StreamResult<[u8; N]> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }
}
