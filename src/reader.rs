//! Typed reads from an in-memory deck buffer
//!
//! Every offset in a deck file is absolute from the start of the file, so the
//! reader never keeps a cursor of its own: each call names the offset it reads.
//!
//! ## Encodings
//!
//! - Obfuscated strings: `u16` unit count, then that many `u16` UTF-16 units,
//!   each XORed with [`STRING_XOR_KEY`].
//! - Blobs: `u32` payload length, 4 reserved bytes, then the payload.
//! - Fixed labels: 24 bytes of NUL padded ASCII.

use byteorder::{ByteOrder, LittleEndian};

use crate::blob::Blob;
use crate::error::{Error, Result};

/// XOR mask applied to every UTF-16 unit of an obfuscated string
pub const STRING_XOR_KEY: u16 = 0x7E;

/// Size of a property label in bytes
pub const FIXED_LABEL_LEN: usize = 24;

/// Size of the blob header (length + reserved)
pub const BLOB_HEADER_LEN: usize = 8;

/// A value with a fixed little-endian layout that can be decoded from raw bytes
pub trait FixedLayout: Sized {
    /// Number of bytes occupied by the value
    const SIZE: usize;

    /// Decode from a slice of exactly `SIZE` bytes
    fn decode(bytes: &[u8]) -> Self;
}

impl FixedLayout for u8 {
    const SIZE: usize = 1;

    fn decode(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl FixedLayout for u16 {
    const SIZE: usize = 2;

    fn decode(bytes: &[u8]) -> Self {
        LittleEndian::read_u16(bytes)
    }
}

impl FixedLayout for u32 {
    const SIZE: usize = 4;

    fn decode(bytes: &[u8]) -> Self {
        LittleEndian::read_u32(bytes)
    }
}

impl<const N: usize> FixedLayout for [u8; N] {
    const SIZE: usize = N;

    fn decode(bytes: &[u8]) -> Self {
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        out
    }
}

impl<const N: usize> FixedLayout for [u32; N] {
    const SIZE: usize = 4 * N;

    fn decode(bytes: &[u8]) -> Self {
        let mut out = [0u32; N];
        LittleEndian::read_u32_into(bytes, &mut out);
        out
    }
}

/// Read-only view over a deck buffer
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow `len` bytes at `offset`, failing if the range leaves the buffer
    pub fn slice(&self, offset: u64, len: u64) -> Result<&'a [u8]> {
        let out_of_bounds = || Error::OutOfBounds {
            offset,
            len,
            buffer_len: self.data.len(),
        };

        let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
        if end > self.data.len() as u64 {
            return Err(out_of_bounds());
        }
        Ok(&self.data[offset as usize..end as usize])
    }

    /// Decode a fixed-layout value at `offset`
    pub fn read_fixed<T: FixedLayout>(&self, offset: u64) -> Result<T> {
        let bytes = self.slice(offset, T::SIZE as u64)?;
        Ok(T::decode(bytes))
    }

    pub fn read_u16(&self, offset: u64) -> Result<u16> {
        self.read_fixed(offset)
    }

    pub fn read_u32(&self, offset: u64) -> Result<u32> {
        self.read_fixed(offset)
    }

    /// Read `len` raw bytes as ASCII text, without any trimming
    pub fn read_ascii(&self, offset: u64, len: usize) -> Result<String> {
        let bytes = self.slice(offset, len as u64)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Decode an obfuscated UTF-16 string.
    ///
    /// Offsets of zero or below denote an absent string and yield `""`.
    pub fn read_string(&self, offset: i64) -> Result<String> {
        if offset <= 0 {
            return Ok(String::new());
        }
        let offset = offset as u64;

        let unit_count = self.read_u16(offset)? as u64;
        let bytes = self.slice(offset + 2, unit_count * 2)?;

        let units = bytes
            .chunks_exact(2)
            .map(|pair| LittleEndian::read_u16(pair) ^ STRING_XOR_KEY);

        Ok(char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect())
    }

    /// Read a 24-byte property label with its NUL padding removed
    pub fn read_fixed_label(&self, offset: u64) -> Result<String> {
        let bytes = self.slice(offset, FIXED_LABEL_LEN as u64)?;
        let end = bytes
            .iter()
            .rposition(|&b| b != 0)
            .map(|p| p + 1)
            .unwrap_or(0);
        Ok(bytes[..end].iter().map(|&b| b as char).collect())
    }

    /// Extract a length-prefixed blob.
    ///
    /// The returned blob carries no filename; callers attach one when they
    /// know where the payload should go.
    pub fn read_blob(&self, offset: u64) -> Result<Blob> {
        let header: [u8; BLOB_HEADER_LEN] = self.read_fixed(offset)?;
        let len = LittleEndian::read_u32(&header[0..4]) as u64;
        let reserved = [header[4], header[5], header[6], header[7]];

        let payload = self.slice(offset + BLOB_HEADER_LEN as u64, len)?;
        Ok(Blob::with_reserved(payload.to_vec(), reserved))
    }
}

/// Encode a string the way deck files store it. Test helper for building
/// synthetic buffers.
#[cfg(test)]
pub(crate) fn encode_string(s: &str) -> Vec<u8> {
    let units: Vec<u16> = s.encode_utf16().collect();
    let mut out = Vec::with_capacity(2 + units.len() * 2);
    out.extend_from_slice(&(units.len() as u16).to_le_bytes());
    for unit in units {
        out.extend_from_slice(&(unit ^ STRING_XOR_KEY).to_le_bytes());
    }
    out
}
