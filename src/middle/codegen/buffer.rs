//! Byte buffers
//!
//! Little-endian writer used by the emitter and the bounds-checked reader
//! used by the decompiler.

use crate::middle::decompile::FormatError;

/// Growable little-endian output buffer
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn u8(
        &mut self,
        value: u8,
    ) {
        self.bytes.push(value);
    }

    pub fn u16(
        &mut self,
        value: u16,
    ) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn i16(
        &mut self,
        value: i16,
    ) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn u32(
        &mut self,
        value: u32,
    ) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn i32(
        &mut self,
        value: i32,
    ) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Overwrite a previously written `u32`
    pub fn patch_u32(
        &mut self,
        at: usize,
        value: u32,
    ) {
        if let Some(slot) = self.bytes.get_mut(at..at + 4) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Cursor over an input buffer; every read is bounds checked
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the buffer
    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume `count` bytes
    pub fn take(
        &mut self,
        count: usize,
    ) -> Result<&'a [u8], FormatError> {
        if self.remaining() < count {
            return Err(FormatError::UnexpectedEof {
                offset: self.pos,
                needed: count - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16, FormatError> {
        self.array().map(u16::from_le_bytes)
    }

    pub fn i16(&mut self) -> Result<i16, FormatError> {
        self.array().map(i16::from_le_bytes)
    }

    pub fn u32(&mut self) -> Result<u32, FormatError> {
        self.array().map(u32::from_le_bytes)
    }

    pub fn i32(&mut self) -> Result<i32, FormatError> {
        self.array().map(i32::from_le_bytes)
    }
}
