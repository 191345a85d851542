//! Class file encoding and decoding utilities
//!
//! All multi-byte quantities in a class file are big-endian. Strings are
//! stored in the JVM's "modified UTF-8" encoding.

use thiserror::Error;

/// Errors that can occur while decoding a class file
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Unexpected end of input
    #[error("Unexpected end of class data at offset {0}")]
    UnexpectedEnd(usize),

    /// Malformed modified UTF-8 string
    #[error("Invalid modified UTF-8 string at offset {0}")]
    InvalidUtf8(usize),

    /// Unknown constant pool tag
    #[error("Invalid constant pool tag {tag} at offset {offset}")]
    InvalidConstantTag {
        /// The tag byte
        tag: u8,
        /// Offset of the tag byte
        offset: usize,
    },

    /// Unknown instruction
    #[error("Invalid opcode {opcode:#04x} at code offset {offset}")]
    InvalidOpcode {
        /// The opcode byte
        opcode: u8,
        /// Offset within the code array
        offset: usize,
    },

    /// Bytes left over after the last structure
    #[error("{0} trailing bytes after class structure")]
    TrailingBytes(usize),
}

/// Writer for big-endian class file structures
#[derive(Debug, Default)]
pub struct ClassWriter {
    pub(crate) buffer: Vec<u8>,
}

impl ClassWriter {
    /// Create a new writer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new writer with capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Get the bytes written so far
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Current offset (number of bytes written)
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    /// Emit a single byte
    pub fn emit_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Emit a big-endian u16
    pub fn emit_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Emit a big-endian u32
    pub fn emit_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Emit a big-endian u64
    pub fn emit_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Emit raw bytes
    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Emit a length-prefixed (u16) modified UTF-8 string
    pub fn emit_utf8(&mut self, value: &str) {
        let encoded = encode_modified_utf8(value);
        self.emit_u16(encoded.len() as u16);
        self.buffer.extend_from_slice(&encoded);
    }

    /// Overwrite a u32 previously emitted at `offset`
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        self.buffer[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }
}

/// Reader for big-endian class file structures
#[derive(Debug)]
pub struct ClassReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ClassReader<'a> {
    /// Create a reader over `buffer`
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Current read position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Whether any bytes are left
    pub fn has_more(&self) -> bool {
        self.position < self.buffer.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEnd(self.position));
        }
        let slice = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    /// Read a big-endian u16
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a big-endian u32
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a big-endian u64
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let high = self.read_u32()? as u64;
        let low = self.read_u32()? as u64;
        Ok((high << 32) | low)
    }

    /// Read `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        Ok(self.take(len)?.to_vec())
    }

    /// Read a length-prefixed (u16) modified UTF-8 string
    pub fn read_utf8(&mut self) -> Result<String, DecodeError> {
        let start = self.position;
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        decode_modified_utf8(bytes).ok_or(DecodeError::InvalidUtf8(start))
    }
}

/// Read a big-endian u16 at `offset` of `code`
pub fn read_u16_at(code: &[u8], offset: usize) -> Option<u16> {
    let bytes = code.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Read a big-endian i32 at `offset` of `code`
pub fn read_i32_at(code: &[u8], offset: usize) -> Option<i32> {
    let bytes = code.get(offset..offset + 4)?;
    Some(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Overwrite a big-endian u16 at `offset` of `code`
pub fn write_u16_at(code: &mut [u8], offset: usize, value: u16) {
    code[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

/// Decode the JVM's modified UTF-8
///
/// Differs from standard UTF-8 in that NUL is encoded as `C0 80` and
/// supplementary characters are stored as surrogate pairs of three bytes each.
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    // Fast path: plain ASCII without NUL is identical in both encodings.
    if bytes.iter().all(|&b| b != 0 && b < 0x80) {
        return std::str::from_utf8(bytes).ok().map(str::to_owned);
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let a = bytes[i] as u16;
        if a & 0x80 == 0 {
            if a == 0 {
                return None;
            }
            units.push(a);
            i += 1;
        } else if a & 0xE0 == 0xC0 {
            let b = *bytes.get(i + 1)? as u16;
            if b & 0xC0 != 0x80 {
                return None;
            }
            units.push(((a & 0x1F) << 6) | (b & 0x3F));
            i += 2;
        } else if a & 0xF0 == 0xE0 {
            let b = *bytes.get(i + 1)? as u16;
            let c = *bytes.get(i + 2)? as u16;
            if b & 0xC0 != 0x80 || c & 0xC0 != 0x80 {
                return None;
            }
            units.push(((a & 0x0F) << 12) | ((b & 0x3F) << 6) | (c & 0x3F));
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}

/// Encode a string as the JVM's modified UTF-8
pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push((0xC0 | ((unit >> 6) & 0x1F)) as u8);
                out.push((0x80 | (unit & 0x3F)) as u8);
            }
            _ => {
                out.push((0xE0 | ((unit >> 12) & 0x0F)) as u8);
                out.push((0x80 | ((unit >> 6) & 0x3F)) as u8);
                out.push((0x80 | (unit & 0x3F)) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_roundtrip() {
        let mut writer = ClassWriter::new();
        writer.emit_u8(0xCA);
        writer.emit_u16(0xFEBA);
        writer.emit_u32(0xBE00_0034);
        writer.emit_u64(0x0102_0304_0506_0708);

        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..3], &[0xCA, 0xFE, 0xBA]);

        let mut reader = ClassReader::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 0xCA);
        assert_eq!(reader.read_u16().unwrap(), 0xFEBA);
        assert_eq!(reader.read_u32().unwrap(), 0xBE00_0034);
        assert_eq!(reader.read_u64().unwrap(), 0x0102_0304_0506_0708);
        assert!(!reader.has_more());
    }

    #[test]
    fn test_unexpected_end() {
        let mut reader = ClassReader::new(&[0x00]);
        assert_eq!(reader.read_u16(), Err(DecodeError::UnexpectedEnd(0)));
    }

    #[test]
    fn test_modified_utf8_nul_and_supplementary() {
        let value = "a\0b\u{1F600}é";
        let encoded = encode_modified_utf8(value);
        // NUL is two bytes, never a literal zero
        assert!(!encoded.contains(&0));
        // The emoji is a surrogate pair, 3 bytes each
        assert_eq!(encoded.len(), 1 + 2 + 1 + 6 + 2);
        assert_eq!(decode_modified_utf8(&encoded).as_deref(), Some(value));
    }

    #[test]
    fn test_rejects_raw_nul() {
        assert_eq!(decode_modified_utf8(&[b'a', 0, b'b']), None);
    }

    #[test]
    fn test_code_helpers() {
        let mut code = vec![0xB7, 0x00, 0x05];
        assert_eq!(read_u16_at(&code, 1), Some(5));
        write_u16_at(&mut code, 1, 0x0102);
        assert_eq!(code, vec![0xB7, 0x01, 0x02]);
        assert_eq!(read_u16_at(&code, 2), None);
    }
}
