//! The `Code` attribute of a method

use crate::class::Attribute;
use crate::encoder::{ClassReader, ClassWriter, DecodeError};
use crate::opcode::instruction_length;

/// A decoded `Code` attribute
///
/// The instruction stream stays an owned byte buffer; callers that need to
/// visit instructions decode the boundary offsets with [`decode_offsets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    /// Maximum operand stack depth
    pub max_stack: u16,
    /// Number of local variable slots
    pub max_locals: u16,
    /// Instruction bytes
    pub code: Vec<u8>,
    /// Raw exception table (4 u16 per entry)
    pub exception_table: Vec<[u16; 4]>,
    /// Nested attributes (line numbers, stack maps, ...)
    pub attributes: Vec<Attribute>,
}

impl CodeAttribute {
    /// A code attribute with no exception handlers or nested attributes
    pub fn new(max_stack: u16, max_locals: u16, code: Vec<u8>) -> Self {
        Self {
            max_stack,
            max_locals,
            code,
            exception_table: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Decode from the body of a `Code` attribute
    pub fn decode(info: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = ClassReader::new(info);
        let max_stack = reader.read_u16()?;
        let max_locals = reader.read_u16()?;
        let code_len = reader.read_u32()? as usize;
        let code = reader.read_bytes(code_len)?;

        let table_len = reader.read_u16()? as usize;
        let mut exception_table = Vec::with_capacity(table_len);
        for _ in 0..table_len {
            exception_table.push([
                reader.read_u16()?,
                reader.read_u16()?,
                reader.read_u16()?,
                reader.read_u16()?,
            ]);
        }

        let attributes = Attribute::decode_all(&mut reader)?;
        if reader.has_more() {
            return Err(DecodeError::TrailingBytes(reader.remaining()));
        }

        Ok(Self {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    /// Encode back into the body of a `Code` attribute
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = ClassWriter::with_capacity(self.code.len() + 16);
        writer.emit_u16(self.max_stack);
        writer.emit_u16(self.max_locals);
        writer.emit_u32(self.code.len() as u32);
        writer.emit_bytes(&self.code);
        writer.emit_u16(self.exception_table.len() as u16);
        for entry in &self.exception_table {
            for value in entry {
                writer.emit_u16(*value);
            }
        }
        Attribute::encode_all(&self.attributes, &mut writer);
        writer.into_bytes()
    }
}

/// Decode the starting offset of every instruction in `code`
pub fn decode_offsets(code: &[u8]) -> Result<Vec<usize>, DecodeError> {
    let mut offsets = Vec::new();
    let mut offset = 0;
    while offset < code.len() {
        offsets.push(offset);
        offset += instruction_length(code, offset)?;
    }
    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::{ALOAD_0, INVOKESPECIAL, RETURN};

    #[test]
    fn test_decode_offsets() {
        let code = [ALOAD_0, INVOKESPECIAL, 0, 7, RETURN];
        assert_eq!(decode_offsets(&code).unwrap(), vec![0, 1, 4]);
    }

    #[test]
    fn test_code_attribute_roundtrip() {
        let attr = CodeAttribute {
            max_stack: 2,
            max_locals: 1,
            code: vec![ALOAD_0, INVOKESPECIAL, 0, 7, RETURN],
            exception_table: vec![[0, 4, 4, 0]],
            attributes: vec![Attribute {
                name_index: 9,
                info: vec![0, 1, 0, 0, 0, 3],
            }],
        };
        let bytes = attr.encode();
        assert_eq!(CodeAttribute::decode(&bytes).unwrap(), attr);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let attr = CodeAttribute {
            max_stack: 1,
            max_locals: 1,
            code: vec![RETURN],
            exception_table: Vec::new(),
            attributes: Vec::new(),
        };
        let mut bytes = attr.encode();
        bytes.push(0);
        assert_eq!(
            CodeAttribute::decode(&bytes),
            Err(DecodeError::TrailingBytes(1))
        );
    }
}
