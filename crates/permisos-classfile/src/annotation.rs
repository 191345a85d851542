//! Runtime annotation attributes
//!
//! Only the subset needed to recognise marker annotations and to carry
//! simple element values (constants, enums, classes, arrays) is decoded.

use crate::class::ClassFileError;
use crate::constants::{Constant, ConstantPool, ConstantPoolError};
use crate::encoder::ClassReader;

/// A decoded annotation
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation type (`Lpkg/Name;`)
    pub type_descriptor: String,
    /// Element name/value pairs in declaration order
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    /// Look up an element by name
    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Constant payload of an element value
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// `B`, `S`, `I`
    Int(i32),
    /// `J`
    Long(i64),
    /// `F`
    Float(f32),
    /// `D`
    Double(f64),
    /// `Z`
    Bool(bool),
    /// `C`
    Char(char),
    /// `s`
    Str(String),
}

/// An annotation element value
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    /// Primitive or string constant
    Const(ConstValue),
    /// Enum constant
    Enum {
        /// Field descriptor of the enum type
        type_descriptor: String,
        /// Constant name
        const_name: String,
    },
    /// Class literal, as a return descriptor (`V` for `void.class`)
    Class(String),
    /// Nested annotation
    Annotation(Box<Annotation>),
    /// Array of values
    Array(Vec<ElementValue>),
}

fn unexpected(index: u16, expected: &'static str) -> ClassFileError {
    ConstantPoolError::UnexpectedKind { index, expected }.into()
}

fn decode_const(tag: u8, index: u16, pool: &ConstantPool) -> Result<ConstValue, ClassFileError> {
    let constant = pool.get(index)?;
    let value = match (tag, constant) {
        (b'B' | b'S' | b'I', Constant::Integer(v)) => ConstValue::Int(*v),
        (b'Z', Constant::Integer(v)) => ConstValue::Bool(*v != 0),
        (b'C', Constant::Integer(v)) => {
            ConstValue::Char(char::from_u32(*v as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        }
        (b'J', Constant::Long(v)) => ConstValue::Long(*v as i64),
        (b'F', Constant::Float(bits)) => ConstValue::Float(f32::from_bits(*bits)),
        (b'D', Constant::Double(bits)) => ConstValue::Double(f64::from_bits(*bits)),
        (b's', Constant::Utf8(v)) => ConstValue::Str(v.clone()),
        _ => return Err(unexpected(index, "annotation constant")),
    };
    Ok(value)
}

fn decode_element_value(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<ElementValue, ClassFileError> {
    let tag = reader.read_u8()?;
    let value = match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => {
            let index = reader.read_u16()?;
            ElementValue::Const(decode_const(tag, index, pool)?)
        }
        b'e' => {
            let type_index = reader.read_u16()?;
            let name_index = reader.read_u16()?;
            ElementValue::Enum {
                type_descriptor: pool.utf8(type_index)?.to_string(),
                const_name: pool.utf8(name_index)?.to_string(),
            }
        }
        b'c' => ElementValue::Class(pool.utf8(reader.read_u16()?)?.to_string()),
        b'@' => ElementValue::Annotation(Box::new(decode_annotation(reader, pool)?)),
        b'[' => {
            let count = reader.read_u16()? as usize;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(decode_element_value(reader, pool)?);
            }
            ElementValue::Array(values)
        }
        _ => return Err(unexpected(0, "element value tag")),
    };
    Ok(value)
}

fn decode_annotation(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<Annotation, ClassFileError> {
    let type_descriptor = pool.utf8(reader.read_u16()?)?.to_string();
    let pair_count = reader.read_u16()? as usize;
    let mut elements = Vec::with_capacity(pair_count);
    for _ in 0..pair_count {
        let name = pool.utf8(reader.read_u16()?)?.to_string();
        let value = decode_element_value(reader, pool)?;
        elements.push((name, value));
    }
    Ok(Annotation {
        type_descriptor,
        elements,
    })
}

/// Decode the body of a `Runtime{Visible,Invisible}Annotations` attribute
pub fn decode_annotations(
    info: &[u8],
    pool: &ConstantPool,
) -> Result<Vec<Annotation>, ClassFileError> {
    let mut reader = ClassReader::new(info);
    let count = reader.read_u16()? as usize;
    let mut annotations = Vec::with_capacity(count);
    for _ in 0..count {
        annotations.push(decode_annotation(&mut reader, pool)?);
    }
    Ok(annotations)
}

/// Decode the body of a `Runtime{Visible,Invisible}ParameterAnnotations` attribute
pub fn decode_parameter_annotations(
    info: &[u8],
    pool: &ConstantPool,
) -> Result<Vec<Vec<Annotation>>, ClassFileError> {
    let mut reader = ClassReader::new(info);
    let parameters = reader.read_u8()? as usize;
    let mut table = Vec::with_capacity(parameters);
    for _ in 0..parameters {
        let count = reader.read_u16()? as usize;
        let mut annotations = Vec::with_capacity(count);
        for _ in 0..count {
            annotations.push(decode_annotation(&mut reader, pool)?);
        }
        table.push(annotations);
    }
    Ok(table)
}
