//! Class file format
//!
//! Layout (JVMS 4.1):
//! - magic `0xCAFEBABE`, minor and major version
//! - constant pool
//! - access flags, this class, super class, interfaces
//! - fields, methods, attributes

use crate::annotation::{decode_annotations, decode_parameter_annotations, Annotation};
use crate::code::CodeAttribute;
use crate::constants::{ConstantPool, ConstantPoolError};
use crate::encoder::{ClassReader, ClassWriter, DecodeError};
use thiserror::Error;

/// Class file magic number
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Attribute names this crate understands
pub mod attr {
    #![allow(missing_docs)]
    pub const CODE: &str = "Code";
    pub const SIGNATURE: &str = "Signature";
    pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
    pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";
    pub const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeVisibleParameterAnnotations";
    pub const RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &str =
        "RuntimeInvisibleParameterAnnotations";
    pub const METHOD_PARAMETERS: &str = "MethodParameters";
}

/// Access flags shared by classes, fields and methods
pub mod access {
    #![allow(missing_docs)]
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SUPER: u16 = 0x0020;
    pub const BRIDGE: u16 = 0x0040;
    pub const VARARGS: u16 = 0x0080;
    pub const NATIVE: u16 = 0x0100;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const STRICT: u16 = 0x0800;
    pub const SYNTHETIC: u16 = 0x1000;
    pub const ANNOTATION: u16 = 0x2000;
    pub const ENUM: u16 = 0x4000;
}

/// Class file errors
#[derive(Debug, Error)]
pub enum ClassFileError {
    /// Structural decode failure
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A constant pool reference has the wrong shape
    #[error("Constant pool error: {0}")]
    ConstantPool(#[from] ConstantPoolError),

    /// Not a class file
    #[error("Invalid magic number: expected 0xCAFEBABE, got {0:#010x}")]
    InvalidMagic(u32),
}

/// A raw attribute: name index plus uninterpreted body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Utf8 index of the attribute name
    pub name_index: u16,
    /// Attribute body
    pub info: Vec<u8>,
}

impl Attribute {
    pub(crate) fn decode_all(reader: &mut ClassReader<'_>) -> Result<Vec<Self>, DecodeError> {
        let count = reader.read_u16()? as usize;
        let mut attributes = Vec::with_capacity(count);
        for _ in 0..count {
            let name_index = reader.read_u16()?;
            let len = reader.read_u32()? as usize;
            let info = reader.read_bytes(len)?;
            attributes.push(Attribute { name_index, info });
        }
        Ok(attributes)
    }

    pub(crate) fn encode_all(attributes: &[Self], writer: &mut ClassWriter) {
        writer.emit_u16(attributes.len() as u16);
        for attribute in attributes {
            writer.emit_u16(attribute.name_index);
            writer.emit_u32(attribute.info.len() as u32);
            writer.emit_bytes(&attribute.info);
        }
    }
}

/// Find the first attribute called `name`
pub fn find_attribute<'a>(
    attributes: &'a [Attribute],
    pool: &ConstantPool,
    name: &str,
) -> Option<&'a Attribute> {
    attributes
        .iter()
        .find(|a| pool.utf8(a.name_index).map_or(false, |n| n == name))
}

fn annotations_of(
    attributes: &[Attribute],
    pool: &ConstantPool,
) -> Result<Vec<Annotation>, ClassFileError> {
    let mut annotations = Vec::new();
    for name in [
        attr::RUNTIME_VISIBLE_ANNOTATIONS,
        attr::RUNTIME_INVISIBLE_ANNOTATIONS,
    ] {
        if let Some(attribute) = find_attribute(attributes, pool, name) {
            annotations.extend(decode_annotations(&attribute.info, pool)?);
        }
    }
    Ok(annotations)
}

/// A field or method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// Access flags
    pub access_flags: u16,
    /// Utf8 index of the name
    pub name_index: u16,
    /// Utf8 index of the descriptor
    pub descriptor_index: u16,
    /// Member attributes
    pub attributes: Vec<Attribute>,
}

impl MemberInfo {
    fn decode(reader: &mut ClassReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            access_flags: reader.read_u16()?,
            name_index: reader.read_u16()?,
            descriptor_index: reader.read_u16()?,
            attributes: Attribute::decode_all(reader)?,
        })
    }

    fn encode(&self, writer: &mut ClassWriter) {
        writer.emit_u16(self.access_flags);
        writer.emit_u16(self.name_index);
        writer.emit_u16(self.descriptor_index);
        Attribute::encode_all(&self.attributes, writer);
    }

    /// Member name
    pub fn name<'a>(&self, pool: &'a ConstantPool) -> Result<&'a str, ConstantPoolError> {
        pool.utf8(self.name_index)
    }

    /// Member descriptor
    pub fn descriptor<'a>(&self, pool: &'a ConstantPool) -> Result<&'a str, ConstantPoolError> {
        pool.utf8(self.descriptor_index)
    }

    /// Whether every bit of `flags` is set
    pub fn has_flags(&self, flags: u16) -> bool {
        self.access_flags & flags == flags
    }

    /// Decode the `Code` attribute, if the member has one
    pub fn code(&self, pool: &ConstantPool) -> Result<Option<CodeAttribute>, ClassFileError> {
        match find_attribute(&self.attributes, pool, attr::CODE) {
            Some(attribute) => Ok(Some(CodeAttribute::decode(&attribute.info)?)),
            None => Ok(None),
        }
    }

    /// Replace the body of the existing `Code` attribute
    ///
    /// Returns `false` if the member has no `Code` attribute.
    pub fn set_code(&mut self, pool: &ConstantPool, code: &CodeAttribute) -> bool {
        let position = self
            .attributes
            .iter()
            .position(|a| pool.utf8(a.name_index).map_or(false, |n| n == attr::CODE));
        match position {
            Some(i) => {
                self.attributes[i].info = code.encode();
                true
            }
            None => false,
        }
    }

    /// Annotations declared on the member (visible and invisible)
    pub fn annotations(&self, pool: &ConstantPool) -> Result<Vec<Annotation>, ClassFileError> {
        annotations_of(&self.attributes, pool)
    }

    /// Per-parameter annotations, merged across visible and invisible tables
    pub fn parameter_annotations(
        &self,
        pool: &ConstantPool,
    ) -> Result<Vec<Vec<Annotation>>, ClassFileError> {
        let mut merged: Vec<Vec<Annotation>> = Vec::new();
        for name in [
            attr::RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS,
            attr::RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS,
        ] {
            if let Some(attribute) = find_attribute(&self.attributes, pool, name) {
                let table = decode_parameter_annotations(&attribute.info, pool)?;
                if merged.len() < table.len() {
                    merged.resize_with(table.len(), Vec::new);
                }
                for (slot, annotations) in merged.iter_mut().zip(table) {
                    slot.extend(annotations);
                }
            }
        }
        Ok(merged)
    }

    /// Parameter names from the `MethodParameters` attribute, if present
    pub fn parameter_names(&self, pool: &ConstantPool) -> Result<Option<Vec<String>>, ClassFileError> {
        let Some(attribute) = find_attribute(&self.attributes, pool, attr::METHOD_PARAMETERS) else {
            return Ok(None);
        };
        let mut reader = ClassReader::new(&attribute.info);
        let count = reader.read_u8()? as usize;
        let mut names = Vec::with_capacity(count);
        for i in 0..count {
            let name_index = reader.read_u16()?;
            let _flags = reader.read_u16()?;
            let name = if name_index == 0 {
                format!("p{}", i)
            } else {
                pool.utf8(name_index)?.to_string()
            };
            names.push(name);
        }
        Ok(Some(names))
    }
}

/// A parsed class file
#[derive(Debug, Clone)]
pub struct ClassFile {
    /// Minor version
    pub minor_version: u16,
    /// Major version
    pub major_version: u16,
    /// Constant pool
    pub constant_pool: ConstantPool,
    /// Class access flags
    pub access_flags: u16,
    /// Class index of this class
    pub this_class: u16,
    /// Class index of the superclass; 0 only for `java/lang/Object`
    pub super_class: u16,
    /// Class indices of direct superinterfaces
    pub interfaces: Vec<u16>,
    /// Fields
    pub fields: Vec<MemberInfo>,
    /// Methods
    pub methods: Vec<MemberInfo>,
    /// Class-level attributes
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Decode a class file
    pub fn decode(data: &[u8]) -> Result<Self, ClassFileError> {
        let mut reader = ClassReader::new(data);

        let magic = reader.read_u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::InvalidMagic(magic));
        }
        let minor_version = reader.read_u16()?;
        let major_version = reader.read_u16()?;

        let constant_pool = ConstantPool::decode(&mut reader)?;

        let access_flags = reader.read_u16()?;
        let this_class = reader.read_u16()?;
        let super_class = reader.read_u16()?;

        let interface_count = reader.read_u16()? as usize;
        let mut interfaces = Vec::with_capacity(interface_count);
        for _ in 0..interface_count {
            interfaces.push(reader.read_u16()?);
        }

        let field_count = reader.read_u16()? as usize;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            fields.push(MemberInfo::decode(&mut reader)?);
        }

        let method_count = reader.read_u16()? as usize;
        let mut methods = Vec::with_capacity(method_count);
        for _ in 0..method_count {
            methods.push(MemberInfo::decode(&mut reader)?);
        }

        let attributes = Attribute::decode_all(&mut reader)?;
        if reader.has_more() {
            return Err(DecodeError::TrailingBytes(reader.remaining()).into());
        }

        Ok(Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Encode the class file
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = ClassWriter::with_capacity(4096);
        writer.emit_u32(MAGIC);
        writer.emit_u16(self.minor_version);
        writer.emit_u16(self.major_version);
        self.constant_pool.encode(&mut writer);
        writer.emit_u16(self.access_flags);
        writer.emit_u16(self.this_class);
        writer.emit_u16(self.super_class);
        writer.emit_u16(self.interfaces.len() as u16);
        for interface in &self.interfaces {
            writer.emit_u16(*interface);
        }
        writer.emit_u16(self.fields.len() as u16);
        for field in &self.fields {
            field.encode(&mut writer);
        }
        writer.emit_u16(self.methods.len() as u16);
        for method in &self.methods {
            method.encode(&mut writer);
        }
        Attribute::encode_all(&self.attributes, &mut writer);
        writer.into_bytes()
    }

    /// Internal name of this class (e.g. `com/example/LoginActivity`)
    pub fn name(&self) -> Result<&str, ConstantPoolError> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Internal name of the superclass, `None` for `java/lang/Object`
    pub fn super_name(&self) -> Result<Option<&str>, ConstantPoolError> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    /// Point `super_class` at `internal_name`, reusing an existing Class entry
    pub fn set_super_name(&mut self, internal_name: &str) -> Result<u16, ConstantPoolError> {
        let index = self.constant_pool.add_class(internal_name)?;
        self.super_class = index;
        Ok(index)
    }

    /// Internal names of the direct superinterfaces
    pub fn interface_names(&self) -> Result<Vec<&str>, ConstantPoolError> {
        self.interfaces
            .iter()
            .map(|&i| self.constant_pool.class_name(i))
            .collect()
    }

    /// Whether the class is an interface
    pub fn is_interface(&self) -> bool {
        self.access_flags & access::INTERFACE != 0
    }

    /// The generic `Signature` attribute, if any
    pub fn signature(&self) -> Result<Option<&str>, ConstantPoolError> {
        match find_attribute(&self.attributes, &self.constant_pool, attr::SIGNATURE) {
            Some(attribute) if attribute.info.len() == 2 => {
                let index = u16::from_be_bytes([attribute.info[0], attribute.info[1]]);
                self.constant_pool.utf8(index).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Class-level annotations (visible and invisible)
    pub fn annotations(&self) -> Result<Vec<Annotation>, ClassFileError> {
        annotations_of(&self.attributes, &self.constant_pool)
    }

    /// Whether the class carries an annotation with the given type descriptor
    /// (e.g. `Lcn/nikeo/permisos/weaving/Permisos;`)
    pub fn has_annotation(&self, descriptor: &str) -> Result<bool, ClassFileError> {
        Ok(self
            .annotations()?
            .iter()
            .any(|a| a.type_descriptor == descriptor))
    }
}
