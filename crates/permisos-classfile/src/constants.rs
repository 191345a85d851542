//! Constant pool
//!
//! Indices are 1-based as in the class file. `Long` and `Double` entries take
//! two slots; the second slot is stored as `None` so that positions line up
//! with the indices used by instructions.

use crate::encoder::{ClassReader, ClassWriter, DecodeError};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Constant pool tags
pub mod tag {
    #![allow(missing_docs)]
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELDREF: u8 = 9;
    pub const METHODREF: u8 = 10;
    pub const INTERFACE_METHODREF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;
}

/// Errors raised when an entry does not have the expected shape
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConstantPoolError {
    /// Index is zero, out of range, or the unusable slot after a wide entry
    #[error("constant pool index {0} is out of range")]
    OutOfRange(u16),

    /// Entry exists but is of a different kind
    #[error("constant pool entry #{index} is not a {expected}")]
    UnexpectedKind {
        /// Offending index
        index: u16,
        /// Kind that was expected
        expected: &'static str,
    },

    /// The pool cannot grow past 65535 slots
    #[error("constant pool is full")]
    Full,
}

/// A single constant pool entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    /// CONSTANT_Utf8
    Utf8(String),
    /// CONSTANT_Integer
    Integer(i32),
    /// CONSTANT_Float, stored as raw bits
    Float(u32),
    /// CONSTANT_Long
    Long(u64),
    /// CONSTANT_Double, stored as raw bits
    Double(u64),
    /// CONSTANT_Class
    Class {
        /// Utf8 index of the internal name
        name_index: u16,
    },
    /// CONSTANT_String
    String {
        /// Utf8 index
        string_index: u16,
    },
    /// CONSTANT_Fieldref
    Fieldref {
        /// Class index
        class_index: u16,
        /// NameAndType index
        name_and_type_index: u16,
    },
    /// CONSTANT_Methodref
    Methodref {
        /// Class index
        class_index: u16,
        /// NameAndType index
        name_and_type_index: u16,
    },
    /// CONSTANT_InterfaceMethodref
    InterfaceMethodref {
        /// Class index
        class_index: u16,
        /// NameAndType index
        name_and_type_index: u16,
    },
    /// CONSTANT_NameAndType
    NameAndType {
        /// Utf8 index of the member name
        name_index: u16,
        /// Utf8 index of the descriptor
        descriptor_index: u16,
    },
    /// CONSTANT_MethodHandle
    MethodHandle {
        /// Reference kind (1..=9)
        reference_kind: u8,
        /// Index of the referenced member
        reference_index: u16,
    },
    /// CONSTANT_MethodType
    MethodType {
        /// Utf8 index of the descriptor
        descriptor_index: u16,
    },
    /// CONSTANT_Dynamic
    Dynamic {
        /// Bootstrap method attribute index
        bootstrap_method_attr_index: u16,
        /// NameAndType index
        name_and_type_index: u16,
    },
    /// CONSTANT_InvokeDynamic
    InvokeDynamic {
        /// Bootstrap method attribute index
        bootstrap_method_attr_index: u16,
        /// NameAndType index
        name_and_type_index: u16,
    },
    /// CONSTANT_Module
    Module {
        /// Utf8 index
        name_index: u16,
    },
    /// CONSTANT_Package
    Package {
        /// Utf8 index
        name_index: u16,
    },
}

impl Constant {
    /// Whether this entry occupies two pool slots
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    fn encode(&self, writer: &mut ClassWriter) {
        match self {
            Constant::Utf8(value) => {
                writer.emit_u8(tag::UTF8);
                writer.emit_utf8(value);
            }
            Constant::Integer(value) => {
                writer.emit_u8(tag::INTEGER);
                writer.emit_u32(*value as u32);
            }
            Constant::Float(bits) => {
                writer.emit_u8(tag::FLOAT);
                writer.emit_u32(*bits);
            }
            Constant::Long(value) => {
                writer.emit_u8(tag::LONG);
                writer.emit_u64(*value);
            }
            Constant::Double(bits) => {
                writer.emit_u8(tag::DOUBLE);
                writer.emit_u64(*bits);
            }
            Constant::Class { name_index } => {
                writer.emit_u8(tag::CLASS);
                writer.emit_u16(*name_index);
            }
            Constant::String { string_index } => {
                writer.emit_u8(tag::STRING);
                writer.emit_u16(*string_index);
            }
            Constant::Fieldref {
                class_index,
                name_and_type_index,
            } => {
                writer.emit_u8(tag::FIELDREF);
                writer.emit_u16(*class_index);
                writer.emit_u16(*name_and_type_index);
            }
            Constant::Methodref {
                class_index,
                name_and_type_index,
            } => {
                writer.emit_u8(tag::METHODREF);
                writer.emit_u16(*class_index);
                writer.emit_u16(*name_and_type_index);
            }
            Constant::InterfaceMethodref {
                class_index,
                name_and_type_index,
            } => {
                writer.emit_u8(tag::INTERFACE_METHODREF);
                writer.emit_u16(*class_index);
                writer.emit_u16(*name_and_type_index);
            }
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => {
                writer.emit_u8(tag::NAME_AND_TYPE);
                writer.emit_u16(*name_index);
                writer.emit_u16(*descriptor_index);
            }
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => {
                writer.emit_u8(tag::METHOD_HANDLE);
                writer.emit_u8(*reference_kind);
                writer.emit_u16(*reference_index);
            }
            Constant::MethodType { descriptor_index } => {
                writer.emit_u8(tag::METHOD_TYPE);
                writer.emit_u16(*descriptor_index);
            }
            Constant::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                writer.emit_u8(tag::DYNAMIC);
                writer.emit_u16(*bootstrap_method_attr_index);
                writer.emit_u16(*name_and_type_index);
            }
            Constant::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                writer.emit_u8(tag::INVOKE_DYNAMIC);
                writer.emit_u16(*bootstrap_method_attr_index);
                writer.emit_u16(*name_and_type_index);
            }
            Constant::Module { name_index } => {
                writer.emit_u8(tag::MODULE);
                writer.emit_u16(*name_index);
            }
            Constant::Package { name_index } => {
                writer.emit_u8(tag::PACKAGE);
                writer.emit_u16(*name_index);
            }
        }
    }

    fn decode(reader: &mut ClassReader<'_>) -> Result<Self, DecodeError> {
        let offset = reader.position();
        let tag = reader.read_u8()?;
        let constant = match tag {
            tag::UTF8 => Constant::Utf8(reader.read_utf8()?),
            tag::INTEGER => Constant::Integer(reader.read_u32()? as i32),
            tag::FLOAT => Constant::Float(reader.read_u32()?),
            tag::LONG => Constant::Long(reader.read_u64()?),
            tag::DOUBLE => Constant::Double(reader.read_u64()?),
            tag::CLASS => Constant::Class {
                name_index: reader.read_u16()?,
            },
            tag::STRING => Constant::String {
                string_index: reader.read_u16()?,
            },
            tag::FIELDREF => Constant::Fieldref {
                class_index: reader.read_u16()?,
                name_and_type_index: reader.read_u16()?,
            },
            tag::METHODREF => Constant::Methodref {
                class_index: reader.read_u16()?,
                name_and_type_index: reader.read_u16()?,
            },
            tag::INTERFACE_METHODREF => Constant::InterfaceMethodref {
                class_index: reader.read_u16()?,
                name_and_type_index: reader.read_u16()?,
            },
            tag::NAME_AND_TYPE => Constant::NameAndType {
                name_index: reader.read_u16()?,
                descriptor_index: reader.read_u16()?,
            },
            tag::METHOD_HANDLE => Constant::MethodHandle {
                reference_kind: reader.read_u8()?,
                reference_index: reader.read_u16()?,
            },
            tag::METHOD_TYPE => Constant::MethodType {
                descriptor_index: reader.read_u16()?,
            },
            tag::DYNAMIC => Constant::Dynamic {
                bootstrap_method_attr_index: reader.read_u16()?,
                name_and_type_index: reader.read_u16()?,
            },
            tag::INVOKE_DYNAMIC => Constant::InvokeDynamic {
                bootstrap_method_attr_index: reader.read_u16()?,
                name_and_type_index: reader.read_u16()?,
            },
            tag::MODULE => Constant::Module {
                name_index: reader.read_u16()?,
            },
            tag::PACKAGE => Constant::Package {
                name_index: reader.read_u16()?,
            },
            _ => return Err(DecodeError::InvalidConstantTag { tag, offset }),
        };
        Ok(constant)
    }
}

/// A resolved member reference: (owner, name, descriptor)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef<'a> {
    /// Internal name of the owning class (e.g. `android/app/Activity`)
    pub owner: &'a str,
    /// Member name
    pub name: &'a str,
    /// Member descriptor
    pub descriptor: &'a str,
}

/// The class file constant pool
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    /// Slot 0 is unused; wide entries are followed by a `None` slot
    entries: Vec<Option<Constant>>,
    /// Reverse lookup used by the find-or-insert helpers
    lookup: FxHashMap<Constant, u16>,
}

impl ConstantPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            entries: vec![None],
            lookup: FxHashMap::default(),
        }
    }

    /// The `constant_pool_count` value: number of slots plus one
    pub fn count(&self) -> u16 {
        self.entries.len() as u16
    }

    /// Iterate over `(index, constant)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| entry.as_ref().map(|c| (i as u16, c)))
    }

    /// Get the entry at `index`
    pub fn get(&self, index: u16) -> Result<&Constant, ConstantPoolError> {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(ConstantPoolError::OutOfRange(index))
    }

    /// Get a Utf8 entry
    pub fn utf8(&self, index: u16) -> Result<&str, ConstantPoolError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value),
            _ => Err(ConstantPoolError::UnexpectedKind {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// Get the internal name referenced by a Class entry
    pub fn class_name(&self, index: u16) -> Result<&str, ConstantPoolError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ConstantPoolError::UnexpectedKind {
                index,
                expected: "Class",
            }),
        }
    }

    /// Get the (name, descriptor) of a NameAndType entry
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), ConstantPoolError> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => Err(ConstantPoolError::UnexpectedKind {
                index,
                expected: "NameAndType",
            }),
        }
    }

    /// Get the `(class_index, name_and_type_index)` pair of a Methodref or
    /// InterfaceMethodref entry
    pub fn method_ref_indices(&self, index: u16) -> Result<(u16, u16), ConstantPoolError> {
        match self.get(index)? {
            Constant::Methodref {
                class_index,
                name_and_type_index,
            }
            | Constant::InterfaceMethodref {
                class_index,
                name_and_type_index,
            } => Ok((*class_index, *name_and_type_index)),
            _ => Err(ConstantPoolError::UnexpectedKind {
                index,
                expected: "Methodref",
            }),
        }
    }

    /// Resolve a Methodref/InterfaceMethodref/Fieldref into its triple
    pub fn member_ref(&self, index: u16) -> Result<MemberRef<'_>, ConstantPoolError> {
        let (class_index, nat_index) = match self.get(index)? {
            Constant::Fieldref {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index),
            _ => self.method_ref_indices(index)?,
        };
        let owner = self.class_name(class_index)?;
        let (name, descriptor) = self.name_and_type(nat_index)?;
        Ok(MemberRef {
            owner,
            name,
            descriptor,
        })
    }

    /// Append an entry without deduplication and return its index
    pub fn push(&mut self, constant: Constant) -> Result<u16, ConstantPoolError> {
        let slots = if constant.is_wide() { 2 } else { 1 };
        if self.entries.len() + slots > u16::MAX as usize {
            return Err(ConstantPoolError::Full);
        }
        let index = self.entries.len() as u16;
        self.lookup.entry(constant.clone()).or_insert(index);
        let wide = constant.is_wide();
        self.entries.push(Some(constant));
        if wide {
            self.entries.push(None);
        }
        Ok(index)
    }

    /// Return the index of an equal entry, inserting one if none exists
    pub fn find_or_insert(&mut self, constant: Constant) -> Result<u16, ConstantPoolError> {
        if let Some(&index) = self.lookup.get(&constant) {
            return Ok(index);
        }
        self.push(constant)
    }

    /// Find-or-insert a Utf8 entry
    pub fn add_utf8(&mut self, value: &str) -> Result<u16, ConstantPoolError> {
        self.find_or_insert(Constant::Utf8(value.to_string()))
    }

    /// Find-or-insert a Class entry for an internal name
    pub fn add_class(&mut self, internal_name: &str) -> Result<u16, ConstantPoolError> {
        let name_index = self.add_utf8(internal_name)?;
        self.find_or_insert(Constant::Class { name_index })
    }

    /// Find-or-insert a NameAndType entry
    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16, ConstantPoolError> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.find_or_insert(Constant::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    /// Find-or-insert a Methodref entry from existing Class and NameAndType indices
    pub fn add_method_ref(
        &mut self,
        class_index: u16,
        name_and_type_index: u16,
    ) -> Result<u16, ConstantPoolError> {
        self.find_or_insert(Constant::Methodref {
            class_index,
            name_and_type_index,
        })
    }

    /// Encode the pool, including the leading count
    pub fn encode(&self, writer: &mut ClassWriter) {
        writer.emit_u16(self.count());
        for entry in self.entries.iter().flatten() {
            entry.encode(writer);
        }
    }

    /// Decode the pool, including the leading count
    pub fn decode(reader: &mut ClassReader<'_>) -> Result<Self, DecodeError> {
        let count = reader.read_u16()? as usize;
        let mut pool = ConstantPool::new();
        pool.entries.reserve(count.saturating_sub(1));
        while pool.entries.len() < count {
            let constant = Constant::decode(reader)?;
            let index = pool.entries.len() as u16;
            let wide = constant.is_wide();
            pool.lookup.entry(constant.clone()).or_insert(index);
            pool.entries.push(Some(constant));
            if wide {
                pool.entries.push(None);
            }
        }
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_or_insert_reuses_entries() {
        let mut pool = ConstantPool::new();
        let a = pool.add_class("android/app/Activity").unwrap();
        let b = pool.add_class("android/app/Activity").unwrap();
        assert_eq!(a, b);
        // Utf8 + Class
        assert_eq!(pool.count(), 3);
        assert_eq!(pool.class_name(a).unwrap(), "android/app/Activity");
    }

    #[test]
    fn test_wide_entries_take_two_slots() {
        let mut pool = ConstantPool::new();
        let long = pool.push(Constant::Long(7)).unwrap();
        let next = pool.add_utf8("after").unwrap();
        assert_eq!(long, 1);
        assert_eq!(next, 3);
        assert_eq!(pool.get(2), Err(ConstantPoolError::OutOfRange(2)));

        let mut writer = ClassWriter::new();
        pool.encode(&mut writer);
        let bytes = writer.into_bytes();
        let decoded = ConstantPool::decode(&mut ClassReader::new(&bytes)).unwrap();
        assert_eq!(decoded.count(), 4);
        assert_eq!(decoded.utf8(3).unwrap(), "after");
    }

    #[test]
    fn test_member_ref_resolution() {
        let mut pool = ConstantPool::new();
        let class = pool.add_class("androidx/activity/ComponentActivity").unwrap();
        let nat = pool.add_name_and_type("onCreate", "(Landroid/os/Bundle;)V").unwrap();
        let method = pool.add_method_ref(class, nat).unwrap();

        let member = pool.member_ref(method).unwrap();
        assert_eq!(member.owner, "androidx/activity/ComponentActivity");
        assert_eq!(member.name, "onCreate");
        assert_eq!(member.descriptor, "(Landroid/os/Bundle;)V");
    }

    #[test]
    fn test_unexpected_kind() {
        let mut pool = ConstantPool::new();
        let utf8 = pool.add_utf8("x").unwrap();
        assert_eq!(
            pool.class_name(utf8),
            Err(ConstantPoolError::UnexpectedKind {
                index: utf8,
                expected: "Class"
            })
        );
        assert!(pool.member_ref(utf8).is_err());
    }
}
