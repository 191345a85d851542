//! Permisos class file support
//!
//! This crate reads and writes JVM class files: the constant pool, fields,
//! methods, `Code` attributes, runtime annotations and generic signatures.
//! It is the binary layer the Permisos transformer and class-file-backed
//! type loading are built on.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod annotation;
pub mod builder;
pub mod class;
pub mod code;
pub mod constants;
pub mod descriptor;
pub mod encoder;
pub mod opcode;

pub use annotation::{Annotation, ConstValue, ElementValue};
pub use builder::ClassBuilder;
pub use class::{access, Attribute, ClassFile, ClassFileError, MemberInfo};
pub use code::{decode_offsets, CodeAttribute};
pub use constants::{Constant, ConstantPool, ConstantPoolError, MemberRef};
pub use descriptor::{JavaType, SignatureError, TypeArgument, TypeParameter};
pub use encoder::{ClassReader, ClassWriter, DecodeError};
