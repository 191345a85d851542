//! Programmatic class file assembly
//!
//! Produces minimal but well-formed class files: enough structure for the
//! loader and the transformer, without stack maps or debug attributes.

use crate::class::{access, attr, Attribute, ClassFile, MemberInfo};
use crate::code::CodeAttribute;
use crate::constants::{Constant, ConstantPool, ConstantPoolError};
use crate::encoder::ClassWriter;

/// Java 8 class file version
pub const JAVA_8: u16 = 52;

/// Incremental class file builder
#[derive(Debug)]
pub struct ClassBuilder {
    class: ClassFile,
}

impl ClassBuilder {
    /// Start a public class named `name` (internal form) extending `super_name`
    pub fn new(name: &str, super_name: Option<&str>) -> Result<Self, ConstantPoolError> {
        let mut constant_pool = ConstantPool::new();
        let this_class = constant_pool.add_class(name)?;
        let super_class = match super_name {
            Some(s) => constant_pool.add_class(s)?,
            None => 0,
        };
        Ok(Self {
            class: ClassFile {
                minor_version: 0,
                major_version: JAVA_8,
                constant_pool,
                access_flags: access::PUBLIC | access::SUPER,
                this_class,
                super_class,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                attributes: Vec::new(),
            },
        })
    }

    /// Replace the class access flags
    pub fn set_access(&mut self, flags: u16) {
        self.class.access_flags = flags;
    }

    /// Mutable access to the constant pool
    pub fn pool_mut(&mut self) -> &mut ConstantPool {
        &mut self.class.constant_pool
    }

    /// Find-or-insert a Methodref and return its index
    pub fn method_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, ConstantPoolError> {
        let pool = &mut self.class.constant_pool;
        let class_index = pool.add_class(owner)?;
        let nat_index = pool.add_name_and_type(name, descriptor)?;
        pool.add_method_ref(class_index, nat_index)
    }

    /// Add a direct superinterface
    pub fn add_interface(&mut self, name: &str) -> Result<(), ConstantPoolError> {
        let index = self.class.constant_pool.add_class(name)?;
        self.class.interfaces.push(index);
        Ok(())
    }

    /// Add an element-less annotation to the class
    pub fn add_annotation(&mut self, descriptor: &str, visible: bool) -> Result<(), ConstantPoolError> {
        let name = if visible {
            attr::RUNTIME_VISIBLE_ANNOTATIONS
        } else {
            attr::RUNTIME_INVISIBLE_ANNOTATIONS
        };
        let type_index = self.class.constant_pool.add_utf8(descriptor)?;
        let name_index = self.class.constant_pool.add_utf8(name)?;
        append_annotation(&mut self.class.attributes, name_index, type_index, &[]);
        Ok(())
    }

    /// Add an annotation with a single `int` element named `value`
    pub fn add_int_annotation(
        &mut self,
        descriptor: &str,
        value: i32,
    ) -> Result<(), ConstantPoolError> {
        let pool = &mut self.class.constant_pool;
        let type_index = pool.add_utf8(descriptor)?;
        let name_index = pool.add_utf8(attr::RUNTIME_VISIBLE_ANNOTATIONS)?;
        let element_name = pool.add_utf8("value")?;
        let value_index = pool.find_or_insert(Constant::Integer(value))?;
        let mut element = ClassWriter::new();
        element.emit_u16(element_name);
        element.emit_u8(b'I');
        element.emit_u16(value_index);
        append_annotation(
            &mut self.class.attributes,
            name_index,
            type_index,
            &[element.into_bytes()],
        );
        Ok(())
    }

    /// Attach a generic `Signature` attribute to the class
    pub fn set_signature(&mut self, signature: &str) -> Result<(), ConstantPoolError> {
        let pool = &mut self.class.constant_pool;
        let name_index = pool.add_utf8(attr::SIGNATURE)?;
        let value = pool.add_utf8(signature)?;
        self.class.attributes.push(Attribute {
            name_index,
            info: value.to_be_bytes().to_vec(),
        });
        Ok(())
    }

    /// Add a method and return its position in the method table
    pub fn add_method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        code: Option<&CodeAttribute>,
    ) -> Result<usize, ConstantPoolError> {
        let pool = &mut self.class.constant_pool;
        let name_index = pool.add_utf8(name)?;
        let descriptor_index = pool.add_utf8(descriptor)?;
        let mut attributes = Vec::new();
        if let Some(code) = code {
            attributes.push(Attribute {
                name_index: pool.add_utf8(attr::CODE)?,
                info: code.encode(),
            });
        }
        self.class.methods.push(MemberInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
        Ok(self.class.methods.len() - 1)
    }

    /// Record parameter names for a method via `MethodParameters`
    pub fn set_parameter_names(
        &mut self,
        method: usize,
        names: &[&str],
    ) -> Result<(), ConstantPoolError> {
        let pool = &mut self.class.constant_pool;
        let attr_name = pool.add_utf8(attr::METHOD_PARAMETERS)?;
        let mut writer = ClassWriter::new();
        writer.emit_u8(names.len() as u8);
        for name in names {
            writer.emit_u16(pool.add_utf8(name)?);
            writer.emit_u16(0);
        }
        if let Some(m) = self.class.methods.get_mut(method) {
            m.attributes.push(Attribute {
                name_index: attr_name,
                info: writer.into_bytes(),
            });
        }
        Ok(())
    }

    /// Annotate one parameter of a method with an element-less annotation
    pub fn add_parameter_annotation(
        &mut self,
        method: usize,
        parameter_count: usize,
        parameter: usize,
        descriptor: &str,
    ) -> Result<(), ConstantPoolError> {
        let pool = &mut self.class.constant_pool;
        let attr_name = pool.add_utf8(attr::RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS)?;
        let type_index = pool.add_utf8(descriptor)?;
        let mut writer = ClassWriter::new();
        writer.emit_u8(parameter_count as u8);
        for i in 0..parameter_count {
            if i == parameter {
                writer.emit_u16(1);
                writer.emit_u16(type_index);
                writer.emit_u16(0);
            } else {
                writer.emit_u16(0);
            }
        }
        if let Some(m) = self.class.methods.get_mut(method) {
            m.attributes.push(Attribute {
                name_index: attr_name,
                info: writer.into_bytes(),
            });
        }
        Ok(())
    }

    /// Add an element-less annotation to a method
    pub fn add_method_annotation(
        &mut self,
        method: usize,
        descriptor: &str,
    ) -> Result<(), ConstantPoolError> {
        let pool = &mut self.class.constant_pool;
        let name_index = pool.add_utf8(attr::RUNTIME_INVISIBLE_ANNOTATIONS)?;
        let type_index = pool.add_utf8(descriptor)?;
        if let Some(m) = self.class.methods.get_mut(method) {
            append_annotation(&mut m.attributes, name_index, type_index, &[]);
        }
        Ok(())
    }

    /// Finish building
    pub fn finish(self) -> ClassFile {
        self.class
    }
}

/// Append one annotation to the attribute named by `name_index`, creating it if needed
fn append_annotation(
    attributes: &mut Vec<Attribute>,
    name_index: u16,
    type_index: u16,
    elements: &[Vec<u8>],
) {
    let position = match attributes.iter().position(|a| a.name_index == name_index) {
        Some(i) => i,
        None => {
            attributes.push(Attribute {
                name_index,
                info: vec![0, 0],
            });
            attributes.len() - 1
        }
    };
    let info = &mut attributes[position].info;
    let count = u16::from_be_bytes([info[0], info[1]]) + 1;
    info[..2].copy_from_slice(&count.to_be_bytes());
    info.extend_from_slice(&type_index.to_be_bytes());
    info.extend_from_slice(&(elements.len() as u16).to_be_bytes());
    for element in elements {
        info.extend_from_slice(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::{ALOAD_0, INVOKESPECIAL, RETURN};

    #[test]
    fn test_builds_decodable_class() {
        let mut builder =
            ClassBuilder::new("com/example/LoginActivity", Some("android/app/Activity")).unwrap();
        builder
            .add_annotation("Lcn/nikeo/permisos/weaving/Permisos;", false)
            .unwrap();
        let init = builder
            .method_ref("android/app/Activity", "<init>", "()V")
            .unwrap();
        let [hi, lo] = init.to_be_bytes();
        let code = CodeAttribute::new(1, 1, vec![ALOAD_0, INVOKESPECIAL, hi, lo, RETURN]);
        builder
            .add_method(access::PUBLIC, "<init>", "()V", Some(&code))
            .unwrap();

        let class = ClassFile::decode(&builder.finish().encode()).unwrap();
        assert_eq!(class.name().unwrap(), "com/example/LoginActivity");
        assert_eq!(class.super_name().unwrap(), Some("android/app/Activity"));
        assert!(class
            .has_annotation("Lcn/nikeo/permisos/weaving/Permisos;")
            .unwrap());
        let decoded = class.methods[0].code(&class.constant_pool).unwrap().unwrap();
        assert_eq!(decoded, code);
    }

    #[test]
    fn test_annotations_accumulate_in_one_attribute() {
        let mut builder = ClassBuilder::new("a/B", Some("java/lang/Object")).unwrap();
        builder.add_annotation("La/One;", true).unwrap();
        builder.add_annotation("La/Two;", true).unwrap();
        builder.add_int_annotation("Landroid/annotation/TargetApi;", 23).unwrap();
        let class = builder.finish();
        assert_eq!(class.attributes.len(), 1);
        let annotations = class.annotations().unwrap();
        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[1].type_descriptor, "La/Two;");
    }
}
