//! Binary superclass splicing
//!
//! A marked class `C extends B` becomes `C extends Permisos_C`, where the
//! generated `Permisos_C` itself extends `B`. Direct `super.m(..)` calls in
//! `C` are compiled as `invokespecial B.m`; those are re-pointed at
//! `Permisos_C.m` so they dispatch through the interposed type. Operands are
//! overwritten in place, so no instruction ever changes length and no
//! branch offset or stack map needs fixing.

use crate::error::{TransformError, TransformResult};
use permisos_classfile::class::access;
use permisos_classfile::encoder::{read_u16_at, write_u16_at};
use permisos_classfile::opcode::INVOKESPECIAL;
use permisos_classfile::{decode_offsets, ClassFile, DecodeError};
use permisos_compiler::names::generated_internal_name;
use rustc_hash::FxHashSet;

const CONSTRUCTOR: &str = "<init>";
const STATIC_INITIALIZER: &str = "<clinit>";

/// Internal names of every class visible to the transformer
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    names: FxHashSet<String>,
}

impl ClassIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an internal name
    pub fn insert(&mut self, internal_name: impl Into<String>) {
        self.names.insert(internal_name.into());
    }

    /// Whether `internal_name` is known
    pub fn contains(&self, internal_name: &str) -> bool {
        self.names.contains(internal_name)
    }

    /// Number of known classes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ClassIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Rewrites marked classes against a fixed class index
#[derive(Debug)]
pub struct BinaryPatcher<'a> {
    marker_descriptor: &'a str,
    prefix: &'a str,
    index: &'a ClassIndex,
}

impl<'a> BinaryPatcher<'a> {
    /// `marker_descriptor` is the field descriptor of the marker annotation
    pub fn new(marker_descriptor: &'a str, prefix: &'a str, index: &'a ClassIndex) -> Self {
        Self {
            marker_descriptor,
            prefix,
            index,
        }
    }

    /// Transform one class file
    ///
    /// Returns `None` when the class is left as it was: it is unmarked, has
    /// no superclass, or already extends its generated type.
    pub fn transform_class(&self, bytes: &[u8], unit: &str) -> TransformResult<Option<Vec<u8>>> {
        let decode_error = |error| TransformError::Decode {
            unit: unit.to_string(),
            error,
        };
        let mut class = ClassFile::decode(bytes).map_err(decode_error)?;
        if !class
            .has_annotation(self.marker_descriptor)
            .map_err(decode_error)?
        {
            tracing::debug!(unit, "skipping unmarked class");
            return Ok(None);
        }

        let name = class_name(&class)?;
        let Some(old_super) = class
            .super_name()
            .map_err(|error| corrupt(&name, error))?
            .map(str::to_string)
        else {
            tracing::debug!(class = %name, "marked class has no superclass");
            return Ok(None);
        };

        let new_super = generated_internal_name(&name, self.prefix);
        if old_super == new_super {
            tracing::debug!(class = %name, "already spliced");
            return Ok(None);
        }
        if !self.index.contains(&new_super) {
            return Err(TransformError::MissingSuperclass {
                class: name,
                superclass: new_super,
            });
        }

        splice(&mut class, &old_super, &new_super)?;
        Ok(Some(class.encode()))
    }
}

/// Re-parent `class` from `old_super` to `new_super`
///
/// Points `super_class` at `new_super` and redirects every qualifying
/// `invokespecial old_super.m` to `new_super.m`. Returns whether anything
/// changed.
pub fn splice(class: &mut ClassFile, old_super: &str, new_super: &str) -> TransformResult<bool> {
    if old_super == new_super {
        return Ok(false);
    }
    let name = class_name(class)?;
    let new_owner = class
        .set_super_name(new_super)
        .map_err(|error| corrupt(&name, error))?;
    tracing::info!(class = %name, from = old_super, to = new_super, "spliced superclass");

    let ClassFile {
        constant_pool,
        methods,
        ..
    } = class;
    for method in methods.iter_mut() {
        if method.access_flags & (access::STATIC | access::ABSTRACT | access::NATIVE) != 0 {
            continue;
        }
        let method_name = method
            .name(constant_pool)
            .map_err(|error| corrupt(&name, error))?
            .to_string();
        if method_name == CONSTRUCTOR || method_name == STATIC_INITIALIZER {
            continue;
        }
        let Some(mut code) = method
            .code(constant_pool)
            .map_err(|error| TransformError::Decode {
                unit: name.clone(),
                error,
            })?
        else {
            continue;
        };

        let offsets = decode_offsets(&code.code).map_err(|error| TransformError::Code {
            class: name.clone(),
            method: method_name.clone(),
            error,
        })?;
        let mut redirected = 0;
        for offset in offsets {
            if code.code[offset] != INVOKESPECIAL {
                continue;
            }
            let Some(index) = read_u16_at(&code.code, offset + 1) else {
                return Err(TransformError::Code {
                    class: name.clone(),
                    method: method_name.clone(),
                    error: DecodeError::UnexpectedEnd(offset + 1),
                });
            };
            let target = constant_pool
                .member_ref(index)
                .map_err(|error| corrupt(&name, error))?;
            if target.owner != old_super {
                continue;
            }
            tracing::info!(
                class = %name,
                method = %method_name,
                offset,
                call = %format!("{}.{}{}", target.owner, target.name, target.descriptor),
                "redirected super call"
            );
            let (_, name_and_type) = constant_pool
                .method_ref_indices(index)
                .map_err(|error| corrupt(&name, error))?;
            let redirected_ref = constant_pool
                .add_method_ref(new_owner, name_and_type)
                .map_err(|error| corrupt(&name, error))?;
            write_u16_at(&mut code.code, offset + 1, redirected_ref);
            redirected += 1;
        }
        if redirected > 0 {
            method.set_code(constant_pool, &code);
        }
    }
    Ok(true)
}

fn class_name(class: &ClassFile) -> TransformResult<String> {
    class
        .name()
        .map(str::to_string)
        .map_err(|error| corrupt("<unknown>", error))
}

fn corrupt(class: &str, error: permisos_classfile::ConstantPoolError) -> TransformError {
    TransformError::CorruptReference {
        class: class.to_string(),
        error,
    }
}
