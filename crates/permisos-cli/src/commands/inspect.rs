//! `permisos inspect` - describe a class file as the transformer sees it

use crate::output;
use anyhow::Context;
use permisos_classfile::class::access;
use permisos_classfile::encoder::read_u16_at;
use permisos_classfile::opcode::INVOKESPECIAL;
use permisos_classfile::{decode_offsets, ClassFile};
use permisos_compiler::{generated_internal_name, Config};
use std::io::Write;
use std::path::Path;

pub fn execute(config: &Config, class: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(class).with_context(|| format!("failed to read {}", class.display()))?;
    let class = ClassFile::decode(&bytes)
        .with_context(|| format!("{} is not a class file", class.display()))?;
    let pool = &class.constant_pool;
    let name = class.name()?;

    let mut out = output::stdout();
    output::field(&mut out, "class", name)?;
    output::field(
        &mut out,
        "version",
        &format!("{}.{}", class.major_version, class.minor_version),
    )?;
    output::field(&mut out, "superclass", class.super_name()?.unwrap_or("-"))?;
    let interfaces = class.interface_names()?;
    if !interfaces.is_empty() {
        output::field(&mut out, "interfaces", &interfaces.join(", "))?;
    }
    if let Some(signature) = class.signature()? {
        output::field(&mut out, "signature", signature)?;
    }
    for annotation in class.annotations()? {
        output::field(&mut out, "annotation", &annotation.type_descriptor)?;
    }

    let marked = class.has_annotation(&config.marker_descriptor())?;
    output::field(&mut out, "marked", if marked { "yes" } else { "no" })?;
    if marked {
        output::field(
            &mut out,
            "splices onto",
            &generated_internal_name(name, &config.prefix),
        )?;
    }

    let superclass = class.super_name()?;
    for method in &class.methods {
        let method_name = method.name(pool)?;
        writeln!(out, "  {}{}", method_name, method.descriptor(pool)?)?;
        if method.access_flags & (access::STATIC | access::ABSTRACT | access::NATIVE) != 0 {
            continue;
        }
        let Some(code) = method.code(pool)? else {
            continue;
        };
        for offset in decode_offsets(&code.code)? {
            if code.code[offset] != INVOKESPECIAL {
                continue;
            }
            let Some(index) = read_u16_at(&code.code, offset + 1) else {
                continue;
            };
            let target = pool.member_ref(index)?;
            let super_call = Some(target.owner) == superclass && target.name != "<init>";
            writeln!(
                out,
                "    @{:<4} invokespecial {}.{}{}{}",
                offset,
                target.owner,
                target.name,
                target.descriptor,
                if super_call { "  (super call)" } else { "" }
            )?;
        }
    }
    Ok(())
}
