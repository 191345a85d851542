//! Kotlin source rendering
//!
//! Output is fully determined by the input spec: no timestamps, no hash
//! ordering, four-space indentation, `\n` line endings.

use super::spec::{AnnotationSpec, FileSpec, FunKind, FunSpec, KModifier, ParameterSpec, PropertySpec, TypeSpec, TypeVariable};

const INDENT: &str = "    ";
/// Signatures longer than this are wrapped one parameter per line
const MAX_LINE: usize = 100;

/// Line-oriented writer with an indentation level
#[derive(Debug, Default)]
pub struct CodeWriter {
    out: String,
    level: usize,
}

impl CodeWriter {
    /// Empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current indentation
    pub fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.out.push('\n');
            return;
        }
        for _ in 0..self.level {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Write an empty line
    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Increase indentation
    pub fn indent(&mut self) {
        self.level += 1;
    }

    /// Decrease indentation
    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Finish and return the text
    pub fn finish(self) -> String {
        self.out
    }
}

/// Render a complete source unit
pub fn render_file(file: &FileSpec) -> String {
    let mut w = CodeWriter::new();
    if let Some(comment) = &file.comment {
        for line in comment.lines() {
            w.line(&format!("// {}", line));
        }
    }
    if !file.package.is_empty() {
        w.line(&format!("package {}", file.package));
        w.blank();
    }
    if !file.imports.is_empty() {
        for import in &file.imports {
            w.line(&format!("import {}", import));
        }
        w.blank();
    }
    for (i, ty) in file.types.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        write_type(&mut w, ty);
    }
    w.finish()
}

fn modifiers(list: &[KModifier]) -> String {
    let mut sorted = list.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted
        .iter()
        .map(|m| format!("{} ", m.keyword()))
        .collect()
}

fn annotation(spec: &AnnotationSpec) -> String {
    match &spec.arguments {
        Some(arguments) => format!("@{}({})", spec.name, arguments),
        None => format!("@{}", spec.name),
    }
}

fn parameter(spec: &ParameterSpec) -> String {
    format!("{}{}: {}", modifiers(&spec.modifiers), spec.name, spec.ty)
}

fn type_variables(vars: &[TypeVariable]) -> (String, Vec<String>) {
    if vars.is_empty() {
        return (String::new(), Vec::new());
    }
    let mut where_clauses = Vec::new();
    let rendered: Vec<String> = vars
        .iter()
        .map(|var| match var.bounds.as_slice() {
            [] => var.name.clone(),
            [bound] => format!("{} : {}", var.name, bound),
            bounds => {
                for bound in bounds {
                    where_clauses.push(format!("{} : {}", var.name, bound));
                }
                var.name.clone()
            }
        })
        .collect();
    (format!("<{}>", rendered.join(", ")), where_clauses)
}

/// Write `head(params)tail`, wrapping the parameters when the line is too long
fn write_parameter_list(w: &mut CodeWriter, head: &str, params: &[String], tail: &str) {
    let single = format!("{}({}){}", head, params.join(", "), tail);
    if params.len() <= 1 || single.len() + w.level * INDENT.len() <= MAX_LINE {
        w.line(&single);
        return;
    }
    w.line(&format!("{}(", head));
    w.indent();
    for (i, param) in params.iter().enumerate() {
        if i + 1 < params.len() {
            w.line(&format!("{},", param));
        } else {
            w.line(param);
        }
    }
    w.dedent();
    w.line(&format!("){}", tail));
}

fn write_kdoc(w: &mut CodeWriter, kdoc: &str) {
    w.line("/**");
    for line in kdoc.lines() {
        if line.is_empty() {
            w.line(" *");
        } else {
            w.line(&format!(" * {}", line));
        }
    }
    w.line(" */");
}

fn write_type(w: &mut CodeWriter, ty: &TypeSpec) {
    if let Some(kdoc) = &ty.kdoc {
        write_kdoc(w, kdoc);
    }
    for a in &ty.annotations {
        w.line(&annotation(a));
    }

    let (vars, where_clauses) = type_variables(&ty.type_variables);
    let head = format!("{}class {}{}", modifiers(&ty.modifiers), ty.name, vars);

    let mut supers = Vec::new();
    if let Some(superclass) = &ty.superclass {
        if ty.superclass_initialized {
            supers.push(format!("{}()", superclass));
        } else {
            supers.push(superclass.clone());
        }
    }
    supers.extend(ty.superinterfaces.iter().cloned());
    let mut tail = String::new();
    if !supers.is_empty() {
        tail.push_str(" : ");
        tail.push_str(&supers.join(", "));
    }
    if !where_clauses.is_empty() {
        tail.push_str(" where ");
        tail.push_str(&where_clauses.join(", "));
    }
    let has_body = !ty.properties.is_empty() || !ty.functions.is_empty() || !ty.types.is_empty();
    if has_body {
        tail.push_str(" {");
    }

    if ty.primary_properties.is_empty() {
        w.line(&format!("{}{}", head, tail));
    } else {
        let params: Vec<String> = ty
            .primary_properties
            .iter()
            .map(|p| format!("{}val {}: {}", modifiers(&p.modifiers), p.name, p.ty))
            .collect();
        write_parameter_list(w, &head, &params, &tail);
    }
    if !has_body {
        return;
    }

    w.indent();
    let mut first = true;
    let mut separate = |w: &mut CodeWriter| {
        if !first {
            w.blank();
        }
        first = false;
    };
    for property in &ty.properties {
        separate(w);
        write_property(w, property);
    }
    for function in ty.constructors() {
        separate(w);
        write_function(w, function);
    }
    for function in ty.functions.iter().filter(|f| f.kind == FunKind::Function) {
        separate(w);
        write_function(w, function);
    }
    for nested in &ty.types {
        separate(w);
        write_type(w, nested);
    }
    w.dedent();
    w.line("}");
}

fn write_property(w: &mut CodeWriter, property: &PropertySpec) {
    let keyword = if property.mutable { "var" } else { "val" };
    let mut line = format!(
        "{}{} {}: {}",
        modifiers(&property.modifiers),
        keyword,
        property.name,
        property.ty
    );
    if let Some(initializer) = &property.initializer {
        line.push_str(" = ");
        line.push_str(initializer);
    } else if let Some(delegate) = &property.delegate {
        line.push_str(" by ");
        line.push_str(delegate);
    }
    w.line(&line);
    if let Some(getter) = &property.getter {
        w.indent();
        w.line(&format!("get() = {}", getter));
        w.dedent();
    }
}

fn write_function(w: &mut CodeWriter, function: &FunSpec) {
    for a in &function.annotations {
        w.line(&annotation(a));
    }
    let head = match function.kind {
        FunKind::Function => format!("{}fun {}", modifiers(&function.modifiers), function.name),
        FunKind::Constructor => format!("{}constructor", modifiers(&function.modifiers)),
    };
    let mut tail = String::new();
    if let Some(return_type) = function.return_type.as_deref().filter(|t| *t != "Unit") {
        tail.push_str(": ");
        tail.push_str(return_type);
    }
    if let Some(arguments) = &function.super_call {
        tail.push_str(&format!(" : super({})", arguments.join(", ")));
    }
    let has_body = !function.body.is_empty() || function.kind == FunKind::Function;
    if has_body {
        tail.push_str(" {");
    }
    let params: Vec<String> = function.parameters.iter().map(parameter).collect();
    write_parameter_list(w, &head, &params, &tail);
    if !has_body {
        return;
    }
    w.indent();
    for (depth, text) in function.body.lines() {
        for _ in 0..*depth {
            w.indent();
        }
        w.line(text);
        for _ in 0..*depth {
            w.dedent();
        }
    }
    w.dedent();
    w.line("}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::spec::CodeBlock;

    #[test]
    fn test_render_small_file() {
        let mut file = FileSpec::new("com.example", "Greeter");
        file.comment = Some("Generated file. Do not edit!".to_string());
        file.import("kotlin.collections.List");

        let mut ty = TypeSpec::class("Greeter");
        ty.modifiers = vec![KModifier::Abstract, KModifier::Public];
        ty.superclass = Some("Base".to_string());
        ty.superclass_initialized = true;
        ty.properties
            .push(PropertySpec::new("count", "Int").modifier(KModifier::Private).mutable().initializer("0"));
        ty.functions.push(
            FunSpec::function("greet")
                .parameter(ParameterSpec::new("name", "String"))
                .body(
                    CodeBlock::new()
                        .begin_control_flow("if (name.isEmpty())")
                        .statement("return")
                        .end_control_flow()
                        .statement("count++"),
                ),
        );
        file.types.push(ty);

        assert_eq!(
            render_file(&file),
            "// Generated file. Do not edit!\n\
             package com.example\n\
             \n\
             import kotlin.collections.List\n\
             \n\
             public abstract class Greeter : Base() {\n    \
             private var count: Int = 0\n\
             \n    \
             fun greet(name: String) {\n        \
             if (name.isEmpty()) {\n            \
             return\n        \
             }\n        \
             count++\n    \
             }\n\
             }\n"
        );
    }

    #[test]
    fn test_long_parameter_lists_wrap() {
        let mut w = CodeWriter::new();
        let params: Vec<String> = (0..6)
            .map(|i| format!("parameterNumber{}: kotlin.collections.List<String>", i))
            .collect();
        write_parameter_list(&mut w, "fun f", &params, " {");
        let text = w.finish();
        assert!(text.starts_with("fun f(\n    parameterNumber0"));
        assert!(text.ends_with("List<String>\n) {\n"));
    }

    #[test]
    fn test_constructor_without_body() {
        let mut w = CodeWriter::new();
        write_function(
            &mut w,
            &FunSpec::constructor()
                .annotation(AnnotationSpec::with_arguments("TargetApi", "21"))
                .parameter(ParameterSpec::new("context", "android.content.Context?"))
                .call_super(vec!["context".to_string()]),
        );
        assert_eq!(
            w.finish(),
            "@TargetApi(21)\nconstructor(context: android.content.Context?) : super(context)\n"
        );
    }

    #[test]
    fn test_type_variable_bounds() {
        let vars = vec![
            TypeVariable {
                name: "T".to_string(),
                bounds: vec!["Any?".to_string()],
            },
            TypeVariable {
                name: "R".to_string(),
                bounds: vec!["A".to_string(), "B".to_string()],
            },
        ];
        let (rendered, clauses) = type_variables(&vars);
        assert_eq!(rendered, "<T : Any?, R>");
        assert_eq!(clauses, vec!["R : A", "R : B"]);
    }
}
