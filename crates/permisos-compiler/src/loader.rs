//! Populating a [`TypeGraph`]
//!
//! Two input formats are understood:
//! - declaration files (`.toml` / `.json`) describing types directly
//! - compiled class files, loose, in directory trees, or inside jars

use crate::config::CONFIG_FILE;
use crate::model::{
    AnnotationRef, ConstructorDecl, DeclKind, Language, MethodDecl, Modifier, Parameter,
    TypeDecl, TypeGraph, TypeParam, UnlinkedType,
};
use crate::names::ClassName;
use permisos_classfile::annotation::{Annotation, ConstValue, ElementValue};
use permisos_classfile::descriptor::{parse_class_signature, parse_method_signature};
use permisos_classfile::{access, ClassFile, ClassFileError, JavaType, MemberInfo, SignatureError, TypeArgument};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Descriptor of `kotlin.Metadata`
const KOTLIN_METADATA: &str = "Lkotlin/Metadata;";
/// Trailing parameter of the synthetic constructor Kotlin emits for default values
const DEFAULT_CONSTRUCTOR_MARKER: &str = "Lkotlin/jvm/internal/DefaultConstructorMarker;";

/// Errors that can occur while loading types
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read an input
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Malformed TOML declaration file
    #[error("Failed to parse {path}: {source}")]
    Toml {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// Malformed JSON declaration file
    #[error("Failed to parse {path}: {source}")]
    Json {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },

    /// Malformed class file
    #[error("Invalid class file {path}: {source}")]
    ClassFile {
        /// Offending path (jar entries as `jar!/entry`)
        path: PathBuf,
        /// Underlying error
        source: ClassFileError,
    },

    /// Malformed generic signature
    #[error("Invalid signature in {path}: {source}")]
    Signature {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        source: SignatureError,
    },

    /// Malformed archive
    #[error("Invalid archive {path}: {source}")]
    Archive {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        source: zip::result::ZipError,
    },

    /// Input kind is not recognised
    #[error("Unsupported input: {0}")]
    Unsupported(PathBuf),
}

/// A declaration file: a list of types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclarationFile {
    /// Declared types
    #[serde(default)]
    pub types: Vec<TypeSource>,
}

/// One type in a declaration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSource {
    /// Qualified name
    pub name: String,
    #[serde(default)]
    pub kind: DeclKind,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Qualified superclass name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    /// Qualified superinterface names
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub type_parameters: Vec<TypeParam>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub annotations: Vec<AnnotationRef>,
}

impl TypeSource {
    fn into_unlinked(self) -> UnlinkedType {
        let normalize = |name: &str| ClassName::parse_qualified(name).qualified();
        UnlinkedType {
            superclass: self.superclass.as_deref().map(normalize),
            interfaces: self.interfaces.iter().map(|n| normalize(n)).collect(),
            decl: TypeDecl {
                name: ClassName::parse_qualified(&self.name),
                kind: self.kind,
                modifiers: self.modifiers,
                superclass: crate::model::SuperRef::None,
                interfaces: Vec::new(),
                type_parameters: self.type_parameters,
                constructors: self.constructors,
                methods: self.methods,
                annotations: self.annotations,
                language: self.language,
            },
        }
    }
}

/// Parse a TOML declaration file
pub fn parse_toml_declarations(contents: &str) -> Result<Vec<UnlinkedType>, toml::de::Error> {
    let file: DeclarationFile = toml::from_str(contents)?;
    Ok(file.types.into_iter().map(TypeSource::into_unlinked).collect())
}

/// Parse a JSON declaration file
pub fn parse_json_declarations(contents: &str) -> Result<Vec<UnlinkedType>, serde_json::Error> {
    let file: DeclarationFile = serde_json::from_str(contents)?;
    Ok(file.types.into_iter().map(TypeSource::into_unlinked).collect())
}

/// Kotlin spelling of a JVM type
pub fn kotlin_type_name(ty: &JavaType) -> String {
    match ty {
        JavaType::Base(c) => match c {
            'B' => "Byte",
            'C' => "Char",
            'D' => "Double",
            'F' => "Float",
            'I' => "Int",
            'J' => "Long",
            'S' => "Short",
            'Z' => "Boolean",
            _ => "Unit",
        }
        .to_string(),
        JavaType::Class {
            internal_name,
            arguments,
        } => {
            let base = match internal_name.as_str() {
                "java/lang/Object" => "Any".to_string(),
                "java/lang/String" => "String".to_string(),
                "java/lang/CharSequence" => "CharSequence".to_string(),
                other => ClassName::from_internal(other).qualified(),
            };
            if arguments.is_empty() {
                return base;
            }
            let arguments: Vec<String> = arguments
                .iter()
                .map(|argument| match argument {
                    TypeArgument::Wildcard => "*".to_string(),
                    TypeArgument::Extends(t) => format!("out {}", kotlin_type_name(t)),
                    TypeArgument::Super(t) => format!("in {}", kotlin_type_name(t)),
                    TypeArgument::Exact(t) => kotlin_type_name(t),
                })
                .collect();
            format!("{}<{}>", base, arguments.join(", "))
        }
        JavaType::Array(component) => match component.as_ref() {
            JavaType::Base(_) if component.is_primitive() => {
                format!("{}Array", kotlin_type_name(component))
            }
            other => format!("Array<{}>", kotlin_type_name(other)),
        },
        JavaType::Variable(name) => name.clone(),
    }
}

fn render_element_value(value: &ElementValue) -> String {
    match value {
        ElementValue::Const(c) => match c {
            ConstValue::Int(v) => v.to_string(),
            ConstValue::Long(v) => format!("{}L", v),
            ConstValue::Float(v) => format!("{}f", v),
            ConstValue::Double(v) => v.to_string(),
            ConstValue::Bool(v) => v.to_string(),
            ConstValue::Char(v) => format!("'{}'", v),
            ConstValue::Str(v) => format!("{:?}", v),
        },
        ElementValue::Enum {
            type_descriptor,
            const_name,
        } => format!("{}.{}", descriptor_class(type_descriptor).qualified(), const_name),
        ElementValue::Class(descriptor) => format!("{}::class", descriptor_class(descriptor).qualified()),
        ElementValue::Annotation(nested) => {
            let reference = annotation_ref(nested);
            match reference.arguments {
                Some(arguments) => format!("{}({})", reference.name.qualified(), arguments),
                None => reference.name.qualified(),
            }
        }
        ElementValue::Array(values) => {
            let values: Vec<String> = values.iter().map(render_element_value).collect();
            format!("[{}]", values.join(", "))
        }
    }
}

fn descriptor_class(descriptor: &str) -> ClassName {
    let internal = descriptor
        .strip_prefix('L')
        .and_then(|d| d.strip_suffix(';'))
        .unwrap_or(descriptor);
    ClassName::from_internal(internal)
}

/// Convert a decoded annotation into an [`AnnotationRef`] with rendered arguments
pub fn annotation_ref(annotation: &Annotation) -> AnnotationRef {
    let arguments = match annotation.elements.as_slice() {
        [] => None,
        [(name, value)] if name == "value" => Some(render_element_value(value)),
        elements => Some(
            elements
                .iter()
                .map(|(name, value)| format!("{} = {}", name, render_element_value(value)))
                .collect::<Vec<_>>()
                .join(", "),
        ),
    };
    AnnotationRef {
        name: descriptor_class(&annotation.type_descriptor),
        arguments,
    }
}

fn member_modifiers(flags: u16) -> Vec<Modifier> {
    let mut modifiers = Vec::new();
    for (flag, modifier) in [
        (access::PUBLIC, Modifier::Public),
        (access::PROTECTED, Modifier::Protected),
        (access::PRIVATE, Modifier::Private),
        (access::STATIC, Modifier::Static),
        (access::FINAL, Modifier::Final),
        (access::ABSTRACT, Modifier::Abstract),
    ] {
        if flags & flag != 0 {
            modifiers.push(modifier);
        }
    }
    modifiers
}

fn class_err(path: &Path) -> impl Fn(ClassFileError) -> LoadError + '_ {
    move |source| LoadError::ClassFile {
        path: path.to_path_buf(),
        source,
    }
}

fn signature_err(path: &Path) -> impl Fn(SignatureError) -> LoadError + '_ {
    move |source| LoadError::Signature {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a method's generic signature, falling back to its descriptor
fn method_signature(
    class: &ClassFile,
    method: &MemberInfo,
    path: &Path,
) -> Result<permisos_classfile::descriptor::MethodSignature, LoadError> {
    let pool = &class.constant_pool;
    let signature = permisos_classfile::class::find_attribute(
        &method.attributes,
        pool,
        permisos_classfile::class::attr::SIGNATURE,
    )
    .filter(|a| a.info.len() == 2)
    .map(|a| pool.utf8(u16::from_be_bytes([a.info[0], a.info[1]])))
    .transpose()
    .map_err(|e| class_err(path)(e.into()))?;
    let descriptor = method.descriptor(pool).map_err(|e| class_err(path)(e.into()))?;
    parse_method_signature(signature.unwrap_or(descriptor)).map_err(signature_err(path))
}

fn constructor_from_method(
    class: &ClassFile,
    method: &MemberInfo,
    path: &Path,
) -> Result<ConstructorDecl, LoadError> {
    let pool = &class.constant_pool;
    let signature = method_signature(class, method, path)?;
    let names = method.parameter_names(pool).map_err(class_err(path))?;
    let parameter_annotations = method.parameter_annotations(pool).map_err(class_err(path))?;

    let parameters = signature
        .parameters
        .iter()
        .enumerate()
        .map(|(i, ty)| {
            let nullable = parameter_annotations.get(i).map_or(false, |annotations| {
                annotations
                    .iter()
                    .any(|a| descriptor_class(&a.type_descriptor).simple_name() == "Nullable")
            });
            Parameter {
                name: names
                    .as_ref()
                    .and_then(|n| n.get(i).cloned())
                    .unwrap_or_else(|| format!("p{}", i)),
                ty: kotlin_type_name(ty),
                nullable,
            }
        })
        .collect();

    let annotations = method
        .annotations(pool)
        .map_err(class_err(path))?
        .iter()
        .map(annotation_ref)
        .collect();

    Ok(ConstructorDecl {
        modifiers: member_modifiers(method.access_flags),
        parameters,
        annotations,
        has_default_values: false,
    })
}

/// Describe a class file as an unlinked type
///
/// `path` is only used in error messages.
pub fn type_from_class(class: &ClassFile, path: &Path) -> Result<UnlinkedType, LoadError> {
    let pool = &class.constant_pool;
    let internal = class.name().map_err(|e| class_err(path)(e.into()))?;
    let name = ClassName::from_internal(internal);

    let kind = if class.access_flags & access::ANNOTATION != 0 {
        DeclKind::Annotation
    } else if class.is_interface() {
        DeclKind::Interface
    } else if class.access_flags & access::ENUM != 0 {
        DeclKind::Enum
    } else {
        DeclKind::Class
    };

    let annotations = class.annotations().map_err(class_err(path))?;
    let language = if annotations.iter().any(|a| a.type_descriptor == KOTLIN_METADATA) {
        Language::Kotlin
    } else {
        Language::Java
    };

    let type_parameters = match class.signature().map_err(|e| class_err(path)(e.into()))? {
        Some(signature) => parse_class_signature(signature)
            .map_err(signature_err(path))?
            .type_parameters
            .into_iter()
            .map(|p| TypeParam {
                name: p.name,
                bounds: p.bounds.iter().map(kotlin_type_name).collect(),
            })
            .collect(),
        None => Vec::new(),
    };

    // Kotlin emits `<init>(declared..., int mask..., DefaultConstructorMarker)`
    // next to the real constructor when parameters have default values.
    let mut default_prefixes: Vec<String> = Vec::new();
    let mut constructors: Vec<(String, ConstructorDecl)> = Vec::new();
    let mut methods = Vec::new();
    for method in &class.methods {
        let method_name = method.name(pool).map_err(|e| class_err(path)(e.into()))?;
        let descriptor = method.descriptor(pool).map_err(|e| class_err(path)(e.into()))?;
        match method_name {
            "<init>" => {
                if method.has_flags(access::SYNTHETIC)
                    && descriptor.ends_with(&format!("{})V", DEFAULT_CONSTRUCTOR_MARKER))
                {
                    let end = descriptor.len() - DEFAULT_CONSTRUCTOR_MARKER.len() - 2;
                    default_prefixes.push(descriptor[..end].to_string());
                    continue;
                }
                if method.has_flags(access::SYNTHETIC) {
                    continue;
                }
                constructors.push((
                    descriptor.to_string(),
                    constructor_from_method(class, method, path)?,
                ));
            }
            "<clinit>" => {}
            _ => {
                let annotations: Vec<AnnotationRef> = method
                    .annotations(pool)
                    .map_err(class_err(path))?
                    .iter()
                    .map(annotation_ref)
                    .collect();
                if !annotations.is_empty() {
                    methods.push(MethodDecl {
                        name: method_name.to_string(),
                        modifiers: member_modifiers(method.access_flags),
                        annotations,
                    });
                }
            }
        }
    }
    for (descriptor, constructor) in constructors.iter_mut() {
        let params = descriptor.trim_end_matches(")V");
        // The synthetic variant is the declared list followed by int masks only
        constructor.has_default_values = params != "("
            && default_prefixes.iter().any(|prefix| {
                prefix
                    .strip_prefix(params)
                    .map_or(false, |masks| !masks.is_empty() && masks.chars().all(|c| c == 'I'))
            });
    }

    let superclass = class
        .super_name()
        .map_err(|e| class_err(path)(e.into()))?
        .map(|s| ClassName::from_internal(s).qualified());
    let interfaces = class
        .interface_names()
        .map_err(|e| class_err(path)(e.into()))?
        .into_iter()
        .map(|s| ClassName::from_internal(s).qualified())
        .collect();

    Ok(UnlinkedType {
        decl: TypeDecl {
            name,
            kind,
            modifiers: member_modifiers(class.access_flags)
                .into_iter()
                .filter(|m| *m != Modifier::Static)
                .collect(),
            superclass: crate::model::SuperRef::None,
            interfaces: Vec::new(),
            type_parameters,
            constructors: constructors.into_iter().map(|(_, c)| c).collect(),
            methods,
            annotations: annotations.iter().map(annotation_ref).collect(),
            language,
        },
        superclass,
        interfaces,
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_class_bytes(bytes: &[u8], path: &Path) -> Result<UnlinkedType, LoadError> {
    let class = ClassFile::decode(bytes).map_err(class_err(path))?;
    type_from_class(&class, path)
}

fn is_class_entry(name: &str) -> bool {
    name.ends_with(".class") && !name.ends_with("module-info.class") && !name.ends_with("package-info.class")
}

fn load_jar(path: &Path, out: &mut Vec<UnlinkedType>) -> Result<(), LoadError> {
    let archive_err = |source| LoadError::Archive {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(archive_err)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(archive_err)?;
        if entry.is_dir() || !is_class_entry(entry.name()) {
            continue;
        }
        let entry_path = PathBuf::from(format!("{}!/{}", path.display(), entry.name()));
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes).map_err(|source| LoadError::Io {
            path: entry_path.clone(),
            source,
        })?;
        out.push(load_class_bytes(&bytes, &entry_path)?);
    }
    Ok(())
}

fn load_into(path: &Path, out: &mut Vec<UnlinkedType>) -> Result<(), LoadError> {
    if path.is_dir() {
        let mut entries: Vec<PathBuf> = fs::read_dir(path)
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        entries.sort();
        for entry in entries {
            let skip = entry.is_file()
                && (entry.file_name().map_or(false, |n| n == CONFIG_FILE)
                    || !matches!(
                        extension(&entry).as_deref(),
                        Some("class" | "jar" | "toml" | "json")
                    ));
            if !skip {
                load_into(&entry, out)?;
            }
        }
        return Ok(());
    }

    match extension(path).as_deref() {
        Some("class") => {
            let bytes = read_file(path)?;
            out.push(load_class_bytes(&bytes, path)?);
        }
        Some("jar") | Some("zip") => load_jar(path, out)?,
        Some("toml") => {
            let bytes = read_file(path)?;
            let contents = String::from_utf8_lossy(&bytes);
            out.extend(parse_toml_declarations(&contents).map_err(|source| LoadError::Toml {
                path: path.to_path_buf(),
                source,
            })?);
        }
        Some("json") => {
            let bytes = read_file(path)?;
            out.extend(
                serde_json::from_slice::<DeclarationFile>(&bytes)
                    .map_err(|source| LoadError::Json {
                        path: path.to_path_buf(),
                        source,
                    })?
                    .types
                    .into_iter()
                    .map(TypeSource::into_unlinked),
            );
        }
        _ => return Err(LoadError::Unsupported(path.to_path_buf())),
    }
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Load every type reachable from `paths` and link them into one graph
pub fn load_graph(paths: &[PathBuf]) -> Result<TypeGraph, LoadError> {
    let mut types = Vec::new();
    for path in paths {
        let before = types.len();
        load_into(path, &mut types)?;
        debug!("Loaded {} types from {}", types.len() - before, path.display());
    }
    Ok(TypeGraph::link(types))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SuperRef, TypeUniverse};
    use permisos_classfile::builder::ClassBuilder;
    use permisos_classfile::opcode::RETURN;
    use permisos_classfile::CodeAttribute;

    #[test]
    fn test_toml_declarations() {
        let toml = r#"
[[types]]
name = "android.app.Activity"

[[types]]
name = "com.example.LoginActivity"
superclass = "android.app.Activity"
language = "kotlin"
modifiers = ["public"]
annotations = [{ name = "cn.nikeo.permisos.weaving.Permisos" }]

[[types.constructors]]
modifiers = ["public"]
parameters = [{ name = "layout", type = "Int" }]
"#;
        let graph = TypeGraph::link(parse_toml_declarations(toml).unwrap());
        let login = graph.lookup("com.example.LoginActivity").unwrap();
        let activity = graph.lookup("android.app.Activity").unwrap();
        let decl = graph.decl(login);
        assert_eq!(decl.superclass, SuperRef::Declared(activity));
        assert_eq!(decl.language, Language::Kotlin);
        assert!(decl.has_annotation("cn.nikeo.permisos.weaving.Permisos"));
        assert_eq!(decl.constructors[0].parameters[0].ty, "Int");
    }

    #[test]
    fn test_json_declarations() {
        let json = r#"{"types": [{"name": "a.B", "kind": "interface"}]}"#;
        let types = parse_json_declarations(json).unwrap();
        assert_eq!(types[0].decl.kind, DeclKind::Interface);
    }

    #[test]
    fn test_kotlin_type_names() {
        let sig = parse_method_signature("(I[I[Ljava/lang/String;Ljava/util/List<+Ljava/lang/Number;>;Ljava/lang/Object;)V").unwrap();
        let names: Vec<String> = sig.parameters.iter().map(kotlin_type_name).collect();
        assert_eq!(
            names,
            vec![
                "Int",
                "IntArray",
                "Array<String>",
                "java.util.List<out java.lang.Number>",
                "Any"
            ]
        );
    }

    #[test]
    fn test_class_file_constructors_and_defaults() {
        let mut builder = ClassBuilder::new("com/example/KBase", Some("androidx/fragment/app/Fragment")).unwrap();
        builder.add_annotation(KOTLIN_METADATA, true).unwrap();
        let code = CodeAttribute::new(0, 3, vec![RETURN]);
        let real = builder
            .add_method(access::PUBLIC, "<init>", "(Ljava/lang/String;I)V", Some(&code))
            .unwrap();
        builder.set_parameter_names(real, &["title", "count"]).unwrap();
        builder
            .add_parameter_annotation(real, 2, 0, "Lorg/jetbrains/annotations/Nullable;")
            .unwrap();
        builder
            .add_method(
                access::PUBLIC | access::SYNTHETIC,
                "<init>",
                "(Ljava/lang/String;IILkotlin/jvm/internal/DefaultConstructorMarker;)V",
                Some(&code),
            )
            .unwrap();
        let class = builder.finish();

        let unlinked = type_from_class(&class, Path::new("KBase.class")).unwrap();
        assert_eq!(unlinked.superclass.as_deref(), Some("androidx.fragment.app.Fragment"));
        let decl = unlinked.decl;
        assert_eq!(decl.language, Language::Kotlin);
        assert_eq!(decl.constructors.len(), 1);
        let ctor = &decl.constructors[0];
        assert!(ctor.has_default_values);
        assert_eq!(ctor.parameters[0].name, "title");
        assert_eq!(ctor.parameters[0].ty, "String");
        assert!(ctor.parameters[0].nullable);
        assert_eq!(ctor.parameters[1].ty, "Int");
        assert!(!ctor.parameters[1].nullable);
    }

    #[test]
    fn test_class_file_annotations_and_signature() {
        let mut builder = ClassBuilder::new("com/example/Screen$Page", Some("java/lang/Object")).unwrap();
        builder.add_int_annotation("Landroid/annotation/TargetApi;", 23).unwrap();
        builder
            .set_signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
            .unwrap();
        let class = builder.finish();

        let unlinked = type_from_class(&class, Path::new("Screen$Page.class")).unwrap();
        let decl = unlinked.decl;
        assert_eq!(decl.name.qualified(), "com.example.Screen.Page");
        assert_eq!(decl.type_parameters[0].name, "T");
        assert_eq!(decl.type_parameters[0].bounds, vec!["Any"]);
        let target = decl.annotation("android.annotation.TargetApi").unwrap();
        assert_eq!(target.arguments.as_deref(), Some("23"));
    }

    #[test]
    fn test_load_graph_from_directory_and_jar() {
        let dir = tempfile::tempdir().unwrap();
        let classes = dir.path().join("classes");
        fs::create_dir_all(classes.join("com/example")).unwrap();

        let activity = ClassBuilder::new("android/app/Activity", Some("java/lang/Object"))
            .unwrap()
            .finish();
        let jar_path = dir.path().join("android.jar");
        {
            let file = fs::File::create(&jar_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("android/app/Activity.class", options).unwrap();
            std::io::Write::write_all(&mut zip, &activity.encode()).unwrap();
            zip.start_file("META-INF/MANIFEST.MF", options).unwrap();
            zip.finish().unwrap();
        }

        let main = ClassBuilder::new("com/example/Main", Some("android/app/Activity"))
            .unwrap()
            .finish();
        fs::write(classes.join("com/example/Main.class"), main.encode()).unwrap();
        fs::write(classes.join("com/example/notes.txt"), "ignored").unwrap();

        let graph = load_graph(&[jar_path, classes]).unwrap();
        assert_eq!(graph.len(), 2);
        let main = graph.lookup("com.example.Main").unwrap();
        assert!(graph.is_assignable(main, "android.app.Activity"));
    }

    #[test]
    fn test_unsupported_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.yaml");
        fs::write(&path, "").unwrap();
        assert!(matches!(load_graph(&[path]), Err(LoadError::Unsupported(_))));
    }
}
