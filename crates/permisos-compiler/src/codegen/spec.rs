//! In-memory model of a Kotlin source unit
//!
//! Types are spelled as strings exactly as they should appear in source;
//! import management is explicit on [`FileSpec`].

use std::collections::BTreeSet;

/// Declaration modifiers, in Kotlin's conventional order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KModifier {
    #[allow(missing_docs)]
    Public,
    #[allow(missing_docs)]
    Protected,
    #[allow(missing_docs)]
    Private,
    #[allow(missing_docs)]
    Internal,
    #[allow(missing_docs)]
    Abstract,
    #[allow(missing_docs)]
    Open,
    #[allow(missing_docs)]
    Override,
    #[allow(missing_docs)]
    Vararg,
}

impl KModifier {
    /// Source keyword
    pub fn keyword(self) -> &'static str {
        match self {
            KModifier::Public => "public",
            KModifier::Protected => "protected",
            KModifier::Private => "private",
            KModifier::Internal => "internal",
            KModifier::Abstract => "abstract",
            KModifier::Open => "open",
            KModifier::Override => "override",
            KModifier::Vararg => "vararg",
        }
    }
}

/// An annotation use, e.g. `@TargetApi(23)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSpec {
    /// Type as spelled in source
    pub name: String,
    /// Arguments between parentheses
    pub arguments: Option<String>,
}

impl AnnotationSpec {
    /// Annotation without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }

    /// Annotation with an argument list
    pub fn with_arguments(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Some(arguments.into()),
        }
    }
}

/// A formal type parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVariable {
    /// Name
    pub name: String,
    /// Upper bounds
    pub bounds: Vec<String>,
}

/// A function or constructor parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Name
    pub name: String,
    /// Type
    pub ty: String,
    /// Modifiers (`vararg`)
    pub modifiers: Vec<KModifier>,
}

impl ParameterSpec {
    /// A plain parameter
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            modifiers: Vec::new(),
        }
    }

    /// A `vararg` parameter
    pub fn vararg(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            modifiers: vec![KModifier::Vararg],
            ..Self::new(name, ty)
        }
    }
}

/// A block of statements with structured indentation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlock {
    lines: Vec<(usize, String)>,
    depth: usize,
}

impl CodeBlock {
    /// Empty block
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one statement line
    pub fn statement(mut self, line: impl Into<String>) -> Self {
        self.lines.push((self.depth, line.into()));
        self
    }

    /// Add an empty line
    pub fn blank(mut self) -> Self {
        self.lines.push((0, String::new()));
        self
    }

    /// Open `header {` and indent
    pub fn begin_control_flow(mut self, header: impl Into<String>) -> Self {
        self.lines.push((self.depth, format!("{} {{", header.into())));
        self.depth += 1;
        self
    }

    /// Close the current block and open `} header {`
    pub fn next_control_flow(mut self, header: impl Into<String>) -> Self {
        self.depth = self.depth.saturating_sub(1);
        self.lines.push((self.depth, format!("}} {} {{", header.into())));
        self.depth += 1;
        self
    }

    /// Close the current block
    pub fn end_control_flow(mut self) -> Self {
        self.depth = self.depth.saturating_sub(1);
        self.lines.push((self.depth, "}".to_string()));
        self
    }

    /// Indent following lines without emitting a brace
    pub fn indent(mut self) -> Self {
        self.depth += 1;
        self
    }

    /// Undo [`CodeBlock::indent`]
    pub fn unindent(mut self) -> Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    /// Lines with their relative indentation
    pub fn lines(&self) -> &[(usize, String)] {
        &self.lines
    }

    /// Whether the block has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A property declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    /// Name
    pub name: String,
    /// Type
    pub ty: String,
    /// Modifiers
    pub modifiers: Vec<KModifier>,
    /// `var` rather than `val`
    pub mutable: bool,
    /// `= expr`
    pub initializer: Option<String>,
    /// `by expr`
    pub delegate: Option<String>,
    /// `get() = expr`
    pub getter: Option<String>,
}

impl PropertySpec {
    /// A read-only property with no initializer
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            modifiers: Vec::new(),
            mutable: false,
            initializer: None,
            delegate: None,
            getter: None,
        }
    }

    /// Add a modifier
    pub fn modifier(mut self, modifier: KModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Make the property a `var`
    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }

    /// Set the initializer expression
    pub fn initializer(mut self, expr: impl Into<String>) -> Self {
        self.initializer = Some(expr.into());
        self
    }

    /// Set the delegate expression
    pub fn delegate(mut self, expr: impl Into<String>) -> Self {
        self.delegate = Some(expr.into());
        self
    }

    /// Set a single-expression getter
    pub fn getter(mut self, expr: impl Into<String>) -> Self {
        self.getter = Some(expr.into());
        self
    }
}

/// Function or secondary constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunKind {
    /// `fun name(...)`
    Function,
    /// `constructor(...)`
    Constructor,
}

/// A function or constructor declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunSpec {
    /// Name (ignored for constructors)
    pub name: String,
    /// Function or constructor
    pub kind: FunKind,
    /// Annotations
    pub annotations: Vec<AnnotationSpec>,
    /// Modifiers
    pub modifiers: Vec<KModifier>,
    /// Parameters
    pub parameters: Vec<ParameterSpec>,
    /// Return type; `None` means `Unit`
    pub return_type: Option<String>,
    /// Arguments of the `: super(...)` delegation (constructors only)
    pub super_call: Option<Vec<String>>,
    /// Body
    pub body: CodeBlock,
}

impl FunSpec {
    /// A function named `name`
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FunKind::Function,
            annotations: Vec::new(),
            modifiers: Vec::new(),
            parameters: Vec::new(),
            return_type: None,
            super_call: None,
            body: CodeBlock::new(),
        }
    }

    /// A secondary constructor
    pub fn constructor() -> Self {
        Self {
            kind: FunKind::Constructor,
            ..Self::function("constructor")
        }
    }

    /// Add a modifier
    pub fn modifier(mut self, modifier: KModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Add an annotation
    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Add a parameter
    pub fn parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Delegate to `super(args)`
    pub fn call_super(mut self, arguments: Vec<String>) -> Self {
        self.super_call = Some(arguments);
        self
    }

    /// Set the body
    pub fn body(mut self, body: CodeBlock) -> Self {
        self.body = body;
        self
    }
}

/// A class declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    /// Simple name
    pub name: String,
    /// KDoc text, without comment markers
    pub kdoc: Option<String>,
    /// Annotations
    pub annotations: Vec<AnnotationSpec>,
    /// Modifiers
    pub modifiers: Vec<KModifier>,
    /// Type parameters
    pub type_variables: Vec<TypeVariable>,
    /// Primary constructor parameters, rendered as `val` properties
    pub primary_properties: Vec<ParameterSpec>,
    /// Superclass type
    pub superclass: Option<String>,
    /// Whether the superclass is constructed inline (`Base()`)
    pub superclass_initialized: bool,
    /// Implemented interfaces
    pub superinterfaces: Vec<String>,
    /// Properties
    pub properties: Vec<PropertySpec>,
    /// Functions and secondary constructors
    pub functions: Vec<FunSpec>,
    /// Nested types
    pub types: Vec<TypeSpec>,
}

impl TypeSpec {
    /// An empty class named `name`
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kdoc: None,
            annotations: Vec::new(),
            modifiers: Vec::new(),
            type_variables: Vec::new(),
            primary_properties: Vec::new(),
            superclass: None,
            superclass_initialized: false,
            superinterfaces: Vec::new(),
            properties: Vec::new(),
            functions: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Secondary constructors, in declaration order
    pub fn constructors(&self) -> impl Iterator<Item = &FunSpec> {
        self.functions
            .iter()
            .filter(|f| f.kind == FunKind::Constructor)
    }
}

/// A source unit: package, imports and top-level types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    /// Package name (may be empty)
    pub package: String,
    /// File name without extension
    pub name: String,
    /// Leading line comment
    pub comment: Option<String>,
    /// Imported qualified names, kept sorted
    pub imports: BTreeSet<String>,
    /// Top-level types
    pub types: Vec<TypeSpec>,
}

impl FileSpec {
    /// An empty file
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            comment: None,
            imports: BTreeSet::new(),
            types: Vec::new(),
        }
    }

    /// Add an import
    pub fn import(&mut self, qualified: impl Into<String>) {
        self.imports.insert(qualified.into());
    }

    /// Path of the unit relative to a source root
    pub fn relative_path(&self) -> String {
        if self.package.is_empty() {
            format!("{}.kt", self.name)
        } else {
            format!("{}/{}.kt", self.package.replace('.', "/"), self.name)
        }
    }
}
