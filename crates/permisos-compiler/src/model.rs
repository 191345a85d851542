//! Type introspection surface
//!
//! The resolver and generator never look at source or bytecode directly.
//! They query declared types through [`TypeUniverse`]; [`TypeGraph`] is the
//! arena-backed implementation populated by the loaders.

use crate::names::ClassName;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Universal root type
pub const JAVA_OBJECT: &str = "java.lang.Object";

/// Handle to a declared type inside a [`TypeUniverse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    /// Arena index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Class or interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    /// A class (abstract or concrete)
    #[default]
    Class,
    /// An interface
    Interface,
    /// An annotation type
    Annotation,
    /// An enum
    Enum,
}

/// Declaring language of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Java (or unknown)
    #[default]
    Java,
    /// Kotlin (carries `kotlin.Metadata`)
    Kotlin,
}

/// Declaration modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
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
    Final,
    #[allow(missing_docs)]
    Open,
    #[allow(missing_docs)]
    Static,
}

/// Superclass link of a declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuperRef {
    /// No superclass (the universal root, or an interface)
    None,
    /// A type present in the universe
    Declared(TypeId),
    /// A name that did not resolve (an error type)
    Unresolved(String),
}

/// An annotation use: type plus rendered arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRef {
    /// Annotation type
    pub name: ClassName,
    /// Argument list as it appears between parentheses, if any (e.g. `23`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl AnnotationRef {
    /// Annotation without arguments
    pub fn marker(name: ClassName) -> Self {
        Self {
            name,
            arguments: None,
        }
    }
}

/// A constructor or method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Type as spelled in generated source (e.g. `android.content.Context`)
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether the parameter is nullable
    #[serde(default)]
    pub nullable: bool,
}

/// A declared constructor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConstructorDecl {
    /// Modifiers
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Parameters in order
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Annotations on the constructor
    #[serde(default)]
    pub annotations: Vec<AnnotationRef>,
    /// Whether any parameter declares a default value (Kotlin)
    #[serde(default)]
    pub has_default_values: bool,
}

impl ConstructorDecl {
    /// Whether the constructor is private
    pub fn is_private(&self) -> bool {
        self.modifiers.contains(&Modifier::Private)
    }
}

/// A declared method (only what annotation validation needs)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Modifiers
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Annotations on the method
    #[serde(default)]
    pub annotations: Vec<AnnotationRef>,
}

/// A formal type parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParam {
    /// Parameter name
    pub name: String,
    /// Bounds, as spelled in generated source
    #[serde(default)]
    pub bounds: Vec<String>,
}

/// A declared type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    /// Name
    pub name: ClassName,
    /// Class or interface
    pub kind: DeclKind,
    /// Modifiers
    pub modifiers: Vec<Modifier>,
    /// Superclass link
    pub superclass: SuperRef,
    /// Direct superinterfaces
    pub interfaces: Vec<SuperRef>,
    /// Formal type parameters
    pub type_parameters: Vec<TypeParam>,
    /// Declared constructors
    pub constructors: Vec<ConstructorDecl>,
    /// Declared methods
    pub methods: Vec<MethodDecl>,
    /// Annotations on the type
    pub annotations: Vec<AnnotationRef>,
    /// Declaring language
    pub language: Language,
}

impl TypeDecl {
    /// A plain public Java class with no members
    pub fn class(name: ClassName) -> Self {
        Self {
            name,
            kind: DeclKind::Class,
            modifiers: vec![Modifier::Public],
            superclass: SuperRef::None,
            interfaces: Vec::new(),
            type_parameters: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
            language: Language::Java,
        }
    }

    /// Whether the type carries an annotation of the given qualified name
    pub fn has_annotation(&self, qualified: &str) -> bool {
        self.annotation(qualified).is_some()
    }

    /// Find an annotation by qualified name
    pub fn annotation(&self, qualified: &str) -> Option<&AnnotationRef> {
        self.annotations
            .iter()
            .find(|a| a.name.qualified() == qualified)
    }

    /// Whether the type has the given modifier
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Whether any constructor declares default parameter values
    pub fn has_constructor_with_defaults(&self) -> bool {
        self.constructors.iter().any(|c| c.has_default_values)
    }
}

/// Read-only introspection over declared types
pub trait TypeUniverse {
    /// The declaration behind a handle
    fn decl(&self, id: TypeId) -> &TypeDecl;

    /// Find a type by qualified name
    fn lookup(&self, qualified: &str) -> Option<TypeId>;

    /// Every type in the universe, in insertion order
    fn type_ids(&self) -> Vec<TypeId>;

    /// Qualified name of a type
    fn name_of(&self, id: TypeId) -> String {
        self.decl(id).name.qualified()
    }

    /// Whether `id` is `target` or a (transitive) subtype of it
    ///
    /// Walks superclasses and superinterfaces; a type seen twice stops the
    /// walk, so cyclic declarations terminate.
    fn is_assignable(&self, id: TypeId, target: &str) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let decl = self.decl(current);
            if decl.name.qualified() == target {
                return true;
            }
            let supers = std::iter::once(&decl.superclass).chain(decl.interfaces.iter());
            for link in supers {
                match link {
                    SuperRef::Declared(next) => stack.push(*next),
                    SuperRef::Unresolved(name) if name == target => return true,
                    _ => {}
                }
            }
        }
        false
    }

    /// Types annotated with the given qualified annotation name
    fn annotated_with(&self, annotation: &str) -> Vec<TypeId> {
        self.type_ids()
            .into_iter()
            .filter(|&id| self.decl(id).has_annotation(annotation))
            .collect()
    }
}

/// Arena-backed [`TypeUniverse`]
#[derive(Debug, Default)]
pub struct TypeGraph {
    decls: Vec<TypeDecl>,
    by_name: FxHashMap<String, TypeId>,
}

/// A type declaration before superclass names are linked
#[derive(Debug, Clone)]
pub struct UnlinkedType {
    /// Declaration; `superclass`/`interfaces` are ignored in favour of the names below
    pub decl: TypeDecl,
    /// Qualified superclass name, if any
    pub superclass: Option<String>,
    /// Qualified superinterface names
    pub interfaces: Vec<String>,
}

impl TypeGraph {
    /// Empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of types
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Whether the graph is empty
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Insert a declaration as-is and return its handle
    ///
    /// The first declaration of a qualified name wins; a later one is
    /// dropped and the existing handle is returned.
    pub fn insert(&mut self, decl: TypeDecl) -> TypeId {
        let name = decl.name.qualified();
        if let Some(&existing) = self.by_name.get(&name) {
            tracing::warn!(type_name = %name, "duplicate declaration ignored");
            return existing;
        }
        let id = TypeId(self.decls.len() as u32);
        self.by_name.insert(name, id);
        self.decls.push(decl);
        id
    }

    /// Mutable access to a declaration
    pub fn decl_mut(&mut self, id: TypeId) -> &mut TypeDecl {
        &mut self.decls[id.index()]
    }

    /// Build a graph from unlinked declarations, resolving names against each other
    ///
    /// `java.lang.Object` as a superclass means "no superclass" unless the
    /// graph declares it. Names that resolve to nothing become
    /// [`SuperRef::Unresolved`].
    pub fn link(types: Vec<UnlinkedType>) -> Self {
        let mut graph = TypeGraph::new();
        let mut pending = Vec::with_capacity(types.len());
        for unlinked in types {
            let before = graph.len();
            let id = graph.insert(unlinked.decl);
            if graph.len() == before {
                continue;
            }
            pending.push((id, unlinked.superclass, unlinked.interfaces));
        }
        for (id, superclass, interfaces) in pending {
            let superclass = match superclass {
                None => SuperRef::None,
                Some(name) => graph.resolve_name(&name),
            };
            let interfaces = interfaces
                .iter()
                .map(|name| graph.resolve_name(name))
                .collect();
            let decl = graph.decl_mut(id);
            decl.superclass = superclass;
            decl.interfaces = interfaces;
        }
        graph
    }

    fn resolve_name(&self, name: &str) -> SuperRef {
        match self.by_name.get(name) {
            Some(&id) => SuperRef::Declared(id),
            None if name == JAVA_OBJECT => SuperRef::None,
            None => SuperRef::Unresolved(name.to_string()),
        }
    }
}

impl TypeUniverse for TypeGraph {
    fn decl(&self, id: TypeId) -> &TypeDecl {
        &self.decls[id.index()]
    }

    fn lookup(&self, qualified: &str) -> Option<TypeId> {
        self.by_name.get(qualified).copied()
    }

    fn type_ids(&self) -> Vec<TypeId> {
        (0..self.decls.len() as u32).map(TypeId).collect()
    }
}
