//! Metadata resolution for annotated types
//!
//! [`MetadataResolver::resolve`] validates an annotated type, walks its
//! superclass chain looking for annotated ancestors and classifies the base.
//! Annotated ancestors produce a chained record whose kind is inherited.

use crate::config::Config;
use crate::error::ProcessError;
use crate::hierarchy::{ComponentKind, HierarchyWalker};
use crate::model::{DeclKind, Language, Modifier, SuperRef, TypeId, TypeUniverse};
use crate::names::{generated_name, ClassName};
use rustc_hash::FxHashSet;

/// Types visited while resolving one root, in visit order
#[derive(Debug, Default)]
pub struct HierarchyTrace {
    order: Vec<TypeId>,
    seen: FxHashSet<TypeId>,
}

impl HierarchyTrace {
    /// A trace containing only `root`
    pub fn seeded(root: TypeId) -> Self {
        let mut trace = Self::default();
        trace.insert(root);
        trace
    }

    /// Record a visit; `false` if `id` was already visited
    pub fn insert(&mut self, id: TypeId) -> bool {
        if self.seen.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    /// Whether `id` was visited
    pub fn contains(&self, id: TypeId) -> bool {
        self.seen.contains(&id)
    }

    /// Visits in order
    pub fn iter(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.order.iter().copied()
    }

    /// Number of visits
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing was visited
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Resolved description of one interposing type to generate
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTypeMetadata {
    /// The annotated type
    pub source: TypeId,
    /// Its declared superclass
    pub base: TypeId,
    /// Name of the type to generate
    pub generated_name: ClassName,
    /// Component family
    pub kind: ComponentKind,
    /// Metadata of the nearest annotated ancestor
    pub parent: Option<Box<GeneratedTypeMetadata>>,
    /// Whether the generated type must be explicitly public
    pub public: bool,
}

impl GeneratedTypeMetadata {
    /// Length of the metadata chain, this record included
    pub fn depth(&self) -> usize {
        1 + self.parent.as_ref().map_or(0, |p| p.depth())
    }
}

/// Builds [`GeneratedTypeMetadata`] from the introspection surface
pub struct MetadataResolver<'a, U: TypeUniverse + ?Sized> {
    universe: &'a U,
    config: &'a Config,
    marker: String,
}

impl<'a, U: TypeUniverse + ?Sized> MetadataResolver<'a, U> {
    /// Create a resolver
    pub fn new(universe: &'a U, config: &'a Config) -> Self {
        Self {
            universe,
            config,
            marker: config.marker_simple_name(),
        }
    }

    /// Resolve metadata for the annotated type `root`
    pub fn resolve(&self, root: TypeId) -> Result<GeneratedTypeMetadata, ProcessError> {
        let mut trace = HierarchyTrace::seeded(root);
        self.resolve_in(root, &mut trace)
    }

    fn resolve_in(
        &self,
        element: TypeId,
        trace: &mut HierarchyTrace,
    ) -> Result<GeneratedTypeMetadata, ProcessError> {
        let decl = self.universe.decl(element);
        let element_name = decl.name.qualified();

        if !decl.has_annotation(&self.config.marker) {
            return Err(ProcessError::bad_input(
                format!("{} is not annotated with @{}", element_name, self.marker),
                element_name,
            ));
        }
        if decl.kind != DeclKind::Class {
            return Err(ProcessError::bad_input(
                format!("Only classes can be annotated with @{}", self.marker),
                element_name,
            ));
        }
        if !decl.type_parameters.is_empty() {
            return Err(ProcessError::bad_input(
                format!("@{}-annotated classes cannot have type parameters.", self.marker),
                element_name,
            ));
        }

        let base = match &decl.superclass {
            SuperRef::Declared(base) => *base,
            SuperRef::Unresolved(name) => {
                return Err(ProcessError::ErrorType {
                    name: name.clone(),
                    element: element_name,
                })
            }
            SuperRef::None => {
                return Err(ProcessError::UnsupportedBaseType {
                    message: format!(
                        "@{} base class must extend ComponentActivity, (support) Fragment.",
                        self.marker
                    ),
                    element: element_name,
                })
            }
        };
        let base_decl = self.universe.decl(base);

        // Bytecode rewriting cannot follow the synthetic constructors Kotlin
        // emits for default values.
        if decl.language == Language::Kotlin
            && base_decl.language == Language::Kotlin
            && base_decl.has_constructor_with_defaults()
        {
            return Err(ProcessError::UnsupportedDefaultParameters {
                marker: self.marker.clone(),
                base: base_decl.name.qualified(),
                source_type: element_name,
            });
        }

        let generated_name = generated_name(&decl.name, &self.config.prefix);
        let public = decl.language == Language::Kotlin && decl.has_modifier(Modifier::Public);

        let parent = self.base_metadata(element, base, trace)?;
        let kind = match &parent {
            Some(parent) => parent.kind,
            None => HierarchyWalker::new(self.universe, &self.config.families, &self.marker)
                .classify(element, base)?,
        };

        Ok(GeneratedTypeMetadata {
            source: element,
            base,
            generated_name,
            kind,
            parent: parent.map(Box::new),
            public,
        })
    }

    fn base_metadata(
        &self,
        element: TypeId,
        base: TypeId,
        trace: &mut HierarchyTrace,
    ) -> Result<Option<GeneratedTypeMetadata>, ProcessError> {
        if !trace.insert(base) {
            return Err(ProcessError::CyclicInheritance {
                marker: self.marker.clone(),
                trace: trace.iter().map(|id| self.universe.name_of(id)).collect(),
                repeated: self.universe.name_of(base),
                element: self.universe.name_of(element),
            });
        }

        let base_decl = self.universe.decl(base);
        if base_decl.has_annotation(&self.config.marker) {
            return self.resolve_in(base, trace).map(Some);
        }

        match &base_decl.superclass {
            SuperRef::Declared(next) => self.base_metadata(element, *next, trace),
            SuperRef::None | SuperRef::Unresolved(_) => Ok(None),
        }
    }
}
