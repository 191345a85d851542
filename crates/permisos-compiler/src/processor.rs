//! Round-based processing driver
//!
//! Every element of a round is attempted even when an earlier one fails.
//! Types whose ancestry does not resolve yet are retried once in the next
//! round; diagnostics are held back until processing is over.

use crate::codegen::{GeneratedFile, TypeGenerator};
use crate::config::Config;
use crate::diagnostic::{Diagnostic, ErrorHandler};
use crate::error::ProcessError;
use crate::hierarchy::{ACTIVITY, COMPONENT_ACTIVITY, FRAGMENT};
use crate::metadata::MetadataResolver;
use crate::model::{DeclKind, TypeId, TypeUniverse};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Destination of generated units
pub trait Filer {
    /// Persist one generated unit
    fn write(&mut self, file: &GeneratedFile) -> io::Result<()>;
}

/// Writes units below a source root
#[derive(Debug)]
pub struct DirectoryFiler {
    root: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectoryFiler {
    /// Filer rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Vec::new(),
        }
    }

    /// Output root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl Filer for DirectoryFiler {
    fn write(&mut self, file: &GeneratedFile) -> io::Result<()> {
        let path = file.write_to(&self.root)?;
        self.written.push(path);
        Ok(())
    }
}

/// Keeps units in memory, keyed by relative path
#[derive(Debug, Default)]
pub struct MemoryFiler {
    /// Contents by relative path
    pub files: BTreeMap<String, String>,
}

impl Filer for MemoryFiler {
    fn write(&mut self, file: &GeneratedFile) -> io::Result<()> {
        self.files
            .insert(file.relative_path.clone(), file.contents.clone());
        Ok(())
    }
}

/// What one round did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Qualified names of the types generated this round
    pub generated: Vec<String>,
    /// Elements deferred to the next round
    pub deferred: usize,
    /// Whether any element failed this round
    pub round_error: bool,
}

/// Resolves, validates and generates for annotated types over one or more rounds
pub struct Processor<'c> {
    config: &'c Config,
    errors: ErrorHandler,
    deferred: Vec<TypeId>,
    processed: FxHashSet<TypeId>,
}

impl<'c> Processor<'c> {
    /// Create a processor
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            errors: ErrorHandler::new(config.marker_simple_name()),
            deferred: Vec::new(),
            processed: FxHashSet::default(),
        }
    }

    /// Diagnostics recorded so far
    pub fn errors(&self) -> &ErrorHandler {
        &self.errors
    }

    /// Elements waiting for the next round
    pub fn deferred(&self) -> &[TypeId] {
        &self.deferred
    }

    /// Elements a round should look at: marked types and owners of guarded methods
    pub fn elements_of<U: TypeUniverse + ?Sized>(&self, universe: &U) -> Vec<TypeId> {
        universe
            .type_ids()
            .into_iter()
            .filter(|&id| {
                let decl = universe.decl(id);
                decl.has_annotation(&self.config.marker)
                    || decl.methods.iter().any(|m| {
                        m.annotations
                            .iter()
                            .any(|a| a.name.qualified() == self.config.required_permissions)
                    })
            })
            .collect()
    }

    /// Process the deferred elements of the previous round plus `elements`
    ///
    /// When `processing_over` is set nothing is deferred any more and all
    /// recorded diagnostics are returned as the error.
    pub fn process_round<U, F>(
        &mut self,
        universe: &U,
        elements: &[TypeId],
        processing_over: bool,
        filer: &mut F,
    ) -> Result<RoundOutcome, Vec<Diagnostic>>
    where
        U: TypeUniverse + ?Sized,
        F: Filer + ?Sized,
    {
        let mut outcome = RoundOutcome::default();

        let mut queue = std::mem::take(&mut self.deferred);
        for &element in elements {
            if !queue.contains(&element) {
                queue.push(element);
            }
        }

        for element in queue {
            if self.processed.contains(&element) {
                continue;
            }
            match self.process_each(universe, element, filer) {
                Ok(generated) => {
                    self.processed.insert(element);
                    outcome.generated.extend(generated);
                }
                Err(e) if e.is_deferrable() && !processing_over => {
                    debug!(
                        "Deferring {} to the next round: {}",
                        universe.name_of(element),
                        e
                    );
                    self.deferred.push(element);
                }
                Err(e) => {
                    self.errors.record(&e);
                    self.processed.insert(element);
                    outcome.round_error = true;
                }
            }
        }
        outcome.deferred = self.deferred.len();

        if processing_over {
            self.errors.check_errors()?;
        }
        Ok(outcome)
    }

    /// Run a single-pass build: one regular round, then a final round
    pub fn run<U, F>(&mut self, universe: &U, filer: &mut F) -> Result<Vec<String>, Vec<Diagnostic>>
    where
        U: TypeUniverse + ?Sized,
        F: Filer + ?Sized,
    {
        let elements = self.elements_of(universe);
        let mut generated = self.process_round(universe, &elements, false, filer)?.generated;
        generated.extend(self.process_round(universe, &[], true, filer)?.generated);
        Ok(generated)
    }

    fn process_each<U, F>(
        &self,
        universe: &U,
        element: TypeId,
        filer: &mut F,
    ) -> Result<Option<String>, ProcessError>
    where
        U: TypeUniverse + ?Sized,
        F: Filer + ?Sized,
    {
        self.check_required_permissions(universe, element)?;

        let decl = universe.decl(element);
        if !decl.has_annotation(&self.config.marker) {
            return Ok(None);
        }
        let metadata = MetadataResolver::new(universe, self.config).resolve(element)?;
        let file = TypeGenerator::new(universe).generate(&metadata)?;
        filer.write(&file)?;
        info!("Generated {} for {}", file.name, decl.name);
        Ok(Some(file.name.qualified()))
    }

    /// Validate the owner of methods carrying the method-level annotation
    fn check_required_permissions<U: TypeUniverse + ?Sized>(
        &self,
        universe: &U,
        owner: TypeId,
    ) -> Result<(), ProcessError> {
        let decl = universe.decl(owner);
        let Some(method) = decl.methods.iter().find(|m| {
            m.annotations
                .iter()
                .any(|a| a.name.qualified() == self.config.required_permissions)
        }) else {
            return Ok(());
        };
        let annotation = self.config.required_permissions_simple_name();
        let owner_name = decl.name.qualified();

        if decl.kind != DeclKind::Class {
            return Err(ProcessError::bad_input(
                format!("The method annotated by @{} must be in a class", annotation),
                format!("{}.{}", owner_name, method.name),
            ));
        }
        let prefix = format!(
            "A class that contains methods annotated by @{} must be a subclass of \
             androidx.activity.ComponentActivity. (e.g. FragmentActivity, AppCompatActivity, etc.)",
            annotation
        );
        if universe.is_assignable(owner, ACTIVITY) {
            if !universe.is_assignable(owner, COMPONENT_ACTIVITY) {
                return Err(ProcessError::bad_input(prefix, owner_name));
            }
        } else if !universe.is_assignable(owner, FRAGMENT) {
            return Err(ProcessError::bad_input(
                format!("{} or Fragment", prefix),
                owner_name,
            ));
        }
        if !decl.has_annotation(&self.config.marker) {
            return Err(ProcessError::bad_input(
                format!(
                    "A class that contains methods annotated by @{} must be annotated by @{}.",
                    annotation, self.config.marker
                ),
                owner_name,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnnotationRef, MethodDecl, TypeDecl, TypeGraph, UnlinkedType};
    use crate::names::ClassName;

    const MARKER: &str = "cn.nikeo.permisos.weaving.Permisos";
    const REQUIRED: &str = "cn.nikeo.permisos.weaving.RequiredPermissions";

    fn unlinked(name: &str, superclass: Option<&str>) -> UnlinkedType {
        UnlinkedType {
            decl: TypeDecl::class(ClassName::parse_qualified(name)),
            superclass: superclass.map(str::to_string),
            interfaces: Vec::new(),
        }
    }

    fn marked(name: &str, superclass: &str) -> UnlinkedType {
        let mut ty = unlinked(name, Some(superclass));
        ty.decl
            .annotations
            .push(AnnotationRef::marker(ClassName::parse_qualified(MARKER)));
        ty
    }

    fn with_guarded_method(mut ty: UnlinkedType) -> UnlinkedType {
        ty.decl.methods.push(MethodDecl {
            name: "takePhoto".to_string(),
            modifiers: Vec::new(),
            annotations: vec![AnnotationRef {
                name: ClassName::parse_qualified(REQUIRED),
                arguments: Some("requestCode = 1, permissions = [\"android.permission.CAMERA\"]".to_string()),
            }],
        });
        ty
    }

    fn android() -> Vec<UnlinkedType> {
        vec![
            unlinked(ACTIVITY, None),
            unlinked(COMPONENT_ACTIVITY, Some(ACTIVITY)),
            unlinked(FRAGMENT, None),
            unlinked("android.view.View", None),
        ]
    }

    #[test]
    fn test_run_generates_every_marked_type() {
        let mut types = android();
        types.push(marked("com.example.A", COMPONENT_ACTIVITY));
        types.push(with_guarded_method(marked("com.example.B", FRAGMENT)));
        let graph = TypeGraph::link(types);
        let config = Config::default();
        let mut filer = MemoryFiler::default();

        let generated = Processor::new(&config).run(&graph, &mut filer).unwrap();
        assert_eq!(generated, vec!["com.example.Permisos_A", "com.example.Permisos_B"]);
        assert!(filer.files.contains_key("com/example/Permisos_A.kt"));
        assert!(filer.files.contains_key("com/example/Permisos_B.kt"));
    }

    #[test]
    fn test_duplicate_declaration_processed_once() {
        let mut types = android();
        types.push(marked("com.example.A", COMPONENT_ACTIVITY));
        // Same class seen again from a second input, with a different base
        types.push(marked("com.example.A", FRAGMENT));
        let graph = TypeGraph::link(types);
        let config = Config::default();
        let mut filer = MemoryFiler::default();

        let mut processor = Processor::new(&config);
        assert_eq!(processor.elements_of(&graph).len(), 1);
        let generated = processor.run(&graph, &mut filer).unwrap();
        assert_eq!(generated, vec!["com.example.Permisos_A"]);

        let source = &filer.files["com/example/Permisos_A.kt"];
        assert!(source.contains("ActivityCompat.requestPermissions"));
    }

    #[test]
    fn test_errors_are_delayed_and_accumulated() {
        let mut types = android();
        types.push(marked("com.example.Bad1", "android.view.View"));
        types.push(marked("com.example.Good", COMPONENT_ACTIVITY));
        types.push(marked("com.example.Bad2", ACTIVITY));
        let graph = TypeGraph::link(types);
        let config = Config::default();
        let mut filer = MemoryFiler::default();
        let mut processor = Processor::new(&config);
        let elements = processor.elements_of(&graph);

        let outcome = processor
            .process_round(&graph, &elements, false, &mut filer)
            .unwrap();
        assert!(outcome.round_error);
        assert_eq!(outcome.generated, vec!["com.example.Permisos_Good"]);
        assert_eq!(processor.errors().diagnostics().len(), 2);

        let diagnostics = processor.process_round(&graph, &[], true, &mut filer).unwrap_err();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].elements, vec!["com.example.Bad1"]);
        assert_eq!(diagnostics[1].elements, vec!["com.example.Bad2"]);
    }

    #[test]
    fn test_unresolved_supertype_deferred_once() {
        let mut types = android();
        types.push(marked("com.example.Late", "com.example.NotYetGenerated"));
        let graph = TypeGraph::link(types);
        let config = Config::default();
        let mut filer = MemoryFiler::default();
        let mut processor = Processor::new(&config);
        let elements = processor.elements_of(&graph);

        let outcome = processor
            .process_round(&graph, &elements, false, &mut filer)
            .unwrap();
        assert_eq!(outcome.deferred, 1);
        assert!(!outcome.round_error);
        assert!(!processor.errors().has_errors());

        let diagnostics = processor.process_round(&graph, &[], true, &mut filer).unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("com.example.NotYetGenerated"));
    }

    #[test]
    fn test_deferred_element_resolves_in_later_round() {
        let config = Config::default();
        let mut filer = MemoryFiler::default();
        let mut processor = Processor::new(&config);

        let mut types = android();
        types.push(marked("com.example.Late", "com.example.Base"));
        let first = TypeGraph::link(types.clone());
        let late = first.lookup("com.example.Late").unwrap();
        processor
            .process_round(&first, &[late], false, &mut filer)
            .unwrap();
        assert_eq!(processor.deferred(), &[late]);

        // Same insertion order, so `late` keeps its id
        types.push(unlinked("com.example.Base", Some(FRAGMENT)));
        let second = TypeGraph::link(types);
        let outcome = processor.process_round(&second, &[], true, &mut filer).unwrap();
        assert_eq!(outcome.generated, vec!["com.example.Permisos_Late"]);
    }

    #[test]
    fn test_required_permissions_validation() {
        let mut types = android();
        types.push(with_guarded_method(unlinked("com.example.Plain", Some(ACTIVITY))));
        types.push(with_guarded_method(unlinked("com.example.Widget", Some("android.view.View"))));
        types.push(with_guarded_method(unlinked("com.example.Unmarked", Some(FRAGMENT))));
        let mut iface = with_guarded_method(unlinked("com.example.Api", None));
        iface.decl.kind = DeclKind::Interface;
        types.push(iface);
        let graph = TypeGraph::link(types);
        let config = Config::default();
        let mut filer = MemoryFiler::default();

        let diagnostics = Processor::new(&config).run(&graph, &mut filer).unwrap_err();
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "A class that contains methods annotated by @RequiredPermissions must be a subclass of androidx.activity.ComponentActivity. (e.g. FragmentActivity, AppCompatActivity, etc.)",
                "A class that contains methods annotated by @RequiredPermissions must be a subclass of androidx.activity.ComponentActivity. (e.g. FragmentActivity, AppCompatActivity, etc.) or Fragment",
                "A class that contains methods annotated by @RequiredPermissions must be annotated by @cn.nikeo.permisos.weaving.Permisos.",
                "The method annotated by @RequiredPermissions must be in a class",
            ]
        );
        assert_eq!(diagnostics[3].elements, vec!["com.example.Api.takePhoto"]);
        assert!(filer.files.is_empty());
    }
}
