//! Permisos compiler - metadata resolution and interposing type generation
//!
//! For every type annotated with the marker this crate resolves its
//! component family through the declared hierarchy and generates the
//! `Permisos_<Name>` base type implementing the permission protocol.

pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod hierarchy;
pub mod loader;
pub mod metadata;
pub mod model;
pub mod names;
pub mod processor;

pub use codegen::{GeneratedFile, TypeGenerator};
pub use config::{Config, ConfigError, CONFIG_FILE};
pub use diagnostic::{Diagnostic, ErrorHandler};
pub use error::ProcessError;
pub use hierarchy::{ComponentKind, FamilyRule, HierarchyWalker};
pub use loader::{load_graph, LoadError};
pub use metadata::{GeneratedTypeMetadata, HierarchyTrace, MetadataResolver};
pub use model::{TypeDecl, TypeGraph, TypeId, TypeUniverse, UnlinkedType};
pub use names::{generated_internal_name, generated_name, ClassName};
pub use processor::{DirectoryFiler, Filer, MemoryFiler, Processor, RoundOutcome};
