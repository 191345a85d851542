//! Kotlin code generation
//!
//! - `spec`: structured model of a source unit
//! - `writer`: deterministic rendering of that model
//! - `generator`: builds the interposing type from resolved metadata

pub mod generator;
pub mod spec;
pub mod writer;

pub use generator::{FamilyProfile, GeneratedFile, TypeGenerator};
pub use spec::{CodeBlock, FileSpec, FunSpec, KModifier, ParameterSpec, PropertySpec, TypeSpec};
pub use writer::render_file;
