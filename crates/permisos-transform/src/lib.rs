//! Permisos class transformer
//!
//! After compilation, every class annotated with `@Permisos` is re-parented
//! onto its generated `Permisos_*` type and its direct superclass calls are
//! redirected through it. See [`patcher`] for the per-class rewrite and
//! [`transformer`] for directory and jar handling.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod patcher;
pub mod transformer;

pub use error::{TransformError, TransformResult};
pub use patcher::{splice, BinaryPatcher, ClassIndex};
pub use transformer::{ClassTransformer, TransformOptions, TransformSummary};
