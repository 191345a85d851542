//! Transformer errors

use permisos_classfile::{ClassFileError, ConstantPoolError, DecodeError};
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for transformer operations
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors raised while splicing classes
#[derive(Debug, Error)]
pub enum TransformError {
    /// The unit is not a readable class file
    #[error("Failed to decode {unit}: {error}")]
    Decode {
        /// Entry name or path of the unit
        unit: String,
        #[source]
        error: ClassFileError,
    },

    /// A method body could not be walked instruction by instruction
    #[error("Malformed code in {class}.{method}: {error}")]
    Code {
        /// Internal name of the class
        class: String,
        /// Method name
        method: String,
        #[source]
        error: DecodeError,
    },

    /// A constant pool index points at the wrong kind of entry
    #[error("Corrupt constant pool reference in {class}: {error}")]
    CorruptReference {
        /// Internal name of the class
        class: String,
        #[source]
        error: ConstantPoolError,
    },

    /// The interposing type was never compiled into the inputs
    #[error(
        "Class {class} is annotated with @Permisos but its generated superclass {superclass} \
         was not found among the inputs"
    )]
    MissingSuperclass {
        /// Internal name of the annotated class
        class: String,
        /// Internal name of the expected generated type
        superclass: String,
    },

    /// Filesystem failure
    #[error("I/O error on {}: {error}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Jar read or write failure
    #[error("Archive error on {}: {error}", path.display())]
    Archive {
        /// Path of the jar
        path: PathBuf,
        #[source]
        error: zip::result::ZipError,
    },

    /// The input is neither a directory nor a jar
    #[error("Unsupported input {}: expected a directory or a .jar", .0.display())]
    UnsupportedInput(PathBuf),

    /// The worker pool could not be started
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl TransformError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        TransformError::Io {
            path: path.into(),
            error,
        }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, error: zip::result::ZipError) -> Self {
        TransformError::Archive {
            path: path.into(),
            error,
        }
    }
}
