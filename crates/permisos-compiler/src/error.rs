//! Processing errors

use thiserror::Error;

/// Errors raised while resolving or generating an interposing type
///
/// Every variant names the offending type(s) by qualified name so the
/// diagnostic can point at them.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A structural requirement on an annotated element is not met
    #[error("{message}")]
    BadInput {
        /// Human-readable message
        message: String,
        /// Offending elements
        elements: Vec<String>,
    },

    /// The declared base type belongs to no supported family
    #[error("{message}")]
    UnsupportedBaseType {
        /// Human-readable message
        message: String,
        /// The annotated type
        element: String,
    },

    /// The base type is in a family but not a subtype of its required type
    #[error("{message}")]
    InvalidBaseSubtype {
        /// Human-readable message
        message: String,
        /// The annotated type
        element: String,
    },

    /// The superclass chain revisits a type
    #[error(
        "Cyclic inheritance detected. Make sure the base class of @{marker} is not the annotated \
         class itself or subclass of the annotated class.\n\
         The cyclic inheritance structure: {} --> {repeated}",
        .trace.join(" --> ")
    )]
    CyclicInheritance {
        /// Simple name of the marker annotation
        marker: String,
        /// Types visited so far, in order
        trace: Vec<String>,
        /// The type seen twice
        repeated: String,
        /// The annotated type being resolved when the cycle was found
        element: String,
    },

    /// A Kotlin base declares constructor default values
    #[error(
        "The base class, '{base}', of the @{marker}, '{source_type}', contains a constructor with \
         default parameters. This is currently not supported by the Gradle plugin."
    )]
    UnsupportedDefaultParameters {
        /// Simple name of the marker annotation
        marker: String,
        /// The base type
        base: String,
        /// The annotated type
        source_type: String,
    },

    /// A referenced type could not be resolved (yet)
    #[error("Unable to resolve type '{name}' referenced by '{element}'")]
    ErrorType {
        /// The unresolved name
        name: String,
        /// The element referring to it
        element: String,
    },

    /// Writing a generated unit failed
    #[error("Failed to write generated file: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Shorthand for a single-element [`ProcessError::BadInput`]
    pub fn bad_input(message: impl Into<String>, element: impl Into<String>) -> Self {
        ProcessError::BadInput {
            message: message.into(),
            elements: vec![element.into()],
        }
    }

    /// Whether processing may be retried in a later round
    pub fn is_deferrable(&self) -> bool {
        matches!(self, ProcessError::ErrorType { .. })
    }

    /// The elements the error points at
    pub fn elements(&self) -> Vec<&str> {
        match self {
            ProcessError::BadInput { elements, .. } => {
                elements.iter().map(String::as_str).collect()
            }
            ProcessError::UnsupportedBaseType { element, .. }
            | ProcessError::InvalidBaseSubtype { element, .. }
            | ProcessError::CyclicInheritance { element, .. }
            | ProcessError::ErrorType { element, .. } => vec![element.as_str()],
            ProcessError::UnsupportedDefaultParameters { base, .. } => vec![base.as_str()],
            ProcessError::Io(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_chain() {
        let err = ProcessError::CyclicInheritance {
            marker: "Permisos".to_string(),
            trace: vec!["a.A".to_string(), "a.B".to_string()],
            repeated: "a.A".to_string(),
            element: "a.B".to_string(),
        };
        let message = err.to_string();
        assert!(message.starts_with("Cyclic inheritance detected."));
        assert!(message.ends_with("The cyclic inheritance structure: a.A --> a.B --> a.A"));
        assert_eq!(err.elements(), vec!["a.B"]);
    }

    #[test]
    fn test_only_error_type_defers() {
        let deferred = ProcessError::ErrorType {
            name: "a.Missing".to_string(),
            element: "a.B".to_string(),
        };
        assert!(deferred.is_deferrable());
        assert!(!ProcessError::bad_input("nope", "a.B").is_deferrable());
    }
}
