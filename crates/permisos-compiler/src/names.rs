//! Class names and the generated-name rule
//!
//! A [`ClassName`] keeps the package and the chain of nested simple names
//! apart, so it can be rendered in any of the three JVM spellings:
//!
//! | form      | example                  |
//! |-----------|--------------------------|
//! | qualified | `a.b.Outer.Inner`        |
//! | binary    | `a.b.Outer$Inner`        |
//! | internal  | `a/b/Outer$Inner`        |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Prefix of every generated interposing type
pub const DEFAULT_PREFIX: &str = "Permisos_";

/// A possibly nested class name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassName {
    package: String,
    simple_names: Vec<String>,
}

impl ClassName {
    /// Create a name from a package and its nesting chain (outermost first)
    pub fn new(package: impl Into<String>, simple_names: Vec<String>) -> Self {
        Self {
            package: package.into(),
            simple_names,
        }
    }

    /// A top-level class
    pub fn top_level(package: impl Into<String>, simple_name: impl Into<String>) -> Self {
        Self::new(package, vec![simple_name.into()])
    }

    /// Parse a binary name (`a.b.Outer$Inner`)
    pub fn from_binary(binary: &str) -> Self {
        let (package, simple) = match binary.rfind('.') {
            Some(i) => (&binary[..i], &binary[i + 1..]),
            None => ("", binary),
        };
        Self::new(package, simple.split('$').map(str::to_string).collect())
    }

    /// Parse an internal name (`a/b/Outer$Inner`)
    pub fn from_internal(internal: &str) -> Self {
        Self::from_binary(&internal.replace('/', "."))
    }

    /// Best-guess parse of a qualified name (`a.b.Outer.Inner`)
    ///
    /// Segments up to the first one starting with an uppercase letter are the
    /// package; `$` separators are honoured as well.
    pub fn parse_qualified(qualified: &str) -> Self {
        if qualified.contains('$') {
            return Self::from_binary(qualified);
        }
        let segments: Vec<&str> = qualified.split('.').collect();
        let first_class = segments
            .iter()
            .position(|s| s.starts_with(|c: char| c.is_uppercase()))
            .unwrap_or(segments.len().saturating_sub(1));
        Self::new(
            segments[..first_class].join("."),
            segments[first_class..].iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Package name, empty for the default package
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Nesting chain, outermost first
    pub fn simple_names(&self) -> &[String] {
        &self.simple_names
    }

    /// Innermost simple name
    pub fn simple_name(&self) -> &str {
        self.simple_names.last().map(String::as_str).unwrap_or("")
    }

    /// Whether this is a nested class
    pub fn is_nested(&self) -> bool {
        self.simple_names.len() > 1
    }

    fn join(&self, package_sep: char, nest_sep: &str) -> String {
        let nested = self.simple_names.join(nest_sep);
        if self.package.is_empty() {
            nested
        } else {
            let package = if package_sep == '.' {
                self.package.clone()
            } else {
                self.package.replace('.', &package_sep.to_string())
            };
            format!("{}{}{}", package, package_sep, nested)
        }
    }

    /// `a.b.Outer.Inner`
    pub fn qualified(&self) -> String {
        self.join('.', ".")
    }

    /// `a.b.Outer$Inner`
    pub fn binary(&self) -> String {
        self.join('.', "$")
    }

    /// `a/b/Outer$Inner`
    pub fn internal(&self) -> String {
        self.join('/', "$")
    }

    /// Class file path relative to a class root (`a/b/Outer$Inner.class`)
    pub fn class_file_path(&self) -> String {
        format!("{}.class", self.internal())
    }

    /// Field descriptor (`La/b/Outer$Inner;`)
    pub fn descriptor(&self) -> String {
        format!("L{};", self.internal())
    }

    /// A top-level class in the same package
    pub fn peer(&self, simple_name: impl Into<String>) -> Self {
        Self::top_level(self.package.clone(), simple_name)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

impl Serialize for ClassName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.binary())
    }
}

impl<'de> Deserialize<'de> for ClassName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(ClassName::parse_qualified(&text))
    }
}

/// Name of the interposing type generated for `source`
///
/// Same package; the nesting chain is flattened with `_` and prefixed, so
/// `a.b.Outer.Inner` becomes `a.b.Permisos_Outer_Inner`.
pub fn generated_name(source: &ClassName, prefix: &str) -> ClassName {
    source.peer(format!("{}{}", prefix, source.simple_names.join("_")))
}

/// [`generated_name`] over internal names, as used by the class transformer
pub fn generated_internal_name(source_internal: &str, prefix: &str) -> String {
    generated_name(&ClassName::from_internal(source_internal), prefix).internal()
}
