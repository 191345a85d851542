//! Component family classification
//!
//! A base type is classified by walking an ordered table of families and
//! taking the first one whose root it is assignable to.

use crate::error::ProcessError;
use crate::model::{TypeId, TypeUniverse};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The family of UI component an annotated type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// `android.app.Activity` subtypes
    Activity,
    /// `androidx.fragment.app.Fragment` subtypes
    Fragment,
}

impl ComponentKind {
    /// Human-readable plural, used in diagnostics
    pub fn plural(self) -> &'static str {
        match self {
            ComponentKind::Activity => "Activities",
            ComponentKind::Fragment => "Fragments",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Activity => f.write_str("Activity"),
            ComponentKind::Fragment => f.write_str("Fragment"),
        }
    }
}

/// One row of the family table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRule {
    /// Kind assigned on match
    pub kind: ComponentKind,
    /// Qualified name of the family root
    pub root: String,
    /// A further supertype every member must also have
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_subtype: Option<String>,
}

/// `android.app.Activity`
pub const ACTIVITY: &str = "android.app.Activity";
/// `androidx.activity.ComponentActivity`
pub const COMPONENT_ACTIVITY: &str = "androidx.activity.ComponentActivity";
/// `androidx.fragment.app.Fragment`
pub const FRAGMENT: &str = "androidx.fragment.app.Fragment";

/// The built-in family table: Activity (requiring ComponentActivity), then Fragment
pub fn default_families() -> Vec<FamilyRule> {
    vec![
        FamilyRule {
            kind: ComponentKind::Activity,
            root: ACTIVITY.to_string(),
            required_subtype: Some(COMPONENT_ACTIVITY.to_string()),
        },
        FamilyRule {
            kind: ComponentKind::Fragment,
            root: FRAGMENT.to_string(),
            required_subtype: None,
        },
    ]
}

/// Classifies base types against a family table
pub struct HierarchyWalker<'a, U: TypeUniverse + ?Sized> {
    universe: &'a U,
    families: &'a [FamilyRule],
    marker: &'a str,
}

impl<'a, U: TypeUniverse + ?Sized> HierarchyWalker<'a, U> {
    /// Create a walker; `marker` is the simple name used in messages
    pub fn new(universe: &'a U, families: &'a [FamilyRule], marker: &'a str) -> Self {
        Self {
            universe,
            families,
            marker,
        }
    }

    /// The first family rule `base` is assignable to
    pub fn family_of(&self, base: TypeId) -> Option<&'a FamilyRule> {
        self.families
            .iter()
            .find(|rule| self.universe.is_assignable(base, &rule.root))
    }

    /// Classify the declared base of `element`
    ///
    /// Errors point at `element`, the annotated type.
    pub fn classify(&self, element: TypeId, base: TypeId) -> Result<ComponentKind, ProcessError> {
        let element_name = self.universe.name_of(element);
        let Some(rule) = self.family_of(base) else {
            return Err(ProcessError::UnsupportedBaseType {
                message: format!(
                    "@{} base class must extend ComponentActivity, (support) Fragment.",
                    self.marker
                ),
                element: element_name,
            });
        };
        if let Some(required) = &rule.required_subtype {
            if !self.universe.is_assignable(base, required) {
                return Err(ProcessError::InvalidBaseSubtype {
                    message: format!(
                        "{} annotated with @{} must be a subclass of {}. \
                         (e.g. FragmentActivity, AppCompatActivity, etc.)",
                        rule.kind.plural(),
                        self.marker,
                        required
                    ),
                    element: element_name,
                });
            }
        }
        Ok(rule.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TypeGraph, TypeDecl, UnlinkedType};
    use crate::names::ClassName;

    fn graph(types: &[(&str, Option<&str>)]) -> TypeGraph {
        TypeGraph::link(
            types
                .iter()
                .map(|(name, superclass)| UnlinkedType {
                    decl: TypeDecl::class(ClassName::parse_qualified(name)),
                    superclass: superclass.map(str::to_string),
                    interfaces: Vec::new(),
                })
                .collect(),
        )
    }

    fn android() -> Vec<(&'static str, Option<&'static str>)> {
        vec![
            (ACTIVITY, None),
            (COMPONENT_ACTIVITY, Some(ACTIVITY)),
            ("androidx.appcompat.app.AppCompatActivity", Some(COMPONENT_ACTIVITY)),
            (FRAGMENT, None),
            ("android.widget.FrameLayout", None),
        ]
    }

    #[test]
    fn test_classify_families() {
        let mut types = android();
        types.push(("com.example.Login", Some("androidx.appcompat.app.AppCompatActivity")));
        let graph = graph(&types);
        let families = default_families();
        let walker = HierarchyWalker::new(&graph, &families, "Permisos");
        let login = graph.lookup("com.example.Login").unwrap();

        let compat = graph.lookup("androidx.appcompat.app.AppCompatActivity").unwrap();
        assert_eq!(walker.classify(login, compat).unwrap(), ComponentKind::Activity);

        let fragment = graph.lookup(FRAGMENT).unwrap();
        assert_eq!(walker.classify(login, fragment).unwrap(), ComponentKind::Fragment);
    }

    #[test]
    fn test_plain_activity_is_invalid_subtype() {
        let graph = graph(&android());
        let families = default_families();
        let walker = HierarchyWalker::new(&graph, &families, "Permisos");
        let activity = graph.lookup(ACTIVITY).unwrap();

        let err = walker.classify(activity, activity).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidBaseSubtype { .. }));
        assert!(err
            .to_string()
            .starts_with("Activities annotated with @Permisos must be a subclass of androidx.activity.ComponentActivity."));
    }

    #[test]
    fn test_unsupported_base() {
        let graph = graph(&android());
        let families = default_families();
        let walker = HierarchyWalker::new(&graph, &families, "Permisos");
        let view = graph.lookup("android.widget.FrameLayout").unwrap();

        let err = walker.classify(view, view).unwrap_err();
        assert!(matches!(err, ProcessError::UnsupportedBaseType { .. }));
        assert_eq!(
            err.to_string(),
            "@Permisos base class must extend ComponentActivity, (support) Fragment."
        );
    }

    #[test]
    fn test_first_matching_family_wins() {
        let graph = graph(&[("x.Both", None)]);
        let families = vec![
            FamilyRule {
                kind: ComponentKind::Fragment,
                root: "x.Both".to_string(),
                required_subtype: None,
            },
            FamilyRule {
                kind: ComponentKind::Activity,
                root: "x.Both".to_string(),
                required_subtype: None,
            },
        ];
        let walker = HierarchyWalker::new(&graph, &families, "Permisos");
        let both = graph.lookup("x.Both").unwrap();
        assert_eq!(walker.classify(both, both).unwrap(), ComponentKind::Fragment);
    }
}
