//! Interposing type generation
//!
//! One generator serves every component family; the family-specific parts
//! (how the hosting activity is obtained, how permissions are requested)
//! come from a [`FamilyProfile`].

use super::spec::{
    AnnotationSpec, CodeBlock, FileSpec, FunSpec, KModifier, ParameterSpec, PropertySpec,
    TypeSpec, TypeVariable,
};
use super::writer::render_file;
use crate::error::ProcessError;
use crate::hierarchy::ComponentKind;
use crate::metadata::GeneratedTypeMetadata;
use crate::model::{AnnotationRef, ConstructorDecl, TypeDecl, TypeUniverse, JAVA_OBJECT};
use crate::names::ClassName;
use rustc_hash::FxHashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const FILE_COMMENT: &str = "Generated file. Do not edit!";
const TARGET_API: &str = "android.annotation.TargetApi";
const CONFIGURATION: &str = "PermissionConfiguration";

const ON_GRANTED_TYPE: &str = "() -> Unit";
const ON_RATIONALE_TYPE: &str = "(List<String>) -> Unit";

const IMPORTS: &[&str] = &[
    "android.app.Activity",
    "android.content.pm.PackageManager",
    "androidx.annotation.CallSuper",
    "androidx.core.app.ActivityCompat",
    "cn.nikeo.permisos.weaving.api.PermissionType",
    "cn.nikeo.permisos.weaving.api.PermissionsChecker",
    "cn.nikeo.permisos.weaving.api.groupPermissions",
];

/// Family-specific pieces of the generated type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyProfile {
    /// Family
    pub kind: ComponentKind,
    /// Noun phrase used in the KDoc
    pub description: &'static str,
    /// Expression yielding the hosting activity
    pub active_instance: &'static str,
    /// Receiver-and-leading-arguments of the permission request call
    pub request_call: &'static str,
}

impl FamilyProfile {
    /// Profile for a family
    pub fn of(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Activity => FamilyProfile {
                kind,
                description: "An Activity",
                active_instance: "this",
                request_call: "ActivityCompat.requestPermissions(requireActivity, ",
            },
            ComponentKind::Fragment => FamilyProfile {
                kind,
                description: "A Fragment",
                active_instance: "requireActivity()",
                request_call: "requestPermissions(",
            },
        }
    }
}

/// A rendered source unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Name of the generated type
    pub name: ClassName,
    /// Path relative to the output root
    pub relative_path: String,
    /// Source text
    pub contents: String,
}

impl GeneratedFile {
    /// Write the unit under `out_dir`, replacing any previous version atomically
    pub fn write_to(&self, out_dir: &Path) -> io::Result<PathBuf> {
        let final_path = out_dir.join(&self.relative_path);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = final_path.with_extension("kt.tmp");
        let mut tmp_file = fs::File::create(&tmp_path)?;
        tmp_file.write_all(self.contents.as_bytes())?;
        tmp_file.sync_all()?;
        fs::rename(&tmp_path, &final_path)?;
        Ok(final_path)
    }
}

/// Generates the interposing type for resolved metadata
pub struct TypeGenerator<'a, U: TypeUniverse + ?Sized> {
    universe: &'a U,
}

impl<'a, U: TypeUniverse + ?Sized> TypeGenerator<'a, U> {
    /// Create a generator over `universe`
    pub fn new(universe: &'a U) -> Self {
        Self { universe }
    }

    /// Build the file model for `metadata`
    pub fn file_spec(&self, metadata: &GeneratedTypeMetadata) -> Result<FileSpec, ProcessError> {
        let source = self.universe.decl(metadata.source);
        let base = self.universe.decl(metadata.base);
        let profile = FamilyProfile::of(metadata.kind);
        let name = &metadata.generated_name;

        let mut file = FileSpec::new(name.package(), name.simple_name());
        file.comment = Some(FILE_COMMENT.to_string());
        for import in IMPORTS {
            file.import(*import);
        }

        let mut ty = TypeSpec::class(name.simple_name());
        ty.kdoc = Some(format!(
            "{} with the ability to easily check and request dangerous permissions.\n\n\
             @see [https://developer.android.com/training/permissions/requesting]",
            profile.description
        ));
        ty.modifiers.push(KModifier::Abstract);
        if metadata.public {
            ty.modifiers.push(KModifier::Public);
        }
        if let Some(target_api) = source.annotation(TARGET_API) {
            ty.annotations.push(target_api_spec(target_api));
            file.import(TARGET_API);
        }

        ty.type_variables = base
            .type_parameters
            .iter()
            .map(|param| {
                let mut bounds: Vec<String> = param
                    .bounds
                    .iter()
                    .filter(|b| !is_any(b))
                    .cloned()
                    .collect();
                if bounds.is_empty() {
                    bounds.push("Any?".to_string());
                }
                TypeVariable {
                    name: param.name.clone(),
                    bounds,
                }
            })
            .collect();
        let mut superclass = base.name.qualified();
        if !ty.type_variables.is_empty() {
            let names: Vec<&str> = ty.type_variables.iter().map(|v| v.name.as_str()).collect();
            superclass = format!("{}<{}>", superclass, names.join(", "));
        }
        ty.superclass = Some(superclass);
        ty.superinterfaces.push("PermissionsChecker".to_string());

        let constructors = self.forwarding_constructors(source, base, &mut file)?;
        ty.superclass_initialized = constructors.is_empty();

        ty.properties.push(
            PropertySpec::new("requireActivity", "Activity")
                .modifier(KModifier::Private)
                .getter(profile.active_instance),
        );
        ty.properties.push(
            PropertySpec::new("permissionConfiguration", format!("{}?", CONFIGURATION))
                .modifier(KModifier::Private)
                .mutable()
                .initializer("null"),
        );
        ty.functions.extend(constructors);
        ty.functions.push(check_permissions(&profile));
        ty.functions.push(on_request_permissions_result());
        ty.types.push(permission_configuration());

        file.types.push(ty);
        Ok(file)
    }

    /// Generate the source unit for `metadata`
    ///
    /// Identical metadata always yields byte-identical output.
    pub fn generate(&self, metadata: &GeneratedTypeMetadata) -> Result<GeneratedFile, ProcessError> {
        let file = self.file_spec(metadata)?;
        debug!("Generated {} ({})", metadata.generated_name, metadata.kind);
        Ok(GeneratedFile {
            name: metadata.generated_name.clone(),
            relative_path: file.relative_path(),
            contents: render_file(&file),
        })
    }

    /// Constructors forwarding to every non-private base constructor
    ///
    /// Empty when the base only has the no-arg constructor.
    fn forwarding_constructors(
        &self,
        source: &TypeDecl,
        base: &TypeDecl,
        file: &mut FileSpec,
    ) -> Result<Vec<FunSpec>, ProcessError> {
        let visible: Vec<&ConstructorDecl> =
            base.constructors.iter().filter(|c| !c.is_private()).collect();
        if visible.is_empty() || (visible.len() == 1 && visible[0].parameters.is_empty()) {
            return Ok(Vec::new());
        }

        // Kotlin cannot overload constructors whose parameter lists erase alike
        let mut erased: FxHashMap<Vec<String>, usize> = FxHashMap::default();
        for (i, constructor) in visible.iter().enumerate() {
            let key: Vec<String> = constructor.parameters.iter().map(|p| erase(&p.ty)).collect();
            if let Some(previous) = erased.insert(key.clone(), i) {
                return Err(ProcessError::BadInput {
                    message: format!(
                        "Constructors #{} and #{} of '{}' have the same parameter types after \
                         erasure ({}); forwarding constructors cannot be generated for '{}'.",
                        previous + 1,
                        i + 1,
                        base.name,
                        key.join(", "),
                        source.name
                    ),
                    elements: vec![source.name.qualified(), base.name.qualified()],
                });
            }
        }

        let mut constructors = Vec::with_capacity(visible.len());
        for constructor in visible {
            let mut spec = FunSpec::constructor().modifier(KModifier::Public);
            if let Some(target_api) = constructor
                .annotations
                .iter()
                .find(|a| a.name.qualified() == TARGET_API)
            {
                spec = spec.annotation(target_api_spec(target_api));
                file.import(TARGET_API);
            }
            for param in &constructor.parameters {
                let ty = if param.nullable && !param.ty.ends_with('?') {
                    format!("{}?", param.ty)
                } else {
                    param.ty.clone()
                };
                spec = spec.parameter(ParameterSpec::new(param.name.clone(), ty));
            }
            let arguments = constructor.parameters.iter().map(|p| p.name.clone()).collect();
            constructors.push(spec.call_super(arguments));
        }
        Ok(constructors)
    }
}

fn is_any(bound: &str) -> bool {
    matches!(bound, "Any" | "kotlin.Any" | JAVA_OBJECT)
}

/// Erased form of a source type: no type arguments, no nullability
fn erase(ty: &str) -> String {
    let ty = ty.trim_end_matches('?');
    match ty.find('<') {
        Some(start) if !ty.starts_with("Array<") => ty[..start].to_string(),
        _ => ty.to_string(),
    }
}

fn target_api_spec(annotation: &AnnotationRef) -> AnnotationSpec {
    match &annotation.arguments {
        Some(arguments) => AnnotationSpec::with_arguments("TargetApi", arguments.clone()),
        None => AnnotationSpec::new("TargetApi"),
    }
}

fn check_permissions(profile: &FamilyProfile) -> FunSpec {
    let body = CodeBlock::new()
        .statement("val grouped = groupPermissions(requireActivity, *permissions)")
        .statement("val grantedPermissions = grouped[PermissionType.GRANTED]")
        .statement("val deniedPermissions = grouped[PermissionType.DENIED]")
        .statement("val notRequestedYetPermissions = grouped[PermissionType.NOT_REQUESTED_YET]")
        .blank()
        .begin_control_flow(
            "if (permissions.isEmpty() || grantedPermissions?.size == permissions.size)",
        )
        .statement("doOnAllPermissionsGranted()")
        .statement("return")
        .end_control_flow()
        .blank()
        .begin_control_flow("if (notRequestedYetPermissions.isNullOrEmpty())")
        .statement("check(!deniedPermissions.isNullOrEmpty())")
        .statement("shouldShowRequestPermissionRationale(deniedPermissions)")
        .statement("return")
        .end_control_flow()
        .blank()
        .statement(format!(
            "val task = {}(requestCode, doOnAllPermissionsGranted, shouldShowRequestPermissionRationale)",
            CONFIGURATION
        ))
        .begin_control_flow("if (!deniedPermissions.isNullOrEmpty())")
        .statement("task.deniedPermissions.addAll(deniedPermissions)")
        .end_control_flow()
        .statement("permissionConfiguration = task")
        .statement(format!(
            "{}notRequestedYetPermissions.toTypedArray(), requestCode)",
            profile.request_call
        ));

    FunSpec::function("checkPermissions")
        .modifier(KModifier::Public)
        .modifier(KModifier::Override)
        .parameter(ParameterSpec::new("requestCode", "Int"))
        .parameter(ParameterSpec::new("doOnAllPermissionsGranted", ON_GRANTED_TYPE))
        .parameter(ParameterSpec::new(
            "shouldShowRequestPermissionRationale",
            ON_RATIONALE_TYPE,
        ))
        .parameter(ParameterSpec::vararg("permissions", "String"))
        .body(body)
}

fn on_request_permissions_result() -> FunSpec {
    // The pending record is cleared before the callbacks run so a callback
    // may start a new request.
    let body = CodeBlock::new()
        .statement("super.onRequestPermissionsResult(requestCode, permissions, grantResults)")
        .statement("val task = permissionConfiguration ?: return")
        .begin_control_flow("if (requestCode != task.requestCode)")
        .statement("return")
        .end_control_flow()
        .statement("permissionConfiguration = null")
        .blank()
        .begin_control_flow("val deniedPermissions = if (grantResults.isEmpty())")
        .statement("permissions.toList()")
        .next_control_flow("else")
        .statement("permissions.filterIndexed { index, _ ->")
        .indent()
        .statement(
            "grantResults.getOrElse(index) { PackageManager.PERMISSION_DENIED } != \
             PackageManager.PERMISSION_GRANTED",
        )
        .unindent()
        .statement("}")
        .end_control_flow()
        .statement("task.deniedPermissions.addAll(deniedPermissions)")
        .blank()
        .begin_control_flow("if (task.deniedPermissions.isEmpty())")
        .statement("task.doOnAllPermissionsGranted()")
        .next_control_flow("else")
        .statement("task.shouldShowRequestPermissionRationale(task.deniedPermissions.toList())")
        .end_control_flow();

    FunSpec::function("onRequestPermissionsResult")
        .annotation(AnnotationSpec::new("CallSuper"))
        .modifier(KModifier::Public)
        .modifier(KModifier::Override)
        .parameter(ParameterSpec::new("requestCode", "Int"))
        .parameter(ParameterSpec::new("permissions", "Array<out String>"))
        .parameter(ParameterSpec::new("grantResults", "IntArray"))
        .body(body)
}

fn permission_configuration() -> TypeSpec {
    let mut ty = TypeSpec::class(CONFIGURATION);
    ty.modifiers.push(KModifier::Private);
    let public = |name: &str, ty: &str| ParameterSpec {
        modifiers: vec![KModifier::Public],
        ..ParameterSpec::new(name, ty)
    };
    ty.primary_properties = vec![
        public("requestCode", "Int"),
        public("doOnAllPermissionsGranted", ON_GRANTED_TYPE),
        public("shouldShowRequestPermissionRationale", ON_RATIONALE_TYPE),
    ];
    ty.properties.push(
        PropertySpec::new("deniedPermissions", "MutableList<String>")
            .modifier(KModifier::Public)
            .delegate("lazy { mutableListOf() }"),
    );
    ty
}
