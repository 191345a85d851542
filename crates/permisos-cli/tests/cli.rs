//! Runs the `permisos` binary against temporary inputs

use permisos_classfile::builder::ClassBuilder;
use permisos_classfile::class::access;
use permisos_classfile::opcode::{ALOAD_0, INVOKESPECIAL, RETURN};
use permisos_classfile::{ClassFile, CodeAttribute};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const DECLARATIONS: &str = r#"
[[types]]
name = "android.app.Activity"

[[types]]
name = "androidx.activity.ComponentActivity"
superclass = "android.app.Activity"

[[types]]
name = "androidx.appcompat.app.AppCompatActivity"
superclass = "androidx.activity.ComponentActivity"

[[types]]
name = "com.example.LoginActivity"
superclass = "androidx.appcompat.app.AppCompatActivity"
annotations = [{ name = "cn.nikeo.permisos.weaving.Permisos" }]
"#;

const MARKER: &str = "Lcn/nikeo/permisos/weaving/Permisos;";
const APP_COMPAT: &str = "androidx/appcompat/app/AppCompatActivity";

fn permisos(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_permisos"))
        .current_dir(cwd)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn activity(name: &str, super_name: &str, marked: bool) -> Vec<u8> {
    let mut builder = ClassBuilder::new(name, Some(super_name)).unwrap();
    if marked {
        builder.add_annotation(MARKER, false).unwrap();
    }
    let [hi, lo] = builder
        .method_ref(super_name, "onResume", "()V")
        .unwrap()
        .to_be_bytes();
    let code = CodeAttribute::new(1, 1, vec![ALOAD_0, INVOKESPECIAL, hi, lo, RETURN]);
    builder
        .add_method(access::PROTECTED, "onResume", "()V", Some(&code))
        .unwrap();
    builder.finish().encode()
}

fn write_class(root: &Path, internal: &str, bytes: &[u8]) {
    let path = root.join(format!("{internal}.class"));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

#[test]
fn test_generate_writes_sources() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("types.toml"), DECLARATIONS).unwrap();

    let output = permisos(dir.path(), &["generate", "--types", "types.toml", "--out", "gen"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("com.example.Permisos_LoginActivity"));

    let source = fs::read_to_string(dir.path().join("gen/com/example/Permisos_LoginActivity.kt"))
        .unwrap();
    assert!(source.contains("abstract class Permisos_LoginActivity"));
}

#[test]
fn test_generate_reports_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("types.toml"),
        r#"
[[types]]
name = "android.widget.FrameLayout"

[[types]]
name = "com.example.MapHolder"
superclass = "android.widget.FrameLayout"
annotations = [{ name = "cn.nikeo.permisos.weaving.Permisos" }]
"#,
    )
    .unwrap();

    let output = permisos(dir.path(), &["generate", "--types", "types.toml", "--out", "gen"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("[Permisos]"));
    assert!(err.contains("com.example.MapHolder"));
    assert!(err.contains("Processing did not complete. See error above for details."));
    assert!(!dir.path().join("gen/com/example/Permisos_MapHolder.kt").exists());
}

#[test]
fn test_transform_directory() {
    let dir = tempfile::tempdir().unwrap();
    let classes = dir.path().join("classes");
    write_class(&classes, "com/example/LoginActivity", &activity("com/example/LoginActivity", APP_COMPAT, true));
    write_class(
        &classes,
        "com/example/Permisos_LoginActivity",
        &activity("com/example/Permisos_LoginActivity", APP_COMPAT, false),
    );

    let output = permisos(
        dir.path(),
        &["transform", "--input", "classes", "--output", "out"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("1 of 2 classes rewritten"));

    let bytes = fs::read(dir.path().join("out/com/example/LoginActivity.class")).unwrap();
    let class = ClassFile::decode(&bytes).unwrap();
    assert_eq!(
        class.super_name().unwrap(),
        Some("com/example/Permisos_LoginActivity")
    );
}

#[test]
fn test_transform_missing_generated_type_fails() {
    let dir = tempfile::tempdir().unwrap();
    let classes = dir.path().join("classes");
    write_class(&classes, "com/example/LoginActivity", &activity("com/example/LoginActivity", APP_COMPAT, true));

    let output = permisos(
        dir.path(),
        &["transform", "--input", "classes", "--output", "out"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("com/example/Permisos_LoginActivity"));
}

#[test]
fn test_inspect_shows_super_calls() {
    let dir = tempfile::tempdir().unwrap();
    write_class(dir.path(), "LoginActivity", &activity("com/example/LoginActivity", APP_COMPAT, true));

    let output = permisos(dir.path(), &["inspect", "LoginActivity.class"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("class: com/example/LoginActivity"));
    assert!(out.contains("marked: yes"));
    assert!(out.contains("splices onto: com/example/Permisos_LoginActivity"));
    assert!(out.contains("invokespecial androidx/appcompat/app/AppCompatActivity.onResume()V  (super call)"));
}

#[test]
fn test_config_prefix_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("permisos.toml"), "prefix = \"Guarded_\"\n").unwrap();
    write_class(dir.path(), "LoginActivity", &activity("com/example/LoginActivity", APP_COMPAT, true));

    let output = permisos(dir.path(), &["inspect", "LoginActivity.class"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("splices onto: com/example/Guarded_LoginActivity"));
}
