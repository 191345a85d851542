//! End-to-end tests: declaration files on disk through resolution and generation

use permisos_compiler::{
    load_graph, ComponentKind, Config, DirectoryFiler, MetadataResolver, ProcessError, Processor,
    TypeGenerator, TypeUniverse,
};
use std::fs;
use std::path::Path;

const ANDROID: &str = r#"
[[types]]
name = "android.app.Activity"

[[types]]
name = "androidx.activity.ComponentActivity"
superclass = "android.app.Activity"

[[types]]
name = "androidx.appcompat.app.AppCompatActivity"
superclass = "androidx.activity.ComponentActivity"

[[types]]
name = "androidx.fragment.app.Fragment"

[[types]]
name = "android.widget.FrameLayout"
"#;

const APP: &str = r#"
[[types]]
name = "com.example.BaseActivity"
superclass = "androidx.appcompat.app.AppCompatActivity"
annotations = [{ name = "cn.nikeo.permisos.weaving.Permisos" }]

[[types]]
name = "com.example.LoginActivity"
superclass = "com.example.BaseActivity"
annotations = [{ name = "cn.nikeo.permisos.weaving.Permisos" }]
"#;

fn write_inputs(dir: &Path, app: &str) {
    fs::write(dir.join("android.toml"), ANDROID).unwrap();
    fs::write(dir.join("app.toml"), app).unwrap();
}

#[test]
fn test_chained_metadata_shares_kind() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), APP);
    let graph = load_graph(&[dir.path().to_path_buf()]).unwrap();
    let config = Config::default();
    let resolver = MetadataResolver::new(&graph, &config);

    let base = resolver
        .resolve(graph.lookup("com.example.BaseActivity").unwrap())
        .unwrap();
    let login = resolver
        .resolve(graph.lookup("com.example.LoginActivity").unwrap())
        .unwrap();

    assert_eq!(login.kind, ComponentKind::Activity);
    assert_eq!(login.depth(), 2);
    let parent = login.parent.as_deref().unwrap();
    assert_eq!(parent, &base);
    assert_eq!(parent.kind, login.kind);
    assert_eq!(login.generated_name.qualified(), "com.example.Permisos_LoginActivity");
}

#[test]
fn test_unsupported_base_names_the_type() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(
        dir.path(),
        r#"
[[types]]
name = "com.example.MapHolder"
superclass = "android.widget.FrameLayout"
annotations = [{ name = "cn.nikeo.permisos.weaving.Permisos" }]
"#,
    );
    let graph = load_graph(&[dir.path().to_path_buf()]).unwrap();
    let config = Config::default();
    let id = graph.lookup("com.example.MapHolder").unwrap();

    let err = MetadataResolver::new(&graph, &config).resolve(id).unwrap_err();
    assert!(matches!(
        &err,
        ProcessError::UnsupportedBaseType { element, .. } if element == "com.example.MapHolder"
    ));
}

#[test]
fn test_processor_writes_sources() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = dir.path().join("types");
    let out = dir.path().join("generated");
    fs::create_dir_all(&inputs).unwrap();
    write_inputs(&inputs, APP);

    let graph = load_graph(&[inputs]).unwrap();
    let config = Config::default();
    let mut filer = DirectoryFiler::new(&out);
    let generated = Processor::new(&config).run(&graph, &mut filer).unwrap();

    assert_eq!(
        generated,
        vec!["com.example.Permisos_BaseActivity", "com.example.Permisos_LoginActivity"]
    );
    assert_eq!(filer.written().len(), 2);
    let login = fs::read_to_string(out.join("com/example/Permisos_LoginActivity.kt")).unwrap();
    assert!(login.contains("abstract class Permisos_LoginActivity : com.example.BaseActivity(), PermissionsChecker {"));
}

#[test]
fn test_generation_is_stable_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), APP);
    let config = Config::default();

    let render = || {
        let graph = load_graph(&[dir.path().to_path_buf()]).unwrap();
        let id = graph.lookup("com.example.LoginActivity").unwrap();
        let metadata = MetadataResolver::new(&graph, &config).resolve(id).unwrap();
        TypeGenerator::new(&graph).generate(&metadata).unwrap().contents
    };
    assert_eq!(render(), render());
}

#[test]
fn test_config_file_is_not_a_declaration_file() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), APP);
    fs::write(dir.path().join("permisos.toml"), "prefix = \"Guarded_\"").unwrap();

    let graph = load_graph(&[dir.path().to_path_buf()]).unwrap();
    let config = Config::discover(dir.path()).unwrap();
    let id = graph.lookup("com.example.LoginActivity").unwrap();
    let metadata = MetadataResolver::new(&graph, &config).resolve(id).unwrap();
    assert_eq!(metadata.generated_name.simple_name(), "Guarded_LoginActivity");
}
