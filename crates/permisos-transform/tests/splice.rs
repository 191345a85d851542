//! End-to-end transformer runs over directories and jars

use permisos_classfile::builder::ClassBuilder;
use permisos_classfile::class::access;
use permisos_classfile::encoder::read_u16_at;
use permisos_classfile::opcode::{ALOAD_0, INVOKESPECIAL, RETURN};
use permisos_classfile::{ClassFile, CodeAttribute};
use permisos_transform::{ClassTransformer, TransformError, TransformOptions};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

const MARKER: &str = "Lcn/nikeo/permisos/weaving/Permisos;";
const APP_COMPAT: &str = "androidx/appcompat/app/AppCompatActivity";
const LOGIN: &str = "com/example/LoginActivity";
const GENERATED: &str = "com/example/Permisos_LoginActivity";

fn options(copy_non_transformed: bool) -> TransformOptions {
    TransformOptions {
        copy_non_transformed,
        workers: 2,
        ..TransformOptions::default()
    }
}

/// `class <name> extends <super_name>` with `onCreate` calling `super.onCreate`
fn activity(name: &str, super_name: &str, marked: bool) -> Vec<u8> {
    let mut builder = ClassBuilder::new(name, Some(super_name)).unwrap();
    if marked {
        builder.add_annotation(MARKER, true).unwrap();
    }
    let [hi, lo] = builder
        .method_ref(super_name, "onCreate", "(Landroid/os/Bundle;)V")
        .unwrap()
        .to_be_bytes();
    let code = CodeAttribute::new(2, 2, vec![ALOAD_0, 0x2b, INVOKESPECIAL, hi, lo, RETURN]);
    builder
        .add_method(access::PUBLIC, "onCreate", "(Landroid/os/Bundle;)V", Some(&code))
        .unwrap();
    builder.finish().encode()
}

fn write(root: &Path, relative: &str, bytes: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

fn populate(root: &Path) {
    write(root, "com/example/LoginActivity.class", &activity(LOGIN, APP_COMPAT, true));
    write(
        root,
        "com/example/Permisos_LoginActivity.class",
        &activity(GENERATED, APP_COMPAT, false),
    );
    write(
        root,
        "com/example/AboutActivity.class",
        &activity("com/example/AboutActivity", APP_COMPAT, false),
    );
    write(root, "META-INF/app.kotlin_module", b"module");
}

fn assert_spliced(bytes: &[u8]) {
    let class = ClassFile::decode(bytes).unwrap();
    assert_eq!(class.super_name().unwrap(), Some(GENERATED));
    let code = class.methods[0]
        .code(&class.constant_pool)
        .unwrap()
        .unwrap()
        .code;
    let index = read_u16_at(&code, 3).unwrap();
    let target = class.constant_pool.member_ref(index).unwrap();
    assert_eq!(target.owner, GENERATED);
    assert_eq!(target.name, "onCreate");
    assert_eq!(target.descriptor, "(Landroid/os/Bundle;)V");
}

#[test]
fn test_directory_rewrites_only_marked_classes() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    populate(input.path());

    let mut transformer = ClassTransformer::new(options(false));
    transformer.index_path(input.path()).unwrap();
    let summary = transformer.transform(input.path(), output.path()).unwrap();

    assert_eq!(summary.scanned, 3);
    assert_eq!(summary.transformed, vec!["com/example/LoginActivity.class"]);
    assert_eq!(summary.copied, 0);
    assert_spliced(&fs::read(output.path().join("com/example/LoginActivity.class")).unwrap());
    assert!(!output.path().join("com/example/AboutActivity.class").exists());
    assert!(!output.path().join("META-INF/app.kotlin_module").exists());
}

#[test]
fn test_directory_copy_non_transformed() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    populate(input.path());

    let mut transformer = ClassTransformer::new(options(true));
    transformer.index_path(input.path()).unwrap();
    let summary = transformer.transform(input.path(), output.path()).unwrap();

    assert_eq!(summary.transformed.len(), 1);
    assert_eq!(summary.copied, 3);
    for relative in [
        "com/example/AboutActivity.class",
        "com/example/Permisos_LoginActivity.class",
        "META-INF/app.kotlin_module",
    ] {
        assert_eq!(
            fs::read(output.path().join(relative)).unwrap(),
            fs::read(input.path().join(relative)).unwrap(),
            "{relative} should be copied unchanged"
        );
    }
}

#[test]
fn test_generated_type_on_classpath() {
    let input = tempfile::tempdir().unwrap();
    let classpath = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(
        input.path(),
        "com/example/LoginActivity.class",
        &activity(LOGIN, APP_COMPAT, true),
    );
    write(
        classpath.path(),
        "com/example/Permisos_LoginActivity.class",
        &activity(GENERATED, APP_COMPAT, false),
    );

    let mut transformer = ClassTransformer::new(options(false));
    transformer.index_path(input.path()).unwrap();
    assert!(matches!(
        transformer.transform(input.path(), output.path()),
        Err(TransformError::MissingSuperclass { .. })
    ));

    transformer.index_path(classpath.path()).unwrap();
    transformer.transform(input.path(), output.path()).unwrap();
    assert_spliced(&fs::read(output.path().join("com/example/LoginActivity.class")).unwrap());
}

#[test]
fn test_jar_keeps_other_entries() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("app.jar");
    let output = dir.path().join("out/app.jar");

    let entries: Vec<(&str, Vec<u8>)> = vec![
        ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".to_vec()),
        ("com/example/AboutActivity.class", activity("com/example/AboutActivity", APP_COMPAT, false)),
        ("com/example/LoginActivity.class", activity(LOGIN, APP_COMPAT, true)),
        ("com/example/Permisos_LoginActivity.class", activity(GENERATED, APP_COMPAT, false)),
    ];
    let mut writer = zip::ZipWriter::new(File::create(&input).unwrap());
    let zip_options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, bytes) in &entries {
        writer.start_file(*name, zip_options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();

    let mut transformer = ClassTransformer::new(options(false));
    transformer.index_path(&input).unwrap();
    let summary = transformer.transform(&input, &output).unwrap();
    assert_eq!(summary.scanned, 3);
    assert_eq!(summary.transformed, vec!["com/example/LoginActivity.class"]);
    assert_eq!(summary.copied, 3);

    let mut archive = zip::ZipArchive::new(File::open(&output).unwrap()).unwrap();
    assert_eq!(archive.len(), entries.len());
    for (i, (name, original)) in entries.iter().enumerate() {
        let mut entry = archive.by_index(i).unwrap();
        assert_eq!(entry.name(), *name);
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        if *name == "com/example/LoginActivity.class" {
            assert_spliced(&bytes);
        } else {
            assert_eq!(&bytes, original);
        }
    }
}
