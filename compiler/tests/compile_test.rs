#![cfg(test)]

use brine_jsgen_compiler::{
    compile_paths, compile_source,
    compiler::{build_registry, collect_inputs},
    error::JsgenError,
    GenerateOptions,
};
use std::fs;

const ROLE_HEADER: &str = r#"
JSON struct role {
    int id;
    char *name;
};
"#;

const USER_HEADER: &str = r#"
JSON typedef struct {
    int id;
    struct role *role;
    bool is_active alias("active");
} User;
"#;

#[test]
fn test_compile_source() {
    let (registry, code) = compile_source(USER_HEADER, &GenerateOptions::default()).expect("compile_source failed");

    assert_eq!(registry.len(), 1);
    let user = registry.get("User").unwrap();
    assert_eq!(user.name, "User");
    assert_eq!(user.fields.len(), 3);
    assert_eq!(user.fields[1].type_, "struct role*");
    assert_eq!(user.fields[2].json_key(), "active");

    assert!(code.starts_with("#include \"jsb.h\"\n#include \"jsp.h\"\n"));
    assert!(code.contains("int parse_User(const char *json, User *out, JsGenAllocator *a) {"));
    assert!(code.contains("} else if (strcmp(jsp->string, \"active\") == 0) {"));
    assert!(code.contains("err = _parse_role(jsp, out->role, a);"));
}

#[test]
fn test_compile_source_is_deterministic() {
    let options = GenerateOptions::default();
    let (_, first) = compile_source(ROLE_HEADER, &options).unwrap();
    let (_, second) = compile_source(ROLE_HEADER, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_directory_inputs_are_sorted_and_filtered() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("b_user.h"), USER_HEADER).unwrap();
    fs::write(temp_dir.path().join("a_role.h"), ROLE_HEADER).unwrap();
    fs::write(temp_dir.path().join("notes.txt"), ROLE_HEADER).unwrap();
    fs::create_dir(temp_dir.path().join("nested.h")).unwrap();

    let inputs = collect_inputs(&[temp_dir.path().to_path_buf()], "h").unwrap();
    let names: Vec<_> = inputs
        .iter()
        .map(|i| i.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a_role.h", "b_user.h"]);
    assert!(inputs.iter().all(|i| !i.explicit));

    let (registry, code) = compile_paths(&[temp_dir.path().to_path_buf()], &GenerateOptions::default()).unwrap();
    let simple_names: Vec<_> = registry.iter().map(|m| m.simple_name.as_str()).collect();
    assert_eq!(simple_names, ["role", "User"]);
    assert!(code.find("int _parse_role(").unwrap() < code.find("int _parse_User(").unwrap());
}

#[test]
fn test_custom_extension() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("role.hpp"), ROLE_HEADER).unwrap();
    fs::write(temp_dir.path().join("user.h"), USER_HEADER).unwrap();

    let options = GenerateOptions { extension: "hpp".into(), ..GenerateOptions::default() };
    let registry = build_registry(&[temp_dir.path().to_path_buf()], &options).unwrap();
    assert_eq!(registry.len(), 1);
    assert!(registry.get("role").is_some());
}

#[test]
fn test_failing_file_in_directory_is_skipped() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("bad.h"), "JSON struct broken { int a; /* never closed").unwrap();
    fs::write(temp_dir.path().join("good.h"), ROLE_HEADER).unwrap();

    let registry = build_registry(&[temp_dir.path().to_path_buf()], &GenerateOptions::default()).unwrap();
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_failing_explicit_file_aborts() {
    let temp_dir = tempfile::tempdir().unwrap();
    let bad = temp_dir.path().join("bad.h");
    fs::write(&bad, "JSON struct broken { char *s = \"open; };").unwrap();

    let err = compile_paths(&[bad.clone()], &GenerateOptions::default()).unwrap_err();
    match err {
        JsgenError::ScanFailed { path, source } => {
            assert_eq!(path, bad);
            assert!(matches!(*source, JsgenError::ParseError { line: 1, .. }));
        }
        other => panic!("expected ScanFailed but got {:?}", other),
    }

    let missing = temp_dir.path().join("missing.h");
    let err = compile_paths(&[missing], &GenerateOptions::default()).unwrap_err();
    assert!(matches!(err, JsgenError::ScanFailed { .. }));
}

#[test]
fn test_strict_mode() {
    let header = "JSON struct grid { int cells[4]; };";
    assert!(compile_source(header, &GenerateOptions::default()).is_ok());

    let strict = GenerateOptions { strict: true, ..GenerateOptions::default() };
    let err = compile_source(header, &strict).unwrap_err();
    assert!(matches!(err, JsgenError::VerifierError(_)));
}
