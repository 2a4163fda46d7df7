use pretty_assertions::assert_eq;

use valtag::error::SemanticError;
use valtag::manifest::Manifest;
use valtag::{compile, CodegenOptions, Error};

fn options() -> CodegenOptions {
    CodegenOptions { support_path: "crate::support".into() }
}

fn manifest(src: &str) -> Manifest {
    Manifest::from_json(src).unwrap()
}

#[test]
fn user_example_renders_one_check_per_rule() {
    let m = manifest(r#"[
        { "name": "User", "package": "models", "fields": [
            { "name": "FirstName", "type": "String", "tag": "required" },
            { "name": "LastName", "type": "String", "tag": "required" },
            { "name": "Age", "type": "u8", "tag": "required" },
            { "name": "Role", "type": "String", "tag": "in=admin user" }
        ] }
    ]"#);
    let output = compile(m.types, &options()).unwrap();
    assert_eq!(output.packages.len(), 1);
    let source = &output.packages[0].source;

    let expected = r#"// Code generated by valtag. DO NOT EDIT.
// package: models

/// Checks the field annotations of `User`.
#[allow(clippy::bool_comparison, clippy::comparison_to_empty, clippy::len_zero, clippy::nonminimal_bool)]
pub fn validate_user(obj: &User) -> Vec<crate::support::ValidationError> {
    let mut errs = Vec::new();
    if !(obj.FirstName != "") {
        errs.push(crate::support::ValidationError::new("FirstName", "FirstName is required"));
    }
    if !(obj.LastName != "") {
        errs.push(crate::support::ValidationError::new("LastName", "LastName is required"));
    }
    if !(obj.Age != 0) {
        errs.push(crate::support::ValidationError::new("Age", "Age is required"));
    }
    if !((obj.Role == "admin") || (obj.Role == "user")) {
        errs.push(crate::support::ValidationError::new("Role", "Role must be one of 'admin' 'user'"));
    }
    errs
}
"#;
    assert_eq!(source.as_str(), expected);
}

#[test]
fn collections_optionals_and_peers() {
    let m = manifest(r#"[
        { "name": "Profile", "fields": [
            { "name": "tags", "type": "Vec<String>", "tag": "min=1, nin='x y' 'z'" },
            { "name": "labels", "type": "HashMap<String, u32>", "tag": "in=a b" },
            { "name": "nick", "type": "Option<String>", "tag": "required, eq_ignore_case=Bob" },
            { "name": "contact", "type": "Option<String>", "tag": "email" },
            { "name": "low", "type": "i32", "tag": "" },
            { "name": "high", "type": "i64", "tag": "gtefield=low" },
            { "name": "ratio", "type": "f32", "tag": "lt=1" }
        ] }
    ]"#);
    let output = compile(m.types, &options()).unwrap();
    let source = &output.validators[0].source;
    for line in [
        "if !(obj.tags.len() >= 1) {",
        r#"if !(obj.tags.iter().all(|e| !["x y", "z"].contains(&e.as_str()))) {"#,
        r#"if !(obj.labels.keys().all(|e| ["a", "b"].contains(&e.as_str()))) {"#,
        r#"if !(obj.nick.as_ref().is_some_and(|v| *v != "")) {"#,
        r#"if !(obj.nick.as_ref().is_some_and(|v| v.to_lowercase() == "bob")) {"#,
        "if !(obj.contact.as_ref().is_some_and(|v| crate::support::is_valid_email(&*v))) {",
        "if !((obj.high as i128) >= (obj.low as i128)) {",
        "if !(obj.ratio < 1.0) {",
    ] {
        assert!(source.contains(line), "missing `{line}` in\n{source}");
    }
}

#[test]
fn packages_get_their_own_files_and_nested_calls_cross_them() {
    let m = manifest(r#"{
        "options": { "support_path": "crate::support" },
        "types": [
            { "name": "Order", "package": "orders", "fields": [
                { "name": "customer", "type": "crate::people::Customer", "tag": "" },
                { "name": "backup", "type": "Option<crate::people::Customer>", "tag": "" }
            ] },
            { "name": "Customer", "package": "people", "fields": [
                { "name": "email", "type": "String", "tag": "email" }
            ] }
        ]
    }"#);
    // Order has no annotations of its own, so it gets no validator.
    let output = compile(m.types, &m.options.unwrap()).unwrap();
    let packages: Vec<&str> = output.packages.iter().map(|p| p.package.as_str()).collect();
    assert_eq!(packages, vec!["people"]);
    assert!(output.support.contains("pub struct ValidationError"));
}

#[test]
fn nested_delegation_in_a_validated_type() {
    let m = manifest(r#"[
        { "name": "Order", "package": "orders", "fields": [
            { "name": "id", "type": "u64", "tag": "required" },
            { "name": "customer", "type": "crate::people::Customer", "tag": "" },
            { "name": "backup", "type": "Option<crate::people::Customer>", "tag": "required" }
        ] },
        { "name": "Customer", "package": "people", "fields": [
            { "name": "email", "type": "String", "tag": "email" }
        ] }
    ]"#);
    let output = compile(m.types, &options()).unwrap();
    let order = &output.validators[0].source;
    assert!(order.contains("    errs.extend(crate::people::validate_customer(&obj.customer));\n"));
    assert!(order.contains("    if !(obj.backup.is_some()) {\n"));
    assert!(order.contains("    if let Some(v) = &obj.backup {\n        errs.extend(crate::people::validate_customer(v));\n    }\n"));
}

#[test]
fn failures_produce_nothing() {
    let m = manifest(r#"[
        { "name": "Good", "fields": [ { "name": "a", "type": "String", "tag": "required" } ] },
        { "name": "Bad", "fields": [ { "name": "b", "type": "String", "tag": "eqfield=a" } ] }
    ]"#);
    let err = compile(m.types, &options()).unwrap_err();
    assert_eq!(err, Error::Semantic(SemanticError::UndefinedField {
        owner: "Bad".into(),
        field: "b".into(),
        reference: "a".into(),
    }));
}

#[test]
fn duplicate_types_are_rejected() {
    let m = manifest(r#"[
        { "name": "A", "package": "m", "fields": [] },
        { "name": "A", "package": "m", "fields": [] }
    ]"#);
    let err = compile(m.types, &options()).unwrap_err();
    assert!(matches!(err, Error::Semantic(SemanticError::DuplicateType { .. })), "{err}");
}
