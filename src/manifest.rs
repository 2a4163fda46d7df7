//! Declaration manifests: the JSON form of the types handed to the compiler.
//!
//! Either a bare array of declarations, or a document carrying codegen options too:
//!
//! ```json
//! { "options": { "support_path": "crate::support" }, "types": [ ... ] }
//! ```
use serde::Deserialize;

use crate::codegen::CodegenOptions;
use crate::ir::DeclaredType;
use crate::path_de::{from_str_with_path, PathError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub options: Option<CodegenOptions>,
    pub types: Vec<DeclaredType>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    #[serde(default)]
    options: Option<CodegenOptions>,
    types: Vec<DeclaredType>,
}

impl Manifest {
    pub fn from_json(src: &str) -> Result<Self, PathError> {
        // decoded per shape so errors keep their JSON path
        if src.trim_start().starts_with('[') {
            let types = from_str_with_path::<Vec<DeclaredType>>(src)?;
            Ok(Self { options: None, types })
        } else {
            let doc = from_str_with_path::<Document>(src)?;
            Ok(Self { options: doc.options, types: doc.types })
        }
    }

    /// Concatenate declarations; the first manifest that sets options wins.
    pub fn merge(manifests: impl IntoIterator<Item = Manifest>) -> Self {
        manifests.into_iter().fold(Self::default(), |mut acc, next| {
            acc.options = acc.options.or(next.options);
            acc.types.extend(next.types);
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_a_bare_array() {
        let src = r#"[
            { "name": "User", "fields": [ { "name": "age", "type": "u8", "tag": "gte=18" } ] }
        ]"#;
        let manifest = Manifest::from_json(src).unwrap();
        assert_eq!(manifest.options, None);
        assert_eq!(manifest.types[0].package, "");
        assert_eq!(manifest.types[0].fields[0].tag, "gte=18");
    }

    #[test]
    fn reads_a_document_with_options() {
        let src = r#"{
            "options": { "support_path": "crate::support" },
            "types": [ { "name": "User", "package": "models", "fields": [] } ]
        }"#;
        let manifest = Manifest::from_json(src).unwrap();
        assert_eq!(manifest.options.map(|o| o.support_path), Some("crate::support".to_string()));
        assert_eq!(manifest.types[0].qualified_name(), "models::User");
    }

    #[test]
    fn errors_point_at_the_offending_node() {
        let src = r#"[ { "name": "User", "fields": [ { "name": "age", "type": 5 } ] } ]"#;
        let err = Manifest::from_json(src).unwrap_err();
        assert_eq!(err.path, "[0].fields[0].type");
    }

    #[test]
    fn merge_keeps_order_and_first_options() {
        let a = Manifest::from_json(r#"[ { "name": "A", "fields": [] } ]"#).unwrap();
        let b = Manifest::from_json(
            r#"{ "options": { "support_path": "x" }, "types": [ { "name": "B", "fields": [] } ] }"#,
        )
        .unwrap();
        let merged = Manifest::merge([a, b]);
        let names: Vec<&str> = merged.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(merged.options.map(|o| o.support_path), Some("x".to_string()));
    }
}
