// Declarations handed to the compiler, and what the analyzer attaches to them.

use serde::{Deserialize, Serialize};

use crate::registry::{Arity, OpKind};
use crate::taxonomy::FieldType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredType {
    pub name: String,
    /// Declaring package (module path). Empty means the crate root.
    #[serde(default)]
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    pub fields: Vec<Field>,
    #[serde(skip)]
    pub has_validations: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    #[serde(default)]
    pub line: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line == 0 {
            f.write_str(&self.file)
        } else {
            write!(f, "{}:{}", self.file, self.line)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub tag: String,
    /// Filled in by the analyzer, in annotation order.
    #[serde(skip)]
    pub rules: Vec<Rule>,
}

/// One parsed annotation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub op: OpKind,
    pub arity: Arity,
    pub values: Vec<String>,
}

/// A validation after semantic analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub validation: Validation,
    /// Resolved target of a field comparison.
    pub peer: Option<Peer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    /// Field names from the compared type down to the target field.
    pub path: Vec<String>,
    pub ty: FieldType,
}

/// Index of a declaration in the collection being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

impl DeclaredType {
    /// `package::Name`, or just `Name` at the crate root.
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.package, self.name)
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl Field {
    pub fn field_type(&self) -> FieldType {
        FieldType::normalize(&self.ty)
    }
}
