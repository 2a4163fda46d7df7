//! Code generation: conditions, validator assembly and rendering.
pub mod assemble;
pub mod condition;
pub mod expr;
pub mod rust;

use serde::{Deserialize, Serialize};

pub use assemble::{Assembler, Block, GeneratedValidator, ValidatorIr};
pub use condition::{build_condition, Condition, Operator};
pub use rust::RustPrinter;

/// Renders validator IR into a concrete target language.
pub trait Printer {
    fn expr(&self, expr: &expr::Expr) -> String;
    fn validator(&self, validator: &ValidatorIr) -> String;
    /// One output file holding the validators of a package.
    fn file(&self, package: &str, validators: &[&GeneratedValidator]) -> String;
    /// Runtime support the generated validators call into.
    fn support(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenOptions {
    /// Module path where the generated code finds `ValidationError` and `is_valid_email`.
    pub support_path: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self { support_path: "crate::validation".to_string() }
    }
}

/// `HTTPServer` → `validate_http_server`
pub fn validator_fn_name(type_name: &str) -> String {
    let chars: Vec<char> = type_name.chars().collect();
    let mut out = String::from("validate_");
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}
