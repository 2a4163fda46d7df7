//! Rust rendering of validator IR.
use super::assemble::{Block, GeneratedValidator, ValidatorIr};
use super::expr::{Expr, Lit, Place, Widen};
use super::{CodegenOptions, Printer};

#[derive(Debug, Clone)]
pub struct RustPrinter {
    support_path: String,
}

const LINTS: &str = "#[allow(clippy::bool_comparison, clippy::comparison_to_empty, clippy::len_zero, clippy::nonminimal_bool)]";

impl RustPrinter {
    pub fn new(options: &CodegenOptions) -> Self {
        Self { support_path: options.support_path.trim_end_matches("::").to_string() }
    }

    fn value(&self, place: &Place) -> String {
        match place {
            Place::Field(path) => format!("obj.{}", path.join(".")),
            Place::Bound => "*v".to_string(),
            Place::Element => "*e".to_string(),
        }
    }

    /// Left of a `.method()` call; auto-deref makes the `*` unnecessary.
    fn receiver(&self, expr: &Expr) -> String {
        match expr {
            Expr::Value(Place::Bound) => "v".to_string(),
            Expr::Value(Place::Element) => "e".to_string(),
            Expr::Value(place) => self.value(place),
            Expr::Len(_) | Expr::Lower(_) | Expr::AsStr(_) | Expr::Lit(_) | Expr::Const(_) => self.expr(expr),
            _ => format!("({})", self.expr(expr)),
        }
    }

    /// Operand of `!`, `==`, `&&` and friends.
    fn atom(&self, expr: &Expr) -> String {
        match expr {
            Expr::Cmp { .. } | Expr::Logic { .. } | Expr::Not(_) => format!("({})", self.expr(expr)),
            _ => self.expr(expr),
        }
    }
}

fn lit(lit: &Lit) -> String {
    match lit {
        Lit::Str(s) => format!("{s:?}"),
        Lit::Int(n) => n.to_string(),
        Lit::UInt(n) => n.to_string(),
        Lit::Float(f) => format!("{f:?}"),
        Lit::Bool(b) => b.to_string(),
        Lit::Size(n) => n.to_string(),
    }
}

impl Printer for RustPrinter {
    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Const(b) => b.to_string(),
            Expr::Value(place) => self.value(place),
            Expr::Lit(l) => lit(l),
            Expr::Len(inner) => format!("{}.len()", self.receiver(inner)),
            Expr::Lower(inner) => format!("{}.to_lowercase()", self.receiver(inner)),
            Expr::AsStr(inner) => format!("{}.as_str()", self.receiver(inner)),
            Expr::Widen(widen, inner) => {
                let to = match widen {
                    Widen::Integer => "i128",
                    Widen::Unsigned => "u128",
                    Widen::Float => "f64",
                };
                format!("({} as {to})", self.expr(inner))
            }
            Expr::IsEmail(inner) => format!("{}::is_valid_email(&{})", self.support_path, self.expr(inner)),
            Expr::Cmp { op, lhs, rhs } => format!("{} {} {}", self.atom(lhs), op.symbol(), self.atom(rhs)),
            Expr::Not(inner) => format!("!{}", self.atom(inner)),
            Expr::Logic { op, terms } => terms
                .iter()
                .map(|t| self.atom(t))
                .collect::<Vec<_>>()
                .join(&format!(" {} ", op.symbol())),
            Expr::InSet { item, set } => {
                let set = set.iter().map(lit).collect::<Vec<_>>().join(", ");
                format!("[{set}].contains(&{})", self.expr(item))
            }
            Expr::Every { collection, keys, body } => {
                let iter = if *keys { "keys" } else { "iter" };
                format!("{}.{iter}().all(|e| {})", self.receiver(collection), self.expr(body))
            }
            Expr::SomeAnd { option, body } if body.is_const_true() => {
                format!("{}.is_some()", self.receiver(option))
            }
            Expr::SomeAnd { option, body } => {
                format!("{}.as_ref().is_some_and(|v| {})", self.receiver(option), self.expr(body))
            }
        }
    }

    fn validator(&self, validator: &ValidatorIr) -> String {
        let error = format!("{}::ValidationError", self.support_path);
        let mut out = String::new();
        out.push_str(&format!("/// Checks the field annotations of `{}`.\n", validator.type_name));
        out.push_str(LINTS);
        out.push('\n');
        out.push_str(&format!(
            "pub fn {}(obj: &{}) -> Vec<{error}> {{\n",
            validator.fn_name, validator.type_name
        ));
        if validator.blocks.is_empty() {
            out.push_str("    let errs = Vec::new();\n");
        } else {
            out.push_str("    let mut errs = Vec::new();\n");
        }
        for block in &validator.blocks {
            match block {
                Block::Check { condition, field, message } => {
                    out.push_str(&format!("    if !({}) {{\n", self.expr(condition)));
                    out.push_str(&format!("        errs.push({error}::new({field:?}, {message:?}));\n"));
                    out.push_str("    }\n");
                }
                Block::Delegate { field, call, optional: false } => {
                    out.push_str(&format!("    errs.extend({call}(&obj.{field}));\n"));
                }
                Block::Delegate { field, call, optional: true } => {
                    out.push_str(&format!("    if let Some(v) = &obj.{field} {{\n"));
                    out.push_str(&format!("        errs.extend({call}(v));\n"));
                    out.push_str("    }\n");
                }
            }
        }
        out.push_str("    errs\n}\n");
        out
    }

    fn file(&self, package: &str, validators: &[&GeneratedValidator]) -> String {
        let mut out = String::from("// Code generated by valtag. DO NOT EDIT.\n");
        if !package.is_empty() {
            out.push_str(&format!("// package: {package}\n"));
        }
        for validator in validators {
            out.push('\n');
            out.push_str(&validator.source);
        }
        out
    }

    fn support(&self) -> String {
        SUPPORT_MODULE.to_string()
    }
}

const SUPPORT_MODULE: &str = r#"// Code generated by valtag. DO NOT EDIT.

/// A single failed check reported by a generated validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// `local@domain.tld` with a conservative character set on both sides.
pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.len() > 255 {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c));
    if !local_ok {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld = labels[labels.len() - 1];
    labels_ok && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}
"#;
