//! Field type taxonomy.
//!
//! Collapses a declared Rust type into the handful of facts code generation cares about:
//! the base category, the container shape around it, and whether it sits behind `Option`.
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    String,
    Bool,
    Integer,
    Float,
    /// Not a primitive: a nested declaration or something we do not know about.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Plain,
    List,
    FixedList(usize),
    Dict,
}

/// `Shape` without the fixed-list size; the part the registry keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Plain,
    List,
    FixedList,
    Dict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub category: Category,
    pub shape: Shape,
    pub optional: bool,
    /// Base type name as written, after peeling `Option` and the container.
    /// For dictionaries this is the key type.
    pub base: String,
}

/// Structured lookup key shared by the registry and the condition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeClass {
    pub category: Category,
    pub shape: ShapeKind,
    pub optional: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// NORMALIZATION
// ————————————————————————————————————————————————————————————————————————————

static OPTION_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:std|core)::option::)?Option\s*<(.+)>$").expect("valid regex")
});
static VEC_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:std|alloc)::vec::)?Vec\s*<(.+)>$").expect("valid regex")
});
static MAP_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:std::collections::)?(?:HashMap|BTreeMap|IndexMap|indexmap::IndexMap)\s*<(.+)>$")
        .expect("valid regex")
});
static ARRAY_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(.+);\s*(\d+)\s*\]$").expect("valid regex")
});

impl FieldType {
    pub fn normalize(raw: &str) -> Self {
        let raw = raw.trim();
        let (optional, rest) = match OPTION_RX.captures(raw) {
            Some(caps) => (true, caps[1].trim().to_string()),
            None => (false, raw.to_string()),
        };

        let (shape, base) = if let Some(caps) = VEC_RX.captures(&rest) {
            (Shape::List, caps[1].trim().to_string())
        } else if let Some(caps) = ARRAY_RX.captures(&rest) {
            match caps[2].parse::<usize>() {
                Ok(size) => (Shape::FixedList(size), caps[1].trim().to_string()),
                Err(_) => (Shape::Plain, rest.clone()),
            }
        } else if let Some(caps) = MAP_RX.captures(&rest) {
            let key = split_generic_args(&caps[1])
                .into_iter()
                .next()
                .unwrap_or_default();
            (Shape::Dict, key)
        } else {
            (Shape::Plain, rest.clone())
        };

        let category = base_category(&base);
        Self { category, shape, optional, base }
    }

    pub fn is_primitive(&self) -> bool {
        self.category != Category::Invalid
    }

    pub fn class(&self) -> TypeClass {
        TypeClass {
            category: self.category,
            shape: self.shape.kind(),
            optional: self.optional,
        }
    }

    /// Plain and not behind `Option`: something a field comparison can read directly.
    pub fn is_bare(&self) -> bool {
        self.shape == Shape::Plain && !self.optional
    }
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Plain => ShapeKind::Plain,
            Shape::List => ShapeKind::List,
            Shape::FixedList(_) => ShapeKind::FixedList,
            Shape::Dict => ShapeKind::Dict,
        }
    }
}

fn base_category(base: &str) -> Category {
    let base = base.trim();
    // `&str`, `&'a str`
    let unref = base
        .strip_prefix('&')
        .map(|s| {
            let s = s.trim_start();
            match s.strip_prefix('\'') {
                Some(lt) => lt.split_once(char::is_whitespace).map_or("", |(_, t)| t),
                None => s,
            }
        })
        .unwrap_or(base)
        .trim();
    match unref {
        "String" | "std::string::String" | "alloc::string::String" | "str" => Category::String,
        "bool" => Category::Bool,
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" => Category::Integer,
        "f32" | "f64" => Category::Float,
        _ => Category::Invalid,
    }
}

/// Split `K, V` on top-level commas (commas nested in `<..>`, `(..)`, `[..]` are kept).
fn split_generic_args(src: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in src.chars() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                out.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// DISPLAY
// ————————————————————————————————————————————————————————————————————————————

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::String => "string",
            Category::Bool => "bool",
            Category::Integer => "integer",
            Category::Float => "float",
            Category::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = match self.shape {
            ShapeKind::Plain => format!("<{}>", self.category),
            ShapeKind::List => format!("[]<{}>", self.category),
            ShapeKind::FixedList => format!("[N]<{}>", self.category),
            ShapeKind::Dict => format!("map[<{}>]", self.category),
        };
        if self.optional { write!(f, "?{inner}") } else { f.write_str(&inner) }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
