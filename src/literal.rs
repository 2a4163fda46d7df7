//! Target values: what an operation expects a literal to look like, and how it is rendered.
use crate::codegen::expr::{Lit, Widen};
use crate::registry::OpKind;
use crate::taxonomy::{Category, FieldType, Shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Text,
    Integer { min: i128, max: u128 },
    /// `single` is an `f32` field: the value must stay finite after narrowing.
    Float { single: bool },
    Bool,
    /// A length or element count.
    Size,
}

impl LiteralKind {
    /// Expected literal for a non-comparison operation applied to `ty`.
    pub fn for_target(op: OpKind, ty: &FieldType) -> Self {
        let sized = matches!(ty.shape, Shape::List | Shape::Dict);
        match op {
            OpKind::Min | OpKind::Max | OpKind::Len
                if sized || ty.category == Category::String =>
            {
                LiteralKind::Size
            }
            OpKind::EqIgnoreCase | OpKind::NeqIgnoreCase => LiteralKind::Text,
            _ => Self::for_category(ty),
        }
    }

    fn for_category(ty: &FieldType) -> Self {
        match ty.category {
            Category::Integer => {
                let (min, max) = integer_bounds(&ty.base);
                LiteralKind::Integer { min, max }
            }
            Category::Float => LiteralKind::Float { single: ty.base.trim() == "f32" },
            Category::Bool => LiteralKind::Bool,
            Category::String | Category::Invalid => LiteralKind::Text,
        }
    }

    pub fn parse(self, value: &str) -> Option<Lit> {
        let value = value.trim();
        match self {
            LiteralKind::Text => Some(Lit::Str(value.to_string())),
            LiteralKind::Integer { min, max } => match value.parse::<i128>() {
                Ok(n) => (n >= min && (n < 0 || n.unsigned_abs() <= max)).then_some(Lit::Int(n)),
                Err(_) => value.parse::<u128>().ok().filter(|n| *n <= max).map(Lit::UInt),
            },
            LiteralKind::Float { single } => value
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && !(single && (*f as f32).is_infinite()))
                .map(Lit::Float),
            LiteralKind::Bool => value.parse::<bool>().ok().map(Lit::Bool),
            LiteralKind::Size => value.parse::<usize>().ok().map(Lit::Size),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            LiteralKind::Text => "a string",
            LiteralKind::Integer { .. } => "an integer within the field's range",
            LiteralKind::Float { single: false } => "a finite number",
            LiteralKind::Float { single: true } => "a number within `f32` range",
            LiteralKind::Bool => "`true` or `false`",
            LiteralKind::Size => "a non-negative size",
        }
    }
}

fn integer_bounds(base: &str) -> (i128, u128) {
    match base.trim() {
        "i8" => (i8::MIN.into(), i8::MAX as u128),
        "i16" => (i16::MIN.into(), i16::MAX as u128),
        "i32" => (i32::MIN.into(), i32::MAX as u128),
        "i64" | "isize" => (i64::MIN.into(), i64::MAX as u128),
        "u8" => (0, u8::MAX.into()),
        "u16" => (0, u16::MAX.into()),
        "u32" => (0, u32::MAX.into()),
        "u64" | "usize" => (0, u64::MAX.into()),
        "u128" => (0, u128::MAX),
        _ => (i128::MIN, i128::MAX as u128),
    }
}

/// Type two integer fields of different widths are compared in. `None` when no
/// primitive holds both, i.e. `u128` against a signed type.
pub fn common_integer(left: &str, right: &str) -> Option<Widen> {
    let (left, right) = (left.trim(), right.trim());
    if left != "u128" && right != "u128" {
        return Some(Widen::Integer);
    }
    let unsigned = |base: &str| base.starts_with('u');
    (unsigned(left) && unsigned(right)).then_some(Widen::Unsigned)
}
