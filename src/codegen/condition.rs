//! Conditions: one boolean check plus its error message per (field, rule) pair.
//!
//! The table below is keyed by `(OpKind, Category, ShapeKind)`. Optional types share the
//! entry of their inner type and get a null guard wrapped around the result.
use crate::error::InternalError;
use crate::ir::Rule;
use crate::literal::{common_integer, LiteralKind};
use crate::registry::OpKind;
use crate::taxonomy::{Category, FieldType, ShapeKind};

use super::expr::{CmpOp, Connective, Expr, Lit, Place, Widen};

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub op: OpKind,
    pub left: Expr,
    pub operator: Operator,
    pub rights: Vec<Expr>,
    pub concat: Option<Connective>,
    /// Optional value that must be set before `left` can be read.
    pub guard: Option<Expr>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// `left <op> right`, one term per right operand.
    Cmp(CmpOp),
    Email,
    /// Every element of `left` is one of the right operands.
    AllIn { keys: bool, item: Expr },
    /// No element of `left` is one of the right operands.
    NoneIn { keys: bool, item: Expr },
    /// Holds by construction (fixed-size lists are never empty).
    Always,
}

// ————————————————————————————————————————————————————————————————————————————
// TABLE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy)]
enum Operand {
    Value,
    Len,
    Lower,
}

#[derive(Debug, Clone)]
enum Right {
    Fixed(Lit),
    Targets,
    Peer,
    Nothing,
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Cmp(CmpOp),
    Email,
    AllIn,
    NoneIn,
    Always,
}

#[derive(Debug, Clone)]
struct Template {
    operand: Operand,
    shape: Shape,
    right: Right,
    concat: Option<Connective>,
    message: &'static str,
}

fn cmp(operand: Operand, op: CmpOp, right: Right, message: &'static str) -> Template {
    Template { operand, shape: Shape::Cmp(op), right, concat: None, message }
}

fn template(op: OpKind, category: Category, shape: ShapeKind) -> Option<Template> {
    use Category::{Bool, Float, Integer, String};
    use CmpOp::{Eq, Ge, Gt, Le, Lt, Ne};
    use Operand::{Len, Lower, Value};
    use ShapeKind::{Dict, FixedList, List, Plain};

    let t = match (op, category, shape) {
        (OpKind::Required, String, Plain) => cmp(Value, Ne, Right::Fixed(Lit::Str(std::string::String::new())), "{name} is required"),
        (OpKind::Required, Integer, Plain) => cmp(Value, Ne, Right::Fixed(Lit::Int(0)), "{name} is required"),
        (OpKind::Required, Float, Plain) => cmp(Value, Ne, Right::Fixed(Lit::Float(0.0)), "{name} is required"),
        (OpKind::Required, Bool, Plain) => cmp(Value, Ne, Right::Fixed(Lit::Bool(false)), "{name} is required"),
        (OpKind::Required, _, List | Dict) => cmp(Len, Ne, Right::Fixed(Lit::Size(0)), "{name} must not be empty"),
        (OpKind::Required, _, FixedList) => Template {
            operand: Value,
            shape: Shape::Always,
            right: Right::Nothing,
            concat: None,
            message: "{name} is required",
        },

        (OpKind::Eq, _, Plain) => cmp(Value, Eq, Right::Targets, "{name} must be equal to {target}"),
        (OpKind::Neq, _, Plain) => cmp(Value, Ne, Right::Targets, "{name} must not be equal to {target}"),
        (OpKind::EqIgnoreCase, String, Plain) => cmp(Lower, Eq, Right::Targets, "{name} must be equal to {target}"),
        (OpKind::NeqIgnoreCase, String, Plain) => cmp(Lower, Ne, Right::Targets, "{name} must not be equal to {target}"),

        (OpKind::Gt, Integer | Float, Plain) => cmp(Value, Gt, Right::Targets, "{name} must be > {target}"),
        (OpKind::Gte, Integer | Float, Plain) => cmp(Value, Ge, Right::Targets, "{name} must be >= {target}"),
        (OpKind::Lt, Integer | Float, Plain) => cmp(Value, Lt, Right::Targets, "{name} must be < {target}"),
        (OpKind::Lte, Integer | Float, Plain) => cmp(Value, Le, Right::Targets, "{name} must be <= {target}"),

        (OpKind::Min, String, Plain) => cmp(Len, Ge, Right::Targets, "{name} length must be >= {target}"),
        (OpKind::Max, String, Plain) => cmp(Len, Le, Right::Targets, "{name} length must be <= {target}"),
        (OpKind::Len, String, Plain) => cmp(Len, Eq, Right::Targets, "{name} length must be {target}"),
        (OpKind::Min, Integer | Float, Plain) => cmp(Value, Ge, Right::Targets, "{name} must be >= {target}"),
        (OpKind::Max, Integer | Float, Plain) => cmp(Value, Le, Right::Targets, "{name} must be <= {target}"),
        (OpKind::Min, _, List | Dict) => cmp(Len, Ge, Right::Targets, "{name} must have at least {target} elements"),
        (OpKind::Max, _, List | Dict) => cmp(Len, Le, Right::Targets, "{name} must have at most {target} elements"),
        (OpKind::Len, _, List | Dict) => cmp(Len, Eq, Right::Targets, "{name} must have exactly {target} elements"),

        (OpKind::In, _, Plain) => Template {
            concat: Some(Connective::Or),
            ..cmp(Value, Eq, Right::Targets, "{name} must be one of {targets}")
        },
        (OpKind::Nin, _, Plain) => Template {
            concat: Some(Connective::And),
            ..cmp(Value, Ne, Right::Targets, "{name} must not be one of {targets}")
        },
        (OpKind::In | OpKind::Nin, _, List | FixedList | Dict) => {
            let (shape, message) = match (op, shape) {
                (OpKind::In, Dict) => (Shape::AllIn, "{name} keys must be one of {targets}"),
                (OpKind::In, _) => (Shape::AllIn, "{name} elements must be one of {targets}"),
                (_, Dict) => (Shape::NoneIn, "{name} keys must not be one of {targets}"),
                _ => (Shape::NoneIn, "{name} elements must not be one of {targets}"),
            };
            Template { operand: Value, shape, right: Right::Targets, concat: None, message }
        }

        (OpKind::Email, String, Plain) => Template {
            operand: Value,
            shape: Shape::Email,
            right: Right::Nothing,
            concat: None,
            message: "{name} must be a valid email",
        },

        (OpKind::EqField, _, Plain) => cmp(Value, Eq, Right::Peer, "{name} must be equal to {target}"),
        (OpKind::NeqField, _, Plain) => cmp(Value, Ne, Right::Peer, "{name} must not be equal to {target}"),
        (OpKind::GtField, Integer | Float, Plain) => cmp(Value, Gt, Right::Peer, "{name} must be > {target}"),
        (OpKind::GteField, Integer | Float, Plain) => cmp(Value, Ge, Right::Peer, "{name} must be >= {target}"),
        (OpKind::LtField, Integer | Float, Plain) => cmp(Value, Lt, Right::Peer, "{name} must be < {target}"),
        (OpKind::LteField, Integer | Float, Plain) => cmp(Value, Le, Right::Peer, "{name} must be <= {target}"),

        _ => return None,
    };
    Some(t)
}

// ————————————————————————————————————————————————————————————————————————————
// BUILD
// ————————————————————————————————————————————————————————————————————————————

pub fn build_condition(field: &str, ty: &FieldType, rule: &Rule) -> Result<Condition, InternalError> {
    let op = rule.validation.op;
    let class = ty.class();
    let template = template(op, class.category, class.shape).ok_or_else(|| {
        InternalError::MissingCondition { op: op.to_string(), class: class.to_string() }
    })?;

    let own_path = vec![field.to_string()];
    let (place, guard) = if ty.optional {
        (Place::Bound, Some(Expr::field(&own_path)))
    } else {
        (Place::Field(own_path.clone()), None)
    };
    let value = Expr::Value(place);

    let mut left = match template.operand {
        Operand::Value => value,
        Operand::Len => Expr::len(value),
        Operand::Lower => Expr::Lower(Box::new(value)),
    };

    let kind = LiteralKind::for_target(op, ty);
    let rights = match &template.right {
        Right::Fixed(lit) => vec![Expr::Lit(lit.clone())],
        Right::Nothing => Vec::new(),
        Right::Targets => rule
            .validation
            .values
            .iter()
            .map(|raw| -> Result<Expr, InternalError> {
                let lit = kind.parse(raw).ok_or_else(|| InternalError::InvalidLiteral {
                    op: op.to_string(),
                    value: raw.clone(),
                })?;
                Ok(Expr::Lit(match (template.operand, lit) {
                    (Operand::Lower, Lit::Str(s)) => Lit::Str(s.to_lowercase()),
                    (_, lit) => lit,
                }))
            })
            .collect::<Result<Vec<_>, InternalError>>()?,
        Right::Peer => {
            let peer = rule.peer.as_ref().ok_or_else(|| InternalError::MissingCondition {
                op: op.to_string(),
                class: class.to_string(),
            })?;
            let mut right = Expr::field(&peer.path);
            if peer.ty.base.trim() != ty.base.trim() {
                let widen = match ty.category {
                    Category::Float => Some(Widen::Float),
                    Category::Integer => Some(common_integer(&ty.base, &peer.ty.base).ok_or_else(|| {
                        InternalError::MissingCondition { op: op.to_string(), class: class.to_string() }
                    })?),
                    _ => None,
                };
                if let Some(widen) = widen {
                    left = Expr::Widen(widen, Box::new(left));
                    right = Expr::Widen(widen, Box::new(right));
                }
            }
            vec![right]
        }
    };

    let item = if ty.category == Category::String && !ty.base.trim_start().starts_with('&') {
        Expr::AsStr(Box::new(Expr::Value(Place::Element)))
    } else {
        Expr::Value(Place::Element)
    };
    let keys = class.shape == ShapeKind::Dict;
    let operator = match template.shape {
        Shape::Cmp(cmp) => Operator::Cmp(cmp),
        Shape::Email => Operator::Email,
        Shape::AllIn => Operator::AllIn { keys, item },
        Shape::NoneIn => Operator::NoneIn { keys, item },
        Shape::Always => Operator::Always,
    };

    let message = render_message(template.message, field, rule, kind);
    Ok(Condition { op, left, operator, rights, concat: template.concat, guard, message })
}

impl Condition {
    /// The complete check: all right operands joined by the connective, under the guard.
    pub fn expr(&self) -> Result<Expr, InternalError> {
        let body = match &self.operator {
            Operator::Cmp(cmp) => {
                let terms: Vec<Expr> = self
                    .rights
                    .iter()
                    .map(|right| Expr::cmp(*cmp, self.left.clone(), right.clone()))
                    .collect();
                match (terms.len(), self.concat) {
                    (1, _) => Expr::join(Connective::And, terms),
                    (n, Some(concat)) if n > 1 => Expr::join(concat, terms),
                    (count, _) => {
                        return Err(InternalError::MissingConcat { op: self.op.to_string(), count });
                    }
                }
            }
            Operator::Email => Expr::IsEmail(Box::new(self.left.clone())),
            Operator::AllIn { keys, item } => self.every(*keys, item, false),
            Operator::NoneIn { keys, item } => self.every(*keys, item, true),
            Operator::Always => Expr::Const(true),
        };
        Ok(match &self.guard {
            Some(option) => Expr::SomeAnd { option: Box::new(option.clone()), body: Box::new(body) },
            None => body,
        })
    }

    fn every(&self, keys: bool, item: &Expr, negate: bool) -> Expr {
        let set = self
            .rights
            .iter()
            .filter_map(|r| match r {
                Expr::Lit(lit) => Some(lit.clone()),
                _ => None,
            })
            .collect();
        let member = Expr::InSet { item: Box::new(item.clone()), set };
        Expr::Every {
            collection: Box::new(self.left.clone()),
            keys,
            body: Box::new(if negate { Expr::not(member) } else { member }),
        }
    }
}

fn render_message(template: &str, field: &str, rule: &Rule, kind: LiteralKind) -> String {
    let values = &rule.validation.values;
    let quote = |v: &String| format!("'{v}'");
    let target = match values.first() {
        Some(v) if rule.peer.is_none() && kind == LiteralKind::Text => quote(v),
        Some(v) => v.trim().to_string(),
        None => String::new(),
    };
    let targets = values.iter().map(quote).collect::<Vec<_>>().join(" ");
    template
        .replace("{targets}", &targets)
        .replace("{target}", &target)
        .replace("{name}", field)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
