//! The operation registry: every validation the tag grammar understands.
//!
//! Built once per process and shared by reference; nothing mutates it after construction.
use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::taxonomy::{Category, FieldType, ShapeKind, TypeClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Zero,
    One,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    Required,
    Eq,
    Neq,
    EqIgnoreCase,
    NeqIgnoreCase,
    Gt,
    Gte,
    Lt,
    Lte,
    Min,
    Max,
    Len,
    In,
    Nin,
    Email,
    EqField,
    NeqField,
    GtField,
    GteField,
    LtField,
    LteField,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OpKind,
    pub arity: Arity,
    /// Target is another field of the same type, not a literal.
    pub field_comparison: bool,
    pub valid_types: HashSet<TypeClass>,
}

#[derive(Debug)]
pub struct Registry {
    ops: IndexMap<&'static str, Operation>,
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

// ————————————————————————————————————————————————————————————————————————————
// CLASS SETS
// ————————————————————————————————————————————————————————————————————————————

use crate::taxonomy::Category::{Bool, Float, Integer, String as Str};

const PRIMITIVES: &[Category] = &[Str, Bool, Integer, Float];
const ORDERED: &[Category] = &[Integer, Float];
const MEMBERSHIP: &[Category] = &[Str, Integer, Float];
const BOTH: &[bool] = &[false, true];
const BARE: &[bool] = &[false];

fn classes(categories: &[Category], shapes: &[ShapeKind], optional: &[bool]) -> HashSet<TypeClass> {
    let mut out = HashSet::new();
    for &category in categories {
        for &shape in shapes {
            for &optional in optional {
                out.insert(TypeClass { category, shape, optional });
            }
        }
    }
    out
}

fn union(a: HashSet<TypeClass>, b: HashSet<TypeClass>) -> HashSet<TypeClass> {
    a.into_iter().chain(b).collect()
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Registry {
    fn new() -> Self {
        use ShapeKind::{Dict, FixedList, List, Plain};

        let sized = || classes(PRIMITIVES, &[List, Dict], BOTH);
        let table = [
            (OpKind::Required, Arity::Zero, false, classes(PRIMITIVES, &[Plain, List, FixedList, Dict], BOTH)),
            (OpKind::Eq, Arity::One, false, classes(PRIMITIVES, &[Plain], BOTH)),
            (OpKind::Neq, Arity::One, false, classes(PRIMITIVES, &[Plain], BOTH)),
            (OpKind::EqIgnoreCase, Arity::One, false, classes(&[Str], &[Plain], BOTH)),
            (OpKind::NeqIgnoreCase, Arity::One, false, classes(&[Str], &[Plain], BOTH)),
            (OpKind::Gt, Arity::One, false, classes(ORDERED, &[Plain], BOTH)),
            (OpKind::Gte, Arity::One, false, classes(ORDERED, &[Plain], BOTH)),
            (OpKind::Lt, Arity::One, false, classes(ORDERED, &[Plain], BOTH)),
            (OpKind::Lte, Arity::One, false, classes(ORDERED, &[Plain], BOTH)),
            (OpKind::Min, Arity::One, false, union(classes(MEMBERSHIP, &[Plain], BOTH), sized())),
            (OpKind::Max, Arity::One, false, union(classes(MEMBERSHIP, &[Plain], BOTH), sized())),
            (OpKind::Len, Arity::One, false, union(classes(&[Str], &[Plain], BOTH), sized())),
            (OpKind::In, Arity::Many, false, classes(MEMBERSHIP, &[Plain, List, FixedList, Dict], BOTH)),
            (OpKind::Nin, Arity::Many, false, classes(MEMBERSHIP, &[Plain, List, FixedList, Dict], BOTH)),
            (OpKind::Email, Arity::Zero, false, classes(&[Str], &[Plain], BOTH)),
            (OpKind::EqField, Arity::One, true, classes(PRIMITIVES, &[Plain], BARE)),
            (OpKind::NeqField, Arity::One, true, classes(PRIMITIVES, &[Plain], BARE)),
            (OpKind::GtField, Arity::One, true, classes(ORDERED, &[Plain], BARE)),
            (OpKind::GteField, Arity::One, true, classes(ORDERED, &[Plain], BARE)),
            (OpKind::LtField, Arity::One, true, classes(ORDERED, &[Plain], BARE)),
            (OpKind::LteField, Arity::One, true, classes(ORDERED, &[Plain], BARE)),
        ];

        let ops = table
            .into_iter()
            .map(|(kind, arity, field_comparison, valid_types)| {
                (kind.name(), Operation { kind, arity, field_comparison, valid_types })
            })
            .collect();
        Self { ops }
    }

    /// Process-wide registry.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    pub fn lookup(&self, name: &str) -> Option<&Operation> {
        self.ops.get(name)
    }

    pub fn get(&self, kind: OpKind) -> &Operation {
        // every OpKind is registered in `new`
        &self.ops[kind.name()]
    }

    pub fn valid_for_type(&self, kind: OpKind, ty: &FieldType) -> bool {
        self.get(kind).valid_types.contains(&ty.class())
    }

    /// Operations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.ops.values()
    }
}

impl OpKind {
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Required => "required",
            OpKind::Eq => "eq",
            OpKind::Neq => "neq",
            OpKind::EqIgnoreCase => "eq_ignore_case",
            OpKind::NeqIgnoreCase => "neq_ignore_case",
            OpKind::Gt => "gt",
            OpKind::Gte => "gte",
            OpKind::Lt => "lt",
            OpKind::Lte => "lte",
            OpKind::Min => "min",
            OpKind::Max => "max",
            OpKind::Len => "len",
            OpKind::In => "in",
            OpKind::Nin => "nin",
            OpKind::Email => "email",
            OpKind::EqField => "eqfield",
            OpKind::NeqField => "neqfield",
            OpKind::GtField => "gtfield",
            OpKind::GteField => "gtefield",
            OpKind::LtField => "ltfield",
            OpKind::LteField => "ltefield",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Arity::Zero => "zero",
            Arity::One => "one",
            Arity::Many => "many",
        })
    }
}
