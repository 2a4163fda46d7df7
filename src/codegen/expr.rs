//! Language-agnostic expression tree for generated conditions.
//!
//! Printers decide the concrete syntax; nothing in here knows about Rust.

/// Where a value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    /// A field of the validated instance, possibly through nested declarations.
    Field(Vec<String>),
    /// The value bound by the innermost optional guard.
    Bound,
    /// The element bound by the innermost collection predicate.
    Element,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Str(String),
    Int(i128),
    /// Unsigned values past `i128::MAX`.
    UInt(u128),
    Float(f64),
    Bool(bool),
    Size(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// Target-independent numeric widening used when two compared fields differ in width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widen {
    Integer,
    /// Unsigned integers when one side is too wide for the signed common type.
    Unsigned,
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(bool),
    Value(Place),
    Lit(Lit),
    /// Size of a string or collection.
    Len(Box<Expr>),
    /// Case-folded string.
    Lower(Box<Expr>),
    /// String value viewed as a borrowed string slice.
    AsStr(Box<Expr>),
    Widen(Widen, Box<Expr>),
    /// Email format predicate from the support module.
    IsEmail(Box<Expr>),
    Cmp {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    Logic {
        op: Connective,
        terms: Vec<Expr>,
    },
    /// `item` is one of the literals in `set`.
    InSet {
        item: Box<Expr>,
        set: Vec<Lit>,
    },
    /// Every element (or dictionary key) of `collection` satisfies `body`,
    /// with `Place::Element` bound inside `body`.
    Every {
        collection: Box<Expr>,
        keys: bool,
        body: Box<Expr>,
    },
    /// `option` is set and `body` holds for it, with `Place::Bound` bound inside `body`.
    SomeAnd {
        option: Box<Expr>,
        body: Box<Expr>,
    },
}

impl Expr {
    pub fn field(path: &[String]) -> Self {
        Expr::Value(Place::Field(path.to_vec()))
    }

    pub fn cmp(op: CmpOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Cmp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn len(inner: Expr) -> Self {
        Expr::Len(Box::new(inner))
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    /// Join terms; a single term is returned unchanged.
    pub fn join(op: Connective, mut terms: Vec<Expr>) -> Self {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Logic { op, terms }
        }
    }

    pub fn is_const_true(&self) -> bool {
        matches!(self, Expr::Const(true))
    }
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
        }
    }
}

impl Connective {
    pub fn symbol(self) -> &'static str {
        match self {
            Connective::And => "&&",
            Connective::Or => "||",
        }
    }
}
