//! Error types for every stage of the compiler.
//!
//! - `ParseError`: a single annotation entry is syntactically wrong.
//! - `SemanticError`: the annotations parse, but do not make sense for the declared types.
//! - `InternalError`: the registry and the condition table disagree. Never reachable
//!   from input the analyzer approved.

use crate::ir::SourceLocation;

/// Syntax errors raised by the tag parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed validation `{entry}`: more than one `=`")]
    Malformed { entry: String },

    #[error("unsupported validation `{name}`")]
    Unsupported { name: String },

    #[error("{op}: expected zero target, but has `{found}`")]
    ExpectedZeroTarget { op: String, found: String },

    #[error("{op}: expected one target, but has nothing")]
    ExpectedOneTarget { op: String },

    #[error("{op}: expected at least one target, but has {count} element(s)")]
    ExpectedManyTargets { op: String, count: usize },

    #[error("{op}: invalid quote value in `{value}`")]
    InvalidQuote { op: String, value: String },

    #[error("{op}: unterminated quote in `{value}`")]
    UnterminatedQuote { op: String, value: String },

    #[error("unbalanced quote in annotation `{tag}`")]
    UnbalancedQuote { tag: String },
}

/// Semantic errors raised while analyzing declarations or wiring up nested validators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    #[error("{owner}.{field}: invalid operation `{op}` for type `{ty}`")]
    InvalidOperation { owner: String, field: String, op: String, ty: String },

    #[error("{owner}.{field}: invalid target `{value}` for `{op}`, expected {expected}")]
    InvalidTarget {
        owner: String,
        field: String,
        op: String,
        value: String,
        expected: &'static str,
    },

    #[error("{owner}.{field}: undefined field `{reference}`")]
    UndefinedField { owner: String, field: String, reference: String },

    #[error("{owner}.{field}: undefined nested field `{reference}`")]
    UndefinedNestedField { owner: String, field: String, reference: String },

    #[error("{owner}: mismatched types between `{left}` and `{right}`")]
    MismatchedTypes { owner: String, left: String, right: String },

    #[error("type `{name}` is declared more than once in package `{package}`")]
    DuplicateType { name: String, package: String },

    #[error("{owner}.{field}: no validator found for type `{ty}`")]
    NoValidator { owner: String, field: String, ty: String },
}

/// Gaps between the operation registry and the code generation tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    #[error("unsupported operation `{op}` for type class {class}")]
    MissingCondition { op: String, class: String },

    #[error("`{op}` produced {count} right operands but defines no concatenation operator")]
    MissingConcat { op: String, count: usize },

    #[error("`{op}`: cannot render literal `{value}`")]
    InvalidLiteral { op: String, value: String },
}

/// Top-level error returned by the library entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{owner}.{field}: {source}")]
    Parse {
        owner: String,
        field: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error("internal error: {0}")]
    Internal(#[from] InternalError),

    /// Any of the above, raised for a type whose declaration site is known.
    #[error("{location}: {source}")]
    Located {
        location: SourceLocation,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Prefixes the error with `location`, when there is one.
    pub fn at(self, location: Option<&SourceLocation>) -> Self {
        match location {
            Some(location) => Error::Located { location: location.clone(), source: Box::new(self) },
            None => self,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
