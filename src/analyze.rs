//! Semantic analysis.
//!
//! Parses every field annotation, checks each operation against the field's type and
//! resolves field-comparison targets. Consumes the declarations and returns them annotated;
//! all lookups go through an immutable snapshot so declaration order does not matter.
use tracing::{debug, trace};

use crate::error::{Error, SemanticError};
use crate::ir::{DeclaredType, Field, Peer, Rule, Validation};
use crate::literal::{common_integer, LiteralKind};
use crate::parse::{parse_validation, split_entries};
use crate::registry::{OpKind, Registry};
use crate::resolve::TypeIndex;
use crate::taxonomy::{Category, FieldType, Shape};

pub fn analyze(types: Vec<DeclaredType>, registry: &Registry) -> Result<Vec<DeclaredType>, Error> {
    let index = TypeIndex::build(&types)?;

    // 1) syntax
    let mut parsed: Vec<Vec<Vec<Validation>>> = Vec::with_capacity(types.len());
    for ty in &types {
        let mut per_field = Vec::with_capacity(ty.fields.len());
        for field in &ty.fields {
            let validations = split_entries(&field.tag)
                .and_then(|entries| {
                    entries
                        .into_iter()
                        .map(|entry| parse_validation(entry, registry))
                        .collect::<Result<Vec<_>, _>>()
                })
                .map_err(|source| {
                    Error::Parse { owner: ty.name.clone(), field: field.name.clone(), source }
                        .at(ty.location.as_ref())
                })?;
            per_field.push(validations);
        }
        parsed.push(per_field);
    }

    // 2) semantics, against the untouched snapshot
    let analyzer = Analyzer { types: &types, index: &index, registry };
    let mut rules: Vec<Vec<Vec<Rule>>> = Vec::with_capacity(types.len());
    for (ty, per_field) in types.iter().zip(parsed) {
        let mut type_rules = Vec::with_capacity(per_field.len());
        for (field, validations) in ty.fields.iter().zip(per_field) {
            let field_rules = analyzer
                .check_field(ty, field, validations)
                .map_err(|e| Error::from(e).at(ty.location.as_ref()))?;
            type_rules.push(field_rules);
        }
        rules.push(type_rules);
    }

    // 3) attach
    let annotated = types
        .into_iter()
        .zip(rules)
        .map(|(mut ty, type_rules)| {
            ty.has_validations = type_rules.iter().any(|r| !r.is_empty());
            for (field, field_rules) in ty.fields.iter_mut().zip(type_rules) {
                field.rules = field_rules;
            }
            debug!(ty = %ty.qualified_name(), validated = ty.has_validations, "analyzed");
            ty
        })
        .collect();
    Ok(annotated)
}

struct Analyzer<'a> {
    types: &'a [DeclaredType],
    index: &'a TypeIndex,
    registry: &'a Registry,
}

impl<'a> Analyzer<'a> {
    fn check_field(
        &self,
        owner: &DeclaredType,
        field: &Field,
        validations: Vec<Validation>,
    ) -> Result<Vec<Rule>, SemanticError> {
        let ty = field.field_type();
        let mut rules = Vec::with_capacity(validations.len());
        for validation in validations {
            trace!(owner = %owner.name, field = %field.name, entry = %validation, "checking");
            let op = self.registry.get(validation.op);

            // nested declarations only understand `required`; the rest is delegated
            if !ty.is_primitive() {
                if validation.op != OpKind::Required || ty.shape != Shape::Plain {
                    return Err(invalid_operation(owner, field, validation.op, &field.ty));
                }
                rules.push(Rule { validation, peer: None });
                continue;
            }

            if op.field_comparison {
                let peer = self.resolve_peer(owner, field, &ty, &validation)?;
                rules.push(Rule { validation, peer: Some(peer) });
                continue;
            }

            if !self.registry.valid_for_type(validation.op, &ty) {
                return Err(invalid_operation(owner, field, validation.op, &field.ty));
            }
            let kind = LiteralKind::for_target(validation.op, &ty);
            if let Some(bad) = validation.values.iter().find(|v| kind.parse(v).is_none()) {
                return Err(SemanticError::InvalidTarget {
                    owner: owner.name.clone(),
                    field: field.name.clone(),
                    op: validation.op.to_string(),
                    value: bad.clone(),
                    expected: kind.describe(),
                });
            }
            rules.push(Rule { validation, peer: None });
        }
        Ok(rules)
    }

    /// `Other` names a sibling field; `Inner.Other` walks through nested declarations.
    fn resolve_peer(
        &self,
        owner: &DeclaredType,
        field: &Field,
        ty: &FieldType,
        validation: &Validation,
    ) -> Result<Peer, SemanticError> {
        let reference = validation.values.first().map(|s| s.trim()).unwrap_or_default();
        let path: Vec<String> = reference.split('.').map(|s| s.trim().to_string()).collect();
        let undefined = |depth: usize| {
            if depth == 0 {
                SemanticError::UndefinedField {
                    owner: owner.name.clone(),
                    field: field.name.clone(),
                    reference: reference.to_string(),
                }
            } else {
                SemanticError::UndefinedNestedField {
                    owner: owner.name.clone(),
                    field: field.name.clone(),
                    reference: reference.to_string(),
                }
            }
        };

        let Some((last, walk)) = path.split_last() else {
            return Err(undefined(0));
        };

        let mut current = owner;
        for (depth, segment) in walk.iter().enumerate() {
            let nested = current.field(segment).ok_or_else(|| undefined(depth))?;
            let nested_ty = nested.field_type();
            if nested_ty.is_primitive() {
                return Err(undefined(depth + 1));
            }
            if !nested_ty.is_bare() {
                return Err(invalid_operation(owner, field, validation.op, &nested.ty));
            }
            let id = self
                .index
                .resolve(&current.package, &nested_ty.base)
                .ok_or_else(|| undefined(depth + 1))?;
            current = &self.types[id.0];
        }

        let target = current.field(last).ok_or_else(|| undefined(walk.len()))?;
        let target_ty = target.field_type();
        let incomparable = ty.category == Category::Integer
            && ty.base.trim() != target_ty.base.trim()
            && common_integer(&ty.base, &target_ty.base).is_none();
        if target_ty.category != ty.category || incomparable {
            return Err(SemanticError::MismatchedTypes {
                owner: owner.name.clone(),
                left: field.name.clone(),
                right: reference.to_string(),
            });
        }
        if !self.registry.valid_for_type(validation.op, ty) {
            return Err(invalid_operation(owner, field, validation.op, &field.ty));
        }
        if !target_ty.is_bare() {
            return Err(invalid_operation(owner, field, validation.op, &target.ty));
        }
        Ok(Peer { path, ty: target_ty })
    }
}

fn invalid_operation(owner: &DeclaredType, field: &Field, op: OpKind, ty: &str) -> SemanticError {
    SemanticError::InvalidOperation {
        owner: owner.name.clone(),
        field: field.name.clone(),
        op: op.to_string(),
        ty: ty.to_string(),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::ir::SourceLocation;
    use pretty_assertions::assert_eq;

    fn field(name: &str, ty: &str, tag: &str) -> Field {
        Field { name: name.into(), ty: ty.into(), tag: tag.into(), rules: vec![] }
    }

    fn decl(package: &str, name: &str, fields: Vec<Field>) -> DeclaredType {
        DeclaredType {
            name: name.into(),
            package: package.into(),
            location: None,
            fields,
            has_validations: false,
        }
    }

    fn run(types: Vec<DeclaredType>) -> Result<Vec<DeclaredType>, Error> {
        analyze(types, Registry::global())
    }

    #[test]
    fn marks_types_with_validations() {
        let out = run(vec![
            decl("", "User", vec![field("name", "String", "required, min=2")]),
            decl("", "Plain", vec![field("name", "String", "")]),
        ])
        .unwrap();
        assert!(out[0].has_validations);
        assert_eq!(out[0].fields[0].rules.len(), 2);
        assert!(!out[1].has_validations);
    }

    #[test]
    fn parse_errors_carry_context() {
        let err = run(vec![decl("", "User", vec![field("age", "u8", "gte")])]).unwrap_err();
        assert_eq!(err, Error::Parse {
            owner: "User".into(),
            field: "age".into(),
            source: ParseError::ExpectedOneTarget { op: "gte".into() },
        });
    }

    #[test]
    fn rejects_operations_illegal_for_the_type() {
        let err = run(vec![decl("", "User", vec![field("name", "String", "gte=3")])]).unwrap_err();
        assert!(matches!(err, Error::Semantic(SemanticError::InvalidOperation { .. })), "{err}");

        let err = run(vec![decl("", "User", vec![field("tags", "[String; 2]", "min=1")])]).unwrap_err();
        assert!(matches!(err, Error::Semantic(SemanticError::InvalidOperation { .. })), "{err}");
    }

    #[test]
    fn rejects_malformed_targets() {
        let err = run(vec![decl("", "User", vec![field("age", "u8", "lte=300")])]).unwrap_err();
        assert_eq!(err.to_string(), "User.age: invalid target `300` for `lte`, expected an integer within the field's range");
    }

    #[test]
    fn field_comparison_requires_matching_categories() {
        let ok = run(vec![decl("", "Pair", vec![
            field("a", "i32", ""),
            field("b", "i64", "gtfield=a"),
        ])]);
        assert!(ok.is_ok());

        let err = run(vec![decl("", "Pair", vec![
            field("a", "String", ""),
            field("b", "i64", "eqfield=a"),
        ])])
        .unwrap_err();
        assert_eq!(err, Error::Semantic(SemanticError::MismatchedTypes {
            owner: "Pair".into(),
            left: "b".into(),
            right: "a".into(),
        }));

        let err = run(vec![decl("", "Pair", vec![
            field("a", "String", ""),
            field("b", "String", "ltfield=a"),
        ])])
        .unwrap_err();
        assert!(matches!(err, Error::Semantic(SemanticError::InvalidOperation { .. })), "{err}");
    }

    #[test]
    fn undefined_references() {
        let err = run(vec![decl("", "Pair", vec![field("b", "String", "eqfield=missing")])]).unwrap_err();
        assert!(matches!(err, Error::Semantic(SemanticError::UndefinedField { .. })), "{err}");

        let err = run(vec![decl("", "Pair", vec![
            field("inner", "Inner", ""),
            field("b", "String", "eqfield=inner.name"),
        ])])
        .unwrap_err();
        assert!(matches!(err, Error::Semantic(SemanticError::UndefinedNestedField { .. })), "{err}");
    }

    #[test]
    fn optional_or_collection_hops_are_invalid_operations() {
        let err = run(vec![
            decl("", "Inner", vec![field("name", "String", "")]),
            decl("", "Pair", vec![
                field("inner", "Option<Inner>", ""),
                field("b", "String", "eqfield=inner.name"),
            ]),
        ])
        .unwrap_err();
        assert_eq!(err, Error::Semantic(SemanticError::InvalidOperation {
            owner: "Pair".into(),
            field: "b".into(),
            op: "eqfield".into(),
            ty: "Option<Inner>".into(),
        }));

        let err = run(vec![
            decl("", "Inner", vec![field("name", "String", "")]),
            decl("", "Pair", vec![
                field("inners", "Vec<Inner>", ""),
                field("b", "String", "eqfield=inners.name"),
            ]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Semantic(SemanticError::InvalidOperation { ref ty, .. }) if ty == "Vec<Inner>"), "{err}");

        let err = run(vec![decl("", "Pair", vec![
            field("count", "u32", ""),
            field("b", "u32", "eqfield=count.value"),
        ])])
        .unwrap_err();
        assert!(matches!(err, Error::Semantic(SemanticError::UndefinedNestedField { .. })), "{err}");
    }

    #[test]
    fn u128_compares_only_with_unsigned_peers() {
        let ok = run(vec![decl("", "Pair", vec![
            field("small", "u64", ""),
            field("big", "u128", "gtfield=small"),
        ])]);
        assert!(ok.is_ok());

        let err = run(vec![decl("", "Pair", vec![
            field("signed", "i64", ""),
            field("big", "u128", "gtfield=signed"),
        ])])
        .unwrap_err();
        assert_eq!(err, Error::Semantic(SemanticError::MismatchedTypes {
            owner: "Pair".into(),
            left: "big".into(),
            right: "signed".into(),
        }));
    }

    #[test]
    fn apostrophes_in_single_targets_keep_later_entries() {
        let out = run(vec![decl("", "User", vec![field("name", "String", "eq=O'Brien, required")])]).unwrap();
        let rules = &out[0].fields[0].rules;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].validation.values, vec!["O'Brien".to_string()]);
        assert_eq!(rules[1].validation.op, OpKind::Required);
    }

    #[test]
    fn errors_name_the_declaration_site() {
        let mut user = decl("", "User", vec![field("age", "u8", "gte")]);
        user.location = Some(SourceLocation { file: "models.rs".into(), line: 12 });
        let err = run(vec![user.clone()]).unwrap_err();
        assert_eq!(err.to_string(), "models.rs:12: User.age: gte: expected one target, but has nothing");

        user.fields = vec![field("age", "u8", "lte=300")];
        let err = run(vec![user]).unwrap_err();
        assert!(err.to_string().starts_with("models.rs:12: User.age: invalid target `300`"), "{err}");
        assert!(matches!(err, Error::Located { ref source, .. } if matches!(**source, Error::Semantic(_))));
    }

    #[test]
    fn nested_references_resolve_regardless_of_order() {
        let types = vec![
            decl("orders", "Order", vec![
                field("customer", "crate::people::Customer", ""),
                field("contact", "String", "neqfield=customer.email"),
            ]),
            decl("people", "Customer", vec![field("email", "String", "email")]),
        ];
        let out = run(types.clone()).unwrap();
        let rule = &out[0].fields[1].rules[0];
        assert_eq!(rule.peer.as_ref().map(|p| p.path.clone()), Some(vec!["customer".to_string(), "email".to_string()]));

        let reversed: Vec<_> = types.into_iter().rev().collect();
        assert!(run(reversed).is_ok());
    }

    #[test]
    fn nested_fields_accept_only_required() {
        let types = vec![
            decl("", "Address", vec![field("city", "String", "required")]),
            decl("", "User", vec![field("home", "Address", "required")]),
        ];
        assert!(run(types).is_ok());

        let types = vec![
            decl("", "Address", vec![field("city", "String", "required")]),
            decl("", "User", vec![field("home", "Address", "min=1")]),
        ];
        assert!(run(types).is_err());
    }
}
