//! Validator assembly.
//!
//! Turns an analyzed declaration into a list of blocks (one check per field rule, or a
//! delegation into a nested type's validator) and hands them to a [`Printer`].
use rayon::prelude::*;
use tracing::debug;

use crate::error::{Error, SemanticError};
use crate::ir::{DeclaredType, Field};
use crate::resolve::TypeIndex;
use crate::taxonomy::{FieldType, Shape};

use super::condition::build_condition;
use super::expr::Expr;
use super::{validator_fn_name, CodegenOptions, Printer, RustPrinter};

/// Everything a printer needs to emit one validator function.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorIr {
    pub type_name: String,
    pub fn_name: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Push `message` for `field` unless `condition` holds.
    Check { condition: Expr, field: String, message: String },
    /// Merge the errors of a nested type's validator.
    Delegate { field: String, call: String, optional: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedValidator {
    pub type_name: String,
    pub package: String,
    pub fn_name: String,
    pub source: String,
}

pub struct Assembler<'a, P: Printer = RustPrinter> {
    types: &'a [DeclaredType],
    index: TypeIndex,
    printer: P,
}

impl<'a> Assembler<'a, RustPrinter> {
    pub fn rust(types: &'a [DeclaredType], options: &CodegenOptions) -> Result<Self, Error> {
        Self::new(types, RustPrinter::new(options))
    }
}

impl<'a, P: Printer> Assembler<'a, P> {
    /// `types` must have been through [`crate::analyze::analyze`].
    pub fn new(types: &'a [DeclaredType], printer: P) -> Result<Self, Error> {
        let index = TypeIndex::build(types)?;
        Ok(Self { types, index, printer })
    }

    pub fn validator_ir(&self, ty: &DeclaredType) -> Result<ValidatorIr, Error> {
        let mut blocks = Vec::new();
        for field in &ty.fields {
            let field_ty = field.field_type();
            if field_ty.is_primitive() {
                self.checks(field, &field_ty, &mut blocks)?;
            } else {
                self.nested(ty, field, &field_ty, &mut blocks)?;
            }
        }
        Ok(ValidatorIr {
            type_name: ty.name.clone(),
            fn_name: validator_fn_name(&ty.name),
            blocks,
        })
    }

    fn checks(&self, field: &Field, ty: &FieldType, blocks: &mut Vec<Block>) -> Result<(), Error> {
        for rule in &field.rules {
            let condition = build_condition(&field.name, ty, rule)?;
            let expr = condition.expr()?;
            // `required` on a fixed-size array
            if expr.is_const_true() {
                continue;
            }
            blocks.push(Block::Check {
                condition: expr,
                field: field.name.clone(),
                message: condition.message,
            });
        }
        Ok(())
    }

    fn nested(
        &self,
        owner: &DeclaredType,
        field: &Field,
        ty: &FieldType,
        blocks: &mut Vec<Block>,
    ) -> Result<(), Error> {
        // the analyzer only lets `required` through on nested fields
        if ty.optional && !field.rules.is_empty() {
            blocks.push(Block::Check {
                condition: Expr::SomeAnd {
                    option: Box::new(Expr::field(std::slice::from_ref(&field.name))),
                    body: Box::new(Expr::Const(true)),
                },
                field: field.name.clone(),
                message: format!("{} is required", field.name),
            });
        }
        if ty.shape != Shape::Plain {
            return Ok(());
        }

        let target = self
            .index
            .resolve(&owner.package, &ty.base)
            .map(|id| &self.types[id.0])
            .filter(|target| target.has_validations);
        match target {
            Some(target) => blocks.push(Block::Delegate {
                field: field.name.clone(),
                call: delegate_path(&ty.base, &target.name),
                optional: ty.optional,
            }),
            None if !field.rules.is_empty() => {
                let err = SemanticError::NoValidator {
                    owner: owner.name.clone(),
                    field: field.name.clone(),
                    ty: ty.base.clone(),
                };
                return Err(Error::from(err).at(owner.location.as_ref()));
            }
            None => {}
        }
        Ok(())
    }

    pub fn build_validator(&self, ty: &DeclaredType) -> Result<GeneratedValidator, Error> {
        let ir = self.validator_ir(ty)?;
        debug!(ty = %ty.qualified_name(), blocks = ir.blocks.len(), "assembled validator");
        Ok(GeneratedValidator {
            type_name: ty.name.clone(),
            package: ty.package.clone(),
            source: self.printer.validator(&ir),
            fn_name: ir.fn_name,
        })
    }

    /// Validators for every validated type, in declaration order.
    pub fn build_all(&self) -> Result<Vec<GeneratedValidator>, Error>
    where
        P: Sync,
    {
        self.types
            .par_iter()
            .filter(|ty| ty.has_validations)
            .map(|ty| self.build_validator(ty))
            .collect()
    }

    /// One output file for the validators declared in `package`.
    pub fn render_package(&self, package: &str, validators: &[GeneratedValidator]) -> String {
        let members: Vec<&GeneratedValidator> =
            validators.iter().filter(|v| v.package == package).collect();
        self.printer.file(package, &members)
    }

    pub fn support_module(&self) -> String {
        self.printer.support()
    }
}

/// The nested validator is emitted next to its type, so it is reached through the
/// same module prefix the field type was written with.
fn delegate_path(base: &str, type_name: &str) -> String {
    let fn_name = validator_fn_name(type_name);
    match base.trim().rsplit_once("::") {
        Some((prefix, _)) => format!("{}::{fn_name}", prefix.trim()),
        None => fn_name,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::analyze;
    use crate::ir::SourceLocation;
    use crate::registry::Registry;
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

    fn analyzed(types: Vec<DeclaredType>) -> Vec<DeclaredType> {
        analyze(types, Registry::global()).unwrap()
    }

    fn options() -> CodegenOptions {
        CodegenOptions { support_path: "crate::support".into() }
    }

    #[test]
    fn one_block_per_rule_in_order() {
        let types = analyzed(vec![decl("", "User", vec![
            field("FirstName", "String", "required"),
            field("LastName", "String", "required"),
            field("Age", "u8", "required, gte=18"),
            field("Note", "String", ""),
        ])]);
        let assembler = Assembler::rust(&types, &options()).unwrap();
        let ir = assembler.validator_ir(&types[0]).unwrap();
        let messages: Vec<&str> = ir
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Check { message, .. } => Some(message.as_str()),
                Block::Delegate { .. } => None,
            })
            .collect();
        assert_eq!(messages, vec![
            "FirstName is required",
            "LastName is required",
            "Age is required",
            "Age must be >= 18",
        ]);
    }

    #[test]
    fn renders_a_complete_function() {
        let types = analyzed(vec![decl("", "Account", vec![
            field("UserName", "String", "min=5, max=10"),
            field("nick", "Option<String>", "required"),
        ])]);
        let assembler = Assembler::rust(&types, &options()).unwrap();
        let generated = assembler.build_validator(&types[0]).unwrap();
        assert_eq!(generated.fn_name, "validate_account");
        let body: Vec<&str> = generated.source.lines().filter(|l| l.starts_with("    if")).collect();
        assert_eq!(body, vec![
            "    if !(obj.UserName.len() >= 5) {",
            "    if !(obj.UserName.len() <= 10) {",
            r#"    if !(obj.nick.as_ref().is_some_and(|v| *v != "")) {"#,
        ]);
    }

    #[test]
    fn fixed_size_required_emits_nothing() {
        let types = analyzed(vec![decl("", "Host", vec![field("ip", "[u8; 4]", "required")])]);
        let assembler = Assembler::rust(&types, &options()).unwrap();
        let ir = assembler.validator_ir(&types[0]).unwrap();
        assert!(ir.blocks.is_empty());
        assert!(assembler.build_validator(&types[0]).unwrap().source.contains("let errs = Vec::new();"));
    }

    #[test]
    fn nested_types_are_delegated() {
        let types = analyzed(vec![
            decl("people", "Customer", vec![
                field("email", "String", "email"),
                field("home", "Address", ""),
                field("work", "Option<Address>", "required"),
            ]),
            decl("people", "Address", vec![field("city", "String", "required")]),
            decl("orders", "Order", vec![
                field("id", "u64", "required"),
                field("customer", "crate::people::Customer", ""),
            ]),
        ]);
        let assembler = Assembler::rust(&types, &options()).unwrap();

        let customer = assembler.validator_ir(&types[0]).unwrap();
        assert_eq!(&customer.blocks[1..], &[
            Block::Delegate { field: "home".into(), call: "validate_address".into(), optional: false },
            Block::Check {
                condition: Expr::SomeAnd {
                    option: Box::new(Expr::field(&["work".to_string()])),
                    body: Box::new(Expr::Const(true)),
                },
                field: "work".into(),
                message: "work is required".into(),
            },
            Block::Delegate { field: "work".into(), call: "validate_address".into(), optional: true },
        ]);

        let order = assembler.validator_ir(&types[2]).unwrap();
        assert_eq!(order.blocks[1], Block::Delegate {
            field: "customer".into(),
            call: "crate::people::validate_customer".into(),
            optional: false,
        });
    }

    #[test]
    fn tagged_nested_field_without_validator_fails() {
        let types = analyzed(vec![
            decl("", "Address", vec![field("city", "String", "")]),
            decl("", "User", vec![field("home", "Address", "required")]),
        ]);
        let assembler = Assembler::rust(&types, &options()).unwrap();
        let err = assembler.validator_ir(&types[1]).unwrap_err();
        assert_eq!(err, Error::Semantic(SemanticError::NoValidator {
            owner: "User".into(),
            field: "home".into(),
            ty: "Address".into(),
        }));
    }

    #[test]
    fn missing_validator_errors_carry_the_declaration_site() {
        let mut types = analyzed(vec![
            decl("", "Address", vec![field("city", "String", "")]),
            decl("", "User", vec![field("home", "Address", "required")]),
        ]);
        types[1].location = Some(SourceLocation { file: "src/user.rs".into(), line: 7 });
        let assembler = Assembler::rust(&types, &options()).unwrap();
        let err = assembler.validator_ir(&types[1]).unwrap_err();
        assert_eq!(err.to_string(), "src/user.rs:7: User.home: no validator found for type `Address`");
    }

    #[test]
    fn untagged_unknown_types_are_skipped() {
        let types = analyzed(vec![decl("", "Event", vec![
            field("at", "chrono::DateTime<Utc>", ""),
            field("name", "String", "required"),
        ])]);
        let assembler = Assembler::rust(&types, &options()).unwrap();
        assert_eq!(assembler.validator_ir(&types[0]).unwrap().blocks.len(), 1);
    }

    #[test]
    fn build_all_keeps_declaration_order() {
        let types = analyzed(
            (0..16)
                .map(|i| decl("", &format!("T{i}"), vec![field("n", "i32", if i % 3 == 0 { "" } else { "gt=0" })]))
                .collect(),
        );
        let assembler = Assembler::rust(&types, &options()).unwrap();
        let names: Vec<String> = assembler.build_all().unwrap().into_iter().map(|v| v.type_name).collect();
        let expected: Vec<String> = (0..16).filter(|i| i % 3 != 0).map(|i| format!("T{i}")).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn package_files_only_hold_their_validators() {
        let types = analyzed(vec![
            decl("a", "One", vec![field("n", "i32", "gt=0")]),
            decl("b", "Two", vec![field("n", "i32", "gt=0")]),
        ]);
        let assembler = Assembler::rust(&types, &options()).unwrap();
        let all = assembler.build_all().unwrap();
        let file = assembler.render_package("a", &all);
        assert!(file.starts_with("// Code generated by valtag. DO NOT EDIT.\n"));
        assert!(file.contains("pub fn validate_one("));
        assert!(!file.contains("validate_two"));
    }
}
