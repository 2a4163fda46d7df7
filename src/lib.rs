//! Compiles field annotations on declared types into validator functions.
//!
//! ```text
//! declarations ─ analyze ─▶ annotated declarations ─ assemble ─▶ validator source
//! ```
pub mod analyze;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod literal;
pub mod manifest;
pub mod parse;
pub mod path_de;
pub mod registry;
pub mod resolve;
pub mod taxonomy;

use indexmap::IndexSet;
use tracing::info;

pub use codegen::{Assembler, CodegenOptions, GeneratedValidator};
pub use error::{Error, Result};
pub use ir::{DeclaredType, Field};
pub use registry::Registry;

/// Generated source for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutput {
    pub package: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub validators: Vec<GeneratedValidator>,
    /// One entry per package that has at least one validator, in first-declaration order.
    pub packages: Vec<PackageOutput>,
    pub support: String,
}

/// Analyze `types` and generate validators for every type that carries annotations.
///
/// Nothing is produced unless the whole set compiles.
pub fn compile(types: Vec<DeclaredType>, options: &CodegenOptions) -> Result<Output> {
    let total = types.len();
    let types = analyze::analyze(types, Registry::global())?;
    let assembler = Assembler::rust(&types, options)?;
    let validators = assembler.build_all()?;

    let packages: Vec<PackageOutput> = {
        let grouped: IndexSet<&str> = validators.iter().map(|v| v.package.as_str()).collect();
        grouped
            .iter()
            .map(|package| PackageOutput {
                package: package.to_string(),
                source: assembler.render_package(package, &validators),
            })
            .collect()
    };

    info!(types = total, validators = validators.len(), "compiled");
    Ok(Output { packages, support: assembler.support_module(), validators })
}
