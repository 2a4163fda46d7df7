//! Type lookup across the whole declaration set.
use indexmap::IndexMap;

use crate::error::SemanticError;
use crate::ir::{DeclaredType, TypeId};

/// `(package, name)` → declaration index. Built from an immutable snapshot of the input,
/// so lookups never depend on declaration order.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    by_name: IndexMap<(String, String), TypeId>,
}

impl TypeIndex {
    pub fn build(types: &[DeclaredType]) -> Result<Self, SemanticError> {
        let mut by_name = IndexMap::with_capacity(types.len());
        for (i, ty) in types.iter().enumerate() {
            let key = (normalize_package(&ty.package).to_string(), ty.name.clone());
            if by_name.insert(key, TypeId(i)).is_some() {
                return Err(SemanticError::DuplicateType {
                    name: ty.name.clone(),
                    package: ty.package.clone(),
                });
            }
        }
        Ok(Self { by_name })
    }

    /// Resolve a type reference written inside `from_package`.
    ///
    /// - `Address` resolves inside the same package.
    /// - `crate::billing::Address` resolves from the crate root.
    /// - `self::Address`, `super::Address` walk from `from_package`.
    /// - `billing::Address` is tried below `from_package` first, then from the root.
    pub fn resolve(&self, from_package: &str, reference: &str) -> Option<TypeId> {
        let from_package = normalize_package(from_package);
        match reference.trim().rsplit_once("::") {
            None => self.lookup(from_package, reference.trim()),
            Some((prefix, name)) => candidate_packages(from_package, prefix)
                .iter()
                .find_map(|package| self.lookup(package, name)),
        }
    }

    fn lookup(&self, package: &str, name: &str) -> Option<TypeId> {
        self.by_name.get(&(package.to_string(), name.to_string())).copied()
    }
}

fn normalize_package(package: &str) -> &str {
    let package = package.trim();
    if package == "crate" {
        return "";
    }
    package.strip_prefix("crate::").unwrap_or(package)
}

fn candidate_packages(from_package: &str, prefix: &str) -> Vec<String> {
    let join = |segments: &[&str]| {
        segments.iter().filter(|s| !s.is_empty()).copied().collect::<Vec<_>>().join("::")
    };
    let segments: Vec<&str> = prefix.split("::").map(str::trim).collect();
    let base: Vec<&str> = from_package.split("::").collect();
    match segments.first() {
        Some(&"crate") => vec![join(&segments[1..])],
        Some(&"self") | Some(&"super") => {
            let mut walked = base;
            for seg in &segments {
                match *seg {
                    "self" => {}
                    "super" => {
                        walked.pop();
                    }
                    other => walked.push(other),
                }
            }
            vec![join(&walked)]
        }
        _ => {
            let relative = [base.as_slice(), segments.as_slice()].concat();
            vec![join(&relative), join(&segments)]
        }
    }
}
