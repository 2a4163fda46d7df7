//! CLI: manifests → (validators | check | ops)
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, info};

use valtag::manifest::Manifest;
use valtag::registry::Registry;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile field annotations on declared types into validator functions
#[derive(Parser, Debug)]
#[command(name = "valtag", version)]
pub struct CommandLineInterface {
    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// analyze declarations and emit validator source
    Generate(GenerateOut),
    /// analyze declarations and report problems without generating anything
    Check(InputSettings),
    /// list the supported operations
    Ops,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more declaration manifests. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory, one `<package>_validators.rs` per package (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// module path the generated code uses to reach `ValidationError`
    #[arg(long)]
    support_path: Option<String>,

    /// also write the support module (`support.rs`)
    #[arg(long, default_value_t = false)]
    emit_support: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> anyhow::Result<Manifest> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut manifests = Vec::with_capacity(source_paths.len());
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read {}", source_path.display()))?;
            let manifest = Manifest::from_json(&source)
                .with_context(|| format!("failed to parse manifest {}", source_path.display()))?;
            debug!(path = %source_path.display(), types = manifest.types.len(), "loaded manifest");
            manifests.push(manifest);
        }
        Ok(Manifest::merge(manifests))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => target.run(),
            Command::Check(input) => {
                let manifest = input.load()?;
                let total = manifest.types.len();
                let types = valtag::analyze::analyze(manifest.types, Registry::global())?;
                let validated = types.iter().filter(|t| t.has_validations).count();
                eprintln!(
                    "{} {total} types, {validated} with validations",
                    "ok".green().bold()
                );
                Ok(())
            }
            Command::Ops => {
                for op in Registry::global().iter() {
                    let comparison = if op.field_comparison { "field" } else { "" };
                    println!("{:<16} {:<5} {comparison}", op.kind.to_string(), op.arity.to_string());
                }
                Ok(())
            }
        }
    }
}

impl GenerateOut {
    fn run(&self) -> anyhow::Result<()> {
        let manifest = self.input_settings.load()?;
        let mut options = manifest.options.unwrap_or_default();
        if let Some(support_path) = self.support_path.as_ref() {
            options.support_path = support_path.clone();
        }
        info!(support_path = %options.support_path, "generating");

        let output = valtag::compile(manifest.types, &options)?;
        match self.out.as_ref() {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                for package in &output.packages {
                    let path = dir.join(package_file_name(&package.package));
                    write_file(&path, &package.source)?;
                }
                if self.emit_support {
                    write_file(&dir.join("support.rs"), &output.support)?;
                }
                eprintln!(
                    "{} {} validators in {} files",
                    "wrote".green().bold(),
                    output.validators.len(),
                    output.packages.len(),
                );
            }
            None => {
                if self.emit_support {
                    println!("{}", output.support);
                }
                for package in &output.packages {
                    println!("{}", package.source);
                }
            }
        }
        Ok(())
    }
}

fn write_file(path: &Path, source: &str) -> anyhow::Result<()> {
    std::fs::write(path, source).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "written");
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// `crate::billing::invoice` → `billing_invoice_validators.rs`; the crate root is `validators.rs`.
fn package_file_name(package: &str) -> String {
    let stem = package
        .split("::")
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "crate")
        .collect::<Vec<_>>()
        .join("_");
    if stem.is_empty() {
        "validators.rs".to_string()
    } else {
        format!("{stem}_validators.rs")
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_file_names() {
        assert_eq!(package_file_name(""), "validators.rs");
        assert_eq!(package_file_name("crate"), "validators.rs");
        assert_eq!(package_file_name("models"), "models_validators.rs");
        assert_eq!(package_file_name("crate::billing::invoice"), "billing_invoice_validators.rs");
    }

    #[test]
    fn literal_paths_pass_through_and_empty_globs_fail() {
        let paths = resolve_file_path_patterns(["a.json", "b/c.json"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.json"), PathBuf::from("b/c.json")]);

        let err = resolve_file_path_patterns(["/definitely/not/here/*.json"]).unwrap_err();
        assert!(err.to_string().contains("matched no files"), "{err}");
    }

    #[test]
    fn parses_subcommands() {
        let cli = CommandLineInterface::try_parse_from([
            "valtag", "-vv", "generate", "-i", "a.json", "--support-path", "crate::support",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.cmd, Command::Generate(ref g) if g.support_path.as_deref() == Some("crate::support")));
    }
}
