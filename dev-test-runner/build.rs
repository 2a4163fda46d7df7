use std::path::PathBuf;

use anyhow::Context;
use valtag::manifest::Manifest;

const FIXTURE: &str = "fixtures/declarations.json";

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed={FIXTURE}");
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").context("OUT_DIR is not set")?);

    let source = std::fs::read_to_string(FIXTURE).with_context(|| format!("failed to read {FIXTURE}"))?;
    let manifest = Manifest::from_json(&source)?;
    let options = manifest.options.unwrap_or_default();
    let output = valtag::compile(manifest.types, &options)?;

    std::fs::write(out_dir.join("support.rs"), &output.support)?;
    for package in &output.packages {
        let path = out_dir.join(format!("{}_validators.rs", package.package));
        std::fs::write(&path, &package.source).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}
