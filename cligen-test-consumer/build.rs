//! Generates the CLI of `people.yaml` into `OUT_DIR`.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use cligen::codegen::{self, GeneratedFile};
use cligen::{parse_design, GeneratorConfig};

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=people.yaml");

    let text = fs::read_to_string("people.yaml").context("Failed to read people.yaml")?;
    let design = parse_design(&text)?;

    // Generated files are module bodies; `include!` needs them wrapped.
    let files: Vec<GeneratedFile> = codegen::generate(&design, &GeneratorConfig::default())?
        .into_iter()
        .map(|file| GeneratedFile {
            content: format!("pub mod cli {{\n{}}}\n", file.content),
            path: file.path,
        })
        .collect();

    let out_dir = PathBuf::from(env::var("OUT_DIR").context("OUT_DIR is not set")?);
    codegen::write_files(&out_dir, &files)?;
    Ok(())
}
