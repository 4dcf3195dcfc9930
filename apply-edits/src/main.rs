//! CLI for stamping an annotation into workspace files.
//!
//! Usage: `apply_edits NOTE FILE [FILE...]`, applied against the current
//! working directory.

use std::path::Path;
use std::path::PathBuf;

use aep_apply_edits::apply_edits;
use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let note = args
        .next()
        .context("usage: apply_edits NOTE FILE [FILE...]")?;
    let files: Vec<PathBuf> = args.map(PathBuf::from).collect();
    if files.is_empty() {
        anyhow::bail!("usage: apply_edits NOTE FILE [FILE...]");
    }

    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let file_refs: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
    let confirmation = apply_edits(&cwd, &file_refs, &note).await;
    println!("{confirmation}");
    Ok(())
}
