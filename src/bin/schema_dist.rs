//! Copy the schema tree into the distribution directory.

use anyhow::{Context, Result};
use clap::Parser;
use schemaweld::{Workspace, copy_schema_tree, init_tracing};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "schema-dist")]
#[command(about = "Mirror every schema JSON file into the dist directory")]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Combiner config file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Schema root directory; skips workspace discovery.
    #[arg(long)]
    schemas: Option<PathBuf>,
    /// Destination directory (default dist/schemas).
    #[arg(long)]
    dest: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut workspace = Workspace::resolve(cli.config.as_deref(), cli.schemas.as_deref())?;
    if let Some(dest) = cli.dest {
        workspace.config.dist_dir = dest;
    }
    let root = workspace.schema_root();
    let dest = workspace.dist_path();

    let copied = copy_schema_tree(&root, &dest)
        .with_context(|| format!("copying {} to {}", root.display(), dest.display()))?;
    println!("copied {} schema files to {}", copied.len(), dest.display());
    Ok(())
}
