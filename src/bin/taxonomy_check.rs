//! Check that every enum has a taxonomy listing exactly its values.

use anyhow::{Result, bail};
use clap::Parser;
use schemaweld::{Workspace, check_taxonomies, init_tracing};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taxonomy-check")]
#[command(about = "Verify enum and taxonomy files stay in sync")]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Combiner config file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Schema root directory; skips workspace discovery.
    #[arg(long)]
    schemas: Option<PathBuf>,
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

    let workspace = Workspace::resolve(cli.config.as_deref(), cli.schemas.as_deref())?;
    let root = workspace.schema_root();
    let problems = check_taxonomies(
        &root,
        &workspace.config.enum_dir,
        &workspace.config.taxonomy_dir,
    )?;

    if problems.is_empty() {
        println!("all enums match their taxonomies");
        return Ok(());
    }
    for problem in &problems {
        println!("{problem}");
    }
    bail!("{} enum/taxonomy problem(s)", problems.len())
}
