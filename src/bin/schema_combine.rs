//! Weld the schema fragment tree into one combined document.
//!
//! Usage:
//!   schema-combine
//!   schema-combine --schemas schemas --output combined-schema.json -v
//!   schema-combine --check --strict-refs

use anyhow::{Context, Result, bail};
use clap::Parser;
use schemaweld::{
    CombineReport, SuffixVariant, Workspace, combine, init_tracing, split_list, write_document,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "schema-combine")]
#[command(about = "Combine schema fragments into a single schema document")]
struct Cli {
    /// Increase log detail (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Combiner config file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Schema root directory; skips workspace discovery.
    #[arg(long)]
    schemas: Option<PathBuf>,
    /// Output path for the combined schema.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Fragment naming convention: strict or loose.
    #[arg(long, value_parser = ["strict", "loose"])]
    variant: Option<String>,
    /// Explicit fragment suffixes, comma separated.
    #[arg(long)]
    suffixes: Option<String>,
    /// Run the whole pipeline but do not write the output.
    #[arg(long)]
    check: bool,
    /// Fail when any rewritten reference does not resolve.
    #[arg(long)]
    strict_refs: bool,
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
    if let Some(output) = cli.output {
        workspace.config.output = output;
    }
    if let Some(variant) = cli.variant.as_deref() {
        workspace.config.variant = SuffixVariant::try_from(variant)?;
    }
    if let Some(list) = cli.suffixes.as_deref() {
        let suffixes = split_list(list);
        if suffixes.is_empty() {
            bail!("--suffixes needs at least one suffix");
        }
        workspace.config.suffixes = Some(suffixes);
    }

    let root = workspace.schema_root();
    let combined = combine(&root, &workspace.config)
        .with_context(|| format!("combining schemas under {}", root.display()))?;
    print_summary(&combined.report);

    if cli.strict_refs && !combined.report.dangling.is_empty() {
        bail!(
            "{} dangling reference(s) in combined schema",
            combined.report.dangling.len()
        );
    }

    if cli.check {
        println!("check only: nothing written");
        return Ok(());
    }

    let output = workspace.output_path();
    write_document(&combined.document, &output)?;
    println!("wrote {}", output.display());
    Ok(())
}

fn print_summary(report: &CombineReport) {
    println!("discovered: {}", report.discovered);
    println!("loaded:     {}", report.loaded);
    println!("skipped:    {}", report.failures.len());
    for failure in &report.failures {
        println!("  {}: {}", failure.path.display(), failure.message);
    }
    println!("definitions: {}", report.total_definitions());
    for (category, count) in &report.categories {
        println!("  {category}: {count}");
    }
    if !report.dangling.is_empty() {
        println!("dangling references: {}", report.dangling.len());
        for gap in &report.dangling {
            println!("  {gap}");
        }
    }
}
