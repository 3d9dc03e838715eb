//! Validate data documents against the combined schema.
//!
//! Usage:
//!   schema-validate data/shot-001.json data/shot-002.json
//!   schema-validate --definition profiles_draft data/draft.json
//!   schema-validate --schema dist/combined-schema.json --json data/*.json
//!   schema-validate --suite test/validation_tests.json

use anyhow::{Context, Result, bail};
use clap::Parser;
use schemaweld::{
    CaseResult, CombineConfig, DocumentValidator, FileResult, KeyDeriver, Suite, SuiteRunner,
    Summary, ValidationIssue, Verdict, Workspace, init_tracing, read_schema,
};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "schema-validate")]
#[command(about = "Validate JSON data files against a schema document")]
struct Cli {
    /// Increase log detail (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Schema document; defaults to the configured combined output.
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Combiner config file, used to locate the default schema.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Validate against one definition instead of the whole document.
    #[arg(long)]
    definition: Option<String>,
    /// Test suite of cases with expected outcomes.
    #[arg(long)]
    suite: Option<PathBuf>,
    /// Print results as JSON.
    #[arg(long)]
    json: bool,
    /// Data files to validate.
    #[arg(required_unless_present = "suite")]
    files: Vec<PathBuf>,
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

/// Returns whether every file and case passed or was skipped.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (schema_path, config) = match cli.schema {
        Some(path) => (path, CombineConfig::load_or_default(cli.config.as_deref())?),
        None => {
            let workspace = Workspace::resolve(cli.config.as_deref(), None)
                .context("locating the combined schema; pass --schema to name one")?;
            (workspace.output_path(), workspace.config)
        }
    };
    if !schema_path.is_file() {
        bail!("schema {} does not exist", schema_path.display());
    }
    let schema = read_schema(&schema_path)?;

    let mut files = Vec::with_capacity(cli.files.len());
    if !cli.files.is_empty() {
        let validator = DocumentValidator::from_schema(&schema, cli.definition.as_deref())
            .with_context(|| format!("loading schema {}", schema_path.display()))?;
        for file in &cli.files {
            let result = validator.validate_file(file)?;
            tracing::info!(path = %file.display(), "validated");
            files.push(result);
        }
    }

    let mut cases = Vec::new();
    if let Some(suite_path) = &cli.suite {
        let suite = Suite::load(suite_path)?;
        let keys = KeyDeriver::new(config.strip_prefixes.clone());
        cases = SuiteRunner::new(&schema, keys).run(&suite);
        tracing::info!(suite = %suite_path.display(), cases = cases.len(), "ran test suite");
    }

    let summary = Summary::from_verdicts(
        files
            .iter()
            .map(|result| &result.verdict)
            .chain(cases.iter().map(|case| &case.verdict)),
    );

    if cli.json {
        let files = serde_json::to_value(&files).context("serializing file results")?;
        let output = if cli.suite.is_some() {
            let cases = serde_json::to_value(&cases).context("serializing suite results")?;
            json!({ "files": files, "cases": cases })
        } else {
            files
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("serializing results")?
        );
    } else {
        for result in &files {
            print_file(result);
        }
        for case in &cases {
            print_case(case);
        }
        println!(
            "passed: {}  failed: {}  skipped: {}  total: {}",
            summary.passed, summary.failed, summary.skipped, summary.total
        );
    }

    Ok(summary.failed == 0)
}

fn print_file(result: &FileResult) {
    match &result.verdict {
        Verdict::Passed => println!("PASS {}", result.path.display()),
        Verdict::Skipped => println!("SKIP {} (not found)", result.path.display()),
        Verdict::Failed(issues) => {
            println!("FAIL {}", result.path.display());
            print_issues(issues);
        }
    }
}

fn print_case(case: &CaseResult) {
    match &case.verdict {
        Verdict::Passed => println!("PASS {}", case.name),
        Verdict::Skipped => println!("SKIP {}", case.name),
        Verdict::Failed(issues) => {
            println!("FAIL {} (expected {:?})", case.name, case.expected);
            print_issues(issues);
        }
    }
}

fn print_issues(issues: &[ValidationIssue]) {
    for issue in issues {
        let at = if issue.instance_path.is_empty() {
            "/"
        } else {
            issue.instance_path.as_str()
        };
        if issue.schema_path.is_empty() {
            println!("  {at}: {}", issue.message);
        } else {
            println!("  {at}: {} ({})", issue.message, issue.schema_path);
        }
    }
}
