//! Validate data documents against a combined schema.
//!
//! Compilation and the validation algorithm itself belong to `jsonschema`;
//! this module only prepares the schema payload (optionally narrowing it to a
//! single definition) and turns validation errors into plain records. Test
//! suites pair inline documents with the outcome they are expected to have.

use crate::keys::KeyDeriver;
use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// One failed constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// JSON pointer into the data document.
    pub instance_path: String,
    /// JSON pointer to the keyword that failed.
    pub schema_path: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "errors", rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed(Vec<ValidationIssue>),
    /// The data file does not exist.
    Skipped,
}

#[derive(Clone, Debug, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub verdict: Verdict,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl Summary {
    pub fn tally(results: &[FileResult]) -> Self {
        Self::from_verdicts(results.iter().map(|result| &result.verdict))
    }

    pub fn from_verdicts<'a>(verdicts: impl IntoIterator<Item = &'a Verdict>) -> Self {
        let mut summary = Summary::default();
        for verdict in verdicts {
            summary.total += 1;
            match verdict {
                Verdict::Passed => summary.passed += 1,
                Verdict::Failed(_) => summary.failed += 1,
                Verdict::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

/// A compiled schema ready to check documents.
pub struct DocumentValidator {
    compiled: JSONSchema,
}

impl DocumentValidator {
    /// Compile `schema`, or only `definitions/<definition>` of it when given.
    pub fn from_schema(schema: &Value, definition: Option<&str>) -> Result<Self> {
        let payload = match definition {
            Some(key) => narrow_to_definition(schema, key)?,
            None => without_root_id(schema),
        };
        let compiled = JSONSchema::compile(&payload)
            .map_err(|err| anyhow!("compiling schema: {err}"))?;
        Ok(Self { compiled })
    }

    /// Read a schema document from disk and compile it.
    pub fn load(path: &Path, definition: Option<&str>) -> Result<Self> {
        let schema = read_schema(path)?;
        Self::from_schema(&schema, definition)
            .with_context(|| format!("loading schema {}", path.display()))
    }

    /// Every failed constraint, in the order the validator reports them.
    pub fn validate(&self, instance: &Value) -> Vec<ValidationIssue> {
        match self.compiled.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|err| ValidationIssue {
                    instance_path: err.instance_path.to_string(),
                    schema_path: err.schema_path.to_string(),
                    message: err.to_string(),
                })
                .collect(),
        }
    }

    /// Validate the JSON file at `path`; a missing file is skipped.
    pub fn validate_file(&self, path: &Path) -> Result<FileResult> {
        if !path.exists() {
            return Ok(FileResult {
                path: path.to_path_buf(),
                verdict: Verdict::Skipped,
            });
        }
        let instance: Value = serde_json::from_reader(
            File::open(path).with_context(|| format!("opening data file {}", path.display()))?,
        )
        .with_context(|| format!("parsing data file {}", path.display()))?;

        let issues = self.validate(&instance);
        let verdict = if issues.is_empty() {
            Verdict::Passed
        } else {
            Verdict::Failed(issues)
        };
        Ok(FileResult {
            path: path.to_path_buf(),
            verdict,
        })
    }
}

/// Parse the schema document at `path`.
pub fn read_schema(path: &Path) -> Result<Value> {
    serde_json::from_reader(
        File::open(path).with_context(|| format!("opening schema {}", path.display()))?,
    )
    .with_context(|| format!("parsing schema {}", path.display()))
}

/// Outcome a suite case asserts for its document.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    Valid,
    Invalid,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SuiteCase {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Fragment path or definition key; the whole document when absent.
    #[serde(default)]
    pub schema: Option<String>,
    pub data: Value,
    pub expected: Expectation,
}

/// `{"tests": [...]}` file of expected-outcome cases.
#[derive(Clone, Debug, Deserialize)]
pub struct Suite {
    pub tests: Vec<SuiteCase>,
}

impl Suite {
    pub fn load(path: &Path) -> Result<Self> {
        serde_json::from_reader(
            File::open(path).with_context(|| format!("opening test suite {}", path.display()))?,
        )
        .with_context(|| format!("parsing test suite {}", path.display()))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CaseResult {
    pub name: String,
    pub expected: Expectation,
    /// `passed` when the outcome matched `expected`.
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Runs suite cases against one combined schema, compiling each selected
/// definition once.
pub struct SuiteRunner<'s> {
    schema: &'s Value,
    keys: KeyDeriver,
    compiled: BTreeMap<Option<String>, DocumentValidator>,
}

impl<'s> SuiteRunner<'s> {
    pub fn new(schema: &'s Value, keys: KeyDeriver) -> Self {
        Self {
            schema,
            keys,
            compiled: BTreeMap::new(),
        }
    }

    pub fn run(&mut self, suite: &Suite) -> Vec<CaseResult> {
        suite.tests.iter().map(|case| self.run_case(case)).collect()
    }

    /// A case whose definition cannot be compiled fails on its own.
    pub fn run_case(&mut self, case: &SuiteCase) -> CaseResult {
        let definition = case
            .schema
            .as_deref()
            .map(|schema| self.keys.derive(schema).0);
        let verdict = match self.validator_for(definition) {
            Ok(validator) => judge(case.expected, validator.validate(&case.data)),
            Err(err) => Verdict::Failed(vec![plain_issue(format!("{err:#}"))]),
        };
        tracing::debug!(case = %case.name, ?verdict, "suite case");
        CaseResult {
            name: case.name.clone(),
            expected: case.expected,
            verdict,
        }
    }

    fn validator_for(&mut self, definition: Option<String>) -> Result<&DocumentValidator> {
        if !self.compiled.contains_key(&definition) {
            let validator = DocumentValidator::from_schema(self.schema, definition.as_deref())?;
            self.compiled.insert(definition.clone(), validator);
        }
        Ok(&self.compiled[&definition])
    }
}

fn judge(expected: Expectation, issues: Vec<ValidationIssue>) -> Verdict {
    match (expected, issues.is_empty()) {
        (Expectation::Valid, true) | (Expectation::Invalid, false) => Verdict::Passed,
        (Expectation::Valid, false) => Verdict::Failed(issues),
        (Expectation::Invalid, true) => Verdict::Failed(vec![plain_issue(
            "expected invalid, but the document is valid".to_string(),
        )]),
    }
}

fn plain_issue(message: String) -> ValidationIssue {
    ValidationIssue {
        instance_path: String::new(),
        schema_path: String::new(),
        message,
    }
}

// A relative root `$id` such as `immerschema/combined-schema.json` is not a
// usable base URI; internal pointers do not need one.
fn without_root_id(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != "$id")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn narrow_to_definition(schema: &Value, key: &str) -> Result<Value> {
    let Some(definitions) = schema.get("definitions").and_then(Value::as_object) else {
        bail!("schema has no definitions table");
    };
    if !definitions.contains_key(key) {
        bail!("unknown definition '{key}'");
    }

    let mut narrowed = Map::new();
    if let Some(draft) = schema.get("$schema") {
        narrowed.insert("$schema".to_string(), draft.clone());
    }
    narrowed.insert("$ref".to_string(), json!(format!("#/definitions/{key}")));
    narrowed.insert(
        "definitions".to_string(),
        Value::Object(definitions.clone()),
    );
    Ok(Value::Object(narrowed))
}
