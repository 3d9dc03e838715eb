//! Combined document assembly.
//!
//! Installs every rewritten fragment under its derived key, orders the
//! table, and adds the `properties`/`oneOf` entry points for project schemas.

use crate::config::{CombineConfig, DocumentHeader};
use crate::keys::{DefinitionKey, KeyDeriver};
use crate::loader::SchemaFile;
use crate::ordering::DefinitionOrder;
use crate::refs::RefRewriter;
use anyhow::{Result, bail};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// The single output artifact of a combine run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CombinedDocument {
    #[serde(flatten)]
    pub header: DocumentHeader,
    pub definitions: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    #[serde(rename = "oneOf", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
}

impl CombinedDocument {
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn definition_keys(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}

/// Turns loaded fragments into a [`CombinedDocument`].
#[derive(Clone, Debug)]
pub struct Assembler {
    rewriter: RefRewriter,
    order: DefinitionOrder,
    header: DocumentHeader,
    project_prefix: String,
    project_suffix: String,
}

impl Assembler {
    pub fn from_config(config: &CombineConfig) -> Self {
        Self {
            rewriter: RefRewriter::new(KeyDeriver::new(config.strip_prefixes.clone())),
            order: DefinitionOrder::new(config.categories.clone()),
            header: config.header.clone(),
            project_prefix: config.project_prefix.clone(),
            project_suffix: config.project_suffix.clone(),
        }
    }

    pub fn order(&self) -> &DefinitionOrder {
        &self.order
    }

    pub fn key_for(&self, file: &SchemaFile) -> DefinitionKey {
        self.rewriter.keys().derive(&file.relative_path)
    }

    /// True for root-level files named with the project prefix.
    pub fn is_project(&self, file: &SchemaFile) -> bool {
        file.relative_path.starts_with(&self.project_prefix)
    }

    /// Short property name of a project file: `project.draft.schema.json` → `draft`.
    pub fn project_property_name<'f>(&self, file: &'f SchemaFile) -> &'f str {
        let name = file.file_name();
        let stem = name
            .strip_suffix(self.project_suffix.as_str())
            .or_else(|| name.strip_suffix(".json"))
            .unwrap_or(name);
        stem.strip_prefix(self.project_prefix.as_str())
            .unwrap_or(stem)
    }

    /// Install, order and finish the combined document.
    ///
    /// Fails when two fragments derive the same key, or a path folds to an
    /// empty key; nothing is dropped silently.
    pub fn assemble(&self, files: Vec<SchemaFile>) -> Result<CombinedDocument> {
        let mut sources: BTreeMap<DefinitionKey, String> = BTreeMap::new();
        let mut installed: Vec<(DefinitionKey, Value)> = Vec::with_capacity(files.len());
        let mut projects: Vec<(DefinitionKey, String)> = Vec::new();

        for file in &files {
            let key = self.key_for(file);
            if key.as_str().is_empty() {
                bail!(
                    "{} derives an empty definition key; rename the file",
                    file.relative_path
                );
            }
            if let Some(previous) = sources.get(&key) {
                bail!(
                    "definition key '{key}' derived from both {previous} and {}",
                    file.relative_path
                );
            }
            sources.insert(key.clone(), file.relative_path.clone());

            if self.is_project(file) {
                projects.push((key.clone(), self.project_property_name(file).to_string()));
            }

            let content = self
                .rewriter
                .rewrite(&strip_declared_id(&file.content), &file.relative_path);
            tracing::debug!(key = %key, source = %file.relative_path, "added definition");
            installed.push((key, content));
        }

        self.order.sort(&mut installed);
        self.order.sort(&mut projects);

        let definitions: Map<String, Value> = installed
            .into_iter()
            .map(|(key, content)| (key.0, content))
            .collect();

        let (properties, one_of) = if projects.is_empty() {
            (None, None)
        } else {
            let properties = projects
                .iter()
                .map(|(key, name)| (name.clone(), json!({ "$ref": key.pointer() })))
                .collect();
            let one_of = projects
                .iter()
                .map(|(key, _)| json!({ "$ref": key.pointer() }))
                .collect();
            (Some(properties), Some(one_of))
        };

        Ok(CombinedDocument {
            header: self.header.clone(),
            definitions,
            properties,
            one_of,
        })
    }
}

/// Copy of `content` without its top-level `$id`; nested ids stay.
fn strip_declared_id(content: &Value) -> Value {
    match content {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != "$id")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler() -> Assembler {
        Assembler::from_config(&CombineConfig::default())
    }

    fn fragment(path: &str, content: Value) -> SchemaFile {
        SchemaFile::from_value(path, content)
    }

    #[test]
    fn installs_rewritten_fragments_in_order() {
        let doc = assembler()
            .assemble(vec![
                fragment("profiles/draft.schema.json", json!({
                    "$id": "immerschema/profiles/draft.schema.json",
                    "allOf": [{"$ref": "../slices/id.slice.schema.json"}]
                })),
                fragment("enum/role.enum.json", json!({"enum": ["lead", "artist"]})),
                fragment("slices/id.slice.schema.json", json!({
                    "type": "object",
                    "properties": {"nested": {"$id": "keep-me"}}
                })),
            ])
            .unwrap();

        let keys: Vec<&str> = doc.definition_keys().collect();
        assert_eq!(keys, vec!["slices_id_slice", "enum_role", "profiles_draft"]);
        assert_eq!(
            doc.definitions["profiles_draft"],
            json!({"allOf": [{"$ref": "#/definitions/slices_id_slice"}]})
        );
        assert_eq!(
            doc.definitions["slices_id_slice"]["properties"]["nested"]["$id"],
            "keep-me"
        );
        assert!(doc.properties.is_none());
        assert!(doc.one_of.is_none());
    }

    #[test]
    fn project_files_get_entry_points() {
        let doc = assembler()
            .assemble(vec![
                fragment("project.review.schema.json", json!({"type": "object"})),
                fragment("project.draft.schema.json", json!({"type": "object"})),
                fragment("profiles/project.lock.schema.json", json!({"type": "object"})),
            ])
            .unwrap();

        let properties = doc.properties.as_ref().unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties["draft"], json!({"$ref": "#/definitions/project_draft"}));
        assert_eq!(properties["review"], json!({"$ref": "#/definitions/project_review"}));
        assert_eq!(
            doc.one_of.as_ref().unwrap(),
            &vec![
                json!({"$ref": "#/definitions/project_draft"}),
                json!({"$ref": "#/definitions/project_review"}),
            ]
        );
    }

    #[test]
    fn colliding_keys_are_an_error() {
        let err = assembler()
            .assemble(vec![
                fragment("a/b.schema.json", json!({})),
                fragment("a-b.schema.json", json!({})),
            ])
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'a_b'"), "{message}");
        assert!(message.contains("a/b.schema.json"), "{message}");
        assert!(message.contains("a-b.schema.json"), "{message}");
    }

    #[test]
    fn output_members_are_ordered() {
        let doc = assembler()
            .assemble(vec![fragment("project.draft.schema.json", json!({}))])
            .unwrap();
        let text = doc.to_pretty_json().unwrap();
        let members = [
            "\"$schema\"",
            "\"$id\"",
            "\"title\"",
            "\"description\"",
            "\"definitions\"",
            "\"properties\"",
            "\"oneOf\"",
        ];
        let positions: Vec<usize> = members
            .iter()
            .map(|member| text.find(member).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
        assert!(text.starts_with("{\n  \"$schema\""));
    }

    #[test]
    fn empty_keys_are_rejected() {
        let err = assembler()
            .assemble(vec![
                fragment("enum/dept.enum.json", json!({})),
                fragment(".schema.json", json!({})),
            ])
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("empty definition key"), "{message}");
        assert!(message.contains(".schema.json"), "{message}");
    }
}
