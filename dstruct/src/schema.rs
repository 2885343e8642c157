/* Schema files declaring named struct types */

use crate::errors::{StructError, StructResult};
use crate::format::{describe, TypeSummary};
use crate::struct_type::StructType;
use dstruct_types::DataType;
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::debug;

/* Top-level document: `types: [...]` */
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaFile {
    pub types: Vec<TypeDef>,
}

/* One named struct type; `fields` uses the JSON field-object shape */
#[derive(Debug, Clone, Deserialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub fields: JsonValue,
}

/// Named struct types resolved from a schema file.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    types: IndexMap<String, StructType>,
    descriptions: IndexMap<String, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(text: &str) -> StructResult<Self> {
        let file: SchemaFile = serde_yml::from_str(text)?;
        Self::load(file)
    }

    pub fn from_json_str(text: &str) -> StructResult<Self> {
        let file: SchemaFile = serde_json::from_str(text)?;
        Self::load(file)
    }

    /// Reads a schema file; `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> StructResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    pub fn load(file: SchemaFile) -> StructResult<Self> {
        let mut registry = Self::new();
        registry.resolve_all(file.types)?;
        Ok(registry)
    }

    /* Resolve definitions in dependency order */
    fn resolve_all(&mut self, defs: Vec<TypeDef>) -> StructResult<()> {
        let mut pending: IndexMap<String, TypeDef> = IndexMap::new();
        for def in defs {
            if self.types.contains_key(&def.name) || pending.contains_key(&def.name) {
                return Err(StructError::Schema(format!(
                    "Duplicate type definition: {}",
                    def.name
                )));
            }
            pending.insert(def.name.clone(), def);
        }

        while !pending.is_empty() {
            let mut ready = Vec::new();
            let mut missing: IndexSet<String> = IndexSet::new();
            for (name, def) in &pending {
                let refs = referenced_types(&def.fields);
                let mut blocked = false;
                for r in refs {
                    if self.types.contains_key(&r) {
                        continue;
                    }
                    blocked = true;
                    if !pending.contains_key(&r) {
                        missing.insert(r);
                    }
                }
                if !blocked {
                    ready.push(name.clone());
                }
            }

            if ready.is_empty() {
                if !missing.is_empty() {
                    let list: Vec<String> = missing.into_iter().collect();
                    return Err(StructError::Schema(format!(
                        "Missing type definitions: {}",
                        list.join(", ")
                    )));
                }
                let cycle: Vec<&str> = pending.keys().map(String::as_str).collect();
                return Err(StructError::Schema(format!(
                    "Circular dependency between types: {}",
                    cycle.join(", ")
                )));
            }

            for name in ready {
                let Some(def) = pending.shift_remove(&name) else {
                    continue;
                };
                let ty = StructType::from_json_with(&def.fields, |r| self.types.get(r).cloned())
                    .map_err(|e| StructError::Schema(format!("type `{}`: {}", name, e)))?;
                debug!(name = %name, byte_length = ty.byte_length(), "resolved schema type");
                if let Some(description) = def.description {
                    self.descriptions.insert(name.clone(), description);
                }
                self.types.insert(name, ty);
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StructType> {
        self.types.get(name)
    }

    /// Looks up a type, failing with the list of known names.
    pub fn require(&self, name: &str) -> StructResult<&StructType> {
        self.get(name).ok_or_else(|| StructError::UnknownType {
            name: name.to_string(),
            known: self.names().join(", "),
        })
    }

    pub fn description_of(&self, name: &str) -> Option<&str> {
        self.descriptions.get(name).map(String::as_str)
    }

    /// [`describe`] output for a named type, carrying its schema description.
    pub fn describe(&self, name: &str) -> StructResult<TypeSummary> {
        let mut summary = describe(self.require(name)?);
        summary.description = self.description_of(name).map(str::to_string);
        Ok(summary)
    }

    /* Type names in declaration-resolution order */
    pub fn names(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/* Non-catalog `type` names used by a field list, union members included */
fn referenced_types(fields: &JsonValue) -> Vec<String> {
    let mut out = Vec::new();
    collect_refs(fields, &mut out);
    out
}

fn collect_refs(value: &JsonValue, out: &mut Vec<String>) {
    match value {
        JsonValue::Array(items) => {
            for item in items {
                collect_refs(item, out);
            }
        }
        JsonValue::Object(obj) => {
            match obj.get("type").and_then(JsonValue::as_str) {
                Some("union") => {
                    if let Some(members) = obj.get("fields") {
                        collect_refs(members, out);
                    }
                }
                Some(name) if name.parse::<DataType>().is_err() => {
                    if !out.iter().any(|r| r == name) {
                        out.push(name.to_string());
                    }
                }
                _ => {}
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_definitions_resolve_first() {
        let registry = SchemaRegistry::from_json_str(
            r#"{"types": [
                {"name": "Outer", "fields": [{"name": "p", "type": "Inner"}]},
                {"name": "Inner", "fields": [{"name": "x", "type": "int32"}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(registry.names(), vec!["Inner", "Outer"]);
        assert_eq!(registry.get("Outer").unwrap().byte_length(), 4);
    }

    #[test]
    fn unknown_references_are_reported() {
        let err = SchemaRegistry::from_json_str(
            r#"{"types": [{"name": "A", "fields": [{"name": "p", "type": "Nope"}]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Missing type definitions: Nope"));
    }

    #[test]
    fn cycles_are_reported() {
        let err = SchemaRegistry::from_json_str(
            r#"{"types": [
                {"name": "A", "fields": [{"name": "b", "type": "B"}]},
                {"name": "B", "fields": [{"name": "a", "type": "A"}]}
            ]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Circular dependency"));
    }
}
