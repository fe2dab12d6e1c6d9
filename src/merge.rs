//! The insert-or-merge fold that turns an ordered list of compiled
//! declarations into a [`SchemaConfig`].

use crate::ast::DeclarationKind;
use crate::error::CompilerError;
use crate::serialization::SchemaConfig;
use miette::SourceSpan;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Accumulates declarations one at a time.
///
/// Same-named declarations of one kind combine as follows:
/// - two mergeable ones deep-merge, and a conflicting value is `Duplicate <name>`;
/// - a `!` declaration replaces a mergeable one, whichever comes first;
/// - two `!` declarations are `Duplicate <name>`.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    config: SchemaConfig,
    /// Names currently held by a `!` declaration.
    fixed: HashSet<(DeclarationKind, String)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        kind: DeclarationKind,
        name: String,
        value: Value,
        mutable: bool,
        span: Option<SourceSpan>,
    ) -> Result<(), CompilerError> {
        let fixed = self.fixed.contains(&(kind, name.clone()));
        let section = self.config.section_mut(kind);

        let Some(existing) = section.get_mut(&name) else {
            section.insert(name.clone(), value);
            if !mutable {
                self.fixed.insert((kind, name));
            }
            return Ok(());
        };

        match (fixed, mutable) {
            (false, true) => {
                log::debug!("merging {} {}", kind.section(), name);
                if merge_declaration(kind, existing, value) {
                    Ok(())
                } else {
                    Err(CompilerError::Duplicate { name, span })
                }
            }
            (false, false) => {
                log::debug!("{} {} replaced by its ! declaration", kind.section(), name);
                *existing = value;
                self.fixed.insert((kind, name));
                Ok(())
            }
            (true, true) => {
                log::debug!("{} {} kept its ! declaration", kind.section(), name);
                Ok(())
            }
            (true, false) => Err(CompilerError::Duplicate { name, span }),
        }
    }

    /// Records a `use` path once.
    pub fn add_import(&mut self, path: String) {
        if !self.config.imports.contains(&path) {
            self.config.imports.push(path);
        }
    }

    pub fn finish(self) -> SchemaConfig {
        self.config
    }
}

/// Merges `incoming` into `existing`. Columns of types and models are matched
/// by name. Returns `false` on a conflicting value.
fn merge_declaration(kind: DeclarationKind, existing: &mut Value, incoming: Value) -> bool {
    let columned = matches!(kind, DeclarationKind::Type | DeclarationKind::Model);
    match (existing, incoming) {
        (Value::Object(existing), Value::Object(incoming)) if columned => {
            incoming.into_iter().all(|(key, value)| match existing.get_mut(&key) {
                Some(Value::Array(columns)) if key == "columns" => match value {
                    Value::Array(incoming) => merge_columns(columns, incoming),
                    _ => false,
                },
                Some(current) => deep_merge(current, value),
                None => {
                    existing.insert(key, value);
                    true
                }
            })
        }
        (existing, incoming) => deep_merge(existing, incoming),
    }
}

fn merge_columns(existing: &mut Vec<Value>, incoming: Vec<Value>) -> bool {
    for column in incoming {
        let name = column.get("name").cloned();
        match existing.iter().find(|current| current.get("name").cloned() == name) {
            Some(current) if *current == column => {}
            Some(_) => return false,
            None => existing.push(column),
        }
    }
    true
}

/// Objects union their keys; anything else must already be equal.
fn deep_merge(existing: &mut Value, incoming: Value) -> bool {
    match (existing, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => merge_objects(existing, incoming),
        (existing, incoming) => *existing == incoming,
    }
}

fn merge_objects(existing: &mut Map<String, Value>, incoming: Map<String, Value>) -> bool {
    incoming.into_iter().all(|(key, value)| match existing.get_mut(&key) {
        Some(current) => deep_merge(current, value),
        None => {
            existing.insert(key, value);
            true
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(columns: Value) -> Value {
        json!({ "name": "User", "mutable": true, "attributes": {}, "columns": columns })
    }

    fn column(name: &str, kind: &str) -> Value {
        json!({ "type": kind, "name": name, "required": true, "multiple": false, "attributes": {} })
    }

    #[test]
    fn test_deep_merge_reports_conflicts() {
        let mut existing = json!({ "a": 1, "nested": { "b": true } });
        assert!(deep_merge(&mut existing, json!({ "nested": { "c": "x" }, "d": [1] })));
        assert_eq!(existing, json!({ "a": 1, "nested": { "b": true, "c": "x" }, "d": [1] }));

        assert!(deep_merge(&mut existing, json!({ "a": 1 })));
        assert!(!deep_merge(&mut existing, json!({ "nested": { "b": false } })));
        assert!(!deep_merge(&mut existing, json!({ "d": [2] })));
    }

    #[test]
    fn test_insert_new_names() {
        let mut builder = SchemaBuilder::new();
        builder
            .insert(DeclarationKind::Enum, "A".into(), json!({ "X": "x" }), true, None)
            .unwrap();
        builder
            .insert(DeclarationKind::Prop, "A".into(), json!({ "y": 1 }), true, None)
            .unwrap();
        let config = builder.finish();
        assert_eq!(config.enums["A"], json!({ "X": "x" }));
        assert_eq!(config.props["A"], json!({ "y": 1 }));
    }

    #[test]
    fn test_mergeable_objects_union() {
        let mut builder = SchemaBuilder::new();
        builder
            .insert(DeclarationKind::Enum, "A".into(), json!({ "X": "x" }), true, None)
            .unwrap();
        builder
            .insert(DeclarationKind::Enum, "A".into(), json!({ "Y": "y", "X": "x" }), true, None)
            .unwrap();
        assert_eq!(builder.finish().enums["A"], json!({ "X": "x", "Y": "y" }));
    }

    #[test]
    fn test_conflicting_scalar_is_duplicate() {
        let mut builder = SchemaBuilder::new();
        builder
            .insert(DeclarationKind::Enum, "A".into(), json!({ "X": "x" }), true, None)
            .unwrap();
        let err = builder
            .insert(DeclarationKind::Enum, "A".into(), json!({ "X": "other" }), true, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate A");
    }

    #[test]
    fn test_columns_merge_by_name() {
        let mut builder = SchemaBuilder::new();
        let first = model(json!([column("id", "String")]));
        let second = model(json!([column("email", "String"), column("id", "String")]));
        builder.insert(DeclarationKind::Model, "User".into(), first, true, None).unwrap();
        builder.insert(DeclarationKind::Model, "User".into(), second, true, None).unwrap();

        let config = builder.finish();
        let names: Vec<&str> = config.models["User"]["columns"]
            .as_array()
            .map(|columns| columns.iter().filter_map(|c| c["name"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["id", "email"]);
    }

    #[test]
    fn test_same_column_different_type_is_duplicate() {
        let mut builder = SchemaBuilder::new();
        let first = model(json!([column("id", "String")]));
        let second = model(json!([column("id", "Number")]));
        builder.insert(DeclarationKind::Model, "User".into(), first, true, None).unwrap();
        let err = builder
            .insert(DeclarationKind::Model, "User".into(), second, true, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate User");
    }

    #[test]
    fn test_fixed_declaration_wins_in_either_order() {
        let loose = json!({ "X": "x" });
        let fixed = json!({ "Y": "y" });

        let mut builder = SchemaBuilder::new();
        builder.insert(DeclarationKind::Enum, "A".into(), loose.clone(), true, None).unwrap();
        builder.insert(DeclarationKind::Enum, "A".into(), fixed.clone(), false, None).unwrap();
        assert_eq!(builder.finish().enums["A"], fixed);

        let mut builder = SchemaBuilder::new();
        builder.insert(DeclarationKind::Enum, "A".into(), fixed.clone(), false, None).unwrap();
        builder.insert(DeclarationKind::Enum, "A".into(), loose, true, None).unwrap();
        assert_eq!(builder.finish().enums["A"], fixed);
    }

    #[test]
    fn test_two_fixed_declarations_are_duplicate() {
        let mut builder = SchemaBuilder::new();
        builder
            .insert(DeclarationKind::Type, "Address".into(), model(json!([])), false, None)
            .unwrap();
        let err = builder
            .insert(DeclarationKind::Type, "Address".into(), model(json!([])), false, None)
            .unwrap_err();
        assert!(matches!(err, CompilerError::Duplicate { ref name, .. } if name == "Address"));
    }

    #[test]
    fn test_imports_are_deduplicated() {
        let mut builder = SchemaBuilder::new();
        builder.add_import("./a.idea".to_string());
        builder.add_import("./b.idea".to_string());
        builder.add_import("./a.idea".to_string());
        assert_eq!(builder.finish().imports, vec!["./a.idea", "./b.idea"]);
    }
}
