use crate::ast::SchemaToken;
use crate::compiler::Compiler;
use crate::error::IdeaError;
use crate::imports::{expand_imports, ImportSources};
use crate::parser::Parser;
use crate::resolver::resolve_final;
use crate::serialization::{FinalSchemaConfig, SchemaConfig};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Compiles a schema, keeping props and `${Name}` reference placeholders.
///
/// `use` statements are not followed, only listed under `use` so a loader
/// can fetch them and call [`parse_with_imports`].
///
/// # Errors
/// Returns an `IdeaError` if the source does not parse or does not compile.
pub fn parse(source: &str) -> Result<SchemaConfig, IdeaError> {
    Ok(analyze(source, "schema.idea")?.config)
}

/// Compiles a schema and inlines every reference, dropping props and `use`.
///
/// # Errors
/// Everything [`parse`] rejects, plus unknown or circular references.
pub fn parse_final(source: &str) -> Result<FinalSchemaConfig, IdeaError> {
    let config = parse(source)?;
    Ok(resolve_final(&config)?)
}

/// [`parse`], with the text of every `use`d path supplied by the caller.
///
/// # Errors
/// Also fails when an imported path is missing from `sources` or imports
/// form a cycle.
pub fn parse_with_imports(
    source: &str,
    sources: &ImportSources,
) -> Result<SchemaConfig, IdeaError> {
    Ok(analyze_with_imports(source, "schema.idea", sources)?.config)
}

/// [`parse_final`], with the text of every `use`d path supplied by the caller.
///
/// # Errors
/// See [`parse_with_imports`] and [`parse_final`].
pub fn final_with_imports(
    source: &str,
    sources: &ImportSources,
) -> Result<FinalSchemaConfig, IdeaError> {
    let config = parse_with_imports(source, sources)?;
    Ok(resolve_final(&config)?)
}

/// The result of a successful analysis: the syntax tree, import-expanded when
/// sources were supplied, and the configuration compiled from it.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub schema: SchemaToken,
    pub config: SchemaConfig,
}

impl Serialize for Analysis {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.config.serialize(serializer)
    }
}

impl Analysis {
    /// The compiled configuration as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        self.config.to_value()
    }

    /// Serializes the compiled configuration into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the compiled configuration into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }

    /// Resolves references into the final configuration.
    ///
    /// # Errors
    /// Returns an `IdeaError` for unknown or circular references.
    pub fn finalize(&self) -> Result<FinalSchemaConfig, IdeaError> {
        Ok(resolve_final(&self.config)?)
    }
}

/// Parses and compiles a schema, keeping the syntax tree around.
///
/// # Arguments
///
/// * `source` - The schema source code.
/// * `file_name` - The name diagnostics use for the source.
///
/// # Errors
///
/// Returns an `IdeaError` if parsing or compilation fails. `use` statements
/// are recorded but not followed.
pub fn analyze(source: &str, file_name: &str) -> Result<Analysis, IdeaError> {
    let mut parser = Parser::new_with_name(source, file_name.to_string());
    let schema = parser.parse_schema()?;

    let config = Compiler::new().schema_token(&schema)?;
    Ok(Analysis { schema, config })
}

/// [`analyze`], with the text of every `use`d path supplied by the caller.
///
/// # Errors
///
/// Returns an `IdeaError` if parsing, import expansion or compilation fails.
pub fn analyze_with_imports(
    source: &str,
    file_name: &str,
    sources: &ImportSources,
) -> Result<Analysis, IdeaError> {
    let mut parser = Parser::new_with_name(source, file_name.to_string());
    let schema = expand_imports(parser.parse_schema()?, sources)?;

    let config = Compiler::new().schema_token(&schema)?;
    Ok(Analysis { schema, config })
}

#[cfg(test)]
mod tests {
    use crate::analyze;

    #[test]
    fn test_simple_parse_to_json() {
        let source = r#"
        enum Status { ACTIVE "Active" }
        model User { id String @id }
    "#;

        let expected_json = serde_json::json!({
            "enum": { "Status": { "ACTIVE": "Active" } },
            "model": {
                "User": {
                    "name": "User",
                    "mutable": true,
                    "attributes": {},
                    "columns": [
                        { "type": "String", "name": "id", "required": true, "multiple": false, "attributes": { "id": true } }
                    ]
                }
            }
        });

        let analysis = analyze(source, "test.idea").unwrap();
        let result = analysis.to_json().unwrap();
        let result_json: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(result_json, expected_json);
        assert_eq!(analysis.to_value(), expected_json);
    }

    #[test]
    fn test_simple_parse_to_yaml() {
        let source = r#"enum Status { ACTIVE "Active" INACTIVE "Inactive" }"#;

        let expected_yaml = "enum:\n  Status:\n    ACTIVE: Active\n    INACTIVE: Inactive\n";

        let analysis = analyze(source, "test.idea").unwrap();
        assert_eq!(analysis.to_yaml().unwrap(), expected_yaml);
    }

    #[test]
    fn test_analysis_keeps_syntax_tree() {
        let source = r#"prop Text { type "text" } model User { name String @field.input(Text) }"#;
        let analysis = analyze(source, "test.idea").unwrap();
        assert_eq!(analysis.schema.declarations().count(), 2);

        let finalized = analysis.finalize().unwrap();
        assert!(finalized.models.contains_key("User"));
    }

    #[test]
    fn test_use_is_recorded_not_followed() {
        let source = r#"use "./a.idea" enum A { X "x" }"#;
        let analysis = analyze(source, "test.idea").unwrap();
        assert_eq!(analysis.schema.imports().count(), 1);
        assert_eq!(
            analysis.to_value(),
            serde_json::json!({ "use": ["./a.idea"], "enum": { "A": { "X": "x" } } })
        );
    }
}
