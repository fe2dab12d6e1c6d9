use crate::ast::*;
use crate::error::CompilerError;
use crate::merge::SchemaBuilder;
use crate::serialization::SchemaConfig;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

/// Wraps a reference name the way unresolved references appear in `parse` output.
pub fn placeholder(name: &str) -> String {
    format!("${{{name}}}")
}

/// The reference name inside a placeholder string, if it is one.
pub fn reference_name(value: &str) -> Option<&str> {
    value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .filter(|name| !name.is_empty())
}

/// Whether a string opens with `$`s followed by `{`, the shape that has to be
/// escaped so it never reads as a placeholder.
fn is_dollar_brace(value: &str) -> bool {
    value.starts_with('$') && value.trim_start_matches('$').starts_with('{')
}

/// A string literal as it appears in `parse` output: `"${X}"` gains one
/// leading `$`, so only references ever read as placeholders.
pub fn escape_literal(value: &str) -> String {
    if is_dollar_brace(value) {
        format!("${value}")
    } else {
        value.to_string()
    }
}

/// Reverses [`escape_literal`] once references are gone.
pub fn unescape_literal(value: &str) -> &str {
    match value.strip_prefix('$') {
        Some(rest) if is_dollar_brace(rest) => rest,
        _ => value,
    }
}

fn duplicate(key: &IdentifierToken) -> CompilerError {
    CompilerError::Duplicate {
        name: key.name.clone(),
        span: Some(key.span.into()),
    }
}

/// Turns AST nodes into plain configuration values.
///
/// Without a reference table, bare identifiers compile to `${Name}`
/// placeholders. With one, they compile to the referenced value and an
/// unknown name is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct Compiler<'r> {
    references: Option<&'r Map<String, Value>>,
}

impl<'r> Compiler<'r> {
    pub fn new() -> Self {
        Self { references: None }
    }

    pub fn with_references(references: &'r Map<String, Value>) -> Self {
        Self {
            references: Some(references),
        }
    }

    /// Compiles any declaration to its `(name, value)` pair.
    pub fn declaration(&self, token: &DeclarationToken) -> Result<(String, Value), CompilerError> {
        match token.kind {
            DeclarationKind::Enum => self.enumeration(token),
            DeclarationKind::Prop => self.prop(token),
            DeclarationKind::Type => self.type_definition(token),
            DeclarationKind::Model => self.model(token),
            DeclarationKind::Plugin => self.plugin(token),
        }
    }

    /// `{ KEY value ... }`
    pub fn enumeration(&self, token: &DeclarationToken) -> Result<(String, Value), CompilerError> {
        Self::require(token, DeclarationKind::Enum)?;
        Ok((token.id.name.clone(), self.object(&token.init)?))
    }

    pub fn prop(&self, token: &DeclarationToken) -> Result<(String, Value), CompilerError> {
        Self::require(token, DeclarationKind::Prop)?;
        Ok((token.id.name.clone(), self.object(&token.init)?))
    }

    /// Keyed by the plugin path.
    pub fn plugin(&self, token: &DeclarationToken) -> Result<(String, Value), CompilerError> {
        Self::require(token, DeclarationKind::Plugin)?;
        Ok((token.id.name.clone(), self.object(&token.init)?))
    }

    pub fn type_definition(
        &self,
        token: &DeclarationToken,
    ) -> Result<(String, Value), CompilerError> {
        Self::require(token, DeclarationKind::Type)?;
        Ok((token.id.name.clone(), self.columned(token)?))
    }

    pub fn model(&self, token: &DeclarationToken) -> Result<(String, Value), CompilerError> {
        Self::require(token, DeclarationKind::Model)?;
        Ok((token.id.name.clone(), self.columned(token)?))
    }

    /// The path of a `use` statement.
    pub fn import(&self, node: &AstNode) -> Result<String, CompilerError> {
        match node {
            AstNode::Import(ImportToken {
                source:
                    LiteralToken {
                        value: Literal::String(path),
                        ..
                    },
                ..
            }) => Ok(path.clone()),
            other => Err(CompilerError::InvalidImport {
                span: Some(other.span().into()),
            }),
        }
    }

    /// Folds an import-expanded schema into its configuration, merging
    /// same-named declarations in body order.
    pub fn schema(&self, node: &AstNode) -> Result<SchemaConfig, CompilerError> {
        let schema = match node {
            AstNode::Schema(schema) => schema,
            other => {
                return Err(CompilerError::InvalidSchema {
                    span: Some(other.span().into()),
                })
            }
        };

        self.schema_token(schema)
    }

    /// [`Compiler::schema`] for a root that is already known to be a schema.
    pub fn schema_token(&self, schema: &SchemaToken) -> Result<SchemaConfig, CompilerError> {
        let mut builder = SchemaBuilder::new();
        for node in &schema.body {
            match node {
                AstNode::Declaration(declaration) => {
                    let (name, value) = self.declaration(declaration)?;
                    builder.insert(
                        declaration.kind,
                        name,
                        value,
                        declaration.mutable,
                        Some(declaration.span.into()),
                    )?;
                }
                AstNode::Import(_) => builder.add_import(self.import(node)?),
                AstNode::Schema(nested) => {
                    return Err(CompilerError::InvalidSchema {
                        span: Some(nested.span.into()),
                    })
                }
            }
        }
        Ok(builder.finish())
    }

    pub fn data(&self, token: &DataToken) -> Result<Value, CompilerError> {
        match token {
            DataToken::Literal(literal) => Ok(self.literal(literal)),
            DataToken::Environment(env) => Ok(self.environment(env)),
            DataToken::Object(object) => self.object(object),
            DataToken::Array(array) => self.array(array),
            DataToken::Identifier(identifier) => self.identifier(identifier),
        }
    }

    /// A key repeated within one object is `Duplicate <key>`.
    pub fn object(&self, token: &ObjectToken) -> Result<Value, CompilerError> {
        let mut map = Map::new();
        for property in &token.properties {
            if map.contains_key(&property.key.name) {
                return Err(duplicate(&property.key));
            }
            map.insert(property.key.name.clone(), self.data(&property.value)?);
        }
        Ok(Value::Object(map))
    }

    pub fn array(&self, token: &ArrayToken) -> Result<Value, CompilerError> {
        token
            .elements
            .iter()
            .map(|element| self.data(element))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    pub fn literal(&self, token: &LiteralToken) -> Value {
        match &token.value {
            Literal::String(s) => Value::String(escape_literal(s)),
            Literal::Integer(n) => Value::Number((*n).into()),
            Literal::Float(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Literal::Boolean(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
        }
    }

    pub fn identifier(&self, token: &IdentifierToken) -> Result<Value, CompilerError> {
        match self.references {
            None => Ok(Value::String(placeholder(&token.name))),
            Some(references) => references.get(&token.name).cloned().ok_or_else(|| {
                CompilerError::UnknownReference {
                    name: token.name.clone(),
                    span: Some(token.span.into()),
                }
            }),
        }
    }

    /// An unset variable compiles to an empty string.
    pub fn environment(&self, token: &EnvironmentToken) -> Value {
        #[cfg(feature = "env")]
        let value = std::env::var(&token.name).unwrap_or_default();
        #[cfg(not(feature = "env"))]
        let value = {
            let _ = token;
            String::new()
        };
        Value::String(escape_literal(&value))
    }

    fn require(token: &DeclarationToken, kind: DeclarationKind) -> Result<(), CompilerError> {
        if token.kind == kind {
            Ok(())
        } else {
            Err(CompilerError::InvalidDeclaration {
                kind,
                span: Some(token.span.into()),
            })
        }
    }

    /// `{ name, mutable, attributes, columns: [...] }` for types and models.
    fn columned(&self, token: &DeclarationToken) -> Result<Value, CompilerError> {
        let columns = match token.init.get("columns") {
            Some(DataToken::Object(columns)) => columns,
            _ => {
                return Err(CompilerError::MissingColumns {
                    span: Some(token.span.into()),
                })
            }
        };
        let attributes = self.attributes(token.init.get("attributes"), &token.id)?;

        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(columns.properties.len());
        for column in &columns.properties {
            if !seen.insert(column.key.name.as_str()) {
                return Err(duplicate(&column.key));
            }
            compiled.push(self.column(column)?);
        }

        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(token.id.name.clone()));
        map.insert("mutable".to_string(), Value::Bool(token.mutable));
        map.insert("attributes".to_string(), attributes);
        map.insert("columns".to_string(), Value::Array(compiled));
        Ok(Value::Object(map))
    }

    /// `{ type, name, required, multiple, attributes }`, with `?` and `[]`
    /// lifted off the declared type.
    fn column(&self, property: &PropertyToken) -> Result<Value, CompilerError> {
        let invalid = || CompilerError::InvalidColumn {
            name: property.key.name.clone(),
            span: Some(property.value.span().into()),
        };
        let column = match &property.value {
            DataToken::Object(column) => column,
            _ => return Err(invalid()),
        };
        let declared = match column.get("type") {
            Some(DataToken::Literal(LiteralToken {
                value: Literal::String(declared),
                ..
            })) => declared.as_str(),
            _ => return Err(invalid()),
        };

        let (declared, required) = match declared.strip_suffix('?') {
            Some(rest) => (rest, false),
            None => (declared, true),
        };
        let (declared, multiple) = match declared.strip_suffix("[]") {
            Some(rest) => (rest, true),
            None => (declared, false),
        };

        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(declared.to_string()));
        map.insert("name".to_string(), Value::String(property.key.name.clone()));
        map.insert("required".to_string(), Value::Bool(required));
        map.insert("multiple".to_string(), Value::Bool(multiple));
        map.insert(
            "attributes".to_string(),
            self.attributes(column.get("attributes"), &property.key)?,
        );
        Ok(Value::Object(map))
    }

    fn attributes(
        &self,
        token: Option<&DataToken>,
        owner: &IdentifierToken,
    ) -> Result<Value, CompilerError> {
        match token {
            None => Ok(Value::Object(Map::new())),
            Some(DataToken::Object(object)) => self.object(object),
            Some(_) => Err(CompilerError::InvalidColumn {
                name: owner.name.clone(),
                span: Some(owner.span.into()),
            }),
        }
    }
}
