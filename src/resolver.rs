use crate::compiler::{reference_name, unescape_literal};
use crate::error::CompilerError;
use crate::serialization::{FinalSchemaConfig, SchemaConfig};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Inlines `${Name}` placeholders and drops the `prop` and `use` sections.
/// Escaped string literals (`$${...}`) lose their escape.
pub fn resolve_final(config: &SchemaConfig) -> Result<FinalSchemaConfig, CompilerError> {
    let mut resolver = Resolver::new(config);

    let mut types = Map::new();
    for (name, value) in &config.types {
        types.insert(name.clone(), resolver.resolve_columned(value)?);
    }
    let mut models = Map::new();
    for (name, value) in &config.models {
        models.insert(name.clone(), resolver.resolve_columned(value)?);
    }
    let mut enums = Map::new();
    for (name, value) in &config.enums {
        enums.insert(name.clone(), resolver.substitute(value)?);
    }
    let mut plugins = Map::new();
    for (name, value) in &config.plugins {
        plugins.insert(name.clone(), resolver.substitute(value)?);
    }

    Ok(FinalSchemaConfig {
        plugins,
        enums,
        types,
        models,
    })
}

/// Where a reference name points. Props shadow enums, which shadow types.
#[derive(Debug, Clone, Copy)]
enum Target {
    Prop,
    Enum,
    Type,
}

struct Resolver<'c> {
    config: &'c SchemaConfig,
    // Names whose values are being resolved, to detect reference cycles
    resolving_stack: Vec<String>,
    resolved: HashMap<String, Value>,
}

impl<'c> Resolver<'c> {
    fn new(config: &'c SchemaConfig) -> Self {
        Resolver {
            config,
            resolving_stack: Vec::new(),
            resolved: HashMap::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<(Target, &'c Value)> {
        let config = self.config;
        config
            .props
            .get(name)
            .map(|value| (Target::Prop, value))
            .or_else(|| config.enums.get(name).map(|value| (Target::Enum, value)))
            .or_else(|| config.types.get(name).map(|value| (Target::Type, value)))
    }

    /// Substitutes inside the declaration attributes and each column's attributes.
    fn resolve_columned(&mut self, value: &Value) -> Result<Value, CompilerError> {
        let mut value = value.clone();
        if let Some(attributes) = value.get_mut("attributes") {
            *attributes = self.substitute(attributes)?;
        }
        if let Some(Value::Array(columns)) = value.get_mut("columns") {
            for column in columns {
                if let Some(attributes) = column.get_mut("attributes") {
                    *attributes = self.substitute(attributes)?;
                }
            }
        }
        Ok(value)
    }

    /// Replaces every placeholder string in `value` with its resolved target.
    fn substitute(&mut self, value: &Value) -> Result<Value, CompilerError> {
        match value {
            Value::String(s) => match reference_name(s) {
                Some(name) => self.resolve_reference(name),
                None => Ok(Value::String(unescape_literal(s).to_string())),
            },
            Value::Array(elements) => elements
                .iter()
                .map(|element| self.substitute(element))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut resolved = Map::new();
                for (key, value) in map {
                    resolved.insert(key.clone(), self.substitute(value)?);
                }
                Ok(Value::Object(resolved))
            }
            _ => Ok(value.clone()),
        }
    }

    fn resolve_reference(&mut self, name: &str) -> Result<Value, CompilerError> {
        if let Some(value) = self.resolved.get(name) {
            return Ok(value.clone());
        }
        if self.resolving_stack.iter().any(|n| n == name) {
            let cycle = self.resolving_stack.join(" -> ");
            return Err(CompilerError::CircularReference {
                cycle: format!("{cycle} -> {name}"),
                span: None,
            });
        }

        let (target, raw) = self
            .lookup(name)
            .ok_or_else(|| CompilerError::UnknownReference {
                name: name.to_string(),
                span: None,
            })?;
        log::trace!("resolving reference {name} ({target:?})");

        self.resolving_stack.push(name.to_string());
        let value = match target {
            Target::Prop | Target::Enum => self.substitute(raw),
            Target::Type => self.resolve_columned(raw),
        };
        self.resolving_stack.pop();

        let value = value?;
        self.resolved.insert(name.to_string(), value.clone());
        Ok(value)
    }
}
