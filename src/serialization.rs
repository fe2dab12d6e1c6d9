use crate::ast::DeclarationKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The output of `parse`: every section, with props and `${Name}`
/// reference placeholders still present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(rename = "plugin", default, skip_serializing_if = "Map::is_empty")]
    pub plugins: Map<String, Value>,
    /// `use` paths in first-seen order.
    #[serde(rename = "use", default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(rename = "prop", default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Map::is_empty")]
    pub enums: Map<String, Value>,
    #[serde(rename = "type", default, skip_serializing_if = "Map::is_empty")]
    pub types: Map<String, Value>,
    #[serde(rename = "model", default, skip_serializing_if = "Map::is_empty")]
    pub models: Map<String, Value>,
}

impl SchemaConfig {
    pub fn section(&self, kind: DeclarationKind) -> &Map<String, Value> {
        match kind {
            DeclarationKind::Enum => &self.enums,
            DeclarationKind::Prop => &self.props,
            DeclarationKind::Type => &self.types,
            DeclarationKind::Model => &self.models,
            DeclarationKind::Plugin => &self.plugins,
        }
    }

    pub fn section_mut(&mut self, kind: DeclarationKind) -> &mut Map<String, Value> {
        match kind {
            DeclarationKind::Enum => &mut self.enums,
            DeclarationKind::Prop => &mut self.props,
            DeclarationKind::Type => &mut self.types,
            DeclarationKind::Model => &mut self.models,
            DeclarationKind::Plugin => &mut self.plugins,
        }
    }

    /// The configuration as one JSON object, empty sections left out.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        insert_section(&mut root, "plugin", &self.plugins);
        if !self.imports.is_empty() {
            let paths = self.imports.iter().cloned().map(Value::String).collect();
            root.insert("use".to_string(), Value::Array(paths));
        }
        insert_section(&mut root, "prop", &self.props);
        insert_section(&mut root, "enum", &self.enums);
        insert_section(&mut root, "type", &self.types);
        insert_section(&mut root, "model", &self.models);
        Value::Object(root)
    }
}

/// The output of `final`: no props, no `use` list, no placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalSchemaConfig {
    #[serde(rename = "plugin", default, skip_serializing_if = "Map::is_empty")]
    pub plugins: Map<String, Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Map::is_empty")]
    pub enums: Map<String, Value>,
    #[serde(rename = "type", default, skip_serializing_if = "Map::is_empty")]
    pub types: Map<String, Value>,
    #[serde(rename = "model", default, skip_serializing_if = "Map::is_empty")]
    pub models: Map<String, Value>,
}

impl FinalSchemaConfig {
    #[must_use]
    pub fn to_value(&self) -> Value {
        SchemaConfig::from(self.clone()).to_value()
    }
}

impl From<FinalSchemaConfig> for SchemaConfig {
    fn from(config: FinalSchemaConfig) -> Self {
        SchemaConfig {
            plugins: config.plugins,
            imports: Vec::new(),
            props: Map::new(),
            enums: config.enums,
            types: config.types,
            models: config.models,
        }
    }
}

fn insert_section(root: &mut Map<String, Value>, key: &str, section: &Map<String, Value>) {
    if !section.is_empty() {
        root.insert(key.to_string(), Value::Object(section.clone()));
    }
}
