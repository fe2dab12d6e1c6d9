use miette::SourceSpan;
use std::fmt::{self, Display};

/// Byte offsets `[start, end)` into the source a node was parsed from.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.len()).into()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct IdentifierToken {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

#[derive(Debug, PartialEq, Clone)]
pub struct LiteralToken {
    pub value: Literal,
    pub span: Span,
}

/// `env("NAME")`, looked up when the value is compiled.
#[derive(Debug, PartialEq, Clone)]
pub struct EnvironmentToken {
    pub name: String,
    pub span: Span,
}

/// `{ key value ... }`. Keys may repeat; uniqueness is checked by the compiler.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ObjectToken {
    pub properties: Vec<PropertyToken>,
    pub span: Span,
}

impl ObjectToken {
    /// The first property named `key`.
    pub fn get(&self, key: &str) -> Option<&DataToken> {
        self.properties
            .iter()
            .find(|property| property.key.name == key)
            .map(|property| &property.value)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ArrayToken {
    pub elements: Vec<DataToken>,
    pub span: Span,
}

/// Any value the generic data grammar produces.
#[derive(Debug, PartialEq, Clone)]
pub enum DataToken {
    Literal(LiteralToken),
    Environment(EnvironmentToken),
    Object(ObjectToken),
    Array(ArrayToken),
    /// A bare reference to another declaration, e.g. `Text` in `@field.input(Text)`.
    Identifier(IdentifierToken),
}

impl DataToken {
    pub fn span(&self) -> Span {
        match self {
            DataToken::Literal(token) => token.span,
            DataToken::Environment(token) => token.span,
            DataToken::Object(token) => token.span,
            DataToken::Array(token) => token.span,
            DataToken::Identifier(token) => token.span,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct PropertyToken {
    pub key: IdentifierToken,
    pub value: DataToken,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum DeclarationKind {
    Enum,
    Prop,
    Type,
    Model,
    Plugin,
}

impl DeclarationKind {
    /// The top-level configuration key this kind compiles into.
    pub fn section(&self) -> &'static str {
        match self {
            DeclarationKind::Enum => "enum",
            DeclarationKind::Prop => "prop",
            DeclarationKind::Type => "type",
            DeclarationKind::Model => "model",
            DeclarationKind::Plugin => "plugin",
        }
    }
}

impl Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeclarationKind::Enum => "Enum",
            DeclarationKind::Prop => "Prop",
            DeclarationKind::Type => "Type",
            DeclarationKind::Model => "Model",
            DeclarationKind::Plugin => "Plugin",
        };
        f.write_str(name)
    }
}

/// One `enum`, `prop`, `type`, `model` or `plugin` statement.
///
/// `init` depends on `kind`: enums hold `KEY value` pairs, props and plugins
/// hold their generic object, and types and models hold an `attributes`
/// object plus a `columns` object whose entries look like
/// `{ type "String[]?" attributes { ... } }`.
#[derive(Debug, PartialEq, Clone)]
pub struct DeclarationToken {
    pub kind: DeclarationKind,
    /// `false` when the name carries the `!` suffix.
    pub mutable: bool,
    /// The declared name. For plugins this is the plugin path.
    pub id: IdentifierToken,
    pub init: ObjectToken,
    pub span: Span,
}

/// `use "<path>"`
#[derive(Debug, PartialEq, Clone)]
pub struct ImportToken {
    pub source: LiteralToken,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct SchemaToken {
    pub body: Vec<AstNode>,
    pub span: Span,
}

impl SchemaToken {
    pub fn declarations(&self) -> impl Iterator<Item = &DeclarationToken> {
        self.body.iter().filter_map(|node| match node {
            AstNode::Declaration(declaration) => Some(declaration),
            _ => None,
        })
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportToken> {
        self.body.iter().filter_map(|node| match node {
            AstNode::Import(import) => Some(import),
            _ => None,
        })
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum AstNode {
    Schema(SchemaToken),
    Declaration(DeclarationToken),
    Import(ImportToken),
}

impl AstNode {
    pub fn span(&self) -> Span {
        match self {
            AstNode::Schema(token) => token.span,
            AstNode::Declaration(token) => token.span,
            AstNode::Import(token) => token.span,
        }
    }
}
