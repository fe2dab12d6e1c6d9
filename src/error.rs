use crate::ast::DeclarationKind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum IdeaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compiler(#[from] CompilerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Import(#[from] ImportError),
}

impl IdeaError {
    /// Where in the source the error points, when that is known.
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            IdeaError::Parser(ParserError::Expecting { span, .. })
            | IdeaError::Parser(ParserError::UnexpectedToken { span, .. }) => Some(*span),
            IdeaError::Compiler(err) => err.span(),
            IdeaError::Import(ImportError::NotFound { span, .. })
            | IdeaError::Import(ImportError::Circular { span, .. }) => *span,
        }
    }

    /// 1-based line and column of [`IdeaError::span`] within `source`.
    pub fn location(&self, source: &str) -> Option<(usize, usize)> {
        self.span()
            .map(|span| crate::utils::get_line_and_column(source, span.offset()))
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("Expecting {expected}, got {found}")]
    #[diagnostic(
        code(idea::parser::expecting),
        help("The schema ended or continued with something the grammar does not allow here.")
    )]
    Expecting {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected} here")]
        span: SourceSpan,
        expected: String,
        found: String,
    },

    #[error("Unexpected token {found}")]
    #[diagnostic(
        code(idea::parser::unexpected_token),
        help("A schema is a sequence of `use` statements and enum, prop, type, model or plugin declarations.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("This does not start a declaration")]
        span: SourceSpan,
        found: String,
    },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Invalid Schema")]
    #[diagnostic(code(idea::compiler::invalid_schema))]
    InvalidSchema {
        #[label("Expected a schema here")]
        span: Option<SourceSpan>,
    },

    #[error("Invalid {kind}")]
    #[diagnostic(
        code(idea::compiler::invalid_declaration),
        help("The declaration was handed to the compiler for a different kind.")
    )]
    InvalidDeclaration {
        kind: DeclarationKind,
        #[label("Not a {kind} declaration")]
        span: Option<SourceSpan>,
    },

    #[error("Invalid Import")]
    #[diagnostic(code(idea::compiler::invalid_import))]
    InvalidImport {
        #[label("Expected a `use` statement with a string path")]
        span: Option<SourceSpan>,
    },

    #[error("Invalid Column {name}")]
    #[diagnostic(
        code(idea::compiler::invalid_column),
        help("A column needs a string `type` and an optional `attributes` object.")
    )]
    InvalidColumn {
        name: String,
        #[label("Malformed column")]
        span: Option<SourceSpan>,
    },

    #[error("Expecting a columns property")]
    #[diagnostic(
        code(idea::compiler::missing_columns),
        help("Types and models must declare their columns between braces.")
    )]
    MissingColumns {
        #[label("This declaration has no columns")]
        span: Option<SourceSpan>,
    },

    #[error("Unknown reference {name}")]
    #[diagnostic(
        code(idea::compiler::unknown_reference),
        help("References must name a prop, enum or type declared in the schema or its imports.")
    )]
    UnknownReference {
        name: String,
        #[label("Referenced here")]
        span: Option<SourceSpan>,
    },

    #[error("Duplicate {name}")]
    #[diagnostic(
        code(idea::compiler::duplicate),
        help("Mark one declaration with `!` to replace the other, or remove the conflicting definition.")
    )]
    Duplicate {
        name: String,
        #[label("Conflicting declaration")]
        span: Option<SourceSpan>,
    },

    #[error("Circular reference {cycle}")]
    #[diagnostic(code(idea::compiler::circular_reference))]
    CircularReference {
        cycle: String,
        #[label("Reference cycle starts here")]
        span: Option<SourceSpan>,
    },
}

impl CompilerError {
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            CompilerError::InvalidSchema { span }
            | CompilerError::InvalidDeclaration { span, .. }
            | CompilerError::InvalidImport { span }
            | CompilerError::InvalidColumn { span, .. }
            | CompilerError::MissingColumns { span }
            | CompilerError::UnknownReference { span, .. }
            | CompilerError::Duplicate { span, .. }
            | CompilerError::CircularReference { span, .. } => *span,
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ImportError {
    #[error("Unknown import {path}")]
    #[diagnostic(
        code(idea::import::not_found),
        help("The loader did not supply source text for this path.")
    )]
    NotFound {
        path: String,
        #[label("Imported here")]
        span: Option<SourceSpan>,
    },

    #[error("Circular import {cycle}")]
    #[diagnostic(code(idea::import::circular))]
    Circular {
        cycle: String,
        #[label("Imported here")]
        span: Option<SourceSpan>,
    },
}
