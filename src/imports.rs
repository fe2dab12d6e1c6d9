//! Splices the declarations of `use`d sources into a schema, in the order the
//! `use` statements appear. Reading files is the loader's job: it hands over
//! the raw text of every path as an [`ImportSources`] table.

use crate::ast::{AstNode, ImportToken, Literal, SchemaToken};
use crate::error::{CompilerError, IdeaError, ImportError};
use crate::parser::Parser;
use std::collections::{HashMap, HashSet};

/// Raw schema text keyed by the path used in `use "<path>"`.
#[derive(Debug, Clone, Default)]
pub struct ImportSources {
    sources: HashMap<String, String>,
}

impl ImportSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.sources.insert(path.into(), text.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.sources.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<P: Into<String>, T: Into<String>> FromIterator<(P, T)> for ImportSources {
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let mut sources = Self::new();
        for (path, text) in iter {
            sources.insert(path, text);
        }
        sources
    }
}

/// Replaces each `use` statement with itself followed by the imported
/// declarations, recursively. A source already spliced in is not repeated.
pub fn expand_imports(
    schema: SchemaToken,
    sources: &ImportSources,
) -> Result<SchemaToken, IdeaError> {
    let mut expander = Expander {
        sources,
        resolving_stack: Vec::new(),
        expanded: HashSet::new(),
    };
    let span = schema.span;
    let body = expander.expand(schema)?;
    Ok(SchemaToken { body, span })
}

struct Expander<'s> {
    sources: &'s ImportSources,
    // Paths being expanded, to detect circular imports
    resolving_stack: Vec<String>,
    expanded: HashSet<String>,
}

impl Expander<'_> {
    fn expand(&mut self, schema: SchemaToken) -> Result<Vec<AstNode>, IdeaError> {
        let mut body = Vec::with_capacity(schema.body.len());
        for node in schema.body {
            match node {
                AstNode::Import(import) => {
                    let imported = self.expand_import(&import)?;
                    body.push(AstNode::Import(import));
                    body.extend(imported);
                }
                other => body.push(other),
            }
        }
        Ok(body)
    }

    fn expand_import(&mut self, import: &ImportToken) -> Result<Vec<AstNode>, IdeaError> {
        let path = match &import.source.value {
            Literal::String(path) => path.clone(),
            _ => {
                return Err(CompilerError::InvalidImport {
                    span: Some(import.span.into()),
                }
                .into())
            }
        };

        if self.resolving_stack.contains(&path) {
            let cycle = self.resolving_stack.join(" -> ");
            return Err(ImportError::Circular {
                cycle: format!("{cycle} -> {path}"),
                span: Some(import.span.into()),
            }
            .into());
        }
        if self.expanded.contains(&path) {
            log::debug!("{path} already imported");
            return Ok(Vec::new());
        }

        let text = self.sources.get(&path).ok_or_else(|| ImportError::NotFound {
            path: path.clone(),
            span: Some(import.span.into()),
        })?;
        log::debug!("importing {path}");

        let schema = Parser::new_with_name(text, path.clone()).parse_schema()?;
        self.resolving_stack.push(path.clone());
        let body = self.expand(schema);
        self.resolving_stack.pop();

        self.expanded.insert(path);
        body
    }
}
