use crate::ast::*;
use crate::error::IdeaError;
use crate::lexer::TokenType;
use miette::NamedSource;
use std::sync::Arc;

/// A recursive descent parser for `.idea` schemas.
///
/// The cursor is a byte offset into the source and tokens are scanned on
/// demand, so backtracking is just restoring an earlier offset. The shared
/// primitives and the generic data grammar live in `grammar.rs`.
#[derive(Debug)]
pub struct Parser<'a> {
    pub(crate) source: Arc<NamedSource<String>>,
    pub(crate) source_text: &'a str,
    pub(crate) position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "schema.idea".to_string())
    }

    /// `name` is what diagnostics will call the source.
    pub fn new_with_name(source_text: &'a str, name: String) -> Self {
        Self {
            source: Arc::new(NamedSource::new(name, source_text.to_string())),
            source_text,
            position: 0,
        }
    }

    /// Schema ::= { Use | Enum | Prop | Type | Model | Plugin }
    pub fn parse_schema(&mut self) -> Result<SchemaToken, IdeaError> {
        let start = self.position;
        let mut body = Vec::new();

        loop {
            self.skip_noncode();
            let token = self.current();
            let node = match token.ttype {
                TokenType::Eof => break,
                TokenType::Use => AstNode::Import(self.parse_use()?),
                TokenType::Enum => AstNode::Declaration(self.parse_enum()?),
                TokenType::Prop => AstNode::Declaration(self.parse_prop()?),
                TokenType::Type => AstNode::Declaration(self.parse_type()?),
                TokenType::Model => AstNode::Declaration(self.parse_model()?),
                TokenType::Plugin => AstNode::Declaration(self.parse_plugin()?),
                _ => return self.err_unexpected(&token),
            };
            body.push(node);
        }

        Ok(SchemaToken {
            body,
            span: Span::new(start, self.position),
        })
    }

    /// Use ::= "use" String
    pub fn parse_use(&mut self) -> Result<ImportToken, IdeaError> {
        let keyword = self.expect(TokenType::Use)?;
        let source = self.expect_string()?;
        Ok(ImportToken {
            span: Span::new(keyword.pos_start, source.span.end),
            source,
        })
    }

    /// Enum ::= "enum" CapitalIdentifier [ "!" ] "{" { Word Scalar } "}"
    pub fn parse_enum(&mut self) -> Result<DeclarationToken, IdeaError> {
        let keyword = self.expect(TokenType::Enum)?;
        let id = self.expect_capital()?;
        let mutable = self.optional(TokenType::Bang).is_none();

        let open = self.expect(TokenType::LBrace)?;
        let properties = self.repeat(|p| {
            let key = p.expect_word("an enum key")?;
            let value = p.parse_scalar()?;
            Ok(PropertyToken { key, value })
        });
        let close = self.expect(TokenType::RBrace)?;

        log::trace!("parsed enum {}", id.name);
        Ok(DeclarationToken {
            kind: DeclarationKind::Enum,
            mutable,
            id,
            init: ObjectToken {
                properties,
                span: Span::new(open.pos_start, close.pos_end),
            },
            span: Span::new(keyword.pos_start, close.pos_end),
        })
    }

    /// Prop ::= "prop" CapitalIdentifier [ "!" ] Object
    pub fn parse_prop(&mut self) -> Result<DeclarationToken, IdeaError> {
        let keyword = self.expect(TokenType::Prop)?;
        let id = self.expect_capital()?;
        let mutable = self.optional(TokenType::Bang).is_none();
        let init = self.parse_object()?;

        log::trace!("parsed prop {}", id.name);
        Ok(DeclarationToken {
            kind: DeclarationKind::Prop,
            mutable,
            span: Span::new(keyword.pos_start, init.span.end),
            id,
            init,
        })
    }

    /// Type ::= "type" CapitalIdentifier [ "!" ] { Attribute } "{" { Column } "}"
    pub fn parse_type(&mut self) -> Result<DeclarationToken, IdeaError> {
        self.parse_columned(TokenType::Type, DeclarationKind::Type)
    }

    /// Model ::= "model" CapitalIdentifier [ "!" ] { Attribute } "{" { Column } "}"
    pub fn parse_model(&mut self) -> Result<DeclarationToken, IdeaError> {
        self.parse_columned(TokenType::Model, DeclarationKind::Model)
    }

    /// Plugin ::= "plugin" String Object
    pub fn parse_plugin(&mut self) -> Result<DeclarationToken, IdeaError> {
        let keyword = self.expect(TokenType::Plugin)?;
        let path = self.expect_string()?;
        let init = self.parse_object()?;

        let name = match path.value {
            Literal::String(name) => name,
            _ => String::new(),
        };
        log::trace!("parsed plugin {name}");
        Ok(DeclarationToken {
            kind: DeclarationKind::Plugin,
            mutable: true,
            id: IdentifierToken {
                name,
                span: path.span,
            },
            span: Span::new(keyword.pos_start, init.span.end),
            init,
        })
    }

    /// Attribute ::= "@" Word { "." Word } [ "(" { Data } ")" ]
    ///
    /// A bare flag becomes `true`; an argument list becomes an array.
    pub fn parse_attribute(&mut self) -> Result<PropertyToken, IdeaError> {
        let at = self.expect(TokenType::At)?;
        let first = self.expect_word("an attribute name")?;
        let mut name = first.name;
        let mut end = first.span.end;
        while self.optional(TokenType::Dot).is_some() {
            let segment = self.expect_word("an attribute name")?;
            name.push('.');
            name.push_str(&segment.name);
            end = segment.span.end;
        }

        let value = match self.optional(TokenType::LParen) {
            Some(open) => {
                let elements = self.repeat(Self::parse_data);
                let close = self.expect(TokenType::RParen)?;
                DataToken::Array(ArrayToken {
                    elements,
                    span: Span::new(open.pos_start, close.pos_end),
                })
            }
            None => DataToken::Literal(LiteralToken {
                value: Literal::Boolean(true),
                span: Span::new(at.pos_start, end),
            }),
        };

        Ok(PropertyToken {
            key: IdentifierToken {
                name,
                span: Span::new(at.pos_start, end),
            },
            value,
        })
    }

    /// Column ::= Word CapitalIdentifier [ "[" "]" ] [ "?" ] { Attribute }
    ///
    /// Produces `name { type "Type[]?" attributes { ... } }`.
    pub fn parse_column(&mut self) -> Result<PropertyToken, IdeaError> {
        let key = self.expect_word("a column name")?;
        let column_type = self.expect_capital()?;

        let mut type_name = column_type.name;
        let mut type_end = column_type.span.end;
        if self.optional(TokenType::LBracket).is_some() {
            let close = self.expect(TokenType::RBracket)?;
            type_name.push_str("[]");
            type_end = close.pos_end;
        }
        if let Some(question) = self.optional(TokenType::Question) {
            type_name.push('?');
            type_end = question.pos_end;
        }

        let attributes = self.parse_attributes();
        let end = attributes.span.end.max(type_end);
        let type_span = Span::new(column_type.span.start, type_end);

        Ok(PropertyToken {
            value: DataToken::Object(ObjectToken {
                properties: vec![
                    PropertyToken {
                        key: IdentifierToken {
                            name: "type".to_string(),
                            span: type_span,
                        },
                        value: DataToken::Literal(LiteralToken {
                            value: Literal::String(type_name),
                            span: type_span,
                        }),
                    },
                    PropertyToken {
                        key: IdentifierToken {
                            name: "attributes".to_string(),
                            span: attributes.span,
                        },
                        value: DataToken::Object(attributes),
                    },
                ],
                span: Span::new(key.span.start, end),
            }),
            key,
        })
    }

    /// Zero or more attributes, gathered into one object.
    fn parse_attributes(&mut self) -> ObjectToken {
        let start = self.position;
        let properties = self.repeat(Self::parse_attribute);
        let span = match (properties.first(), properties.last()) {
            (Some(first), Some(last)) => Span::new(first.key.span.start, last.value.span().end),
            _ => Span::new(start, start),
        };
        ObjectToken { properties, span }
    }

    fn parse_columned(
        &mut self,
        keyword: TokenType,
        kind: DeclarationKind,
    ) -> Result<DeclarationToken, IdeaError> {
        let keyword = self.expect(keyword)?;
        let id = self.expect_capital()?;
        let mutable = self.optional(TokenType::Bang).is_none();
        let attributes = self.parse_attributes();

        let open = self.expect(TokenType::LBrace)?;
        let columns = self.repeat(Self::parse_column);
        let close = self.expect(TokenType::RBrace)?;
        let columns_span = Span::new(open.pos_start, close.pos_end);

        log::trace!("parsed {} {} with {} columns", kind.section(), id.name, columns.len());
        Ok(DeclarationToken {
            kind,
            mutable,
            init: ObjectToken {
                properties: vec![
                    PropertyToken {
                        key: IdentifierToken {
                            name: "attributes".to_string(),
                            span: attributes.span,
                        },
                        value: DataToken::Object(attributes),
                    },
                    PropertyToken {
                        key: IdentifierToken {
                            name: "columns".to_string(),
                            span: columns_span,
                        },
                        value: DataToken::Object(ObjectToken {
                            properties: columns,
                            span: columns_span,
                        }),
                    },
                ],
                span: Span::new(id.span.start, close.pos_end),
            },
            id,
            span: Span::new(keyword.pos_start, close.pos_end),
        })
    }
}
