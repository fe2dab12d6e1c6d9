//! Backtracking primitives and the generic data grammar shared by every
//! declaration parser.

use crate::ast::*;
use crate::error::{IdeaError, ParserError};
use crate::lexer::{scan, Token, TokenType};
use crate::parser::Parser;

impl Parser<'_> {
    // === Primitives ===

    /// The token at the cursor, without skipping anything.
    pub(crate) fn current(&self) -> Token {
        scan(self.source_text, self.position)
    }

    /// Consumes whitespace and comments.
    pub fn skip_noncode(&mut self) {
        loop {
            let token = self.current();
            if !token.ttype.is_noncode() {
                break;
            }
            self.position = token.pos_end;
        }
    }

    /// Whether the next significant token has the kind of `ttype`. Never moves the cursor.
    pub fn check(&self, ttype: &TokenType) -> bool {
        let mut offset = self.position;
        loop {
            let token = scan(self.source_text, offset);
            if !token.ttype.is_noncode() {
                return token.ttype.same_kind(ttype);
            }
            offset = token.pos_end;
        }
    }

    /// Consumes a token of the given kind or fails with `Expecting <kind>, got <found>`.
    pub fn expect(&mut self, ttype: TokenType) -> Result<Token, IdeaError> {
        self.skip_noncode();
        let token = self.current();
        if token.ttype.same_kind(&ttype) {
            self.position = token.pos_end;
            Ok(token)
        } else {
            self.err_expecting(&ttype.to_string(), &token)
        }
    }

    /// Like [`Parser::expect`], but leaves the cursor untouched and returns
    /// `None` when the token is absent.
    pub fn optional(&mut self, ttype: TokenType) -> Option<Token> {
        let saved = self.position;
        match self.expect(ttype) {
            Ok(token) => Some(token),
            Err(_) => {
                self.position = saved;
                None
            }
        }
    }

    /// Runs `step` until it fails, rolling the cursor back to before the
    /// failed attempt. Returns whatever matched.
    pub fn repeat<T>(
        &mut self,
        mut step: impl FnMut(&mut Self) -> Result<T, IdeaError>,
    ) -> Vec<T> {
        let mut matches = Vec::new();
        loop {
            let saved = self.position;
            match step(self) {
                Ok(value) => {
                    matches.push(value);
                    // a step that consumed nothing would loop forever
                    if self.position == saved {
                        break;
                    }
                }
                Err(_) => {
                    self.position = saved;
                    break;
                }
            }
        }
        matches
    }

    /// A word used as a name or key. Keywords count, so `type` can be a column.
    pub fn expect_word(&mut self, what: &str) -> Result<IdentifierToken, IdeaError> {
        self.skip_noncode();
        let token = self.current();
        if token.ttype.is_word() {
            self.position = token.pos_end;
            Ok(IdentifierToken {
                name: token.text(self.source_text).to_string(),
                span: Span::new(token.pos_start, token.pos_end),
            })
        } else {
            self.err_expecting(what, &token)
        }
    }

    pub fn expect_capital(&mut self) -> Result<IdentifierToken, IdeaError> {
        let token = self.expect(TokenType::CapitalIdentifier(String::new()))?;
        let name = match token.ttype {
            TokenType::CapitalIdentifier(name) => name,
            _ => String::new(),
        };
        Ok(IdentifierToken {
            name,
            span: Span::new(token.pos_start, token.pos_end),
        })
    }

    pub fn expect_string(&mut self) -> Result<LiteralToken, IdeaError> {
        let token = self.expect(TokenType::String(String::new()))?;
        let value = match token.ttype {
            TokenType::String(value) => value,
            _ => String::new(),
        };
        Ok(LiteralToken {
            value: Literal::String(value),
            span: Span::new(token.pos_start, token.pos_end),
        })
    }

    // === Data Grammar ===

    /// Data ::= Object | Array | Environment | Literal | CapitalIdentifier
    pub fn parse_data(&mut self) -> Result<DataToken, IdeaError> {
        self.skip_noncode();
        let token = self.current();
        match &token.ttype {
            TokenType::LBrace => self.parse_object().map(DataToken::Object),
            TokenType::LBracket => self.parse_array().map(DataToken::Array),
            TokenType::Identifier(name) if name == "env" => {
                self.parse_environment().map(DataToken::Environment)
            }
            TokenType::CapitalIdentifier(name) => {
                self.position = token.pos_end;
                Ok(DataToken::Identifier(IdentifierToken {
                    name: name.clone(),
                    span: Span::new(token.pos_start, token.pos_end),
                }))
            }
            _ => self.parse_scalar(),
        }
    }

    /// Scalar ::= String | Number | Boolean | "null"
    pub fn parse_scalar(&mut self) -> Result<DataToken, IdeaError> {
        self.skip_noncode();
        let token = self.current();
        let value = match &token.ttype {
            TokenType::String(s) => Literal::String(s.clone()),
            TokenType::Integer(n) => Literal::Integer(*n),
            TokenType::Float(n) => Literal::Float(*n),
            TokenType::True => Literal::Boolean(true),
            TokenType::False => Literal::Boolean(false),
            TokenType::Null => Literal::Null,
            _ => return self.err_expecting("a value", &token),
        };
        self.position = token.pos_end;
        Ok(DataToken::Literal(LiteralToken {
            value,
            span: Span::new(token.pos_start, token.pos_end),
        }))
    }

    /// Object ::= "{" { Word Data } "}"
    pub fn parse_object(&mut self) -> Result<ObjectToken, IdeaError> {
        let open = self.expect(TokenType::LBrace)?;
        let properties = self.repeat(|p| {
            let key = p.expect_word("a property key")?;
            let value = p.parse_data()?;
            Ok(PropertyToken { key, value })
        });
        let close = self.expect(TokenType::RBrace)?;
        Ok(ObjectToken {
            properties,
            span: Span::new(open.pos_start, close.pos_end),
        })
    }

    /// Array ::= "[" { Data } "]"
    pub fn parse_array(&mut self) -> Result<ArrayToken, IdeaError> {
        let open = self.expect(TokenType::LBracket)?;
        let elements = self.repeat(Self::parse_data);
        let close = self.expect(TokenType::RBracket)?;
        Ok(ArrayToken {
            elements,
            span: Span::new(open.pos_start, close.pos_end),
        })
    }

    /// Environment ::= "env" "(" String ")"
    fn parse_environment(&mut self) -> Result<EnvironmentToken, IdeaError> {
        let keyword = self.expect(TokenType::Identifier(String::new()))?;
        self.expect(TokenType::LParen)?;
        let name = self.expect_string()?;
        let close = self.expect(TokenType::RParen)?;
        Ok(EnvironmentToken {
            name: match name.value {
                Literal::String(name) => name,
                _ => String::new(),
            },
            span: Span::new(keyword.pos_start, close.pos_end),
        })
    }

    // === Errors ===

    fn err_expecting<T>(&self, expected: &str, token: &Token) -> Result<T, IdeaError> {
        Err(ParserError::Expecting {
            src: (*self.source).clone(),
            span: (token.pos_start, token.pos_end - token.pos_start).into(),
            expected: expected.to_string(),
            found: describe(token, self.source_text),
        }
        .into())
    }

    pub(crate) fn err_unexpected<T>(&self, token: &Token) -> Result<T, IdeaError> {
        Err(ParserError::UnexpectedToken {
            src: (*self.source).clone(),
            span: (token.pos_start, token.pos_end - token.pos_start).into(),
            found: describe(token, self.source_text),
        }
        .into())
    }
}

/// How a found token reads in an error message.
fn describe(token: &Token, source: &str) -> String {
    match token.ttype {
        TokenType::Eof => "end of input".to_string(),
        _ => token.text(source).to_string(),
    }
}
