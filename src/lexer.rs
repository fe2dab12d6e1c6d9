use std::fmt::{self, Display};

/// The kinds of tokens the scanner recognizes in `.idea` source.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // == Special Tokens ==
    /// Represents the end of the input.
    Eof,
    /// A run of whitespace characters (spaces, tabs, newlines).
    Whitespace,
    /// A line comment, starting with `//` and continuing to the end of the line.
    Comment(String),
    /// A block comment, `/* ... */`.
    BlockComment(String),
    /// Anything the scanner could not classify, including unterminated strings.
    Unknown,

    // == Literals ==
    /// A lowercase-led name: column names, object keys, attribute segments.
    Identifier(String),
    /// An uppercase-led name: declaration names, column types, references.
    CapitalIdentifier(String),
    /// A double quoted string with escapes already decoded.
    String(String),
    Integer(i64),
    Float(f64),

    // == Keywords ==
    True,
    False,
    Null,
    Enum,
    Prop,
    Type,
    Model,
    Plugin,
    Use,

    // == Punctuation ==
    /// Left Brace: `{`
    LBrace,
    /// Right Brace: `}`
    RBrace,
    /// Left Bracket: `[`
    LBracket,
    /// Right Bracket: `]`
    RBracket,
    /// Left Parenthesis: `(`
    LParen,
    /// Right Parenthesis: `)`
    RParen,
    /// Bang: `!` (marks a declaration as non-mergeable)
    Bang,
    /// At: `@` (starts an attribute)
    At,
    /// Dot: `.` (separates attribute name segments)
    Dot,
    /// Question: `?` (marks a column as optional)
    Question,
}

impl TokenType {
    /// Whitespace and comments, which the grammar skips between significant tokens.
    pub fn is_noncode(&self) -> bool {
        matches!(
            self,
            TokenType::Whitespace | TokenType::Comment(_) | TokenType::BlockComment(_)
        )
    }

    /// Tokens that read as a bare word and may therefore be used as a key.
    /// Keywords qualify so that `type "text"` works inside an object.
    pub fn is_word(&self) -> bool {
        matches!(
            self,
            TokenType::Identifier(_)
                | TokenType::CapitalIdentifier(_)
                | TokenType::True
                | TokenType::False
                | TokenType::Null
                | TokenType::Enum
                | TokenType::Prop
                | TokenType::Type
                | TokenType::Model
                | TokenType::Plugin
                | TokenType::Use
        )
    }

    /// Compares token kinds while ignoring any carried value.
    pub fn same_kind(&self, other: &TokenType) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Eof => "end of input",
            TokenType::Whitespace => "whitespace",
            TokenType::Comment(_) | TokenType::BlockComment(_) => "comment",
            TokenType::Unknown => "unknown token",
            TokenType::Identifier(_) => "Identifier",
            TokenType::CapitalIdentifier(_) => "CapitalIdentifier",
            TokenType::String(_) => "String",
            TokenType::Integer(_) | TokenType::Float(_) => "Number",
            TokenType::True | TokenType::False => "Boolean",
            TokenType::Null => "null",
            TokenType::Enum => "enum",
            TokenType::Prop => "prop",
            TokenType::Type => "type",
            TokenType::Model => "model",
            TokenType::Plugin => "plugin",
            TokenType::Use => "use",
            TokenType::LBrace => "{",
            TokenType::RBrace => "}",
            TokenType::LBracket => "[",
            TokenType::RBracket => "]",
            TokenType::LParen => "(",
            TokenType::RParen => ")",
            TokenType::Bang => "!",
            TokenType::At => "@",
            TokenType::Dot => ".",
            TokenType::Question => "?",
        };
        f.write_str(name)
    }
}

/// A token with its type and byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub ttype: TokenType,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl Token {
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize) -> Token {
        Token {
            ttype,
            pos_start,
            pos_end,
        }
    }

    /// The raw source text this token was read from.
    pub fn text<'s>(&self, input: &'s str) -> &'s str {
        input.get(self.pos_start..self.pos_end).unwrap_or("")
    }
}

/// Reads the single token that starts at `offset`.
///
/// The scanner keeps no state beyond `(input, offset)`, so a caller backtracks
/// by scanning again from an earlier offset.
pub fn scan(input: &str, offset: usize) -> Token {
    Lexer::at(input, offset).next_token()
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::at(input, 0)
    }

    /// Starts scanning at a byte offset. An offset past the end, or inside a
    /// multi-byte character, behaves like end of input.
    pub fn at(input: &'a str, offset: usize) -> Self {
        let position = offset.min(input.len());
        let rest = input.get(position..).unwrap_or("");
        Self {
            input,
            chars: rest.chars().peekable(),
            position,
        }
    }

    /// Scans every token through to (and including) `Eof`.
    pub fn lex(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if token.ttype == TokenType::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    pub fn next_token(&mut self) -> Token {
        let start_pos = self.position;

        let ttype = if let Some(char) = self.advance() {
            match char {
                '{' => TokenType::LBrace,
                '}' => TokenType::RBrace,
                '[' => TokenType::LBracket,
                ']' => TokenType::RBracket,
                '(' => TokenType::LParen,
                ')' => TokenType::RParen,
                '!' => TokenType::Bang,
                '@' => TokenType::At,
                '.' => TokenType::Dot,
                '?' => TokenType::Question,
                '/' => match self.peek() {
                    Some('/') => self.read_comment(),
                    Some('*') => self.read_block_comment(),
                    _ => TokenType::Unknown,
                },
                '"' => self.read_string(),
                c if c.is_whitespace() => self.read_whitespace(),
                c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier(c),
                c if c.is_ascii_digit()
                    || (c == '-' && self.peek().is_some_and(|c| c.is_ascii_digit())) =>
                {
                    self.read_number(c)
                }

                _ => TokenType::Unknown,
            }
        } else {
            TokenType::Eof
        };

        Token::new(ttype, start_pos, self.position)
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.position += c.len_utf8();
        }
        char
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// The character after the one `peek` would return.
    fn peek_second(&self) -> Option<char> {
        let mut rest = self.input.get(self.position..)?.chars();
        rest.next();
        rest.next()
    }

    fn read_whitespace(&mut self) -> TokenType {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
        TokenType::Whitespace
    }

    fn read_comment(&mut self) -> TokenType {
        self.advance(); // the second '/'
        let mut comment_text = String::new();
        while let Some(&c) = self.peek() {
            if c == '\n' {
                break;
            }
            comment_text.push(c);
            self.advance();
        }
        TokenType::Comment(comment_text.trim().to_string())
    }

    fn read_block_comment(&mut self) -> TokenType {
        self.advance(); // the '*'
        let mut comment_text = String::new();
        while let Some(c) = self.advance() {
            if c == '*' && self.peek() == Some(&'/') {
                self.advance();
                return TokenType::BlockComment(comment_text.trim().to_string());
            }
            comment_text.push(c);
        }
        TokenType::Unknown // unterminated
    }

    fn read_string(&mut self) -> TokenType {
        let mut value = String::new();
        while let Some(c) = self.advance() {
            match c {
                '"' => return TokenType::String(value),
                '\\' => match self.advance() {
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return TokenType::Unknown,
                },
                _ => value.push(c),
            }
        }
        TokenType::Unknown // unterminated
    }

    fn read_identifier(&mut self, first_char: char) -> TokenType {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(&c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "true" => TokenType::True,
            "false" => TokenType::False,
            "null" => TokenType::Null,
            "enum" => TokenType::Enum,
            "prop" => TokenType::Prop,
            "type" => TokenType::Type,
            "model" => TokenType::Model,
            "plugin" => TokenType::Plugin,
            "use" => TokenType::Use,
            _ if first_char.is_ascii_uppercase() => TokenType::CapitalIdentifier(ident),
            _ => TokenType::Identifier(ident),
        }
    }

    fn read_number(&mut self, first_char: char) -> TokenType {
        let mut number_str = String::new();
        number_str.push(first_char);
        self.read_digits(&mut number_str);

        // A fraction needs at least one digit after the dot.
        let is_float = self.peek() == Some(&'.')
            && self.peek_second().is_some_and(|c| c.is_ascii_digit());
        if is_float {
            number_str.push('.');
            self.advance();
            self.read_digits(&mut number_str);
            return number_str
                .parse::<f64>()
                .map_or(TokenType::Unknown, TokenType::Float);
        }

        match number_str.parse::<i64>() {
            Ok(num) => TokenType::Integer(num),
            Err(_) => number_str
                .parse::<f64>()
                .map_or(TokenType::Unknown, TokenType::Float),
        }
    }

    fn read_digits(&mut self, into: &mut String) {
        while let Some(&c) = self.peek() {
            if c.is_ascii_digit() {
                into.push(c);
                self.advance();
            } else {
                break;
            }
        }
    }
}
