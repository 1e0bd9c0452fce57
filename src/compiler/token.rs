use std::{fmt::Display, rc::Rc};

use crate::common::{source::Source, span::Span};

/// Every kind of token the lexer can produce.
/// Tokens don't carry any data of their own;
/// the text they stand for is recovered from the source
/// through the token's offset and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, proptest_derive::Arbitrary)]
pub enum TokenType {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Semicolon,
    Colon,
    Minus,
    Plus,
    Star,
    Slash,

    // One or two character tokens.
    Bang,
    BangEq,
    Equal,
    EqualEq,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Ellipsis,

    // Digraphs.
    And,
    Or,

    // Keywords.
    Case,
    Class,
    Const,
    Default,
    Else,
    Enum,
    Export,
    False,
    For,
    Func,
    If,
    Import,
    Nil,
    Return,
    Static,
    Switch,
    True,
    Var,

    // Literals.
    Ident,
    String,
    Char,
    Number,

    /// Marks the end of the source.
    End,
}

/// Reserved words, checked in order before falling back to an identifier.
pub const KEYWORDS: [(&str, TokenType); 18] = [
    ("case", TokenType::Case),
    ("class", TokenType::Class),
    ("const", TokenType::Const),
    ("default", TokenType::Default),
    ("else", TokenType::Else),
    ("enum", TokenType::Enum),
    ("export", TokenType::Export),
    ("false", TokenType::False),
    ("for", TokenType::For),
    ("func", TokenType::Func),
    ("if", TokenType::If),
    ("import", TokenType::Import),
    ("nil", TokenType::Nil),
    ("return", TokenType::Return),
    ("static", TokenType::Static),
    ("switch", TokenType::Switch),
    ("true", TokenType::True),
    ("var", TokenType::Var),
];

impl TokenType {
    /// The fixed spelling of punctuation, operators and keywords.
    /// Literals and `End` have none.
    pub fn lexeme(&self) -> Option<&'static str> {
        use TokenType::*;
        let fixed = match self {
            LeftParen => "(",
            RightParen => ")",
            LeftBrace => "{",
            RightBrace => "}",
            Comma => ",",
            Dot => ".",
            Semicolon => ";",
            Colon => ":",
            Minus => "-",
            Plus => "+",
            Star => "*",
            Slash => "/",
            Bang => "!",
            BangEq => "!=",
            Equal => "=",
            EqualEq => "==",
            Greater => ">",
            GreaterEq => ">=",
            Less => "<",
            LessEq => "<=",
            Ellipsis => "...",
            And => "&&",
            Or => "||",
            Ident | String | Char | Number | End => return None,
            keyword => {
                return KEYWORDS
                    .iter()
                    .find(|(_, kind)| kind == keyword)
                    .map(|(name, _)| *name)
            },
        };
        Some(fixed)
    }

    pub fn is_keyword(&self) -> bool {
        KEYWORDS.iter().any(|(_, kind)| kind == self)
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // pretty formatting for error messages
        // just use debug if you're dumping tokens.
        match self {
            TokenType::Ident => write!(f, "an identifier"),
            TokenType::String => write!(f, "a string literal"),
            TokenType::Char => write!(f, "a character literal"),
            TokenType::Number => write!(f, "a number"),
            TokenType::End => write!(f, "the end of the source"),
            keyword if keyword.is_keyword() => {
                write!(f, "keyword `{}`", keyword.lexeme().unwrap_or_default())
            },
            other => write!(f, "`{}`", other.lexeme().unwrap_or_default()),
        }
    }
}

pub type Tokens = Vec<Token>;

/// A token is a kind plus the byte range it covers in the source.
/// It never holds a copy of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenType,
    pub start: usize,
    pub len: usize,
}

impl Token {
    pub fn new(kind: TokenType, start: usize, len: usize) -> Token {
        Token { kind, start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// The exact text of this token within `contents`.
    /// Yields an empty string for the `End` token,
    /// or if the token doesn't belong to `contents`.
    pub fn lexeme<'a>(&self, contents: &'a str) -> &'a str {
        contents.get(self.start..self.end()).unwrap_or("")
    }

    /// The location of this token, for error reporting.
    pub fn span(&self, source: &Rc<Source>) -> Span {
        Span::new(source, self.start, self.len)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = format!("TokenType::{:?}", self.kind);
        write!(f, "{:<22} Start: {}, Len: {}", kind, self.start, self.len)
    }
}
