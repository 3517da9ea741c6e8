//! Lexer tokens.

use quoll_common::Origin;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    String,
    Vocab,
    Integer,
    Property,

    OpenBrace,
    CloseBrace,
    OpenSquare,
    CloseSquare,
    OpenParan,
    CloseParan,

    Semicolon,
    Colon,
    Indirection,
    AtSymbol,
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "Identifier",
            TokenKind::String => "String",
            TokenKind::Vocab => "Vocab",
            TokenKind::Integer => "Integer",
            TokenKind::Property => "Property",
            TokenKind::OpenBrace => "Open Brace",
            TokenKind::CloseBrace => "Close Brace",
            TokenKind::OpenSquare => "Open Square",
            TokenKind::CloseSquare => "Close Square",
            TokenKind::OpenParan => "Open Paran",
            TokenKind::CloseParan => "Close Paran",
            TokenKind::Semicolon => "Semicolon",
            TokenKind::Colon => "Colon",
            TokenKind::Indirection => "Indirection",
            TokenKind::AtSymbol => "At Symbol",
            TokenKind::EndOfFile => "End-Of-File",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub origin: Origin,
    pub kind: TokenKind,
    pub text: String,
    pub value: i32,
}

impl Token {
    pub fn new(origin: Origin, kind: TokenKind) -> Self {
        Token {
            origin,
            kind,
            text: String::new(),
            value: 0,
        }
    }

    pub fn with_text(origin: Origin, kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            origin,
            kind,
            text: text.into(),
            value: 0,
        }
    }

    pub fn with_value(origin: Origin, kind: TokenKind, value: i32) -> Self {
        Token {
            origin,
            kind,
            text: String::new(),
            value,
        }
    }

    pub fn with_text_value(
        origin: Origin,
        kind: TokenKind,
        text: impl Into<String>,
        value: i32,
    ) -> Self {
        Token {
            origin,
            kind,
            text: text.into(),
            value,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}", self.origin, self.kind)?;
        match self.kind {
            TokenKind::Integer => write!(f, " {}", self.value)?,
            TokenKind::String => write!(f, " ~{}~", self.text)?,
            TokenKind::Identifier | TokenKind::Vocab => write!(f, " {}", self.text)?,
            TokenKind::Property => write!(f, " {}[{}]", self.text, self.value)?,
            _ => {}
        }
        f.write_str("]")
    }
}
