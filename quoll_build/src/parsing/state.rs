//! Cursor over the token stream with the match/require/skip helpers the
//! recursive-descent rules are written in.

use crate::error::BuildError;
use crate::token::{Token, TokenKind};
use quoll_common::Origin;

pub struct ParseState<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ParseState<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        ParseState { tokens, pos: 0 }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn eof(&self) -> bool {
        self.at_end() || self.matches_kind(TokenKind::EndOfFile)
    }

    pub fn here(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos + 1)
    }

    pub fn advance(&mut self) -> Option<&'a Token> {
        if !self.at_end() {
            self.pos += 1;
        }
        self.here()
    }

    /// Origin of the current token, or of the end of input.
    pub fn origin(&self) -> Origin {
        match self.here().or_else(|| self.tokens.last()) {
            Some(token) => token.origin.clone(),
            None => Origin::none(),
        }
    }

    pub fn matches_kind(&self, kind: TokenKind) -> bool {
        self.here().map(|t| t.kind == kind).unwrap_or(false)
    }

    pub fn matches_text(&self, text: &str) -> bool {
        self.here()
            .map(|t| t.kind == TokenKind::Identifier && t.text == text)
            .unwrap_or(false)
    }

    pub fn require(&self, kind: TokenKind) -> Result<&'a Token, BuildError> {
        match self.here() {
            Some(token) if token.kind == kind => Ok(token),
            Some(token) => Err(BuildError::new(
                token.origin.clone(),
                format!("Expected {}, but found {}.", kind, token.kind),
            )),
            None => Err(BuildError::new(
                self.origin(),
                "Unexpected end of tokens.",
            )),
        }
    }

    pub fn skip(&mut self, kind: TokenKind) -> Result<(), BuildError> {
        self.require(kind)?;
        self.advance();
        Ok(())
    }

    pub fn skip_text(&mut self, text: &str) -> Result<(), BuildError> {
        let token = self.require(TokenKind::Identifier)?;
        if token.text == text {
            self.advance();
            Ok(())
        } else {
            Err(BuildError::new(
                token.origin.clone(),
                format!("Expected identifier ~{}~, but found ~{}~.", text, token.text),
            ))
        }
    }

    /// Skip forward until the given token kind (or end of input).
    pub fn skip_to(&mut self, kind: TokenKind) {
        while !self.eof() && !self.matches_kind(kind) {
            self.advance();
        }
    }
}
