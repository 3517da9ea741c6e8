//! The lexer: UTF-8 source text to a token stream.
//!
//! Vocab words (`@word`) are registered with the game data as they are
//! seen; the table is sorted once after every file has been lexed, before
//! parsing begins.

use crate::error::Severity;
use crate::gamedata::GameData;
use crate::token::{Token, TokenKind};
use quoll_common::gamefile::MAX_STRING_BYTES;
use quoll_common::text::{is_identifier_char, is_space, parse_int, IntParseError};
use quoll_common::Origin;

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    file: &'a str,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(file: &'a str, text: &str) -> Self {
        Lexer {
            chars: text.chars().collect(),
            pos: 0,
            file,
            line: 1,
            column: 1,
        }
    }

    fn here(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        if let Some(c) = self.here() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.pos += 1;
        }
        self.here()
    }

    fn origin(&self) -> Origin {
        Origin::new(self.file, self.line, self.column)
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.here().map(&accept).unwrap_or(false) {
            self.advance();
        }
        self.chars[start..self.pos].iter().collect()
    }
}

/// Lex one source file, appending any diagnostics to the game data. The
/// stream is always terminated by an `EndOfFile` token, so token vectors
/// from several files concatenate safely.
pub fn lex_string(gamedata: &mut GameData, file: &str, text: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(file, text);
    let mut tokens = Vec::new();

    while let Some(c) = lexer.here() {
        if is_space(c) {
            lexer.advance();
            continue;
        }

        // Line and block comments.
        if c == '/' && lexer.peek() == Some('/') {
            while let Some(c) = lexer.here() {
                if c == '\n' {
                    break;
                }
                lexer.advance();
            }
            continue;
        }
        if c == '/' && lexer.peek() == Some('*') {
            let origin = lexer.origin();
            lexer.advance();
            lexer.advance();
            let mut terminated = false;
            while let Some(c) = lexer.here() {
                if c == '*' && lexer.peek() == Some('/') {
                    lexer.advance();
                    lexer.advance();
                    terminated = true;
                    break;
                }
                if c == '/' && lexer.peek() == Some('*') {
                    gamedata.add_error(lexer.origin(), "Block comments may not be nested.");
                }
                lexer.advance();
            }
            if !terminated {
                gamedata.add_error(origin, "End-of-file in block comment.");
            }
            continue;
        }

        let origin = lexer.origin();
        let single = match c {
            ';' => Some(TokenKind::Semicolon),
            ':' => Some(TokenKind::Colon),
            '*' => Some(TokenKind::Indirection),
            '[' => Some(TokenKind::OpenSquare),
            ']' => Some(TokenKind::CloseSquare),
            '{' => Some(TokenKind::OpenBrace),
            '}' => Some(TokenKind::CloseBrace),
            '(' => Some(TokenKind::OpenParan),
            ')' => Some(TokenKind::CloseParan),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token::new(origin, kind));
            lexer.advance();
            continue;
        }

        if c.is_ascii_digit() || (c == '-' && lexer.peek().map(|p| p.is_ascii_digit()).unwrap_or(false)) {
            let mut literal = String::new();
            if c == '-' {
                literal.push('-');
                lexer.advance();
            }
            // digits plus prefix/hex letters and separators, but not '-'
            literal.push_str(&lexer.take_while(|c| c.is_ascii_alphanumeric() || c == '_'));
            let value = match parse_int(&literal) {
                Ok(value) => value,
                Err(IntParseError::Invalid) => {
                    gamedata.add_error(origin.clone(), format!("Invalid integer literal ~{}~.", literal));
                    0
                }
                Err(IntParseError::OutOfRange) => {
                    gamedata.add_error(
                        origin.clone(),
                        format!("Integer literal ~{}~ out of range.", literal),
                    );
                    0
                }
            };
            tokens.push(Token::with_value(origin, TokenKind::Integer, value));
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            lexer.advance();
            let start = lexer.pos;
            while let Some(c) = lexer.here() {
                if c == quote {
                    break;
                }
                if c == '\\' {
                    lexer.advance();
                }
                lexer.advance();
            }
            let raw: String = lexer.chars[start..lexer.pos].iter().collect();
            if lexer.here().is_none() {
                gamedata.add_error(origin.clone(), "End-of-file in string literal.");
            }
            lexer.advance();
            let mut text = fold_string_escapes(gamedata, &origin, &raw);
            if quote == '"' {
                if text.len() > MAX_STRING_BYTES {
                    gamedata.add_diagnostic(
                        Severity::Warning,
                        origin.clone(),
                        format!(
                            "String exceeds max string length of {}; excess data truncated.",
                            MAX_STRING_BYTES
                        ),
                    );
                    let mut cut = MAX_STRING_BYTES;
                    while !text.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    text.truncate(cut);
                }
                tokens.push(Token::with_text(origin, TokenKind::String, text));
            } else {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => {
                        tokens.push(Token::with_value(origin, TokenKind::Integer, c as i32))
                    }
                    _ => gamedata
                        .add_error(origin, "Character literal has invalid length."),
                }
            }
            continue;
        }

        if c == '$' {
            lexer.advance();
            let name = lexer.take_while(is_identifier_char);
            if name.is_empty() {
                gamedata.add_error(origin.clone(), "Found empty property name.");
            }
            let id = gamedata.get_property_id(&name);
            tokens.push(Token::with_text_value(
                origin,
                TokenKind::Property,
                name,
                id as i32,
            ));
            continue;
        }

        if c == '@' {
            lexer.advance();
            let word = lexer.take_while(is_identifier_char);
            if word.is_empty() {
                tokens.push(Token::new(origin, TokenKind::AtSymbol));
            } else {
                gamedata.add_vocab(&word);
                tokens.push(Token::with_text(origin, TokenKind::Vocab, word));
            }
            continue;
        }

        if is_identifier_char(c) || c.is_alphabetic() {
            let name = lexer.take_while(|c| is_identifier_char(c) || c.is_alphabetic());
            tokens.push(Token::with_text(origin, TokenKind::Identifier, name));
            continue;
        }

        gamedata.add_error(origin, format!("Unexpected '{}' encountered.", c));
        lexer.advance();
    }

    tokens.push(Token::new(lexer.origin(), TokenKind::EndOfFile));
    tokens
}

/// Resolve escapes and fold line breaks inside a string literal body.
///
/// A line break and the indentation around it collapse to a single space,
/// except a run touching the start or end of the literal, which collapses
/// to nothing. Recognized escapes: `\\`, `\"`, `\'`, `\n`.
fn fold_string_escapes(gamedata: &mut GameData, origin: &Origin, raw: &str) -> String {
    let mut text: Vec<char> = raw.chars().collect();
    let mut spaces_start: Option<usize> = None;
    let mut i = 0;

    while i < text.len() {
        let c = text[i];
        if is_space(c) {
            if spaces_start.is_none() {
                spaces_start = Some(i);
            }
        } else {
            spaces_start = None;
        }

        if c == '\n' {
            let start = spaces_start.unwrap_or(i);
            let mut end = i;
            while end < text.len() && is_space(text[end]) {
                end += 1;
            }
            if start != 0 && end != text.len() {
                text[start] = ' ';
                text.drain(start + 1..end);
            } else {
                text.drain(start..end);
            }
            i = start;
            spaces_start = None;
            continue;
        }

        if c == '\\' {
            match text.get(i + 1).copied() {
                Some('\'') | Some('"') | Some('\\') => {
                    text.remove(i);
                }
                Some('n') => {
                    text.remove(i);
                    text[i] = '\n';
                }
                other => {
                    let shown = other.map(String::from).unwrap_or_default();
                    gamedata.add_error(
                        origin.clone(),
                        format!("Unknown string escape \\{}.", shown),
                    );
                }
            }
        }
        i += 1;
    }

    text.into_iter().collect()
}
