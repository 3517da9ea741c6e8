//! S-expression parsing for structured function bodies.

use crate::gamedata::{FunctionDef, GameData};
use crate::parsing::ParseState;
use crate::token::TokenKind;
use crate::value::Value;
use quoll_common::opcode;
use quoll_common::{Origin, TypeTag};

/// Words with dedicated statement lowerings.
pub const RESERVED_WORDS: &[&str] = &[
    "and",
    "break",
    "continue",
    "do_while",
    "if",
    "label",
    "or",
    "print",
    "print_uf",
    "proc",
    "while",
];

/// One element of a parsed list: a value, or a nested sub-list.
#[derive(Debug)]
pub struct ListValue {
    pub origin: Origin,
    pub value: Value,
    pub list: Option<ListExpr>,
}

impl ListValue {
    fn plain(origin: Origin, value: Value) -> Self {
        ListValue {
            origin,
            value,
            list: None,
        }
    }
}

/// A parenthesized list of [`ListValue`]s.
#[derive(Debug, Default)]
pub struct ListExpr {
    pub values: Vec<ListValue>,
}

/// Resolve an identifier in expression context: opcode mnemonic, reserved
/// word, global symbol, local name, or (failing all of those) a symbol
/// placeholder the emitter treats as a forward label.
pub fn eval_identifier(gamedata: &mut GameData, function: &FunctionDef, name: &str) -> Value {
    if let Some(def) = opcode::by_name(name) {
        return Value::opcode(def);
    }
    if RESERVED_WORDS.contains(&name) {
        return Value::reserved(name);
    }
    if let Some(value) = gamedata.symbols.lookup(name, true) {
        return value;
    }
    if let Some(n) = function.local_number(name) {
        return Value::new(TypeTag::LocalVar, n as i32);
    }
    Value::symbol(name)
}

/// Parse one parenthesized list, consuming through its closing paren.
/// Returns None when the stream does not open with a paren; the error has
/// already been recorded.
pub fn parse_list_expr(
    gamedata: &mut GameData,
    function: &FunctionDef,
    state: &mut ParseState,
) -> Option<ListExpr> {
    if let Err(err) = state.require(TokenKind::OpenParan) {
        gamedata.report(err);
        return None;
    }
    let open_origin = state.origin();
    state.advance();

    let mut list = ListExpr::default();
    loop {
        match state.here() {
            None => {
                gamedata.add_error(open_origin, "Unexpected end of function body in list.");
                return Some(list);
            }
            Some(token) if token.kind == TokenKind::CloseParan => {
                state.advance();
                return Some(list);
            }
            Some(_) => {
                if let Some(value) = parse_list_value(gamedata, function, state) {
                    list.values.push(value);
                }
            }
        }
    }
}

/// Parse a single list element.
fn parse_list_value(
    gamedata: &mut GameData,
    function: &FunctionDef,
    state: &mut ParseState,
) -> Option<ListValue> {
    let token = state.here()?;
    let origin = token.origin.clone();

    match token.kind {
        TokenKind::Integer => {
            let value = Value::integer(token.value);
            state.advance();
            Some(ListValue::plain(origin, value))
        }
        TokenKind::Property => {
            let value = Value::new(TypeTag::Property, token.value);
            state.advance();
            Some(ListValue::plain(origin, value))
        }
        TokenKind::String => {
            let id = gamedata.get_string_id(&token.text);
            state.advance();
            Some(ListValue::plain(origin, Value::new(TypeTag::String, id as i32)))
        }
        TokenKind::Vocab => {
            let word = token.text.clone();
            state.advance();
            match gamedata.vocab_number(&word) {
                Some(id) => {
                    Some(ListValue::plain(origin, Value::new(TypeTag::Vocab, id as i32)))
                }
                None => {
                    gamedata.add_error(origin, format!("Unknown vocab word @{}.", word));
                    None
                }
            }
        }
        TokenKind::OpenParan => {
            let sublist = parse_list_expr(gamedata, function, state)?;
            Some(ListValue {
                origin,
                value: Value::new(TypeTag::Expression, 0),
                list: Some(sublist),
            })
        }
        TokenKind::Identifier => {
            let value = eval_identifier(gamedata, function, &token.text);
            state.advance();
            Some(ListValue::plain(origin, value))
        }
        TokenKind::Indirection => {
            // `*name` names a local explicitly.
            state.advance();
            match state.here() {
                Some(name) if name.kind == TokenKind::Identifier => {
                    let result = match function.local_number(&name.text) {
                        Some(n) => Some(ListValue::plain(
                            origin,
                            Value::new(TypeTag::LocalVar, n as i32),
                        )),
                        None => {
                            gamedata.add_error(
                                name.origin.clone(),
                                format!("{} is not a local variable.", name.text),
                            );
                            None
                        }
                    };
                    state.advance();
                    result
                }
                _ => {
                    gamedata.add_error(origin, "Indirection requires local variable name.");
                    None
                }
            }
        }
        TokenKind::Colon => {
            state.advance();
            Some(ListValue::plain(origin, Value::new(TypeTag::Colon, 0)))
        }
        other => {
            gamedata.add_error(origin, format!("Unexpected type {} found in list.", other));
            state.advance();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_string;

    fn setup(body: &str) -> (GameData, FunctionDef, Vec<crate::token::Token>) {
        let mut gamedata = GameData::new();
        crate::translate::add_default_constants(&mut gamedata);
        let tokens = lex_string(&mut gamedata, "test.src", body);
        gamedata.sort_vocab();
        let mut function =
            FunctionDef::new(Origin::new("test.src", 1, 1), 0, "f".to_string(), 0);
        function.argument_count = 2;
        function.add_local("self", TypeTag::None, true);
        function.add_local("n", TypeTag::None, false);
        (gamedata, function, tokens)
    }

    #[test]
    fn parses_nested_lists() {
        let (mut gamedata, function, tokens) = setup("(add 1 (sub 2 3))");
        let mut state = ParseState::new(&tokens);
        let list = parse_list_expr(&mut gamedata, &function, &mut state).unwrap();
        assert!(!gamedata.has_errors());
        assert_eq!(list.values.len(), 3);
        assert_eq!(list.values[0].value.tag, TypeTag::Opcode);
        assert_eq!(list.values[2].value.tag, TypeTag::Expression);
        let inner = list.values[2].list.as_ref().unwrap();
        assert_eq!(inner.values.len(), 3);
    }

    #[test]
    fn identifiers_resolve_in_order() {
        let (mut gamedata, function, _) = setup("");
        // opcode beats everything
        assert_eq!(
            eval_identifier(&mut gamedata, &function, "add").tag,
            TypeTag::Opcode
        );
        // reserved word
        assert_eq!(
            eval_identifier(&mut gamedata, &function, "while").tag,
            TypeTag::Reserved
        );
        // global symbol
        assert_eq!(
            eval_identifier(&mut gamedata, &function, "true").tag,
            TypeTag::Integer
        );
        // local
        assert_eq!(
            eval_identifier(&mut gamedata, &function, "n").tag,
            TypeTag::LocalVar
        );
        // leftover symbol
        assert_eq!(
            eval_identifier(&mut gamedata, &function, "mystery").tag,
            TypeTag::Symbol
        );
    }

    #[test]
    fn indirection_resolves_locals() {
        let (mut gamedata, function, tokens) = setup("(say *n)");
        let mut state = ParseState::new(&tokens);
        let list = parse_list_expr(&mut gamedata, &function, &mut state).unwrap();
        assert!(!gamedata.has_errors());
        assert_eq!(list.values[1].value.tag, TypeTag::LocalVar);
        assert_eq!(list.values[1].value.payload, 1);
    }

    #[test]
    fn unterminated_list_reports() {
        let (mut gamedata, function, tokens) = setup("(say 1");
        let mut state = ParseState::new(&tokens);
        // The EndOfFile token inside the list is reported as unexpected.
        let _ = parse_list_expr(&mut gamedata, &function, &mut state);
        assert!(gamedata.has_errors());
    }
}
