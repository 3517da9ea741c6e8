//! Per-function compilation: body tokens become bytecode.
//!
//! Structured functions are re-parsed into S-expression lists and lowered
//! statement by statement; `asm_function` bodies translate token-for-token.
//! Both paths accumulate [`crate::gamedata::AsmLine`]s, which the emitter
//! turns into bytes with label backpatching.

mod emitter;
mod parser;
mod statements;

pub use emitter::{build_function, bytecode_push_value, Backpatch};
pub use parser::{eval_identifier, parse_list_expr, ListExpr, ListValue, RESERVED_WORDS};
pub use statements::process_list;

use crate::gamedata::{FunctionDef, GameData};
use crate::parsing::ParseState;
use crate::token::TokenKind;
use crate::value::Value;
use quoll_common::opcode::{self, Opcode};
use quoll_common::TypeTag;

/// Compile every function body and append the results to the shared
/// program bytecode. Function code positions are 4-byte aligned.
pub fn compile_functions(gamedata: &mut GameData) {
    log::debug!("compiling {} function bodies", gamedata.functions.len().saturating_sub(1));
    for at in 1..gamedata.functions.len() {
        let Some(mut function) = gamedata.functions[at].take() else {
            continue;
        };

        for i in 0..function.locals.len() {
            let name = function.locals[i].name.clone();
            if name_in_use(gamedata, &function, &name, i) {
                gamedata.add_error(
                    function.origin.clone(),
                    format!("Local name \"{}\" already in use.", name),
                );
            }
        }

        function.code_position = gamedata.bytecode.size() as u32;
        if function.is_asm {
            compile_asm_function(gamedata, &mut function);
        } else {
            compile_std_function(gamedata, &mut function);
        }
        build_function(gamedata, &mut function);
        function.code.pad_to(4);
        gamedata.bytecode.append(&function.code);

        for local in &function.locals {
            if local.reads == 0 {
                gamedata.add_warning(
                    function.origin.clone(),
                    format!("Local variable {} not used.", local.name),
                );
            }
        }
        gamedata.functions[at] = Some(function);
    }
}

/// A local name collides when it shadows an opcode (in asm functions), a
/// global symbol, a reserved word, a label, or another local.
fn name_in_use(gamedata: &GameData, function: &FunctionDef, name: &str, local_id: usize) -> bool {
    if function.is_asm && opcode::by_name(name).is_some() {
        return true;
    }
    if gamedata.symbols.get(name).is_some() {
        return true;
    }
    if RESERVED_WORDS.contains(&name) {
        return true;
    }
    if function.labels.contains_key(name) {
        return true;
    }
    function
        .locals
        .iter()
        .enumerate()
        .any(|(i, local)| i != local_id && local.name == name)
}

/// Structured path: the body is a sequence of parenthesized statements.
/// Every statement leaves exactly one value; all but the last are popped,
/// so the final statement's value is what `Return` hands back. An empty
/// body returns Integer 0.
fn compile_std_function(gamedata: &mut GameData, function: &mut FunctionDef) {
    let tokens = std::mem::take(&mut function.tokens);
    let mut state = ParseState::new(&tokens);

    let mut lists = Vec::new();
    while !state.at_end() {
        match parse_list_expr(gamedata, function, &mut state) {
            Some(list) => lists.push(list),
            None => break,
        }
    }

    let origin = function.origin.clone();
    let count = lists.len();
    for (i, list) in lists.iter().enumerate() {
        process_list(gamedata, function, list);
        if i + 1 < count {
            function.add_opcode(origin.clone(), Opcode::StackPop);
        }
    }
    if count == 0 {
        function.add_value(origin.clone(), Value::integer(0));
    }
    function.add_opcode(origin, Opcode::Return);
}

/// Raw path: translate the token stream directly. `name:` defines a label,
/// `*name` pushes a VarRef for a local, identifiers resolve through the
/// opcode table, the symbol table, and the local list, in that order;
/// anything left is a forward label reference.
fn compile_asm_function(gamedata: &mut GameData, function: &mut FunctionDef) {
    let tokens = std::mem::take(&mut function.tokens);
    let mut state = ParseState::new(&tokens);

    while let Some(token) = state.here() {
        let origin = token.origin.clone();
        match token.kind {
            TokenKind::Identifier => {
                if state.peek().map(|t| t.kind) == Some(TokenKind::Colon) {
                    function.add_label(origin, token.text.clone());
                    state.advance();
                    state.advance();
                    continue;
                }
                let value = eval_identifier(gamedata, function, &token.text);
                match value.tag {
                    TypeTag::Opcode => {
                        let def = value.opcode.expect("opcode values carry their table entry");
                        function.add_opcode(origin, def.code);
                    }
                    TypeTag::Reserved => {
                        gamedata.add_error(
                            origin,
                            format!("Reserved word {} not allowed in assembly.", token.text),
                        );
                    }
                    _ => function.add_value(origin, value),
                }
                state.advance();
            }
            TokenKind::Indirection => {
                state.advance();
                match state.here() {
                    Some(name) if name.kind == TokenKind::Identifier => {
                        match function.local_number(&name.text) {
                            Some(n) => function
                                .add_value(origin, Value::new(TypeTag::VarRef, n as i32)),
                            None => gamedata.add_error(
                                name.origin.clone(),
                                format!("{} is not a local variable.", name.text),
                            ),
                        }
                        state.advance();
                    }
                    _ => gamedata
                        .add_error(origin, "Indirection requires local variable name."),
                }
            }
            TokenKind::Integer => {
                function.add_value(origin, Value::integer(token.value));
                state.advance();
            }
            TokenKind::String => {
                let id = gamedata.get_string_id(&token.text);
                function.add_value(origin, Value::new(TypeTag::String, id as i32));
                state.advance();
            }
            TokenKind::Property => {
                function.add_value(origin, Value::new(TypeTag::Property, token.value));
                state.advance();
            }
            TokenKind::Vocab => {
                match gamedata.vocab_number(&token.text) {
                    Some(id) => {
                        function.add_value(origin, Value::new(TypeTag::Vocab, id as i32))
                    }
                    None => gamedata
                        .add_error(origin, format!("Unknown vocab word @{}.", token.text)),
                }
                state.advance();
            }
            other => {
                gamedata.add_error(origin, format!("Unexpected {} in assembly.", other));
                state.advance();
            }
        }
    }

    let origin = function.origin.clone();
    function.add_value(origin.clone(), Value::integer(0));
    function.add_opcode(origin, Opcode::Return);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_string;
    use crate::parsing::parse_tokens;

    fn compile(source: &str) -> GameData {
        let mut gamedata = GameData::new();
        crate::translate::add_default_constants(&mut gamedata);
        let tokens = lex_string(&mut gamedata, "test.src", source);
        gamedata.sort_vocab();
        let mut state = ParseState::new(&tokens);
        parse_tokens(&mut gamedata, &mut state);
        crate::translate::translate_symbols(&mut gamedata);
        compile_functions(&mut gamedata);
        gamedata
    }

    #[test]
    fn empty_function_compiles_to_push_and_return() {
        let gamedata = compile("function f() { }");
        assert!(!gamedata.has_errors());
        let function = gamedata.function_by_name("f").unwrap();
        // Push0 Integer, Return, then padding
        assert_eq!(function.code.read_8(0), Some(Opcode::Push0 as u8));
        assert_eq!(function.code.read_8(1), Some(TypeTag::Integer as u8));
        assert_eq!(function.code.read_8(2), Some(Opcode::Return as u8));
        assert_eq!(function.code.size() % 4, 0);
    }

    #[test]
    fn code_positions_are_aligned_and_increasing() {
        let gamedata = compile("function a() { }\nfunction b() { }");
        assert!(!gamedata.has_errors());
        let a = gamedata.function_by_name("a").unwrap();
        let b = gamedata.function_by_name("b").unwrap();
        assert_eq!(a.code_position % 4, 0);
        assert_eq!(b.code_position % 4, 0);
        assert!(b.code_position > a.code_position);
        assert_eq!(
            gamedata.bytecode.size(),
            (a.code.size() + b.code.size()) as usize
        );
    }

    #[test]
    fn store_requires_local_var() {
        let gamedata = compile("function f() { (set 5 5) }");
        assert!(gamedata.has_errors());
        assert!(gamedata
            .diagnostics
            .iter()
            .any(|d| d.message.contains("Store opcode must reference local variable")));
    }

    #[test]
    fn store_lowers_local_to_var_ref() {
        let gamedata = compile("function f(: x) { (set *x 5) (say *x) }");
        assert!(!gamedata.has_errors());
    }

    #[test]
    fn operand_count_mismatch_is_reported() {
        let gamedata = compile("function f() { (add 1) }");
        assert!(gamedata.has_errors());
    }

    #[test]
    fn unused_local_warns() {
        let gamedata = compile("function f(: unused) { }");
        assert!(!gamedata.has_errors());
        assert!(gamedata
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unused")));
    }

    #[test]
    fn local_shadowing_global_is_error() {
        let gamedata = compile("declare size 10;\nfunction f(size) { }");
        assert!(gamedata.has_errors());
    }

    #[test]
    fn break_outside_loop_is_error() {
        let gamedata = compile("function f() { (break) }");
        assert!(gamedata.has_errors());
    }

    #[test]
    fn undefined_symbol_in_body_is_error() {
        let gamedata = compile("function f() { (say missing) }");
        assert!(gamedata.has_errors());
        assert!(gamedata
            .diagnostics
            .iter()
            .any(|d| d.message.contains("Undefined symbol")));
    }

    #[test]
    fn asm_function_labels_and_jumps_resolve() {
        let gamedata = compile(
            "asm_function spin() { top: 0 again jz 1 top jmp again: 2 return }",
        );
        assert!(!gamedata.has_errors());
        let function = gamedata.function_by_name("spin").unwrap();
        assert!(function.labels.contains_key("top"));
        assert!(function.labels.contains_key("again"));
        // the forward reference to `again` was patched, no placeholder left
        let mut found_placeholder = false;
        for at in 0..function.code.size().saturating_sub(3) {
            if function.code.read_32(at) == Some(0xFFFF_FFFF) {
                found_placeholder = true;
            }
        }
        assert!(!found_placeholder);
    }

    #[test]
    fn asm_undefined_label_is_error() {
        let gamedata = compile("asm_function f() { nowhere jmp }");
        assert!(gamedata.has_errors());
        assert!(gamedata
            .diagnostics
            .iter()
            .any(|d| d.message.contains("Undefined symbol")));
    }

    #[test]
    fn asm_var_ref_needs_local() {
        let gamedata = compile("asm_function f() { *nope 5 set }");
        assert!(gamedata.has_errors());
    }

    #[test]
    fn reserved_word_in_asm_is_error() {
        let gamedata = compile("asm_function f() { while }");
        assert!(gamedata.has_errors());
    }
}
