//! Recursive descent over the concatenated token stream.
//!
//! Each top-level directive recovers independently: a failed rule reports
//! one error, resynchronizes at the next `;`, and parsing continues.

use crate::error::Severity;
use crate::gamedata::{
    FlagSet, FunctionDef, GameData, GameList, GameMap, GameObject, MapRow, SymbolDef,
};
use crate::parsing::ParseState;
use crate::token::TokenKind;
use crate::value::Value;
use quoll_common::TypeTag;

/// Parse every directive in the token stream into the game data.
pub fn parse_tokens(gamedata: &mut GameData, state: &mut ParseState) {
    while !state.at_end() {
        if state.matches_kind(TokenKind::EndOfFile) {
            state.advance();
            continue;
        }
        if let Err(err) = state.require(TokenKind::Identifier) {
            gamedata.report(err);
            state.advance();
            continue;
        }

        if state.matches_text("declare") {
            parse_constant(gamedata, state);
        } else if state.matches_text("default") {
            parse_default(gamedata, state);
        } else if state.matches_text("extend") {
            parse_extend(gamedata, state);
        } else if state.matches_text("object") {
            let id = parse_object(gamedata, state, "");
            if let Some(object) = gamedata.object(id) {
                if object.name.is_empty() {
                    let origin = object.origin.clone();
                    gamedata.add_warning(
                        origin,
                        "Anonymous object at top level can never be referenced.",
                    );
                }
            }
        } else if state.matches_text("function") || state.matches_text("asm_function") {
            let is_asm = state.matches_text("asm_function");
            let id = parse_function(gamedata, state, "", is_asm);
            if let Some(function) = gamedata.function(id) {
                if function.name.is_empty() {
                    let origin = function.origin.clone();
                    gamedata.add_warning(
                        origin,
                        "Anonymous function at top level can never be referenced.",
                    );
                }
            }
        } else {
            let token = state.here().expect("checked above");
            gamedata.add_error(
                token.origin.clone(),
                format!("Unexpected top level directive {}.", token.text),
            );
            state.advance();
        }
    }
}

/// `declare NAME value;`
fn parse_constant(gamedata: &mut GameData, state: &mut ParseState) {
    let origin = state.origin();
    state.advance(); // declare
    let name = match state.require(TokenKind::Identifier) {
        Ok(token) => token.text.clone(),
        Err(err) => {
            gamedata.report(err);
            state.advance();
            return;
        }
    };
    state.advance();
    let value = parse_value(gamedata, state, &name);
    if matches!(value.tag, TypeTag::Object | TypeTag::Function) {
        gamedata.add_error(
            state.origin(),
            format!("Declaration of {} cannot declare objects or functions.", name),
        );
    }
    if let Err(err) = gamedata
        .symbols
        .add(SymbolDef::new(origin.clone(), name, value))
    {
        gamedata.report(err);
    }
    if let Err(err) = state.skip(TokenKind::Semicolon) {
        gamedata.report(err);
        state.skip_to(TokenKind::Semicolon);
        state.advance();
    }
}

/// `default NAME value;` — promoted into the symbol table after parsing iff
/// NAME is still undefined.
fn parse_default(gamedata: &mut GameData, state: &mut ParseState) {
    let origin = state.origin();
    state.advance(); // default
    let name = match state.require(TokenKind::Identifier) {
        Ok(token) => token.text.clone(),
        Err(err) => {
            gamedata.report(err);
            state.advance();
            return;
        }
    };
    state.advance();
    let value = parse_value(gamedata, state, &name);
    if matches!(value.tag, TypeTag::Object | TypeTag::Function) {
        gamedata.add_diagnostic(
            Severity::Warning,
            state.origin(),
            format!(
                "Declaration of default value for {} cannot declare objects or functions.",
                name
            ),
        );
    }
    if let Some(old) = gamedata.defaults.get(&name) {
        let message = format!(
            "Default value for {} already declared at {}.",
            name, old.origin
        );
        gamedata.add_warning(origin, message);
    } else if let Err(err) = gamedata
        .defaults
        .add(SymbolDef::new(origin, name, value))
    {
        gamedata.report(err);
    }
    if let Err(err) = state.skip(TokenKind::Semicolon) {
        gamedata.report(err);
        state.skip_to(TokenKind::Semicolon);
        state.advance();
    }
}

/// `extend NAME …;` — appends to a list or map, or adds properties to an
/// object.
fn parse_extend(gamedata: &mut GameData, state: &mut ParseState) {
    let origin = state.origin();
    state.advance(); // extend

    let name = match state.require(TokenKind::Identifier) {
        Ok(token) => token.text.clone(),
        Err(err) => {
            gamedata.report(err);
            state.advance();
            return;
        }
    };
    let old = match gamedata.symbols.lookup(&name, true) {
        Some(value) => value,
        None => {
            gamedata.add_error(origin, "Can only extend existing values.");
            state.skip_to(TokenKind::Semicolon);
            state.advance();
            return;
        }
    };
    if !matches!(old.tag, TypeTag::List | TypeTag::Map | TypeTag::Object) {
        gamedata.add_error(origin, format!("Cannot extend values of type {}.", old.tag));
        state.skip_to(TokenKind::Semicolon);
        state.advance();
        return;
    }

    state.advance();
    if state.eof() {
        gamedata.add_error(origin, "Unexpected end of file.");
        return;
    }

    let mut failed = false;
    match state.here().map(|t| t.kind) {
        Some(TokenKind::OpenSquare) => {
            if old.tag != TypeTag::List {
                gamedata.add_error(origin.clone(), format!("Cannot expand {} as list.", name));
                failed = true;
            } else {
                state.advance();
                while !state.eof() && !state.matches_kind(TokenKind::CloseSquare) {
                    if state.matches_kind(TokenKind::Semicolon) {
                        gamedata.add_error(
                            state.origin(),
                            "List values must be terminated with ].",
                        );
                        state.advance();
                        return;
                    }
                    let value = parse_value(gamedata, state, "");
                    if let Some(list) = gamedata.list_mut(old.payload as u32) {
                        list.items.push(value);
                    }
                }
                state.advance();
            }
        }
        Some(TokenKind::OpenBrace) => {
            if old.tag != TypeTag::Map {
                gamedata.add_error(origin.clone(), format!("Cannot expand {} as map.", name));
                failed = true;
            } else {
                state.advance();
                while !state.eof() && !state.matches_kind(TokenKind::CloseBrace) {
                    if state.matches_kind(TokenKind::Semicolon) {
                        gamedata.add_error(state.origin(), "Map must be terminated with }.");
                        state.advance();
                        return;
                    }
                    let key = parse_value(gamedata, state, "");
                    if let Err(err) = state.skip(TokenKind::Colon) {
                        gamedata.report(err);
                    }
                    let value = parse_value(gamedata, state, "");
                    if let Some(map) = gamedata.map_mut(old.payload as u32) {
                        map.rows.push(MapRow { key, value });
                    }
                }
                state.advance();
            }
        }
        _ => {
            if old.tag == TypeTag::Object {
                while !state.matches_kind(TokenKind::Semicolon) && !state.eof() {
                    if parse_object_property(gamedata, state, old.payload as u32).is_err() {
                        failed = true;
                        break;
                    }
                }
            } else {
                gamedata.add_error(
                    origin.clone(),
                    format!("Invalid value to extend {} {}.", old.tag, name),
                );
                failed = true;
            }
        }
    }

    if failed {
        state.skip_to(TokenKind::Semicolon);
    } else if let Err(err) = state.require(TokenKind::Semicolon) {
        gamedata.report(err);
        state.skip_to(TokenKind::Semicolon);
    }
    state.advance();
}

/// `flags(member …)` — members resolve and OR together during translation.
fn parse_flags(gamedata: &mut GameData, state: &mut ParseState) -> i32 {
    let origin = state.origin();
    state.advance(); // flags
    if let Err(err) = state.skip(TokenKind::OpenParan) {
        gamedata.report(err);
        state.skip_to(TokenKind::Semicolon);
        return 0;
    }

    let mut values = Vec::new();
    while !state.eof() && !state.matches_kind(TokenKind::CloseParan) {
        let token = state.here().expect("not at end");
        match token.kind {
            TokenKind::Integer => values.push(Value::integer(token.value)),
            TokenKind::Identifier => values.push(Value::symbol(token.text.clone())),
            _ => {
                gamedata.add_error(
                    token.origin.clone(),
                    format!("Invalid token {} in flags.", token.kind),
                );
            }
        }
        state.advance();
    }
    state.advance();

    gamedata.flagsets.push(FlagSet {
        origin,
        values,
        final_value: 0,
    });
    (gamedata.flagsets.len() - 1) as i32
}

/// `function [Name]([args][: locals]) [ [locals] ] { body }`, shared with
/// `asm_function`. The body tokens are captured verbatim for the later
/// per-function compile pass.
fn parse_function(
    gamedata: &mut GameData,
    state: &mut ParseState,
    default_name: &str,
    is_asm: bool,
) -> u32 {
    let origin = state.origin();
    state.advance(); // function / asm_function

    let id = gamedata.next_function_id();
    let name = if state.matches_kind(TokenKind::Identifier) {
        let name = state.here().expect("identifier").text.clone();
        if let Err(err) = gamedata.symbols.add(SymbolDef::new(
            origin.clone(),
            name.clone(),
            Value::new(TypeTag::Function, id as i32),
        )) {
            gamedata.report(err);
        }
        state.advance();
        name
    } else {
        default_name.to_string()
    };

    let file_string = gamedata.get_string_id(&origin.file);
    let name_string = gamedata.get_string_id(&name);
    let mut function = FunctionDef::new(origin.clone(), file_string, name, name_string);
    function.is_asm = is_asm;
    // hidden "self" argument
    function.argument_count = 1;
    function.add_local("self", TypeTag::None, true);

    if let Err(err) = state.skip(TokenKind::OpenParan) {
        gamedata.report(err);
        state.skip_to(TokenKind::CloseBrace);
        state.advance();
        return gamedata.add_function(function);
    }

    // Arguments, then (after a bare colon) locals.
    let mut locals_mode = false;
    while !state.eof() && !state.matches_kind(TokenKind::CloseParan) {
        if state.matches_kind(TokenKind::Colon) {
            state.advance();
            locals_mode = true;
            continue;
        }
        let token = match state.require(TokenKind::Identifier) {
            Ok(token) => token,
            Err(err) => {
                gamedata.report(err);
                state.advance();
                continue;
            }
        };
        let local_name = token.text.clone();
        state.advance();

        let mut declared = TypeTag::None;
        if !locals_mode && state.matches_kind(TokenKind::Colon) {
            // A colon here is a type annotation only when the next token
            // names a type; otherwise it separates arguments from locals
            // and the next loop turn consumes it.
            let annotation = state.peek().and_then(|next| {
                if next.kind != TokenKind::Identifier {
                    return None;
                }
                match gamedata.symbols.get(&next.text) {
                    Some(sym) if sym.value.tag == TypeTag::TypeId => {
                        Some((next.origin.clone(), next.text.clone(), sym.value.payload))
                    }
                    _ => None,
                }
            });
            if let Some((at, type_name, payload)) = annotation {
                state.advance(); // colon
                state.advance(); // type name
                match TypeTag::try_from(payload as u8) {
                    Ok(tag) => declared = tag,
                    Err(_) => {
                        gamedata.add_error(at, format!("{} is not a valid type.", type_name))
                    }
                }
            }
        }

        if locals_mode {
            function.local_count += 1;
        } else {
            function.argument_count += 1;
        }
        function.add_local(local_name, declared, false);
    }
    state.advance(); // )

    if let Err(err) = state.skip(TokenKind::OpenBrace) {
        gamedata.report(err);
        state.skip_to(TokenKind::CloseBrace);
        state.advance();
        return gamedata.add_function(function);
    }

    // Optional bracketed local-name block.
    if state.matches_kind(TokenKind::OpenSquare) {
        state.advance();
        while !state.eof() && !state.matches_kind(TokenKind::CloseSquare) {
            match state.require(TokenKind::Identifier) {
                Ok(token) => {
                    function.local_count += 1;
                    function.add_local(token.text.clone(), TypeTag::None, false);
                    state.advance();
                }
                Err(err) => {
                    gamedata.report(err);
                    state.advance();
                }
            }
        }
        state.advance();
    }

    while !state.matches_kind(TokenKind::CloseBrace) {
        if state.eof() {
            gamedata.add_error(origin, "Unexpected end of file in function.");
            return gamedata.add_function(function);
        }
        function.tokens.push(state.here().expect("not eof").clone());
        state.advance();
    }
    state.advance();
    gamedata.add_function(function)
}

/// `[ value … ]`
fn parse_list(gamedata: &mut GameData, state: &mut ParseState) -> i32 {
    let origin = state.origin();
    if let Err(err) = state.skip(TokenKind::OpenSquare) {
        gamedata.report(err);
        return 0;
    }
    let file_string = gamedata.get_string_id(&origin.file);
    let id = gamedata.add_list(GameList {
        origin: origin.clone(),
        file_string,
        global_id: 0,
        items: Vec::new(),
    });

    while !state.matches_kind(TokenKind::CloseSquare) {
        if state.eof() {
            gamedata.add_error(origin, "Unexpected end of file in list.");
            return id as i32;
        }
        let value = parse_value(gamedata, state, "");
        if let Some(list) = gamedata.list_mut(id) {
            list.items.push(value);
        }
    }
    state.advance();
    id as i32
}

/// `{ key : value, … }` (rows separated only by position; no commas).
fn parse_map(gamedata: &mut GameData, state: &mut ParseState) -> i32 {
    let origin = state.origin();
    if let Err(err) = state.skip(TokenKind::OpenBrace) {
        gamedata.report(err);
        return 0;
    }
    let file_string = gamedata.get_string_id(&origin.file);
    let id = gamedata.add_map(GameMap {
        origin: origin.clone(),
        file_string,
        global_id: 0,
        rows: Vec::new(),
    });

    while !state.matches_kind(TokenKind::CloseBrace) {
        if state.eof() {
            gamedata.add_error(origin, "Unexpected end of file in map.");
            return id as i32;
        }
        let key = parse_value(gamedata, state, "");
        let mut value = Value::none();
        match state.skip(TokenKind::Colon) {
            Ok(()) => value = parse_value(gamedata, state, ""),
            Err(err) => gamedata.report(err),
        }
        if let Some(map) = gamedata.map_mut(id) {
            map.rows.push(MapRow { key, value });
        }
    }
    state.advance();
    id as i32
}

/// One `$prop value` pair inside an object body or an object extension.
fn parse_object_property(
    gamedata: &mut GameData,
    state: &mut ParseState,
    object_id: u32,
) -> Result<(), ()> {
    if state.eof() {
        gamedata.add_error(
            state.origin(),
            "Unexpected end of file in object definition.",
        );
        return Err(());
    }
    let token = match state.require(TokenKind::Property) {
        Ok(token) => token,
        Err(err) => {
            gamedata.report(err);
            return Err(());
        }
    };
    let prop_id = token.value as u32;
    let prop_name = token.text.clone();
    let prop_origin = token.origin.clone();
    state.advance();

    if state.eof() {
        gamedata.add_error(prop_origin, "Unexpected end of file in object definition.");
        return Err(());
    }
    let owner_name = gamedata
        .object(object_id)
        .map(|object| object.name.clone())
        .unwrap_or_default();
    let default_name = format!("{}.{}", owner_name, prop_name);
    let value = parse_value(gamedata, state, &default_name);
    let result = match gamedata.object_mut(object_id) {
        Some(object) => object.add_property(prop_origin, prop_id, value),
        None => Ok(()),
    };
    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            gamedata.report(err);
            Err(())
        }
    }
}

/// `object [Name] [: Parent] $prop value … ;` (the `;` is consumed by the
/// caller for nested objects, by this rule at top level).
fn parse_object(gamedata: &mut GameData, state: &mut ParseState, default_name: &str) -> u32 {
    let internal_name_id = gamedata.get_property_id("internal_name");
    let parent_prop_id = gamedata.get_property_id("parent");

    let origin = state.origin();
    state.advance(); // object

    let name = if state.matches_kind(TokenKind::Identifier) {
        let name = state.here().expect("identifier").text.clone();
        state.advance();
        name
    } else {
        default_name.to_string()
    };
    let mut parent_name = String::new();
    if state.matches_kind(TokenKind::Colon) {
        state.advance();
        match state.require(TokenKind::Identifier) {
            Ok(token) => {
                parent_name = token.text.clone();
                state.advance();
            }
            Err(err) => gamedata.report(err),
        }
    }

    let file_string = gamedata.get_string_id(&origin.file);
    let name_string = gamedata.get_string_id(&name);
    let id = gamedata.add_object(GameObject {
        origin: origin.clone(),
        file_string,
        name: name.clone(),
        name_string,
        global_id: 0,
        properties: Vec::new(),
        parent_id: 0,
        child_id: 0,
        sibling_id: 0,
    });

    if !name.is_empty() {
        if quoll_common::text::valid_symbol(&name) {
            if let Err(err) = gamedata.symbols.add(SymbolDef::new(
                origin.clone(),
                name.clone(),
                Value::new(TypeTag::Object, id as i32),
            )) {
                gamedata.report(err);
            }
        }
        let name_value = Value::new(TypeTag::String, name_string as i32);
        if let Some(object) = gamedata.object_mut(id) {
            let _ = object.add_property(origin.clone(), internal_name_id, name_value);
        }
    }
    if !parent_name.is_empty() {
        let result = gamedata
            .object_mut(id)
            .map(|object| {
                object.add_property(origin.clone(), parent_prop_id, Value::symbol(parent_name))
            })
            .unwrap_or(Ok(()));
        if let Err(err) = result {
            gamedata.report(err);
        }
    }

    while !state.matches_kind(TokenKind::Semicolon) && !state.eof() {
        if parse_object_property(gamedata, state, id).is_err() {
            state.skip_to(TokenKind::Semicolon);
            state.advance();
            return id;
        }
    }
    state.advance();
    id
}

/// Parse a single data value; identifiers become `Symbol` placeholders for
/// the translator.
pub fn parse_value(gamedata: &mut GameData, state: &mut ParseState, default_name: &str) -> Value {
    let origin = state.origin();
    if state.eof() {
        gamedata.add_error(origin, "Unexpected end of file.");
        return Value::none();
    }
    if state.matches_text("object") {
        let id = parse_object(gamedata, state, default_name);
        return Value::new(TypeTag::Object, id as i32);
    }
    if state.matches_text("flags") {
        let id = parse_flags(gamedata, state);
        return Value::new(TypeTag::FlagSet, id);
    }
    if state.matches_text("function") || state.matches_text("asm_function") {
        let is_asm = state.matches_text("asm_function");
        let id = parse_function(gamedata, state, default_name, is_asm);
        return Value::new(TypeTag::Function, id as i32);
    }

    let token = state.here().expect("not eof");
    match token.kind {
        TokenKind::Integer => {
            let value = Value::integer(token.value);
            state.advance();
            value
        }
        TokenKind::Property => {
            let value = Value::new(TypeTag::Property, token.value);
            state.advance();
            value
        }
        TokenKind::String => {
            let id = gamedata.get_string_id(&token.text.clone());
            state.advance();
            Value::new(TypeTag::String, id as i32)
        }
        TokenKind::Vocab => {
            let word = token.text.clone();
            state.advance();
            match gamedata.vocab_number(&word) {
                Some(id) => Value::new(TypeTag::Vocab, id as i32),
                None => {
                    gamedata.add_error(origin, format!("Unknown vocab word @{}.", word));
                    Value::none()
                }
            }
        }
        TokenKind::Identifier => {
            let value = Value::symbol(token.text.clone());
            state.advance();
            value
        }
        TokenKind::OpenSquare => {
            let id = parse_list(gamedata, state);
            Value::new(TypeTag::List, id)
        }
        TokenKind::OpenBrace => {
            let id = parse_map(gamedata, state);
            Value::new(TypeTag::Map, id)
        }
        other => {
            gamedata.add_error(origin, format!("Encountered value of invalid type {}.", other));
            state.advance();
            Value::none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_string;

    fn parse(source: &str) -> GameData {
        let mut gamedata = GameData::new();
        crate::translate::add_default_constants(&mut gamedata);
        let tokens = lex_string(&mut gamedata, "test.src", source);
        gamedata.sort_vocab();
        let mut state = ParseState::new(&tokens);
        parse_tokens(&mut gamedata, &mut state);
        gamedata
    }

    #[test]
    fn declares_a_constant() {
        let gamedata = parse("declare MAX_SCORE 100;");
        assert!(!gamedata.has_errors());
        let sym = gamedata.symbols.get("MAX_SCORE").unwrap();
        assert_eq!(sym.value.tag, TypeTag::Integer);
        assert_eq!(sym.value.payload, 100);
    }

    #[test]
    fn parses_an_object_with_properties() {
        let gamedata = parse("object lamp $article \"a\" $weight 5;");
        assert!(!gamedata.has_errors());
        let sym = gamedata.symbols.get("lamp").unwrap();
        assert_eq!(sym.value.tag, TypeTag::Object);
        let object = gamedata.object(sym.value.payload as u32).unwrap();
        // internal_name plus the two declared properties
        assert_eq!(object.properties.len(), 3);
    }

    #[test]
    fn object_parent_is_symbolic() {
        let gamedata = parse("object box;\nobject gem : box;");
        assert!(!gamedata.has_errors());
        let gem = gamedata.symbols.get("gem").unwrap().value.payload as u32;
        let parent_prop = gamedata
            .object(gem)
            .unwrap()
            .properties
            .iter()
            .find(|p| p.value.tag == TypeTag::Symbol)
            .expect("parent property present");
        assert_eq!(parent_prop.value.text, "box");
    }

    #[test]
    fn parses_lists_and_maps() {
        let gamedata = parse("declare stuff [ 1 2 3 ];\ndeclare table { 1 : \"one\" };");
        assert!(!gamedata.has_errors());
        let list = gamedata.symbols.get("stuff").unwrap().value.clone();
        assert_eq!(list.tag, TypeTag::List);
        let items = &gamedata
            .lists
            .get(list.payload as usize)
            .unwrap()
            .as_ref()
            .unwrap()
            .items;
        assert_eq!(items.len(), 3);
        let map = gamedata.symbols.get("table").unwrap().value.clone();
        assert_eq!(map.tag, TypeTag::Map);
    }

    #[test]
    fn nested_lists_get_distinct_ids() {
        let gamedata = parse("declare nested [ [ 1 ] [ 2 ] ];");
        assert!(!gamedata.has_errors());
        // outer plus two inner lists, plus the reserved slot
        assert_eq!(gamedata.lists.len(), 4);
        let outer = gamedata.symbols.get("nested").unwrap().value.payload as usize;
        let items = &gamedata.lists[outer].as_ref().unwrap().items;
        assert!(items.iter().all(|v| v.tag == TypeTag::List));
    }

    #[test]
    fn function_records_args_and_locals() {
        let gamedata = parse("function greet(who : mood) { (say *who) }");
        assert!(!gamedata.has_errors());
        let function = gamedata.function_by_name("greet").unwrap();
        assert_eq!(function.argument_count, 2); // self + who
        assert_eq!(function.local_count, 1);
        assert_eq!(function.locals[0].name, "self");
        assert!(!function.tokens.is_empty());
    }

    #[test]
    fn function_bracket_locals() {
        let gamedata = parse("function f(a) { [ tmp other ] (set *tmp 1) }");
        assert!(!gamedata.has_errors());
        let function = gamedata.function_by_name("f").unwrap();
        assert_eq!(function.argument_count, 2);
        assert_eq!(function.local_count, 2);
    }

    #[test]
    fn typed_argument_annotation() {
        let gamedata = parse("function f(count: Integer) { }");
        assert!(!gamedata.has_errors());
        let function = gamedata.function_by_name("f").unwrap();
        assert_eq!(function.locals[1].declared_type, TypeTag::Integer);
        assert_eq!(function.argument_count, 2);
        assert_eq!(function.local_count, 0);
    }

    #[test]
    fn extend_appends_to_list() {
        let gamedata = parse("declare stuff [ 1 ];\nextend stuff [ 2 3 ];");
        assert!(!gamedata.has_errors());
        let id = gamedata.symbols.get("stuff").unwrap().value.payload as usize;
        assert_eq!(gamedata.lists[id].as_ref().unwrap().items.len(), 3);
    }

    #[test]
    fn extend_type_mismatch_is_error() {
        let gamedata = parse("declare stuff [ 1 ];\nextend stuff { 1 : 2 };");
        assert!(gamedata.has_errors());
    }

    #[test]
    fn extend_unknown_symbol_is_error() {
        let gamedata = parse("extend missing [ 1 ];");
        assert!(gamedata.has_errors());
    }

    #[test]
    fn flags_collect_members() {
        let gamedata = parse("declare doors flags(1 2 locked);");
        assert!(!gamedata.has_errors());
        assert_eq!(gamedata.flagsets.len(), 1);
        assert_eq!(gamedata.flagsets[0].values.len(), 3);
    }

    #[test]
    fn anonymous_top_level_object_warns() {
        let gamedata = parse("object $weight 1;");
        assert!(!gamedata.has_errors());
        assert!(gamedata
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning && d.message.contains("Anonymous object")));
    }

    #[test]
    fn bad_directive_recovers() {
        let gamedata = parse("banana;\ndeclare ok 1;");
        assert!(gamedata.has_errors());
        assert!(gamedata.symbols.get("ok").is_some());
    }

    #[test]
    fn duplicate_property_reports_error() {
        let gamedata = parse("object lamp $weight 1 $weight 2;");
        assert!(gamedata.has_errors());
    }
}
