//! Gamefile round-trip: what the encoder writes, the decoder reads back
//! structurally intact.

use quoll_build::expression::compile_functions;
use quoll_build::parsing::{parse_tokens, ParseState};
use quoll_build::{encode, lexer, translate, GameData};

const SOURCE: &str = "declare TITLE \"Round Trip\";\n\
                      declare AUTHOR \"Tester\";\n\
                      declare VERSION 3;\n\
                      declare GAMEID \"ROUND-TRIP\";\n\
                      declare numbers [ 1 2 3 ];\n\
                      declare names { 1 : \"one\" };\n\
                      declare words [ @go @look ];\n\
                      object room $ident 7;\n\
                      object lamp : room $weight 5;\n\
                      function helper(a b) { (add *a *b) }\n\
                      function main() { (print (helper 1 2)) }\n";

/// Run every compiler phase by hand so the build-side game data stays
/// available for comparison.
fn compile_keeping_gamedata(timestamp: u32) -> (GameData, Vec<u8>) {
    let mut gamedata = GameData::new();
    translate::add_default_constants(&mut gamedata);
    let tokens = lexer::lex_string(&mut gamedata, "round.src", SOURCE);
    gamedata.sort_vocab();
    let mut state = ParseState::new(&tokens);
    parse_tokens(&mut gamedata, &mut state);
    translate::translate_symbols(&mut gamedata);
    gamedata.organize();
    gamedata.check_object_idents();
    compile_functions(&mut gamedata);
    let bytes = encode::generate(&mut gamedata, timestamp);
    assert!(!gamedata.has_errors(), "{:?}", gamedata.diagnostics);
    (gamedata, bytes)
}

#[test]
fn encode_then_decode_preserves_structure() {
    let (built, bytes) = compile_keeping_gamedata(777);
    let loaded = quoll_run::load_gamefile(&bytes).unwrap();

    assert_eq!(loaded.build_number, 777);
    assert_eq!(loaded.version, 3);
    assert_eq!(
        loaded.static_strings as usize,
        built.string_table.len()
    );
    for (at, text) in built.string_table.iter().enumerate() {
        assert_eq!(&loaded.strings[at].text, text);
    }

    assert_eq!(loaded.vocab, built.vocab);
    assert_eq!(loaded.static_lists as usize, built.lists.len() - 1);
    assert_eq!(loaded.static_maps as usize, built.maps.len() - 1);
    assert_eq!(loaded.static_objects as usize, built.objects.len() - 1);
    assert_eq!(loaded.functions.len(), built.functions.len());

    for list in built.lists.iter().flatten() {
        let decoded = loaded.list(list.global_id as i32).unwrap();
        assert_eq!(decoded.items.len(), list.items.len());
        for (decoded_item, built_item) in decoded.items.iter().zip(&list.items) {
            assert_eq!(decoded_item.tag, built_item.tag);
            assert_eq!(decoded_item.payload, built_item.payload);
        }
    }

    for map in built.maps.iter().flatten() {
        let decoded = loaded.map(map.global_id as i32).unwrap();
        assert_eq!(decoded.rows.len(), map.rows.len());
    }

    for object in built.objects.iter().flatten() {
        let decoded = loaded.object(object.global_id as i32).unwrap();
        assert_eq!(decoded.properties.len(), object.properties.len());
        assert_eq!(decoded.parent, object.parent_id);
        assert_eq!(decoded.child, object.child_id);
        assert_eq!(decoded.sibling, object.sibling_id);
        for property in &object.properties {
            let read_back = decoded.properties.get(&property.id).unwrap();
            assert_eq!(read_back.tag, property.value.tag);
            assert_eq!(read_back.payload, property.value.payload);
        }
    }

    for function in built.functions.iter().flatten() {
        let decoded = loaded.function(function.global_id as i32).unwrap();
        assert_eq!(decoded.arg_count, function.argument_count);
        assert_eq!(decoded.local_count, function.local_count);
        assert_eq!(decoded.position, function.code_position);
        assert_eq!(
            decoded.declared_types.len(),
            function.locals.len()
        );
    }

    assert_eq!(loaded.bytecode.as_slice(), built.bytecode.as_slice());
    assert_eq!(loaded.main_function as i32, {
        built.symbols.get("main").unwrap().value.payload
    });
}

#[test]
fn timestamp_is_the_only_difference() {
    let (_, a) = compile_keeping_gamedata(1);
    let (_, b) = compile_keeping_gamedata(2);
    assert_eq!(a.len(), b.len());
    let differing: Vec<usize> = a
        .iter()
        .zip(b.iter())
        .enumerate()
        .filter(|(_, (x, y))| x != y)
        .map(|(at, _)| at)
        .collect();
    // only the build-number word at offset 32 differs
    assert!(differing.iter().all(|at| (32..36).contains(at)));
    assert!(!differing.is_empty());
}

#[test]
fn code_positions_stay_four_byte_aligned() {
    let (_, bytes) = compile_keeping_gamedata(5);
    let loaded = quoll_run::load_gamefile(&bytes).unwrap();
    for function in loaded.functions.iter().skip(1) {
        assert_eq!(function.position % 4, 0);
    }
}

#[test]
fn no_symbol_tags_survive_into_the_gamefile() {
    let (built, _) = compile_keeping_gamedata(5);
    let all_values = built
        .lists
        .iter()
        .flatten()
        .flat_map(|l| l.items.iter())
        .chain(
            built
                .objects
                .iter()
                .flatten()
                .flat_map(|o| o.properties.iter().map(|p| &p.value)),
        );
    for value in all_values {
        assert!(!value.tag.is_compile_only(), "leaked {}", value.tag);
    }
}
