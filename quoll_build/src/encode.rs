//! Gamefile encoding.
//!
//! Writes the versioned binary layout: a fixed 64-byte header, then the
//! string, vocab, list, map, object, function, and bytecode sections, in
//! that order. Strings are stored XOR-obfuscated. Output is deterministic
//! for a given game data and build timestamp.

use crate::gamedata::GameData;
use quoll_common::gamefile::{FILETYPE_ID, FORMAT_VERSION, STRING_XOR_KEY};
use quoll_common::{ByteStream, Origin, TypeTag};

fn write_str(out: &mut ByteStream, text: &str) {
    let bytes = text.as_bytes();
    out.add_16(bytes.len() as u16);
    for byte in bytes {
        out.add_8(byte ^ STRING_XOR_KEY);
    }
}

/// Write a required header symbol, or report why it cannot be written.
fn write_symbol(
    out: &mut ByteStream,
    gamedata: &mut GameData,
    name: &str,
    required: TypeTag,
) {
    let payload = match gamedata.symbols.get(name) {
        None => {
            gamedata.add_error(Origin::none(), format!("Symbol {} not defined.", name));
            0
        }
        Some(sym) if sym.value.tag != required => {
            let message = format!("Symbol {} must be {}.", name, required);
            gamedata.add_error(Origin::none(), message);
            0
        }
        Some(sym) => sym.value.payload,
    };
    out.add_32(payload as u32);
}

/// Encode the whole gamefile. The caller supplies the build timestamp so
/// byte-for-byte reproducible output is possible.
pub fn generate(gamedata: &mut GameData, build_number: u32) -> Vec<u8> {
    let mut out = ByteStream::new();

    // header
    out.add_32(FILETYPE_ID);
    out.add_32(FORMAT_VERSION);
    write_symbol(&mut out, gamedata, "main", TypeTag::Function);
    out.add_32(0); // gamefile flags, reserved
    write_symbol(&mut out, gamedata, "TITLE", TypeTag::String);
    write_symbol(&mut out, gamedata, "AUTHOR", TypeTag::String);
    write_symbol(&mut out, gamedata, "VERSION", TypeTag::Integer);
    write_symbol(&mut out, gamedata, "GAMEID", TypeTag::String);
    out.add_32(build_number);
    while out.size() < quoll_common::gamefile::HEADER_SIZE {
        out.add_32(0);
    }

    // strings
    out.add_32(gamedata.string_table.len() as u32);
    for text in &gamedata.string_table {
        write_str(&mut out, text);
    }

    // vocab, lexicographically sorted during the lex phase
    out.add_32(gamedata.vocab.len() as u32);
    for word in &gamedata.vocab {
        write_str(&mut out, word);
    }

    // lists
    out.add_32((gamedata.lists.len() - 1) as u32);
    for list in gamedata.lists.iter().flatten() {
        out.add_32(list.file_string);
        out.add_32(list.origin.line);
        out.add_32(list.global_id);
        out.add_16(list.items.len() as u16);
        for item in &list.items {
            out.add_8(item.tag as u8);
            out.add_32(item.payload as u32);
        }
    }

    // maps
    out.add_32((gamedata.maps.len() - 1) as u32);
    for map in gamedata.maps.iter().flatten() {
        out.add_32(map.file_string);
        out.add_32(map.origin.line);
        out.add_32(map.global_id);
        out.add_16(map.rows.len() as u16);
        for row in &map.rows {
            out.add_8(row.key.tag as u8);
            out.add_32(row.key.payload as u32);
            out.add_8(row.value.tag as u8);
            out.add_32(row.value.payload as u32);
        }
    }

    // objects
    out.add_32((gamedata.objects.len() - 1) as u32);
    for object in gamedata.objects.iter().flatten() {
        out.add_32(object.name_string);
        out.add_32(object.file_string);
        out.add_32(object.origin.line);
        out.add_32(object.global_id);
        out.add_32(object.parent_id);
        out.add_32(object.child_id);
        out.add_32(object.sibling_id);
        out.add_16(object.properties.len() as u16);
        for property in &object.properties {
            out.add_16(property.id as u16);
            out.add_8(property.value.tag as u8);
            out.add_32(property.value.payload as u32);
        }
    }

    // function headers
    out.add_32((gamedata.functions.len() - 1) as u32);
    for function in gamedata.functions.iter().flatten() {
        out.add_32(function.name_string);
        out.add_32(function.file_string);
        out.add_32(function.origin.line);
        out.add_32(function.global_id);
        out.add_16(function.argument_count);
        out.add_16(function.local_count);
        for local in &function.locals {
            out.add_8(local.declared_type as u8);
        }
        out.add_32(function.code_position);
    }

    // bytecode
    out.add_32(gamedata.bytecode.size() as u32);
    out.append(&gamedata.bytecode);

    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamedata::SymbolDef;
    use crate::value::Value;

    fn minimal_gamedata() -> GameData {
        let mut gamedata = GameData::new();
        crate::translate::add_default_constants(&mut gamedata);
        let title = gamedata.get_string_id("Test Game");
        let author = gamedata.get_string_id("Nobody");
        let gameid = gamedata.get_string_id("TEST-GAME");
        let mut add = |name: &str, tag: TypeTag, payload: i32| {
            gamedata
                .symbols
                .add(SymbolDef::new(Origin::none(), name, Value::new(tag, payload)))
                .unwrap();
        };
        add("TITLE", TypeTag::String, title as i32);
        add("AUTHOR", TypeTag::String, author as i32);
        add("VERSION", TypeTag::Integer, 7);
        add("GAMEID", TypeTag::String, gameid as i32);
        add("main", TypeTag::Function, 1);
        gamedata
    }

    #[test]
    fn header_layout() {
        let mut gamedata = minimal_gamedata();
        let bytes = generate(&mut gamedata, 12345);
        assert!(!gamedata.has_errors());
        let stream = ByteStream::from_bytes(bytes);
        assert_eq!(stream.read_32(0), Some(FILETYPE_ID));
        assert_eq!(stream.read_32(4), Some(0));
        assert_eq!(stream.read_32(8), Some(1)); // main function id
        assert_eq!(stream.read_32(12), Some(0));
        assert_eq!(stream.read_32(24), Some(7)); // VERSION
        assert_eq!(stream.read_32(32), Some(12345)); // build number
        for at in (36..64).step_by(4) {
            assert_eq!(stream.read_32(at), Some(0));
        }
    }

    #[test]
    fn strings_are_obfuscated() {
        let mut gamedata = minimal_gamedata();
        let bytes = generate(&mut gamedata, 0);
        let stream = ByteStream::from_bytes(bytes);
        // first section: string count then the reserved empty string
        let count = stream.read_32(64).unwrap();
        assert_eq!(count as usize, gamedata.string_table.len());
        assert_eq!(stream.read_16(68), Some(0)); // reserved entry is empty
        // the next string is "Test Game", XOR'd
        let len = stream.read_16(70).unwrap() as usize;
        assert_eq!(len, "Test Game".len());
        let first = stream.read_8(72).unwrap();
        assert_eq!(first ^ STRING_XOR_KEY, b'T');
    }

    #[test]
    fn missing_required_symbol_is_error() {
        let mut gamedata = GameData::new();
        crate::translate::add_default_constants(&mut gamedata);
        let _ = generate(&mut gamedata, 0);
        assert!(gamedata.has_errors());
        assert!(gamedata
            .diagnostics
            .iter()
            .any(|d| d.message.contains("TITLE")));
    }

    #[test]
    fn output_is_deterministic() {
        let mut a = minimal_gamedata();
        let mut b = minimal_gamedata();
        assert_eq!(generate(&mut a, 999), generate(&mut b, 999));
    }
}
