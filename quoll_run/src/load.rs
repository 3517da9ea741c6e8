//! Gamefile decoding: the inverse of the encoder, filling the runtime
//! arenas and recording the static-entry boundaries.

use crate::error::LoadError;
use crate::gamedata::{
    FunctionItem, GameData, ItemInfo, ListItem, MapItem, MapRow, ObjectItem, StringItem,
};
use quoll_common::gamefile::{FILETYPE_ID, HEADER_SIZE, STRING_XOR_KEY};
use quoll_common::{ByteStream, TypeTag, Value};

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    fn read_u8(&mut self) -> Result<u8, LoadError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(LoadError::Truncated(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> Result<u16, LoadError> {
        let bytes = self
            .data
            .get(self.pos..self.pos + 2)
            .ok_or(LoadError::Truncated(self.pos))?;
        self.pos += 2;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, LoadError> {
        let bytes = self
            .data
            .get(self.pos..self.pos + 4)
            .ok_or(LoadError::Truncated(self.pos))?;
        self.pos += 4;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_str(&mut self) -> Result<String, LoadError> {
        let length = self.read_u16()? as usize;
        let mut bytes = Vec::with_capacity(length);
        for _ in 0..length {
            bytes.push(self.read_u8()? ^ STRING_XOR_KEY);
        }
        String::from_utf8(bytes).map_err(|_| LoadError::BadString)
    }

    fn read_tag(&mut self) -> Result<TypeTag, LoadError> {
        let byte = self.read_u8()?;
        TypeTag::try_from(byte).map_err(|_| LoadError::BadTag(byte))
    }

    fn read_value(&mut self) -> Result<Value, LoadError> {
        let tag = self.read_tag()?;
        let payload = self.read_u32()? as i32;
        Ok(Value::new(tag, payload))
    }
}

/// Decode a gamefile into runtime game data.
pub fn load_gamefile(bytes: &[u8]) -> Result<GameData, LoadError> {
    let mut reader = Reader::new(bytes);
    if reader.read_u32()? != FILETYPE_ID {
        return Err(LoadError::NotAGamefile);
    }
    let version = reader.read_u32()?;
    if version != 0 {
        return Err(LoadError::UnsupportedVersion(version));
    }

    let mut gamedata = GameData::default();
    gamedata.main_function = reader.read_u32()?;
    let _flags = reader.read_u32()?;
    gamedata.title_string = reader.read_u32()?;
    gamedata.author_string = reader.read_u32()?;
    gamedata.version = reader.read_u32()? as i32;
    gamedata.gameid_string = reader.read_u32()?;
    gamedata.build_number = reader.read_u32()?;
    reader.pos = HEADER_SIZE;
    if bytes.len() < HEADER_SIZE {
        return Err(LoadError::Truncated(bytes.len()));
    }

    // strings
    gamedata.static_strings = reader.read_u32()?;
    for ident in 0..gamedata.static_strings {
        let text = reader.read_str()?;
        gamedata.strings.push(StringItem {
            info: ItemInfo {
                ident,
                ..ItemInfo::default()
            },
            text,
        });
    }

    // vocab
    let vocab_count = reader.read_u32()?;
    for _ in 0..vocab_count {
        let word = reader.read_str()?;
        gamedata.vocab.push(word);
    }

    // lists
    gamedata.lists.push(ListItem::default());
    gamedata.static_lists = reader.read_u32()?;
    for ident in 0..gamedata.static_lists {
        let mut info = ItemInfo::default();
        info.ident = ident + 1;
        info.src_file = reader.read_u32()? as i32;
        info.src_line = reader.read_u32()? as i32;
        let _global_id = reader.read_u32()?;
        let item_count = reader.read_u16()?;
        let mut items = Vec::with_capacity(item_count as usize);
        for _ in 0..item_count {
            items.push(reader.read_value()?);
        }
        gamedata.lists.push(ListItem { info, items });
    }

    // maps
    gamedata.maps.push(MapItem::default());
    gamedata.static_maps = reader.read_u32()?;
    for ident in 0..gamedata.static_maps {
        let mut info = ItemInfo::default();
        info.ident = ident + 1;
        info.src_file = reader.read_u32()? as i32;
        info.src_line = reader.read_u32()? as i32;
        let _global_id = reader.read_u32()?;
        let row_count = reader.read_u16()?;
        let mut rows = Vec::with_capacity(row_count as usize);
        for _ in 0..row_count {
            let key = reader.read_value()?;
            let value = reader.read_value()?;
            rows.push(MapRow { key, value });
        }
        gamedata.maps.push(MapItem { info, rows });
    }

    // objects
    gamedata.objects.push(ObjectItem::default());
    gamedata.static_objects = reader.read_u32()?;
    for ident in 0..gamedata.static_objects {
        let mut object = ObjectItem::default();
        object.info.ident = ident + 1;
        object.info.src_name = reader.read_u32()? as i32;
        object.info.src_file = reader.read_u32()? as i32;
        object.info.src_line = reader.read_u32()? as i32;
        let _global_id = reader.read_u32()?;
        object.parent = reader.read_u32()?;
        object.child = reader.read_u32()?;
        object.sibling = reader.read_u32()?;
        let prop_count = reader.read_u16()?;
        for _ in 0..prop_count {
            let prop_id = reader.read_u16()? as u32;
            let value = reader.read_value()?;
            object.properties.insert(prop_id, value);
        }
        gamedata.objects.push(object);
    }

    // function headers
    gamedata.functions.push(FunctionItem::default());
    let function_count = reader.read_u32()?;
    for ident in 0..function_count {
        let mut function = FunctionItem::default();
        function.info.ident = ident + 1;
        function.info.src_name = reader.read_u32()? as i32;
        function.info.src_file = reader.read_u32()? as i32;
        function.info.src_line = reader.read_u32()? as i32;
        let _global_id = reader.read_u32()?;
        function.arg_count = reader.read_u16()?;
        function.local_count = reader.read_u16()?;
        let total = function.arg_count as usize + function.local_count as usize;
        for _ in 0..total {
            function.declared_types.push(reader.read_tag()?);
        }
        function.position = reader.read_u32()?;
        gamedata.functions.push(function);
    }

    // bytecode
    let byte_count = reader.read_u32()? as usize;
    let mut code = Vec::with_capacity(byte_count);
    for _ in 0..byte_count {
        code.push(reader.read_u8()?);
    }
    gamedata.bytecode = ByteStream::from_bytes(code);

    if reader.pos != bytes.len() {
        return Err(LoadError::TrailingData);
    }
    log::debug!(
        "loaded gamefile: {} strings, {} objects, {} functions, {} bytes of code",
        gamedata.static_strings,
        gamedata.static_objects,
        function_count,
        byte_count
    );
    Ok(gamedata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        assert!(matches!(
            load_gamefile(&[0, 1, 2, 3, 4, 5, 6, 7]),
            Err(LoadError::NotAGamefile)
        ));
    }

    #[test]
    fn rejects_future_versions() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&FILETYPE_ID.to_le_bytes());
        bytes.extend_from_slice(&9u32.to_le_bytes());
        assert!(matches!(
            load_gamefile(&bytes),
            Err(LoadError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn rejects_truncated_header() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&FILETYPE_ID.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            load_gamefile(&bytes),
            Err(LoadError::Truncated(_))
        ));
    }
}
