//! Runtime game data: the decoded arenas plus dynamic entries created
//! while the game runs.

use crate::error::VmError;
use quoll_common::{ByteStream, TypeTag, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `src_file` marker: entry has no debug information.
pub const SRC_NONE: i32 = -1;
/// `src_file` marker: entry was created at runtime.
pub const SRC_DYNAMIC: i32 = -2;

/// Bookkeeping shared by every arena entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInfo {
    pub ident: u32,
    pub src_file: i32,
    pub src_line: i32,
    pub src_name: i32,
    pub marked: bool,
}

impl Default for ItemInfo {
    fn default() -> Self {
        ItemInfo {
            ident: 0,
            src_file: SRC_NONE,
            src_line: SRC_NONE,
            src_name: SRC_NONE,
            marked: false,
        }
    }
}

impl ItemInfo {
    pub fn dynamic(ident: u32) -> Self {
        ItemInfo {
            ident,
            src_file: SRC_DYNAMIC,
            ..ItemInfo::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StringItem {
    pub info: ItemInfo,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListItem {
    pub info: ItemInfo,
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapRow {
    pub key: Value,
    pub value: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapItem {
    pub info: ItemInfo,
    pub rows: Vec<MapRow>,
}

impl MapItem {
    pub fn get(&self, key: &Value) -> Value {
        self.rows
            .iter()
            .find(|row| row.key == *key)
            .map(|row| row.value)
            .unwrap_or_else(|| Value::integer(0))
    }

    pub fn has(&self, key: &Value) -> bool {
        self.rows.iter().any(|row| row.key == *key)
    }

    pub fn set(&mut self, key: Value, value: Value) {
        for row in self.rows.iter_mut() {
            if row.key == key {
                row.value = value;
                return;
            }
        }
        self.rows.push(MapRow { key, value });
    }

    pub fn del(&mut self, key: &Value) {
        self.rows.retain(|row| row.key != *key);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectItem {
    pub info: ItemInfo,
    pub properties: BTreeMap<u32, Value>,
    pub parent: u32,
    pub child: u32,
    pub sibling: u32,
}

impl ObjectItem {
    /// Property read; stamps the owning object into `self_obj` so calling
    /// the value later threads `self` correctly.
    pub fn get(&self, prop_id: u32) -> Value {
        match self.properties.get(&prop_id) {
            Some(value) => {
                let mut result = *value;
                result.self_obj = self.info.ident;
                result
            }
            None => Value::integer(0),
        }
    }

    pub fn has(&self, prop_id: u32) -> bool {
        self.properties.contains_key(&prop_id)
    }

    pub fn set(&mut self, prop_id: u32, value: Value) {
        self.properties.insert(prop_id, value);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionItem {
    pub info: ItemInfo,
    pub arg_count: u16,
    pub local_count: u16,
    pub declared_types: Vec<TypeTag>,
    pub position: u32,
}

/// The decoded gamefile plus runtime growth. Arena indices 1 and up are
/// live entries; index 0 of lists/maps/objects/functions is a null
/// sentinel. Entries below the `static_*` boundaries came from the
/// gamefile and are never collected.
#[derive(Debug, Default)]
pub struct GameData {
    pub main_function: u32,
    pub title_string: u32,
    pub author_string: u32,
    pub version: i32,
    pub gameid_string: u32,
    pub build_number: u32,

    pub strings: Vec<StringItem>,
    pub vocab: Vec<String>,
    pub lists: Vec<ListItem>,
    pub maps: Vec<MapItem>,
    pub objects: Vec<ObjectItem>,
    pub functions: Vec<FunctionItem>,
    pub bytecode: ByteStream,

    pub static_strings: u32,
    pub static_lists: u32,
    pub static_maps: u32,
    pub static_objects: u32,
}

impl GameData {
    pub fn string(&self, id: i32) -> Result<&StringItem, VmError> {
        self.strings
            .get(usize::try_from(id).map_err(|_| bad("string", id))?)
            .ok_or_else(|| bad("string", id))
    }

    pub fn string_mut(&mut self, id: i32) -> Result<&mut StringItem, VmError> {
        self.strings
            .get_mut(usize::try_from(id).map_err(|_| bad("string", id))?)
            .ok_or_else(|| bad("string", id))
    }

    pub fn list(&self, id: i32) -> Result<&ListItem, VmError> {
        arena_get(&self.lists, id, "list")
    }

    pub fn list_mut(&mut self, id: i32) -> Result<&mut ListItem, VmError> {
        arena_get_mut(&mut self.lists, id, "list")
    }

    pub fn map(&self, id: i32) -> Result<&MapItem, VmError> {
        arena_get(&self.maps, id, "map")
    }

    pub fn map_mut(&mut self, id: i32) -> Result<&mut MapItem, VmError> {
        arena_get_mut(&mut self.maps, id, "map")
    }

    pub fn object(&self, id: i32) -> Result<&ObjectItem, VmError> {
        arena_get(&self.objects, id, "object")
    }

    pub fn object_mut(&mut self, id: i32) -> Result<&mut ObjectItem, VmError> {
        arena_get_mut(&mut self.objects, id, "object")
    }

    pub fn function(&self, id: i32) -> Result<&FunctionItem, VmError> {
        arena_get(&self.functions, id, "function")
    }

    pub fn game_id(&self) -> &str {
        self.strings
            .get(self.gameid_string as usize)
            .map(|s| s.text.as_str())
            .unwrap_or("")
    }

    /// Append a fresh dynamic string and return its value.
    pub fn make_string(&mut self, text: impl Into<String>) -> Value {
        let ident = self.strings.len() as u32;
        self.strings.push(StringItem {
            info: ItemInfo::dynamic(ident),
            text: text.into(),
        });
        Value::new(TypeTag::String, ident as i32)
    }

    /// Create a fresh dynamic entry of the given kind.
    pub fn make_new(&mut self, type_id: TypeTag) -> Result<Value, VmError> {
        match type_id {
            TypeTag::String => Ok(self.make_string(String::new())),
            TypeTag::List => {
                let ident = self.lists.len() as u32;
                self.lists.push(ListItem {
                    info: ItemInfo::dynamic(ident),
                    items: Vec::new(),
                });
                Ok(Value::new(TypeTag::List, ident as i32))
            }
            TypeTag::Map => {
                let ident = self.maps.len() as u32;
                self.maps.push(MapItem {
                    info: ItemInfo::dynamic(ident),
                    rows: Vec::new(),
                });
                Ok(Value::new(TypeTag::Map, ident as i32))
            }
            TypeTag::Object => {
                let ident = self.objects.len() as u32;
                self.objects.push(ObjectItem {
                    info: ItemInfo::dynamic(ident),
                    ..ObjectItem::default()
                });
                Ok(Value::new(TypeTag::Object, ident as i32))
            }
            other => Err(VmError::game(format!(
                "Cannot create new value of type {}.",
                other
            ))),
        }
    }

    /// True when the value's referent was loaded from the gamefile.
    pub fn is_static(&self, value: &Value) -> bool {
        match value.tag {
            TypeTag::String => (value.payload as u32) < self.static_strings,
            TypeTag::List => value.payload as u32 <= self.static_lists,
            TypeTag::Map => value.payload as u32 <= self.static_maps,
            TypeTag::Object => value.payload as u32 <= self.static_objects,
            _ => true,
        }
    }

    /// Source description for a value: `"name" file:line`, `no debug
    /// info`, `dynamic`, or empty for unlocated kinds.
    pub fn source_of(&self, value: &Value) -> String {
        let info = match value.tag {
            TypeTag::List => self.list(value.payload).map(|v| v.info.clone()),
            TypeTag::Map => self.map(value.payload).map(|v| v.info.clone()),
            TypeTag::Object => self.object(value.payload).map(|v| v.info.clone()),
            TypeTag::Function => self.function(value.payload).map(|v| v.info.clone()),
            _ => return String::new(),
        };
        let info = match info {
            Ok(info) => info,
            Err(_) => return String::new(),
        };
        if info.src_file == SRC_NONE {
            return "no debug info".to_string();
        }
        if info.src_file == SRC_DYNAMIC {
            return "dynamic".to_string();
        }
        let mut text = String::new();
        if info.src_name >= 0 {
            if let Ok(name) = self.string(info.src_name) {
                text.push_str(&format!("\"{}\" ", name.text));
            }
        }
        if let Ok(file) = self.string(info.src_file) {
            text.push_str(&file.text);
            if info.src_line >= 0 {
                text.push_str(&format!(":{}", info.src_line));
            }
        }
        text
    }
}

fn bad(kind: &'static str, index: i32) -> VmError {
    VmError::BadIndex { kind, index }
}

fn arena_get<'a, T>(arena: &'a [T], id: i32, kind: &'static str) -> Result<&'a T, VmError> {
    if id < 1 {
        return Err(bad(kind, id));
    }
    arena.get(id as usize).ok_or_else(|| bad(kind, id))
}

fn arena_get_mut<'a, T>(
    arena: &'a mut [T],
    id: i32,
    kind: &'static str,
) -> Result<&'a mut T, VmError> {
    if id < 1 {
        return Err(bad(kind, id));
    }
    arena.get_mut(id as usize).ok_or_else(|| bad(kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_index_zero_is_invalid() {
        let mut gamedata = GameData::default();
        gamedata.lists.push(ListItem::default());
        assert!(gamedata.list(0).is_err());
        assert!(gamedata.list(-3).is_err());
        assert!(gamedata.list(1).is_err());
    }

    #[test]
    fn property_reads_stamp_self() {
        let mut object = ObjectItem::default();
        object.info.ident = 4;
        object.set(2, Value::new(TypeTag::Function, 9));
        let value = object.get(2);
        assert_eq!(value.self_obj, 4);
        assert_eq!(object.get(99), Value::integer(0));
    }

    #[test]
    fn map_rows_upsert() {
        let mut map = MapItem::default();
        map.set(Value::integer(1), Value::integer(10));
        map.set(Value::integer(1), Value::integer(20));
        assert_eq!(map.rows.len(), 1);
        assert_eq!(map.get(&Value::integer(1)), Value::integer(20));
        map.del(&Value::integer(1));
        assert!(!map.has(&Value::integer(1)));
    }

    #[test]
    fn dynamic_entries_are_not_static() {
        let mut gamedata = GameData::default();
        gamedata.strings.push(StringItem::default());
        gamedata.static_strings = 1;
        let value = gamedata.make_string("fresh");
        assert!(!gamedata.is_static(&value));
        let list = gamedata.make_new(TypeTag::List).unwrap();
        assert_eq!(gamedata.source_of(&list), "dynamic");
    }
}
