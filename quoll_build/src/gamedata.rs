//! Compile-time game data: symbol tables, interning tables, and the arenas
//! every declaration lands in.

use crate::error::{BuildError, Diagnostic, Severity};
use crate::token::Token;
use crate::value::Value;
use quoll_common::opcode::Opcode;
use quoll_common::{ByteStream, Origin, TypeTag};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SymbolDef {
    pub origin: Origin,
    pub name: String,
    pub value: Value,
    pub uses: u32,
}

impl SymbolDef {
    pub fn new(origin: Origin, name: impl Into<String>, value: Value) -> Self {
        SymbolDef {
            origin,
            name: name.into(),
            value,
            uses: 0,
        }
    }

    pub fn used(origin: Origin, name: impl Into<String>, value: Value) -> Self {
        SymbolDef {
            uses: 1,
            ..SymbolDef::new(origin, name, value)
        }
    }
}

/// Append-only name table. Lookups optionally count as uses so the final
/// unused-symbol sweep has something to report on.
#[derive(Debug, Default)]
pub struct SymbolTable {
    pub symbols: Vec<SymbolDef>,
}

impl SymbolTable {
    pub fn add(&mut self, symbol: SymbolDef) -> Result<(), BuildError> {
        if let Some(existing) = self.get(&symbol.name) {
            return Err(BuildError::new(
                symbol.origin,
                format!(
                    "Symbol ~{}~ already defined at {}.",
                    symbol.name, existing.origin
                ),
            ));
        }
        self.symbols.push(symbol);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SymbolDef> {
        self.symbols.iter().find(|sym| sym.name == name)
    }

    /// Look up a symbol's value, optionally recording the use.
    pub fn lookup(&mut self, name: &str, counts_as_use: bool) -> Option<Value> {
        let sym = self.symbols.iter_mut().find(|sym| sym.name == name)?;
        if counts_as_use {
            sym.uses += 1;
        }
        Some(sym.value.clone())
    }

    pub fn mark_used(&mut self, name: &str) {
        if let Some(sym) = self.symbols.iter_mut().find(|sym| sym.name == name) {
            sym.uses += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameProperty {
    pub origin: Origin,
    pub id: u32,
    pub value: Value,
}

#[derive(Debug)]
pub struct GameObject {
    pub origin: Origin,
    pub file_string: u32,
    pub name: String,
    pub name_string: u32,
    pub global_id: u32,
    pub properties: Vec<GameProperty>,
    pub parent_id: u32,
    pub child_id: u32,
    pub sibling_id: u32,
}

impl GameObject {
    pub fn add_property(
        &mut self,
        origin: Origin,
        id: u32,
        value: Value,
    ) -> Result<(), BuildError> {
        if self.get_property(id).is_some() {
            return Err(BuildError::new(origin, "Duplicate property on object."));
        }
        self.properties.push(GameProperty { origin, id, value });
        Ok(())
    }

    pub fn get_property(&self, id: u32) -> Option<&GameProperty> {
        self.properties.iter().find(|prop| prop.id == id)
    }
}

#[derive(Debug)]
pub struct GameList {
    pub origin: Origin,
    pub file_string: u32,
    pub global_id: u32,
    pub items: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct MapRow {
    pub key: Value,
    pub value: Value,
}

#[derive(Debug)]
pub struct GameMap {
    pub origin: Origin,
    pub file_string: u32,
    pub global_id: u32,
    pub rows: Vec<MapRow>,
}

#[derive(Debug)]
pub struct FlagSet {
    pub origin: Origin,
    pub values: Vec<Value>,
    pub final_value: u32,
}

#[derive(Debug, Clone)]
pub struct LocalDef {
    pub name: String,
    pub declared_type: TypeTag,
    pub reads: u32,
}

/// One line of pending function code: a label definition, a raw opcode, or
/// a value push.
#[derive(Debug, Clone)]
pub enum AsmLine {
    Label { origin: Origin, name: String },
    Op { origin: Origin, opcode: Opcode },
    Value { origin: Origin, value: Value },
}

#[derive(Debug)]
pub struct FunctionDef {
    pub origin: Origin,
    pub file_string: u32,
    pub name: String,
    pub name_string: u32,
    pub global_id: u32,
    pub argument_count: u16,
    pub local_count: u16,
    pub locals: Vec<LocalDef>,
    pub labels: HashMap<String, u32>,
    pub tokens: Vec<Token>,
    pub code: ByteStream,
    pub code_position: u32,
    pub is_asm: bool,
    pub asm_code: Vec<AsmLine>,
    pub next_label: u32,
    pub continue_labels: Vec<String>,
    pub break_labels: Vec<String>,
}

impl FunctionDef {
    pub fn new(origin: Origin, file_string: u32, name: String, name_string: u32) -> Self {
        FunctionDef {
            origin,
            file_string,
            name,
            name_string,
            global_id: 0,
            argument_count: 0,
            local_count: 0,
            locals: Vec::new(),
            labels: HashMap::new(),
            tokens: Vec::new(),
            code: ByteStream::new(),
            code_position: 0,
            is_asm: false,
            asm_code: Vec::new(),
            next_label: 1,
            continue_labels: Vec::new(),
            break_labels: Vec::new(),
        }
    }

    pub fn add_label(&mut self, origin: Origin, name: impl Into<String>) {
        self.asm_code.push(AsmLine::Label {
            origin,
            name: name.into(),
        });
    }

    pub fn add_opcode(&mut self, origin: Origin, opcode: Opcode) {
        self.asm_code.push(AsmLine::Op { origin, opcode });
    }

    pub fn add_value(&mut self, origin: Origin, value: Value) {
        self.asm_code.push(AsmLine::Value { origin, value });
    }

    pub fn add_local(&mut self, name: impl Into<String>, declared_type: TypeTag, always_used: bool) {
        self.locals.push(LocalDef {
            name: name.into(),
            declared_type,
            reads: if always_used { 1 } else { 0 },
        });
    }

    pub fn local_number(&self, name: &str) -> Option<u32> {
        self.locals
            .iter()
            .position(|local| local.name == name)
            .map(|n| n as u32)
    }

    /// Make a fresh `__label_<N>` name unique within this function.
    pub fn fresh_label(&mut self) -> String {
        let label = format!("__label_{}", self.next_label);
        self.next_label += 1;
        label
    }
}

/// Everything the compiler accumulates between the first lexed token and
/// the encoded gamefile.
#[derive(Debug, Default)]
pub struct GameData {
    pub symbols: SymbolTable,
    pub defaults: SymbolTable,
    pub objects: Vec<Option<GameObject>>,
    pub lists: Vec<Option<GameList>>,
    pub maps: Vec<Option<GameMap>>,
    pub functions: Vec<Option<FunctionDef>>,
    pub flagsets: Vec<FlagSet>,
    pub property_names: Vec<String>,
    pub string_table: Vec<String>,
    pub vocab: Vec<String>,
    pub bytecode: ByteStream,
    pub diagnostics: Vec<Diagnostic>,
    error_count: u32,
}

impl GameData {
    pub fn new() -> Self {
        let mut gamedata = GameData::default();
        // Index 0 of every arena is reserved.
        gamedata.objects.push(None);
        gamedata.lists.push(None);
        gamedata.maps.push(None);
        gamedata.functions.push(None);
        gamedata.string_table.push(String::new());
        gamedata
    }

    pub fn get_property_id(&mut self, name: &str) -> u32 {
        if let Some(at) = self.property_names.iter().position(|p| p == name) {
            return at as u32;
        }
        self.property_names.push(name.to_string());
        (self.property_names.len() - 1) as u32
    }

    pub fn property_name(&self, id: u32) -> Option<&str> {
        self.property_names.get(id as usize).map(String::as_str)
    }

    /// Intern a string, NFC-normalized.
    pub fn get_string_id(&mut self, text: &str) -> u32 {
        let text = quoll_common::text::normalize(text);
        if let Some(at) = self.string_table.iter().position(|s| *s == text) {
            return at as u32;
        }
        self.string_table.push(text);
        (self.string_table.len() - 1) as u32
    }

    pub fn string(&self, id: u32) -> &str {
        self.string_table
            .get(id as usize)
            .map(String::as_str)
            .unwrap_or("(invalid string id)")
    }

    pub fn add_vocab(&mut self, word: &str) {
        if !self.vocab.iter().any(|v| v == word) {
            self.vocab.push(word.to_string());
        }
    }

    pub fn vocab_number(&self, word: &str) -> Option<u32> {
        self.vocab.iter().position(|v| v == word).map(|n| n as u32)
    }

    /// Sort the vocab once all input is lexed; `Vocab` payloads handed out
    /// by the parser are indices into the sorted table.
    pub fn sort_vocab(&mut self) {
        self.vocab.sort();
    }

    pub fn add_diagnostic(&mut self, severity: Severity, origin: Origin, message: impl Into<String>) {
        let message = message.into();
        if severity != Severity::Warning {
            self.error_count += 1;
        } else {
            log::warn!("{}: {}", origin, message);
        }
        self.diagnostics.push(Diagnostic {
            severity,
            origin,
            message,
        });
    }

    pub fn add_error(&mut self, origin: Origin, message: impl Into<String>) {
        self.add_diagnostic(Severity::Error, origin, message);
    }

    pub fn add_warning(&mut self, origin: Origin, message: impl Into<String>) {
        self.add_diagnostic(Severity::Warning, origin, message);
    }

    pub fn add_fatal(&mut self, origin: Origin, message: impl Into<String>) {
        self.add_diagnostic(Severity::Fatal, origin, message);
    }

    pub fn report(&mut self, error: BuildError) {
        self.add_error(error.origin, error.message);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn add_object(&mut self, mut object: GameObject) -> u32 {
        let id = self.objects.len() as u32;
        object.global_id = id;
        self.objects.push(Some(object));
        id
    }

    pub fn add_list(&mut self, mut list: GameList) -> u32 {
        let id = self.lists.len() as u32;
        list.global_id = id;
        self.lists.push(Some(list));
        id
    }

    pub fn add_map(&mut self, mut map: GameMap) -> u32 {
        let id = self.maps.len() as u32;
        map.global_id = id;
        self.maps.push(Some(map));
        id
    }

    pub fn add_function(&mut self, mut function: FunctionDef) -> u32 {
        let id = self.functions.len() as u32;
        function.global_id = id;
        self.functions.push(Some(function));
        id
    }

    /// The id the next function declaration will receive; needed because a
    /// named function registers its symbol before its body is parsed.
    pub fn next_function_id(&self) -> u32 {
        self.functions.len() as u32
    }

    pub fn next_object_id(&self) -> u32 {
        self.objects.len() as u32
    }

    pub fn object(&self, id: u32) -> Option<&GameObject> {
        self.objects.get(id as usize).and_then(Option::as_ref)
    }

    pub fn object_mut(&mut self, id: u32) -> Option<&mut GameObject> {
        self.objects.get_mut(id as usize).and_then(Option::as_mut)
    }

    pub fn list_mut(&mut self, id: u32) -> Option<&mut GameList> {
        self.lists.get_mut(id as usize).and_then(Option::as_mut)
    }

    pub fn map_mut(&mut self, id: u32) -> Option<&mut GameMap> {
        self.maps.get_mut(id as usize).and_then(Option::as_mut)
    }

    pub fn function(&self, id: u32) -> Option<&FunctionDef> {
        self.functions.get(id as usize).and_then(Option::as_ref)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&FunctionDef> {
        self.functions
            .iter()
            .flatten()
            .find(|func| func.name == name)
    }

    /// Sort every object's properties by property id.
    pub fn organize(&mut self) {
        for object in self.objects.iter_mut().flatten() {
            object.properties.sort_by_key(|prop| prop.id);
        }
    }

    /// Validate `ident`/`save`/`load` properties; returns the next free
    /// object ident.
    pub fn check_object_idents(&mut self) -> i32 {
        let p_ident = self.get_property_id("ident");
        let p_save = self.get_property_id("save");
        let p_load = self.get_property_id("load");

        let mut used: HashMap<i32, (String, Origin)> = HashMap::new();
        let mut next_ident = -1;
        let mut errors: Vec<(Origin, String)> = Vec::new();

        for object in self.objects.iter().flatten() {
            let ident = object.get_property(p_ident);
            let save = object.get_property(p_save);
            let load = object.get_property(p_load);

            if let Some(ident) = ident {
                if ident.value.tag != TypeTag::Integer || ident.value.payload <= 0 {
                    errors.push((
                        object.origin.clone(),
                        "Object ident property must be positive integer.".to_string(),
                    ));
                } else if let Some((owner, at)) = used.get(&ident.value.payload) {
                    errors.push((
                        object.origin.clone(),
                        format!(
                            "Object ident {} already in use by object \"{}\" @ {}.",
                            ident.value.payload, owner, at
                        ),
                    ));
                } else {
                    used.insert(
                        ident.value.payload,
                        (object.name.clone(), object.origin.clone()),
                    );
                    if ident.value.payload >= next_ident {
                        next_ident = ident.value.payload + 1;
                    }
                }
            }

            if ident.is_none() && save.is_some() {
                errors.push((
                    object.origin.clone(),
                    "Object has save property but no ident property.".to_string(),
                ));
            }
            if ident.is_none() && load.is_some() {
                errors.push((
                    object.origin.clone(),
                    "Object has load property but no ident property.".to_string(),
                ));
            }
            if save.is_some() && load.is_none() {
                errors.push((
                    object.origin.clone(),
                    "Object has save property but no load property.".to_string(),
                ));
            }
            if load.is_some() && save.is_none() {
                errors.push((
                    object.origin.clone(),
                    "Object has load property but no save property.".to_string(),
                ));
            }
            if let Some(load) = load {
                if load.value.tag != TypeTag::Function {
                    errors.push((
                        object.origin.clone(),
                        "Object load property must be function.".to_string(),
                    ));
                }
            }
            if let Some(save) = save {
                if save.value.tag != TypeTag::Function {
                    errors.push((
                        object.origin.clone(),
                        "Object save property must be function.".to_string(),
                    ));
                }
            }
        }

        for (origin, message) in errors {
            self.add_error(origin, message);
        }
        if next_ident < 0 {
            1
        } else {
            next_ident
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_append_only_and_deduplicated() {
        let mut gamedata = GameData::new();
        let a = gamedata.get_string_id("hello");
        let b = gamedata.get_string_id("world");
        let c = gamedata.get_string_id("hello");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert!(a > 0, "string id 0 is reserved");
    }

    #[test]
    fn property_ids_are_stable() {
        let mut gamedata = GameData::new();
        let a = gamedata.get_property_id("ident");
        let b = gamedata.get_property_id("ident");
        assert_eq!(a, b);
    }

    #[test]
    fn vocab_sorts_once() {
        let mut gamedata = GameData::new();
        gamedata.add_vocab("take");
        gamedata.add_vocab("drop");
        gamedata.add_vocab("take");
        gamedata.sort_vocab();
        assert_eq!(gamedata.vocab, vec!["drop", "take"]);
        assert_eq!(gamedata.vocab_number("take"), Some(1));
    }

    #[test]
    fn duplicate_symbols_are_rejected() {
        let mut table = SymbolTable::default();
        table
            .add(SymbolDef::new(Origin::none(), "x", Value::integer(1)))
            .unwrap();
        assert!(table
            .add(SymbolDef::new(Origin::none(), "x", Value::integer(2)))
            .is_err());
    }

    #[test]
    fn duplicate_object_properties_are_rejected() {
        let mut object = GameObject {
            origin: Origin::none(),
            file_string: 0,
            name: "lamp".to_string(),
            name_string: 0,
            global_id: 1,
            properties: Vec::new(),
            parent_id: 0,
            child_id: 0,
            sibling_id: 0,
        };
        object
            .add_property(Origin::none(), 3, Value::integer(1))
            .unwrap();
        assert!(object
            .add_property(Origin::none(), 3, Value::integer(2))
            .is_err());
    }

    #[test]
    fn ident_check_reports_duplicates() {
        let mut gamedata = GameData::new();
        let p_ident = gamedata.get_property_id("ident");
        for name in ["a", "b"] {
            let mut object = GameObject {
                origin: Origin::new("t.src", 1, 1),
                file_string: 0,
                name: name.to_string(),
                name_string: 0,
                global_id: 0,
                properties: Vec::new(),
                parent_id: 0,
                child_id: 0,
                sibling_id: 0,
            };
            object
                .add_property(Origin::none(), p_ident, Value::integer(7))
                .unwrap();
            gamedata.add_object(object);
        }
        let next = gamedata.check_object_idents();
        assert!(gamedata.has_errors());
        assert_eq!(next, 8);
    }
}
