//! Symbol translation: flagsets collapse to integers, defaults are
//! promoted, every `Symbol` placeholder is overwritten with its concrete
//! value, and the object containment tree is linked.

use crate::gamedata::{GameData, SymbolDef};
use crate::value::Value;
use quoll_common::{Origin, TypeTag};

/// Seed the symbol table with the built-in constants and pre-intern the
/// property names the toolchain itself relies on.
pub fn add_default_constants(gamedata: &mut GameData) {
    let builtins: &[(&str, TypeTag, i32)] = &[
        ("None", TypeTag::TypeId, 0),
        ("Integer", TypeTag::TypeId, 1),
        ("String", TypeTag::TypeId, 2),
        ("List", TypeTag::TypeId, 3),
        ("Map", TypeTag::TypeId, 4),
        ("Function", TypeTag::TypeId, 5),
        ("Object", TypeTag::TypeId, 6),
        ("Property", TypeTag::TypeId, 7),
        ("Label", TypeTag::TypeId, 9),
        ("Reference", TypeTag::TypeId, 10),
        ("Vocab", TypeTag::TypeId, 11),
        ("none", TypeTag::None, 0),
        ("saveAllowed", TypeTag::Integer, 0),
        ("infobarLeft", TypeTag::Integer, 1),
        ("infobarRight", TypeTag::Integer, 2),
        ("infobarFooter", TypeTag::Integer, 3),
        ("infobarTitle", TypeTag::Integer, 4),
        ("true", TypeTag::Integer, 1),
        ("false", TypeTag::Integer, 0),
    ];
    for (name, tag, payload) in builtins {
        let symbol = SymbolDef::used(Origin::none(), *name, Value::new(*tag, *payload));
        gamedata
            .symbols
            .add(symbol)
            .expect("builtin constants are seeded before user symbols");
    }
    for property in ["(invalid)", "internal_name", "ident", "parent", "save", "load"] {
        gamedata.get_property_id(property);
    }
}

/// Rewrite one value in place. Flagsets become their OR'd integer; symbols
/// resolve through the global table or fail.
fn translate_value(gamedata: &mut GameData, value: &mut Value) -> Result<(), String> {
    if value.tag == TypeTag::FlagSet {
        let final_value = gamedata
            .flagsets
            .get(value.payload as usize)
            .map(|set| set.final_value)
            .ok_or_else(|| "Invalid flag set reference.".to_string())?;
        *value = Value::integer(final_value as i32);
        return Ok(());
    }
    if value.tag != TypeTag::Symbol {
        return Ok(());
    }
    match gamedata.symbols.lookup(&value.text, true) {
        Some(resolved) => {
            *value = resolved;
            Ok(())
        }
        None => Err(format!("Undefined symbol ~{}~.", value.text)),
    }
}

/// The translation phase proper. One error is reported per unresolved
/// occurrence; after this pass no `Symbol` or `FlagSet` value remains in
/// any arena.
pub fn translate_symbols(gamedata: &mut GameData) {
    log::debug!("translating symbols");

    // Collapse flagsets first so flagset-valued symbols can resolve.
    for at in 0..gamedata.flagsets.len() {
        let mut values = std::mem::take(&mut gamedata.flagsets[at].values);
        let origin = gamedata.flagsets[at].origin.clone();
        let mut result: u32 = 0;
        for value in values.iter_mut() {
            match translate_value(gamedata, value) {
                Ok(()) if value.tag == TypeTag::Integer => result |= value.payload as u32,
                Ok(()) => {
                    gamedata.add_error(origin.clone(), "Flag values must be integers.")
                }
                Err(message) => gamedata.add_error(origin.clone(), message),
            }
        }
        gamedata.flagsets[at].values = values;
        gamedata.flagsets[at].final_value = result;
    }

    // Promote defaults for names still undefined.
    let pending: Vec<SymbolDef> = gamedata.defaults.symbols.clone();
    for default in pending {
        if gamedata.symbols.get(&default.name).is_some() {
            continue;
        }
        if default.value.tag == TypeTag::Symbol {
            match gamedata.symbols.lookup(&default.value.text, false) {
                Some(resolved) => {
                    let symbol = SymbolDef::new(default.origin.clone(), default.name, resolved);
                    if let Err(err) = gamedata.symbols.add(symbol) {
                        gamedata.report(err);
                    }
                }
                None => {
                    let message = format!(
                        "Default value for {} is undefined value {}.",
                        default.name, default.value.text
                    );
                    gamedata.add_error(default.origin, message);
                }
            }
        } else {
            let symbol = SymbolDef::new(default.origin.clone(), default.name, default.value);
            if let Err(err) = gamedata.symbols.add(symbol) {
                gamedata.report(err);
            }
        }
    }

    // Flagset-valued symbols collapse too.
    for at in 0..gamedata.symbols.symbols.len() {
        if gamedata.symbols.symbols[at].value.tag != TypeTag::FlagSet {
            continue;
        }
        let mut value = gamedata.symbols.symbols[at].value.clone();
        let origin = gamedata.symbols.symbols[at].origin.clone();
        match translate_value(gamedata, &mut value) {
            Ok(()) if value.tag == TypeTag::Integer => {
                gamedata.symbols.symbols[at].value = value;
            }
            _ => gamedata.add_error(origin, "Invalid value in flag set."),
        }
    }

    // Object properties, list items, map rows.
    for at in 1..gamedata.objects.len() {
        let Some(mut object) = gamedata.objects[at].take() else {
            continue;
        };
        for property in object.properties.iter_mut() {
            if let Err(message) = translate_value(gamedata, &mut property.value) {
                gamedata.add_error(property.origin.clone(), message);
            }
        }
        gamedata.objects[at] = Some(object);
    }

    for at in 1..gamedata.lists.len() {
        let Some(mut list) = gamedata.lists[at].take() else {
            continue;
        };
        for item in list.items.iter_mut() {
            if let Err(message) = translate_value(gamedata, item) {
                gamedata.add_error(list.origin.clone(), message);
            }
        }
        gamedata.lists[at] = Some(list);
    }

    for at in 1..gamedata.maps.len() {
        let Some(mut map) = gamedata.maps[at].take() else {
            continue;
        };
        for row in map.rows.iter_mut() {
            if let Err(message) = translate_value(gamedata, &mut row.key) {
                gamedata.add_error(map.origin.clone(), message);
            }
            if let Err(message) = translate_value(gamedata, &mut row.value) {
                gamedata.add_error(map.origin.clone(), message);
            }
        }
        gamedata.maps[at] = Some(map);
    }

    build_object_tree(gamedata);
}

/// Link the parent/child/sibling containment tree from translated `parent`
/// properties. The newest insertion becomes its parent's first child; the
/// previous first child becomes its sibling.
fn build_object_tree(gamedata: &mut GameData) {
    let parent_prop = gamedata.get_property_id("parent");
    for at in 1..gamedata.objects.len() {
        let parent_id = match gamedata.objects[at].as_ref() {
            Some(object) => match object.get_property(parent_prop) {
                Some(prop) if prop.value.tag == TypeTag::Object => prop.value.payload as u32,
                _ => continue,
            },
            None => continue,
        };
        if gamedata.object(parent_id).is_none() || parent_id as usize == at {
            let origin = gamedata.objects[at].as_ref().unwrap().origin.clone();
            gamedata.add_error(origin, "Object parent must be an existing object.");
            continue;
        }
        let previous_first = {
            let parent = gamedata.object_mut(parent_id).expect("checked above");
            let previous = parent.child_id;
            parent.child_id = at as u32;
            previous
        };
        let object = gamedata.objects[at].as_mut().expect("object exists");
        object.parent_id = parent_id;
        object.sibling_id = previous_first;
    }
}
