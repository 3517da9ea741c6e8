//! Coarse mark-collection over the dynamic arena entries.
//!
//! Roots are every frame's value stack and locals, the pending options,
//! and the most recent result. Entries at or below the static boundaries
//! are never considered; collected entries become empty tombstones so the
//! arenas keep their stable indices.

use crate::vm::machine::Vm;
use quoll_common::{TypeTag, Value};

/// Mark everything reachable, sweep the rest. Returns how many entries
/// were collected.
pub fn collect(vm: &mut Vm) -> u32 {
    for string in vm.game.strings.iter_mut() {
        string.info.marked = false;
    }
    for list in vm.game.lists.iter_mut() {
        list.info.marked = false;
    }
    for map in vm.game.maps.iter_mut() {
        map.info.marked = false;
    }
    for object in vm.game.objects.iter_mut() {
        object.info.marked = false;
    }

    let mut pending: Vec<Value> = Vec::new();
    for frame in &vm.frames {
        pending.extend(frame.stack.values.iter().copied());
        pending.extend(frame.stack.locals.iter().copied());
    }
    for option in &vm.options {
        pending.push(Value::new(TypeTag::String, option.text as i32));
        pending.push(option.value);
        pending.push(option.extra);
    }
    pending.push(vm.option_extra);
    pending.push(vm.result());

    while let Some(value) = pending.pop() {
        mark(vm, &value, &mut pending);
    }

    let mut collected = 0;
    let static_strings = vm.game.static_strings as usize;
    for at in static_strings..vm.game.strings.len() {
        let string = &mut vm.game.strings[at];
        if !string.info.marked && string.info.ident != 0 {
            string.text.clear();
            string.info.ident = 0;
            collected += 1;
        }
    }
    let static_lists = vm.game.static_lists as usize;
    for at in static_lists + 1..vm.game.lists.len() {
        let list = &mut vm.game.lists[at];
        if !list.info.marked && list.info.ident != 0 {
            list.items.clear();
            list.info.ident = 0;
            collected += 1;
        }
    }
    let static_maps = vm.game.static_maps as usize;
    for at in static_maps + 1..vm.game.maps.len() {
        let map = &mut vm.game.maps[at];
        if !map.info.marked && map.info.ident != 0 {
            map.rows.clear();
            map.info.ident = 0;
            collected += 1;
        }
    }
    let static_objects = vm.game.static_objects as usize;
    for at in static_objects + 1..vm.game.objects.len() {
        let object = &mut vm.game.objects[at];
        if !object.info.marked && object.info.ident != 0 {
            object.properties.clear();
            object.info.ident = 0;
            collected += 1;
        }
    }

    log::debug!("garbage collection reclaimed {} entries", collected);
    collected
}

/// Mark one value and queue its referents.
fn mark(vm: &mut Vm, value: &Value, pending: &mut Vec<Value>) {
    match value.tag {
        TypeTag::String => {
            if let Ok(string) = vm.game.string_mut(value.payload) {
                string.info.marked = true;
            }
        }
        TypeTag::List => {
            if let Ok(list) = vm.game.list_mut(value.payload) {
                if !list.info.marked {
                    list.info.marked = true;
                    pending.extend(list.items.iter().copied());
                }
            }
        }
        TypeTag::Map => {
            if let Ok(map) = vm.game.map_mut(value.payload) {
                if !map.info.marked {
                    map.info.marked = true;
                    for row in &map.rows {
                        pending.push(row.key);
                        pending.push(row.value);
                    }
                }
            }
        }
        TypeTag::Object => {
            if let Ok(object) = vm.game.object_mut(value.payload) {
                if !object.info.marked {
                    object.info.marked = true;
                    pending.extend(object.properties.values().copied());
                    for id in [object.parent, object.child, object.sibling] {
                        if id != 0 {
                            pending.push(Value::new(TypeTag::Object, id as i32));
                        }
                    }
                }
            }
        }
        _ => {}
    }
}
