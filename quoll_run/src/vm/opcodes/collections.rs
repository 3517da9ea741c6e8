//! List, map, and object item handlers (`get`/`setp`/`has` and friends).

use crate::error::{require, VmError};
use crate::vm::machine::Vm;
use quoll_common::{TypeTag, Value};

fn list_index(value: &Value, len: usize) -> Result<usize, VmError> {
    require(value, TypeTag::Integer)?;
    let at = usize::try_from(value.payload).map_err(|_| VmError::BadIndex {
        kind: "list item",
        index: value.payload,
    })?;
    if at >= len {
        return Err(VmError::BadIndex {
            kind: "list item",
            index: value.payload,
        });
    }
    Ok(at)
}

pub fn handle_list_push(vm: &mut Vm) -> Result<(), VmError> {
    let list = vm.pop()?;
    let value = vm.pop()?;
    require(&list, TypeTag::List)?;
    vm.game.list_mut(list.payload)?.items.push(value);
    Ok(())
}

/// `list_pop` removes and pushes the final item; an empty list yields None.
pub fn handle_list_pop(vm: &mut Vm) -> Result<(), VmError> {
    let list = vm.pop()?;
    require(&list, TypeTag::List)?;
    let value = vm
        .game
        .list_mut(list.payload)?
        .items
        .pop()
        .unwrap_or_else(Value::none);
    vm.push(value)
}

/// In-place sort: by tag first, then payload, so Integers order
/// numerically and mixed lists group by kind.
pub fn handle_sort(vm: &mut Vm) -> Result<(), VmError> {
    let list = vm.pop()?;
    require(&list, TypeTag::List)?;
    vm.game
        .list_mut(list.payload)?
        .items
        .sort_by_key(|value| (value.tag as u8, value.payload));
    Ok(())
}

pub fn handle_get_item(vm: &mut Vm) -> Result<(), VmError> {
    let from = vm.pop()?;
    let index = vm.pop()?;
    let result = match from.tag {
        TypeTag::Object => {
            require(&index, TypeTag::Property)?;
            vm.game.object(from.payload)?.get(index.payload as u32)
        }
        TypeTag::List => {
            let items = &vm.game.list(from.payload)?.items;
            items[list_index(&index, items.len())?]
        }
        TypeTag::Map => vm.game.map(from.payload)?.get(&index),
        _ => return Err(VmError::game("get requires list, map, or object.")),
    };
    vm.push(result)
}

pub fn handle_has_item(vm: &mut Vm) -> Result<(), VmError> {
    let from = vm.pop()?;
    let index = vm.pop()?;
    let result = match from.tag {
        TypeTag::Object => {
            require(&index, TypeTag::Property)?;
            vm.game.object(from.payload)?.has(index.payload as u32)
        }
        TypeTag::List => {
            require(&index, TypeTag::Integer)?;
            let items = &vm.game.list(from.payload)?.items;
            index.payload >= 0 && (index.payload as usize) < items.len()
        }
        TypeTag::Map => vm.game.map(from.payload)?.has(&index),
        _ => return Err(VmError::game("has requires list, map, or object.")),
    };
    vm.push(Value::integer(if result { 1 } else { 0 }))
}

pub fn handle_get_size(vm: &mut Vm) -> Result<(), VmError> {
    let from = vm.pop()?;
    let size = match from.tag {
        TypeTag::List => vm.game.list(from.payload)?.items.len(),
        TypeTag::Map => vm.game.map(from.payload)?.rows.len(),
        TypeTag::String => vm.game.string(from.payload)?.text.chars().count(),
        _ => return Err(VmError::game("get_size requires list, map, or string.")),
    };
    vm.push(Value::integer(size as i32))
}

pub fn handle_set_item(vm: &mut Vm) -> Result<(), VmError> {
    let from = vm.pop()?;
    let index = vm.pop()?;
    let value = vm.pop()?;
    match from.tag {
        TypeTag::Object => {
            require(&index, TypeTag::Property)?;
            vm.game
                .object_mut(from.payload)?
                .set(index.payload as u32, value);
        }
        TypeTag::List => {
            let items = &mut vm.game.list_mut(from.payload)?.items;
            let at = list_index(&index, items.len())?;
            items[at] = value;
        }
        TypeTag::Map => vm.game.map_mut(from.payload)?.set(index, value),
        _ => return Err(VmError::game("setp requires list, map, or object.")),
    }
    Ok(())
}

pub fn handle_del_item(vm: &mut Vm) -> Result<(), VmError> {
    let from = vm.pop()?;
    let index = vm.pop()?;
    match from.tag {
        TypeTag::List => {
            let items = &mut vm.game.list_mut(from.payload)?.items;
            let at = list_index(&index, items.len())?;
            items.remove(at);
        }
        TypeTag::Map => vm.game.map_mut(from.payload)?.del(&index),
        _ => return Err(VmError::game("del_item requires list or map.")),
    }
    Ok(())
}

/// `ins list index value` — inserting at the length appends.
pub fn handle_ins_item(vm: &mut Vm) -> Result<(), VmError> {
    let from = vm.pop()?;
    let index = vm.pop()?;
    let value = vm.pop()?;
    require(&from, TypeTag::List)?;
    require(&index, TypeTag::Integer)?;
    let items = &mut vm.game.list_mut(from.payload)?.items;
    let at = usize::try_from(index.payload).map_err(|_| VmError::BadIndex {
        kind: "list item",
        index: index.payload,
    })?;
    if at > items.len() {
        return Err(VmError::BadIndex {
            kind: "list item",
            index: index.payload,
        });
    }
    items.insert(at, value);
    Ok(())
}

/// `index_of list value` — Integer position or -1.
pub fn handle_index_of(vm: &mut Vm) -> Result<(), VmError> {
    let list = vm.pop()?;
    let value = vm.pop()?;
    require(&list, TypeTag::List)?;
    let found = vm
        .game
        .list(list.payload)?
        .items
        .iter()
        .position(|item| *item == value)
        .map(|at| at as i32)
        .unwrap_or(-1);
    vm.push(Value::integer(found))
}

pub fn handle_get_random(vm: &mut Vm) -> Result<(), VmError> {
    let list = vm.pop()?;
    require(&list, TypeTag::List)?;
    let len = vm.game.list(list.payload)?.items.len();
    if len == 0 {
        return vm.push(Value::none());
    }
    let at = (vm.next_random() % len as u64) as usize;
    let value = vm.game.list(list.payload)?.items[at];
    vm.push(value)
}

/// `get_keys` builds a fresh list of a map's keys.
pub fn handle_get_keys(vm: &mut Vm) -> Result<(), VmError> {
    let map = vm.pop()?;
    require(&map, TypeTag::Map)?;
    let keys: Vec<Value> = vm
        .game
        .map(map.payload)?
        .rows
        .iter()
        .map(|row| row.key)
        .collect();
    let list = vm.game.make_new(TypeTag::List)?;
    vm.game.list_mut(list.payload)?.items = keys;
    vm.push(list)
}
