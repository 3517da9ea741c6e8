//! Save-file opcodes; each maps 1:1 onto the [`crate::storage::FileStore`]
//! operations, keyed by the gamefile's game id.

use crate::error::{require, VmError};
use crate::storage;
use crate::vm::machine::Vm;
use quoll_common::{TypeTag, Value};

/// `file_list` — a fresh list of file-name strings.
pub fn handle_file_list(vm: &mut Vm) -> Result<(), VmError> {
    let game_id = vm.game.game_id().to_string();
    let records = vm.store().list(&game_id);
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        items.push(vm.game.make_string(record.name));
    }
    let list = vm.game.make_new(TypeTag::List)?;
    vm.game.list_mut(list.payload)?.items = items;
    vm.push(list)
}

/// `file_read name` — the stored blob as a list of Integers, or None when
/// the file does not exist.
pub fn handle_file_read(vm: &mut Vm) -> Result<(), VmError> {
    let name = vm.pop()?;
    require(&name, TypeTag::String)?;
    let game_id = vm.game.game_id().to_string();
    let file_name = vm.game.string(name.payload)?.text.clone();
    match vm.store().read(&game_id, &file_name) {
        Some(blob) => {
            let items = storage::unpack_blob(&blob);
            let list = vm.game.make_new(TypeTag::List)?;
            vm.game.list_mut(list.payload)?.items = items;
            vm.push(list)
        }
        None => vm.push(Value::none()),
    }
}

/// `file_write name list` — pushes 1 on success, 0 when the list holds a
/// non-Integer.
pub fn handle_file_write(vm: &mut Vm) -> Result<(), VmError> {
    let name = vm.pop()?;
    let list = vm.pop()?;
    require(&name, TypeTag::String)?;
    require(&list, TypeTag::List)?;
    let game_id = vm.game.game_id().to_string();
    let file_name = vm.game.string(name.payload)?.text.clone();
    let items = vm.game.list(list.payload)?.items.clone();
    let result = match storage::pack_values(&items) {
        Some(blob) => vm.store_mut().write(&game_id, &file_name, &blob),
        None => false,
    };
    vm.push(Value::integer(if result { 1 } else { 0 }))
}

/// `file_delete name` — pushes 1 when a file was removed.
pub fn handle_file_delete(vm: &mut Vm) -> Result<(), VmError> {
    let name = vm.pop()?;
    require(&name, TypeTag::String)?;
    let game_id = vm.game.game_id().to_string();
    let file_name = vm.game.string(name.payload)?.text.clone();
    let result = vm.store_mut().delete(&game_id, &file_name);
    vm.push(Value::integer(if result { 1 } else { 0 }))
}
