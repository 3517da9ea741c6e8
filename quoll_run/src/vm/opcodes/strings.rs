//! String opcode handlers. Mutation requires a dynamic string; the static
//! table is frozen at load time.

use crate::error::{require, VmError};
use crate::storage;
use crate::vm::machine::Vm;
use quoll_common::text::{explode, upper_first};
use quoll_common::{TypeTag, Value};

fn require_dynamic(vm: &Vm, value: &Value) -> Result<(), VmError> {
    require(value, TypeTag::String)?;
    if vm.game.is_static(value) {
        return Err(VmError::game("Cannot modify static string."));
    }
    Ok(())
}

pub fn handle_string_clear(vm: &mut Vm) -> Result<(), VmError> {
    let target = vm.pop()?;
    require_dynamic(vm, &target)?;
    vm.game.string_mut(target.payload)?.text.clear();
    Ok(())
}

/// `strcat dest value` — the rendered value is appended to dest.
pub fn handle_string_append(vm: &mut Vm) -> Result<(), VmError> {
    let target = vm.pop()?;
    let value = vm.pop()?;
    require_dynamic(vm, &target)?;
    let text = vm.render(&value)?;
    vm.game.string_mut(target.payload)?.text.push_str(&text);
    Ok(())
}

/// `strcat_uf` — as `strcat`, with the first codepoint uppercased.
pub fn handle_string_append_uf(vm: &mut Vm) -> Result<(), VmError> {
    let target = vm.pop()?;
    let value = vm.pop()?;
    require_dynamic(vm, &target)?;
    let text = upper_first(&vm.render(&value)?);
    vm.game.string_mut(target.payload)?.text.push_str(&text);
    Ok(())
}

pub fn handle_string_length(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    require(&value, TypeTag::String)?;
    let length = vm.game.string(value.payload)?.text.chars().count();
    vm.push(Value::integer(length as i32))
}

/// `strcmp a b` — 0 when equal, otherwise the sign of the lexicographic
/// order.
pub fn handle_string_compare(vm: &mut Vm) -> Result<(), VmError> {
    let a = vm.pop()?;
    let b = vm.pop()?;
    require(&a, TypeTag::String)?;
    require(&b, TypeTag::String)?;
    let left = &vm.game.string(a.payload)?.text;
    let right = &vm.game.string(b.payload)?.text;
    let result = match left.cmp(right) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    };
    vm.push(Value::integer(result))
}

/// `encode_string` — UTF-8 bytes packed four to an Integer, NUL padded;
/// the same blob format the save-file store uses.
pub fn handle_encode_string(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    require(&value, TypeTag::String)?;
    let mut bytes = vm.game.string(value.payload)?.text.clone().into_bytes();
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    let items = storage::unpack_blob(&bytes);
    let list = vm.game.make_new(TypeTag::List)?;
    vm.game.list_mut(list.payload)?.items = items;
    vm.push(list)
}

/// `decode_string` — inverse of `encode_string`; stops at the first NUL.
pub fn handle_decode_string(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    require(&value, TypeTag::List)?;
    let items = vm.game.list(value.payload)?.items.clone();
    let blob = storage::pack_values(&items)
        .ok_or_else(|| VmError::game("decode_string requires a list of integers."))?;
    let end = blob.iter().position(|&b| b == 0).unwrap_or(blob.len());
    let text = String::from_utf8(blob[..end].to_vec())
        .map_err(|_| VmError::game("decode_string data is not valid text."))?;
    let result = vm.game.make_string(text);
    vm.push(result)
}

/// `tokenize` — whitespace split; words in the vocab table become Vocab
/// values, everything else becomes a fresh string.
pub fn handle_tokenize(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    require(&value, TypeTag::String)?;
    let text = vm.game.string(value.payload)?.text.clone();
    let mut items = Vec::new();
    for word in explode(&text) {
        match vm.game.vocab.binary_search_by(|v| v.as_str().cmp(word)) {
            Ok(at) => items.push(Value::new(TypeTag::Vocab, at as i32)),
            Err(_) => items.push(vm.game.make_string(word)),
        }
    }
    let list = vm.game.make_new(TypeTag::List)?;
    vm.game.list_mut(list.payload)?.items = items;
    vm.push(list)
}
