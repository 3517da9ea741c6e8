//! Type introspection, dynamic allocation, randomness, and origins.

use crate::error::{require, require_either, VmError};
use crate::vm::machine::Vm;
use quoll_common::{TypeTag, Value};

pub fn handle_type_of(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    vm.push(Value::integer(value.tag as u8 as i32))
}

/// `astype value type` — reinterpret the payload under a new tag.
pub fn handle_as_type(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    let to_type = vm.pop()?;
    require_either(&to_type, TypeTag::TypeId, TypeTag::Integer)?;
    let tag = u8::try_from(to_type.payload)
        .ok()
        .and_then(|byte| TypeTag::try_from(byte).ok())
        .ok_or(VmError::BadTypeTag(to_type.payload as u8))?;
    vm.push(Value::new(tag, value.payload))
}

/// `is_valid` — 1 when an arena reference is in range; non-reference
/// values are always valid.
pub fn handle_is_valid(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    let valid = match value.tag {
        TypeTag::String => vm.game.string(value.payload).is_ok(),
        TypeTag::List => vm.game.list(value.payload).is_ok(),
        TypeTag::Map => vm.game.map(value.payload).is_ok(),
        TypeTag::Object => vm.game.object(value.payload).is_ok(),
        TypeTag::Function => vm.game.function(value.payload).is_ok(),
        TypeTag::Vocab => (value.payload as usize) < vm.game.vocab.len() && value.payload >= 0,
        _ => true,
    };
    vm.push(Value::integer(if valid { 1 } else { 0 }))
}

/// `is_static` — 1 when the referent was loaded from the gamefile.
pub fn handle_is_static(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    let is_static = vm.game.is_static(&value);
    vm.push(Value::integer(if is_static { 1 } else { 0 }))
}

/// `new Type` — extend the arena and push the fresh reference.
pub fn handle_new(vm: &mut Vm) -> Result<(), VmError> {
    let type_id = vm.pop()?;
    require_either(&type_id, TypeTag::TypeId, TypeTag::Integer)?;
    let tag = u8::try_from(type_id.payload)
        .ok()
        .and_then(|byte| TypeTag::try_from(byte).ok())
        .ok_or(VmError::BadTypeTag(type_id.payload as u8))?;
    let value = vm.game.make_new(tag)?;
    vm.push(value)
}

/// `origin` — a fresh string describing where the value was declared.
pub fn handle_origin(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    let text = vm.game.source_of(&value);
    let result = vm.game.make_string(text);
    vm.push(result)
}

/// `random min max` — an Integer in `[min, max)`.
pub fn handle_random(vm: &mut Vm) -> Result<(), VmError> {
    let min = vm.pop()?;
    let max = vm.pop()?;
    require(&min, TypeTag::Integer)?;
    require(&max, TypeTag::Integer)?;
    if max.payload <= min.payload {
        return Err(VmError::game("random requires max greater than min."));
    }
    let span = (max.payload as i64 - min.payload as i64) as u64;
    let result = min.payload as i64 + (vm.next_random() % span) as i64;
    vm.push(Value::integer(result as i32))
}
