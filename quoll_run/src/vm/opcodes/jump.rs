//! Jump opcode handlers. Targets are `JumpTarget` values holding offsets
//! relative to the current function's base address.

use crate::error::{require, VmError};
use crate::vm::machine::Vm;
use quoll_common::TypeTag;

pub fn handle_jump(vm: &mut Vm) -> Result<(), VmError> {
    let target = vm.pop()?;
    vm.jump_to(&target)
}

pub fn handle_jump_zero(vm: &mut Vm) -> Result<(), VmError> {
    let target = vm.pop()?;
    let condition = vm.pop()?;
    require(&target, TypeTag::JumpTarget)?;
    if !condition.is_true() {
        vm.jump_to(&target)?;
    }
    Ok(())
}

pub fn handle_jump_not_zero(vm: &mut Vm) -> Result<(), VmError> {
    let target = vm.pop()?;
    let condition = vm.pop()?;
    require(&target, TypeTag::JumpTarget)?;
    if condition.is_true() {
        vm.jump_to(&target)?;
    }
    Ok(())
}
