//! Comparison opcode handlers. Each pushes Integer 1 or 0. Ordering is
//! defined only for Integers; other pairs are equal or not.

use crate::error::VmError;
use crate::vm::machine::Vm;
use quoll_common::Value;

fn pop_pair(vm: &mut Vm) -> Result<(Value, Value), VmError> {
    let first = vm.pop()?;
    let second = vm.pop()?;
    Ok((first, second))
}

fn push_flag(vm: &mut Vm, flag: bool) -> Result<(), VmError> {
    vm.push(Value::integer(if flag { 1 } else { 0 }))
}

pub fn handle_equal(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_pair(vm)?;
    push_flag(vm, a.compare(&b) == 0)
}

pub fn handle_not_equal(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_pair(vm)?;
    push_flag(vm, a.compare(&b) != 0)
}

pub fn handle_less_than(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_pair(vm)?;
    push_flag(vm, b.compare(&a) > 0)
}

pub fn handle_less_than_equal(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_pair(vm)?;
    push_flag(vm, b.compare(&a) >= 0)
}

pub fn handle_greater_than(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_pair(vm)?;
    push_flag(vm, b.compare(&a) < 0)
}

pub fn handle_greater_than_equal(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_pair(vm)?;
    push_flag(vm, b.compare(&a) <= 0)
}
