//! Arithmetic and bitwise opcode handlers. Operands must be Integers; the
//! first value popped is the left-hand operand.

use crate::error::{require, VmError};
use crate::vm::machine::Vm;
use quoll_common::{TypeTag, Value};

fn pop_ints(vm: &mut Vm) -> Result<(i32, i32), VmError> {
    let lhs = vm.pop()?;
    let rhs = vm.pop()?;
    require(&lhs, TypeTag::Integer)?;
    require(&rhs, TypeTag::Integer)?;
    Ok((lhs.payload, rhs.payload))
}

pub fn handle_add(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_ints(vm)?;
    vm.push(Value::integer(a.wrapping_add(b)))
}

pub fn handle_sub(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_ints(vm)?;
    vm.push(Value::integer(a.wrapping_sub(b)))
}

pub fn handle_mult(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_ints(vm)?;
    vm.push(Value::integer(a.wrapping_mul(b)))
}

pub fn handle_div(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_ints(vm)?;
    if b == 0 {
        return Err(VmError::DivisionByZero);
    }
    vm.push(Value::integer(a.wrapping_div(b)))
}

pub fn handle_mod(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_ints(vm)?;
    if b == 0 {
        return Err(VmError::DivisionByZero);
    }
    vm.push(Value::integer(a.wrapping_rem(b)))
}

/// `pow` repeats multiplication `exponent` times; a negative exponent
/// multiplies zero times, so the result is 1.
pub fn handle_pow(vm: &mut Vm) -> Result<(), VmError> {
    let (base, exponent) = pop_ints(vm)?;
    let mut result: i32 = 1;
    for _ in 0..exponent.max(0) {
        result = result.wrapping_mul(base);
    }
    vm.push(Value::integer(result))
}

pub fn handle_bit_left(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_ints(vm)?;
    vm.push(Value::integer(a.wrapping_shl(b as u32)))
}

pub fn handle_bit_right(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_ints(vm)?;
    vm.push(Value::integer(a.wrapping_shr(b as u32)))
}

pub fn handle_bit_and(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_ints(vm)?;
    vm.push(Value::integer(a & b))
}

pub fn handle_bit_or(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_ints(vm)?;
    vm.push(Value::integer(a | b))
}

pub fn handle_bit_xor(vm: &mut Vm) -> Result<(), VmError> {
    let (a, b) = pop_ints(vm)?;
    vm.push(Value::integer(a ^ b))
}

pub fn handle_bit_not(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    require(&value, TypeTag::Integer)?;
    vm.push(Value::integer(!value.payload))
}

pub fn handle_not(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    let result = if value.is_true() { 0 } else { 1 };
    vm.push(Value::integer(result))
}
