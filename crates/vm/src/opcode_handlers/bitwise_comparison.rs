use ethereum_types::U256;

use crate::{
    computation::Computation, errors::VMError, opcodes::OpcodeResult, vm::Vm,
};

use super::arithmetic::is_negative;

fn push_bool(computation: &mut Computation, value: bool) -> Result<OpcodeResult, VMError> {
    computation
        .stack
        .push(if value { U256::one() } else { U256::zero() })?;
    Ok(OpcodeResult::Continue)
}

pub fn lt(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    push_bool(computation, left < right)
}

pub fn gt(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    push_bool(computation, left > right)
}

pub fn slt(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    push_bool(computation, signed_lt(left, right))
}

pub fn sgt(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    push_bool(computation, signed_lt(right, left))
}

pub fn eq(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    push_bool(computation, left == right)
}

pub fn iszero(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let value = computation.stack.pop()?;
    push_bool(computation, value.is_zero())
}

pub fn and(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    computation.stack.push(left & right)?;
    Ok(OpcodeResult::Continue)
}

pub fn or(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    computation.stack.push(left | right)?;
    Ok(OpcodeResult::Continue)
}

pub fn xor(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    computation.stack.push(left ^ right)?;
    Ok(OpcodeResult::Continue)
}

pub fn not(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let value = computation.stack.pop()?;
    computation.stack.push(!value)?;
    Ok(OpcodeResult::Continue)
}

pub fn byte(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let index = computation.stack.pop()?;
    let value = computation.stack.pop()?;
    let result = if index >= U256::from(32) {
        U256::zero()
    } else {
        // U256::byte is little-endian; BYTE indexes from the big end.
        U256::from(value.byte(31 - index.low_u64() as usize))
    };
    computation.stack.push(result)?;
    Ok(OpcodeResult::Continue)
}

fn signed_lt(left: U256, right: U256) -> bool {
    match (is_negative(left), is_negative(right)) {
        (true, false) => true,
        (false, true) => false,
        // Two's complement ordering matches unsigned ordering within a sign.
        _ => left < right,
    }
}
