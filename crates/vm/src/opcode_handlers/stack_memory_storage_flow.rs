use ethereum_types::U256;

use crate::{
    computation::{Computation, u256_to_usize},
    constants::{GAS_SRESET, GAS_SSET, REFUND_SCLEAR},
    errors::VMError,
    opcodes::OpcodeResult,
    vm::Vm,
};

pub fn pop(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    computation.stack.pop()?;
    Ok(OpcodeResult::Continue)
}

pub fn mload(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let offset = computation.stack.pop()?;
    computation.extend_memory(offset, U256::from(32))?;
    let word = computation.memory_read(offset, U256::from(32))?;
    computation.stack.push(U256::from_big_endian(&word))?;
    Ok(OpcodeResult::Continue)
}

pub fn mstore(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let offset = computation.stack.pop()?;
    let value = computation.stack.pop()?;
    computation.extend_memory(offset, U256::from(32))?;
    let bytes = value.to_big_endian();
    computation.memory.write(u256_to_usize(offset)?, &bytes);
    Ok(OpcodeResult::Continue)
}

pub fn mstore8(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let offset = computation.stack.pop()?;
    let value = computation.stack.pop()?;
    computation.extend_memory(offset, U256::one())?;
    let byte = (value.low_u64() & 0xff) as u8;
    computation.memory.write(u256_to_usize(offset)?, &[byte]);
    Ok(OpcodeResult::Continue)
}

pub fn sload(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let slot = computation.stack.pop()?;
    let value = vm.state.get_storage(computation.msg.storage_address(), slot)?;
    computation.stack.push(value)?;
    Ok(OpcodeResult::Continue)
}

pub fn sstore(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    if computation.msg.is_static {
        return Err(VMError::WriteProtection);
    }
    let slot = computation.stack.pop()?;
    let value = computation.stack.pop()?;
    let address = computation.msg.storage_address();
    let current = vm.state.get_storage(address, slot)?;

    // Only setting a fresh slot pays the high cost; clearing earns the
    // refund settled at transaction end.
    let gas_cost = if current.is_zero() && !value.is_zero() {
        GAS_SSET
    } else {
        GAS_SRESET
    };
    computation.gas_meter.consume(gas_cost, "SSTORE")?;
    if !current.is_zero() && value.is_zero() {
        computation.gas_meter.refund(REFUND_SCLEAR);
    }
    vm.state.set_storage(address, slot, value)?;
    Ok(OpcodeResult::Continue)
}

pub fn jump(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let destination = computation.stack.pop()?;
    jump_to(computation, destination)
}

pub fn jumpi(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let destination = computation.stack.pop()?;
    let condition = computation.stack.pop()?;
    if condition.is_zero() {
        return Ok(OpcodeResult::Continue);
    }
    jump_to(computation, destination)
}

fn jump_to(computation: &mut Computation, destination: U256) -> Result<OpcodeResult, VMError> {
    let destination = u256_to_usize(destination).map_err(|_| VMError::InvalidJumpDestination)?;
    if !computation.code.is_valid_jumpdest(destination) {
        return Err(VMError::InvalidJumpDestination);
    }
    computation.code.seek(destination);
    Ok(OpcodeResult::Continue)
}

pub fn pc(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let pc = computation.code.pc().saturating_sub(1);
    computation.stack.push(U256::from(pc))?;
    Ok(OpcodeResult::Continue)
}

pub fn msize(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let size = computation.memory.len();
    computation.stack.push(U256::from(size))?;
    Ok(OpcodeResult::Continue)
}

pub fn gas(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let remaining = computation.gas_meter.gas_remaining();
    computation.stack.push(U256::from(remaining))?;
    Ok(OpcodeResult::Continue)
}

pub fn jumpdest(_vm: &mut Vm<'_>, _computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    Ok(OpcodeResult::Continue)
}
