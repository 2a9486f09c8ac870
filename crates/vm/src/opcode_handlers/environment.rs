use ethereum_types::U256;
use ethrun_common::utils::{address_to_word, word_to_address};

use crate::{
    computation::{Computation, u256_to_usize},
    errors::VMError,
    gas_cost::copy_gas_cost,
    opcodes::OpcodeResult,
    vm::Vm,
};

pub fn address(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let address = computation.msg.storage_address();
    computation.stack.push(address_to_word(address))?;
    Ok(OpcodeResult::Continue)
}

pub fn balance(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let address = word_to_address(computation.stack.pop()?);
    let balance = vm.state.get_balance(address)?;
    computation.stack.push(balance)?;
    Ok(OpcodeResult::Continue)
}

pub fn origin(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let origin = computation.msg.origin;
    computation.stack.push(address_to_word(origin))?;
    Ok(OpcodeResult::Continue)
}

pub fn caller(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let sender = computation.msg.sender;
    computation.stack.push(address_to_word(sender))?;
    Ok(OpcodeResult::Continue)
}

pub fn callvalue(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let value = computation.msg.value;
    computation.stack.push(value)?;
    Ok(OpcodeResult::Continue)
}

pub fn calldataload(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let offset = computation.stack.pop()?;
    let mut word = [0u8; 32];
    if let Ok(offset) = u256_to_usize(offset) {
        let data = &computation.msg.data;
        if offset < data.len() {
            let end = (offset + 32).min(data.len());
            word[..end - offset].copy_from_slice(&data[offset..end]);
        }
    }
    computation.stack.push(U256::from_big_endian(&word))?;
    Ok(OpcodeResult::Continue)
}

pub fn calldatasize(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let size = computation.msg.data.len();
    computation.stack.push(U256::from(size))?;
    Ok(OpcodeResult::Continue)
}

pub fn calldatacopy(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let mem_offset = computation.stack.pop()?;
    let data_offset = computation.stack.pop()?;
    let size = computation.stack.pop()?;
    computation.extend_memory(mem_offset, size)?;
    computation
        .gas_meter
        .consume(copy_gas_cost(size.low_u64()), "CALLDATACOPY words")?;
    if size.is_zero() {
        return Ok(OpcodeResult::Continue);
    }
    let data = computation.msg.data.clone();
    let chunk = right_padded_slice(&data, data_offset, u256_to_usize(size)?);
    computation.memory.write(u256_to_usize(mem_offset)?, &chunk);
    Ok(OpcodeResult::Continue)
}

pub fn codesize(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let size = computation.code.code().len();
    computation.stack.push(U256::from(size))?;
    Ok(OpcodeResult::Continue)
}

pub fn codecopy(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let mem_offset = computation.stack.pop()?;
    let code_offset = computation.stack.pop()?;
    let size = computation.stack.pop()?;
    computation.extend_memory(mem_offset, size)?;
    computation
        .gas_meter
        .consume(copy_gas_cost(size.low_u64()), "CODECOPY words")?;
    if size.is_zero() {
        return Ok(OpcodeResult::Continue);
    }
    let code = computation.code.code().clone();
    let chunk = right_padded_slice(&code, code_offset, u256_to_usize(size)?);
    computation.memory.write(u256_to_usize(mem_offset)?, &chunk);
    Ok(OpcodeResult::Continue)
}

pub fn gasprice(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let gas_price = computation.msg.gas_price;
    computation.stack.push(gas_price)?;
    Ok(OpcodeResult::Continue)
}

pub fn extcodesize(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let address = word_to_address(computation.stack.pop()?);
    let code = vm.state.get_code(address)?;
    computation.stack.push(U256::from(code.len()))?;
    Ok(OpcodeResult::Continue)
}

pub fn extcodecopy(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let address = word_to_address(computation.stack.pop()?);
    let mem_offset = computation.stack.pop()?;
    let code_offset = computation.stack.pop()?;
    let size = computation.stack.pop()?;
    computation.extend_memory(mem_offset, size)?;
    computation
        .gas_meter
        .consume(copy_gas_cost(size.low_u64()), "EXTCODECOPY words")?;
    if size.is_zero() {
        return Ok(OpcodeResult::Continue);
    }
    let code = vm.state.get_code(address)?;
    let chunk = right_padded_slice(&code, code_offset, u256_to_usize(size)?);
    computation.memory.write(u256_to_usize(mem_offset)?, &chunk);
    Ok(OpcodeResult::Continue)
}

/// `size` bytes of `data` starting at `offset`, zero-padded on the right.
fn right_padded_slice(data: &[u8], offset: U256, size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    if let Ok(offset) = usize::try_from(offset) {
        if offset < data.len() {
            let end = (offset + size).min(data.len());
            out[..end - offset].copy_from_slice(&data[offset..end]);
        }
    }
    out
}
