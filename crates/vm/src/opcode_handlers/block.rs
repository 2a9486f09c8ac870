use ethereum_types::U256;
use ethrun_common::utils::address_to_word;

use crate::{
    computation::Computation, errors::VMError, opcodes::OpcodeResult, vm::Vm,
};

pub fn blockhash(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let number = computation.stack.pop()?;
    let hash = match u64::try_from(number) {
        Ok(number) => vm.block.block_hash(number),
        Err(_) => Default::default(),
    };
    computation
        .stack
        .push(U256::from_big_endian(hash.as_bytes()))?;
    Ok(OpcodeResult::Continue)
}

pub fn coinbase(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    computation.stack.push(address_to_word(vm.block.coinbase))?;
    Ok(OpcodeResult::Continue)
}

pub fn timestamp(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    computation.stack.push(U256::from(vm.block.timestamp))?;
    Ok(OpcodeResult::Continue)
}

pub fn number(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    computation.stack.push(U256::from(vm.block.number))?;
    Ok(OpcodeResult::Continue)
}

pub fn difficulty(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    computation.stack.push(vm.block.difficulty)?;
    Ok(OpcodeResult::Continue)
}

pub fn gaslimit(vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    computation.stack.push(U256::from(vm.block.gas_limit))?;
    Ok(OpcodeResult::Continue)
}
