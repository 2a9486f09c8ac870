use ethereum_types::U256;
use ethrun_common::utils::keccak;

use crate::{
    computation::Computation, errors::VMError, gas_cost::sha3_gas_cost,
    opcodes::OpcodeResult, vm::Vm,
};

pub fn sha3(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let offset = computation.stack.pop()?;
    let size = computation.stack.pop()?;
    computation.extend_memory(offset, size)?;
    computation
        .gas_meter
        .consume(sha3_gas_cost(size.low_u64()), "SHA3 words")?;
    let data = computation.memory_read(offset, size)?;
    let hash = keccak(&data);
    computation
        .stack
        .push(U256::from_big_endian(hash.as_bytes()))?;
    Ok(OpcodeResult::Continue)
}
