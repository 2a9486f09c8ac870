use ethereum_types::U256;

use crate::{
    computation::Computation, errors::VMError, opcodes::OpcodeResult,
    opcodes::opcode_values as op, vm::Vm,
};

pub fn push_n(_vm: &mut Vm<'_>, computation: &mut Computation, opcode: u8) -> Result<OpcodeResult, VMError> {
    let size = (opcode - op::PUSH1 + 1) as usize;
    let immediates = computation.code.read(size);
    computation.stack.push(U256::from_big_endian(&immediates))?;
    Ok(OpcodeResult::Continue)
}
