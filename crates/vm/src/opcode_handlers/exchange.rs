use crate::{
    computation::Computation, errors::VMError, opcodes::OpcodeResult,
    opcodes::opcode_values as op, vm::Vm,
};

pub fn swap_n(_vm: &mut Vm<'_>, computation: &mut Computation, opcode: u8) -> Result<OpcodeResult, VMError> {
    let depth = (opcode - op::SWAP1 + 1) as usize;
    computation.stack.swap(depth)?;
    Ok(OpcodeResult::Continue)
}
