use crate::{
    computation::Computation, errors::VMError, opcodes::OpcodeResult,
    opcodes::opcode_values as op, vm::Vm,
};

pub fn dup_n(_vm: &mut Vm<'_>, computation: &mut Computation, opcode: u8) -> Result<OpcodeResult, VMError> {
    let depth = (opcode - op::DUP1 + 1) as usize;
    computation.stack.dup(depth)?;
    Ok(OpcodeResult::Continue)
}
