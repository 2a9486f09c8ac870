use ethereum_types::H256;

use crate::{
    computation::Computation,
    constants::{GAS_LOG_DATA_BYTE, GAS_LOG_TOPIC},
    errors::VMError,
    opcodes::OpcodeResult,
    opcodes::opcode_values as op,
    vm::Vm,
};

pub fn log_n(vm: &mut Vm<'_>, computation: &mut Computation, opcode: u8) -> Result<OpcodeResult, VMError> {
    if computation.msg.is_static {
        return Err(VMError::WriteProtection);
    }
    let topic_count = (opcode - op::LOG0) as usize;
    let offset = computation.stack.pop()?;
    let size = computation.stack.pop()?;
    let mut topics = Vec::with_capacity(topic_count);
    for _ in 0..topic_count {
        let word = computation.stack.pop()?;
        topics.push(H256(word.to_big_endian()));
    }
    computation.extend_memory(offset, size)?;
    let variable_cost =
        GAS_LOG_TOPIC * topic_count as u64 + GAS_LOG_DATA_BYTE * size.low_u64();
    computation.gas_meter.consume(variable_cost, "LOG topics and data")?;
    let data = computation.memory_read(offset, size)?;
    let counter = vm.tx_context.next_log_counter();
    let address = computation.msg.storage_address();
    computation.add_log_entry(counter, address, topics, data);
    Ok(OpcodeResult::Continue)
}
