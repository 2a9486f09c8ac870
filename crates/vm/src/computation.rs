use std::collections::HashMap;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use ethrun_common::types::Log;
use tracing::debug;

use crate::{
    code_stream::CodeStream,
    errors::{InternalError, VMError},
    gas_cost::{ceil32, memory_gas_cost},
    gas_meter::GasMeter,
    memory::Memory,
    message::Message,
    stack::Stack,
};

/// A single call frame: the stack, memory, gas and code of one message or
/// create execution, plus everything its subtree produced.
#[derive(Debug)]
pub struct Computation {
    pub msg: Message,
    pub gas_meter: GasMeter,
    pub stack: Stack,
    pub memory: Memory,
    pub code: CodeStream,
    /// Output of the most recent child call, per the return-data rules.
    pub return_data: Bytes,
    pub children: Vec<Computation>,
    output: Bytes,
    error: Option<VMError>,
    log_entries: Vec<(u64, Log)>,
    /// storage_address -> beneficiary; at most one entry, this frame's own.
    accounts_to_delete: HashMap<Address, Address>,
}

impl Computation {
    pub fn new(msg: Message) -> Self {
        let gas_meter = GasMeter::new(msg.gas);
        let code = CodeStream::new(msg.code.clone());
        Self {
            msg,
            gas_meter,
            stack: Stack::new(),
            memory: Memory::new(),
            code,
            return_data: Bytes::new(),
            children: Vec::new(),
            output: Bytes::new(),
            error: None,
            log_entries: Vec::new(),
            accounts_to_delete: HashMap::new(),
        }
    }

    //
    // Outcome
    //
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        !self.is_success()
    }

    pub fn error(&self) -> Option<&VMError> {
        self.error.as_ref()
    }

    /// Records a frame error. Burning errors consume all remaining gas.
    pub fn set_error(&mut self, error: VMError) {
        debug!(%error, depth = self.msg.depth, "computation error");
        if error.burns_gas() {
            let remaining = self.gas_meter.gas_remaining();
            let _ = self.gas_meter.consume(remaining, "zeroing gas due to VM error");
        }
        self.error = Some(error);
    }

    pub fn should_burn_gas(&self) -> bool {
        self.error.as_ref().is_some_and(|error| error.burns_gas())
    }

    pub fn should_erase_return_data(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|error| error.erases_return_data())
    }

    /// The frame's output; erased when the frame failed.
    pub fn output(&self) -> Bytes {
        if self.should_erase_return_data() {
            Bytes::new()
        } else {
            self.output.clone()
        }
    }

    pub fn set_output(&mut self, output: Bytes) {
        self.output = output;
    }

    //
    // Memory
    //
    /// Extends memory to cover `[offset, offset + size)`, charging the gas
    /// delta between the old and new footprint.
    pub fn extend_memory(&mut self, offset: U256, size: U256) -> Result<(), VMError> {
        if size.is_zero() {
            return Ok(());
        }
        let offset = u256_to_usize(offset)?;
        let size = u256_to_usize(size)?;
        let end = offset.checked_add(size).ok_or(VMError::VeryLargeNumber)? as u64;
        let before_cost = memory_gas_cost(self.memory.len() as u64)?;
        let after_cost = memory_gas_cost(ceil32(end))?;
        if after_cost > before_cost {
            self.gas_meter
                .consume(after_cost - before_cost, "memory expansion")?;
        }
        self.memory.extend(offset, size);
        Ok(())
    }

    pub fn memory_read(&self, offset: U256, size: U256) -> Result<Bytes, VMError> {
        if size.is_zero() {
            return Ok(Bytes::new());
        }
        Ok(self
            .memory
            .read(u256_to_usize(offset)?, u256_to_usize(size)?))
    }

    //
    // Logs
    //
    /// Appends a log entry tagged with its transaction-wide counter.
    pub fn add_log_entry(&mut self, counter: u64, address: Address, topics: Vec<H256>, data: Bytes) {
        self.log_entries.push((
            counter,
            Log {
                address,
                topics,
                data,
            },
        ));
    }

    /// This frame's and its children's log entries, ordered by counter.
    /// Errored frames contribute nothing.
    pub fn get_log_entries(&self) -> Vec<(u64, Log)> {
        if self.is_error() {
            return Vec::new();
        }
        let mut entries = self.log_entries.clone();
        for child in &self.children {
            entries.extend(child.get_log_entries());
        }
        entries.sort_by_key(|(counter, _)| *counter);
        entries
    }

    pub fn logs(&self) -> Vec<Log> {
        self.get_log_entries()
            .into_iter()
            .map(|(_, log)| log)
            .collect()
    }

    //
    // Self-destructs
    //
    /// Schedules this frame's storage address for end-of-transaction
    /// deletion in favour of `beneficiary`.
    pub fn register_account_for_deletion(&mut self, beneficiary: Address) -> Result<(), VMError> {
        let address = self.msg.storage_address();
        if self.accounts_to_delete.contains_key(&address) {
            return Err(VMError::Internal(InternalError::Invariant(
                "account registered for deletion twice in one frame",
            )));
        }
        self.accounts_to_delete.insert(address, beneficiary);
        Ok(())
    }

    /// Deletions across the whole subtree, deduplicated by storage address
    /// (deepest registration wins). Empty when this frame errored.
    pub fn get_accounts_for_deletion(&self) -> Vec<(Address, Address)> {
        if self.is_error() {
            return Vec::new();
        }
        let mut ordered: Vec<(Address, Address)> = Vec::new();
        for (address, beneficiary) in &self.accounts_to_delete {
            upsert_deletion(&mut ordered, *address, *beneficiary);
        }
        for child in &self.children {
            for (address, beneficiary) in child.get_accounts_for_deletion() {
                upsert_deletion(&mut ordered, address, beneficiary);
            }
        }
        ordered
    }

    //
    // Children
    //
    /// Adopts a finished child frame, applying the return-data rules.
    pub fn absorb_child(&mut self, child: Computation) {
        if child.is_error() {
            if child.msg.is_create() {
                self.return_data = child.output();
            } else if child.should_burn_gas() {
                self.return_data = Bytes::new();
            } else {
                self.return_data = child.output();
            }
        } else if child.msg.is_create() {
            self.return_data = Bytes::new();
        } else {
            self.return_data = child.output();
        }
        self.children.push(child);
    }

    //
    // Gas accounting
    //
    /// Refund accumulated by this subtree; zero when this frame errored.
    pub fn get_gas_refund(&self) -> u64 {
        if self.is_error() {
            return 0;
        }
        self.gas_meter.gas_refunded()
            + self
                .children
                .iter()
                .map(Computation::get_gas_refund)
                .sum::<u64>()
    }

    pub fn get_gas_used(&self) -> u64 {
        if self.should_burn_gas() {
            self.msg.gas
        } else {
            self.msg.gas.saturating_sub(self.gas_meter.gas_remaining())
        }
    }

    pub fn get_gas_remaining(&self) -> u64 {
        if self.should_burn_gas() {
            0
        } else {
            self.gas_meter.gas_remaining()
        }
    }
}

fn upsert_deletion(ordered: &mut Vec<(Address, Address)>, address: Address, beneficiary: Address) {
    match ordered.iter_mut().find(|(existing, _)| *existing == address) {
        Some(entry) => entry.1 = beneficiary,
        None => ordered.push((address, beneficiary)),
    }
}

/// Converts a stack word into a host offset; anything wider than the address
/// space cannot be paid for anyway.
pub fn u256_to_usize(value: U256) -> Result<usize, VMError> {
    usize::try_from(value).map_err(|_| VMError::VeryLargeNumber)
}
