//! Per-fork rule records: opcode tables, gas constants and behaviour flags.
//!
//! Fork variants are data, not types: a [`ForkRules`] record parameterises
//! the single [`Vm`](crate::Vm).

use std::collections::BTreeMap;

use ethrun_common::types::{ChainConfig, Fork};
use lazy_static::lazy_static;

use crate::{
    constants::*,
    errors::ExecutionError,
    opcode_handlers::{
        arithmetic, bitwise_comparison, block, dup, environment, exchange, keccak, logging, push,
        stack_memory_storage_flow as flow, system,
    },
    opcodes::{OpcodeTable, opcode_values as op},
};

/// Everything that varies between protocol variants.
pub struct ForkRules {
    pub fork: Fork,
    pub opcodes: OpcodeTable,
    /// Homestead+: signatures with high `s` values are rejected.
    pub enforce_low_s: bool,
    /// Homestead+: a create frame that cannot pay the code-deposit cost
    /// leaves a codeless contract instead of burning the frame.
    pub create_deposit_empties_code: bool,
    /// EIP-150: CALL/CALLCODE/DELEGATECALL/CREATE forward at most all but
    /// one 64th of the remaining gas.
    pub call_gas_cap: bool,
    /// EIP-150: surcharge when SELFDESTRUCT names a fresh beneficiary.
    pub selfdestruct_new_account_gas: u64,
}

fn frontier_opcodes() -> OpcodeTable {
    let mut table = OpcodeTable::new();

    table.insert(op::STOP, system::stop, GAS_ZERO, "STOP");
    table.insert(op::ADD, arithmetic::add, GAS_VERY_LOW, "ADD");
    table.insert(op::MUL, arithmetic::mul, GAS_LOW, "MUL");
    table.insert(op::SUB, arithmetic::sub, GAS_VERY_LOW, "SUB");
    table.insert(op::DIV, arithmetic::div, GAS_LOW, "DIV");
    table.insert(op::SDIV, arithmetic::sdiv, GAS_LOW, "SDIV");
    table.insert(op::MOD, arithmetic::modulo, GAS_LOW, "MOD");
    table.insert(op::SMOD, arithmetic::smod, GAS_LOW, "SMOD");
    table.insert(op::ADDMOD, arithmetic::addmod, GAS_MID, "ADDMOD");
    table.insert(op::MULMOD, arithmetic::mulmod, GAS_MID, "MULMOD");
    table.insert(op::EXP, arithmetic::exp, GAS_EXP, "EXP");
    table.insert(op::SIGNEXTEND, arithmetic::signextend, GAS_LOW, "SIGNEXTEND");

    table.insert(op::LT, bitwise_comparison::lt, GAS_VERY_LOW, "LT");
    table.insert(op::GT, bitwise_comparison::gt, GAS_VERY_LOW, "GT");
    table.insert(op::SLT, bitwise_comparison::slt, GAS_VERY_LOW, "SLT");
    table.insert(op::SGT, bitwise_comparison::sgt, GAS_VERY_LOW, "SGT");
    table.insert(op::EQ, bitwise_comparison::eq, GAS_VERY_LOW, "EQ");
    table.insert(op::ISZERO, bitwise_comparison::iszero, GAS_VERY_LOW, "ISZERO");
    table.insert(op::AND, bitwise_comparison::and, GAS_VERY_LOW, "AND");
    table.insert(op::OR, bitwise_comparison::or, GAS_VERY_LOW, "OR");
    table.insert(op::XOR, bitwise_comparison::xor, GAS_VERY_LOW, "XOR");
    table.insert(op::NOT, bitwise_comparison::not, GAS_VERY_LOW, "NOT");
    table.insert(op::BYTE, bitwise_comparison::byte, GAS_VERY_LOW, "BYTE");

    table.insert(op::SHA3, keccak::sha3, GAS_SHA3, "SHA3");

    table.insert(op::ADDRESS, environment::address, GAS_BASE, "ADDRESS");
    table.insert(op::BALANCE, environment::balance, GAS_BALANCE, "BALANCE");
    table.insert(op::ORIGIN, environment::origin, GAS_BASE, "ORIGIN");
    table.insert(op::CALLER, environment::caller, GAS_BASE, "CALLER");
    table.insert(op::CALLVALUE, environment::callvalue, GAS_BASE, "CALLVALUE");
    table.insert(op::CALLDATALOAD, environment::calldataload, GAS_VERY_LOW, "CALLDATALOAD");
    table.insert(op::CALLDATASIZE, environment::calldatasize, GAS_BASE, "CALLDATASIZE");
    table.insert(op::CALLDATACOPY, environment::calldatacopy, GAS_VERY_LOW, "CALLDATACOPY");
    table.insert(op::CODESIZE, environment::codesize, GAS_BASE, "CODESIZE");
    table.insert(op::CODECOPY, environment::codecopy, GAS_VERY_LOW, "CODECOPY");
    table.insert(op::GASPRICE, environment::gasprice, GAS_BASE, "GASPRICE");
    table.insert(op::EXTCODESIZE, environment::extcodesize, GAS_EXTCODE, "EXTCODESIZE");
    table.insert(op::EXTCODECOPY, environment::extcodecopy, GAS_EXTCODE, "EXTCODECOPY");

    table.insert(op::BLOCKHASH, block::blockhash, GAS_BLOCKHASH, "BLOCKHASH");
    table.insert(op::COINBASE, block::coinbase, GAS_BASE, "COINBASE");
    table.insert(op::TIMESTAMP, block::timestamp, GAS_BASE, "TIMESTAMP");
    table.insert(op::NUMBER, block::number, GAS_BASE, "NUMBER");
    table.insert(op::DIFFICULTY, block::difficulty, GAS_BASE, "DIFFICULTY");
    table.insert(op::GASLIMIT, block::gaslimit, GAS_BASE, "GASLIMIT");

    table.insert(op::POP, flow::pop, GAS_BASE, "POP");
    table.insert(op::MLOAD, flow::mload, GAS_VERY_LOW, "MLOAD");
    table.insert(op::MSTORE, flow::mstore, GAS_VERY_LOW, "MSTORE");
    table.insert(op::MSTORE8, flow::mstore8, GAS_VERY_LOW, "MSTORE8");
    table.insert(op::SLOAD, flow::sload, GAS_SLOAD, "SLOAD");
    // SSTORE prices itself on the slot transition.
    table.insert(op::SSTORE, flow::sstore, GAS_ZERO, "SSTORE");
    table.insert(op::JUMP, flow::jump, GAS_MID, "JUMP");
    table.insert(op::JUMPI, flow::jumpi, GAS_HIGH, "JUMPI");
    table.insert(op::PC, flow::pc, GAS_BASE, "PC");
    table.insert(op::MSIZE, flow::msize, GAS_BASE, "MSIZE");
    table.insert(op::GAS, flow::gas, GAS_BASE, "GAS");
    table.insert(op::JUMPDEST, flow::jumpdest, GAS_JUMPDEST, "JUMPDEST");

    table.insert_range(op::PUSH1, op::PUSH32, push::push_n, GAS_VERY_LOW, "PUSH");
    table.insert_range(op::DUP1, op::DUP16, dup::dup_n, GAS_VERY_LOW, "DUP");
    table.insert_range(op::SWAP1, op::SWAP16, exchange::swap_n, GAS_VERY_LOW, "SWAP");
    table.insert_range(op::LOG0, op::LOG4, logging::log_n, GAS_LOG, "LOG");

    table.insert(op::CREATE, system::create, GAS_CREATE, "CREATE");
    table.insert(op::CALL, system::call, GAS_CALL, "CALL");
    table.insert(op::CALLCODE, system::callcode, GAS_CALL, "CALLCODE");
    table.insert(op::RETURN, system::return_op, GAS_ZERO, "RETURN");
    table.insert(op::SELFDESTRUCT, system::selfdestruct, GAS_ZERO, "SELFDESTRUCT");

    table
}

fn homestead_opcodes() -> OpcodeTable {
    let mut table = frontier_opcodes();
    table.insert(op::DELEGATECALL, system::delegatecall, GAS_CALL, "DELEGATECALL");
    table
}

// EIP-150 reprices the state-reading opcodes and SELFDESTRUCT.
fn tangerine_opcodes() -> OpcodeTable {
    let mut table = homestead_opcodes();
    table.reprice(op::BALANCE, GAS_BALANCE_EIP150);
    table.reprice(op::SLOAD, GAS_SLOAD_EIP150);
    table.reprice(op::EXTCODESIZE, GAS_EXTCODE_EIP150);
    table.reprice(op::EXTCODECOPY, GAS_EXTCODE_EIP150);
    table.reprice(op::CALL, GAS_CALL_EIP150);
    table.reprice(op::CALLCODE, GAS_CALL_EIP150);
    table.reprice(op::DELEGATECALL, GAS_CALL_EIP150);
    table.reprice(op::SELFDESTRUCT, GAS_SELFDESTRUCT_EIP150);
    table
}

lazy_static! {
    pub static ref FRONTIER_RULES: ForkRules = ForkRules {
        fork: Fork::Frontier,
        opcodes: frontier_opcodes(),
        enforce_low_s: false,
        create_deposit_empties_code: false,
        call_gas_cap: false,
        selfdestruct_new_account_gas: 0,
    };
    pub static ref HOMESTEAD_RULES: ForkRules = ForkRules {
        fork: Fork::Homestead,
        opcodes: homestead_opcodes(),
        enforce_low_s: true,
        create_deposit_empties_code: true,
        call_gas_cap: false,
        selfdestruct_new_account_gas: 0,
    };
    pub static ref TANGERINE_RULES: ForkRules = ForkRules {
        fork: Fork::Tangerine,
        opcodes: tangerine_opcodes(),
        enforce_low_s: true,
        create_deposit_empties_code: true,
        call_gas_cap: true,
        selfdestruct_new_account_gas: GAS_SELFDESTRUCT_NEW_ACCOUNT,
    };
}

pub fn rules_for_fork(fork: Fork) -> &'static ForkRules {
    match fork {
        Fork::Frontier => &FRONTIER_RULES,
        Fork::Homestead => &HOMESTEAD_RULES,
        Fork::Tangerine => &TANGERINE_RULES,
    }
}

/// Sorted mapping from starting block number to fork variant.
pub struct ForkSchedule {
    activations: BTreeMap<u64, Fork>,
}

impl ForkSchedule {
    pub fn new(activations: impl IntoIterator<Item = (u64, Fork)>) -> Self {
        Self {
            activations: activations.into_iter().collect(),
        }
    }

    pub fn from_config(config: &ChainConfig) -> Self {
        Self::new(config.fork_activations())
    }

    /// The fork whose activation block is the largest one at or below
    /// `block_number`.
    pub fn fork_at(&self, block_number: u64) -> Result<Fork, ExecutionError> {
        self.activations
            .range(..=block_number)
            .next_back()
            .map(|(_, fork)| *fork)
            .ok_or(ExecutionError::VmNotFound(block_number))
    }

    pub fn rules_at(&self, block_number: u64) -> Result<&'static ForkRules, ExecutionError> {
        Ok(rules_for_fork(self.fork_at(block_number)?))
    }
}
