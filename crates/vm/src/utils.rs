//! Harness helpers for exercising the VM from tests and tools: canned
//! accounts, bytecode execution over a fresh world state, and genesis
//! fixture loading.

use std::sync::Arc;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use ethrun_common::types::{Fork, Genesis, Receipt, Transaction, TxKind};
use ethrun_storage::{InMemoryKv, StoreError, WorldState};
use secp256k1::{SECP256K1, SecretKey};

use crate::{
    computation::Computation,
    environment::{BlockContext, TransactionContext},
    errors::{ExecutionError, VMError},
    forks::rules_for_fork,
    message::Message,
    operations::{Operation, ops_to_bytecode},
    vm::{ExecutionReport, Vm},
};

/// Address the helpers install test bytecode at.
pub fn test_contract_address() -> Address {
    Address::repeat_byte(0x42)
}

/// Default sender used by the helpers.
pub fn test_sender_address() -> Address {
    Address::repeat_byte(0x21)
}

pub fn test_block_context() -> BlockContext {
    BlockContext {
        number: 1,
        coinbase: Address::repeat_byte(0xc0),
        timestamp: 1_500_000_000,
        difficulty: U256::from(0x20000),
        gas_limit: 10_000_000,
        parent_hashes: vec![H256::repeat_byte(0x01)],
    }
}

/// Deterministic secret key for signing test transactions.
// A key with a single nonzero low byte is always below the group order.
#[allow(clippy::unwrap_used)]
pub fn test_secret_key(seed: u8) -> SecretKey {
    let mut bytes = [0u8; 32];
    bytes[31] = seed.max(1);
    SecretKey::from_slice(&bytes).unwrap()
}

/// The address controlled by `secret_key`.
pub fn address_of(secret_key: &SecretKey) -> Address {
    let public_key = secret_key.public_key(SECP256K1);
    let hash = ethrun_common::utils::keccak(&public_key.serialize_uncompressed()[1..]);
    Address::from_slice(&hash.as_bytes()[12..])
}

/// A world state plus block context, pre-wired for driving the VM.
pub struct TestVm {
    pub state: WorldState,
    pub block: BlockContext,
}

impl Default for TestVm {
    fn default() -> Self {
        Self::new()
    }
}

impl TestVm {
    pub fn new() -> Self {
        Self {
            state: WorldState::new(Arc::new(InMemoryKv::new())),
            block: test_block_context(),
        }
    }

    pub fn from_genesis(genesis: &Genesis) -> Result<Self, StoreError> {
        Ok(Self {
            state: WorldState::from_genesis(Arc::new(InMemoryKv::new()), genesis)?,
            block: test_block_context(),
        })
    }

    pub fn fund(&mut self, address: Address, balance: U256) -> Result<(), StoreError> {
        self.state.set_balance(address, balance)
    }

    pub fn install_contract(&mut self, address: Address, code: &[u8]) -> Result<(), StoreError> {
        self.state.set_code(address, code)
    }

    /// Runs the given operations as the code of [`test_contract_address`]
    /// under Frontier rules.
    pub fn execute_ops(&mut self, operations: &[Operation]) -> Result<Computation, VMError> {
        self.execute_ops_with_fork(operations, Fork::Frontier)
    }

    pub fn execute_ops_with_fork(
        &mut self,
        operations: &[Operation],
        fork: Fork,
    ) -> Result<Computation, VMError> {
        self.execute_code(ops_to_bytecode(operations), fork)
    }

    pub fn execute_code(&mut self, code: Bytes, fork: Fork) -> Result<Computation, VMError> {
        let message = Message {
            gas: 1_000_000,
            gas_price: U256::one(),
            to: TxKind::Call(test_contract_address()),
            sender: test_sender_address(),
            origin: test_sender_address(),
            value: U256::zero(),
            data: Bytes::new(),
            code,
            depth: 0,
            code_address: None,
            create_address: None,
            is_static: false,
            should_transfer_value: false,
        };
        self.execute_message(message, fork)
    }

    pub fn execute_message(&mut self, message: Message, fork: Fork) -> Result<Computation, VMError> {
        let mut vm = Vm::new(&mut self.state, self.block.clone(), rules_for_fork(fork));
        vm.tx_context = TransactionContext::new(message.origin, message.gas_price);
        if message.is_create() {
            vm.apply_create_message(message)
        } else {
            vm.apply_message(message)
        }
    }

    pub fn execute_transaction(
        &mut self,
        transaction: &Transaction,
        fork: Fork,
    ) -> Result<(Receipt, ExecutionReport), ExecutionError> {
        let mut vm = Vm::new(&mut self.state, self.block.clone(), rules_for_fork(fork));
        vm.execute_transaction(transaction)
    }
}

/// Loads a genesis fixture and builds its world state, for comparing
/// computed state roots against declared ones.
pub fn genesis_state(json: &str) -> Result<WorldState, ExecutionError> {
    let genesis: Genesis = serde_json::from_str(json)
        .map_err(|err| ExecutionError::InvalidFixture(err.to_string()))?;
    Ok(WorldState::from_genesis(Arc::new(InMemoryKv::new()), &genesis)?)
}
