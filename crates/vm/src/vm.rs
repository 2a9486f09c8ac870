use bytes::Bytes;
use ethereum_types::{Address, U256};
use ethrun_common::types::{
    Log, Receipt, Transaction, TxKind, create_contract_address,
};
use ethrun_storage::WorldState;
use tracing::{debug, info};

use crate::{
    computation::Computation,
    constants::{GAS_CODE_DEPOSIT_BYTE, REFUND_SELFDESTRUCT, STACK_DEPTH_LIMIT},
    environment::{BlockContext, TransactionContext},
    errors::{ExecutionError, InvalidTransaction, VMError},
    forks::{ForkRules, ForkSchedule},
    message::Message,
    opcodes::OpcodeResult,
    precompiles,
};

/// Outcome of a transaction as seen by the caller of
/// [`Vm::execute_transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxResult {
    Success,
    /// The top-level frame failed; fees were still charged.
    Halted(VMError),
}

/// Summary of one executed transaction.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub result: TxResult,
    /// Gas charged to the sender, net of the refund.
    pub gas_used: u64,
    pub gas_refunded: u64,
    pub output: Bytes,
    pub logs: Vec<Log>,
    pub created_address: Option<Address>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        matches!(self.result, TxResult::Success)
    }
}

/// The state transition machine for one fork variant.
///
/// Owns the per-transaction context and drives the message / create
/// sub-protocols; fork differences come in through [`ForkRules`].
pub struct Vm<'a> {
    pub state: &'a mut WorldState,
    pub block: BlockContext,
    pub rules: &'static ForkRules,
    pub tx_context: TransactionContext,
    /// Cumulative gas used by the transactions executed so far, net of
    /// refunds; carried into each receipt.
    block_gas_used: u64,
}

/// What a parent frame needs to know about a finished child.
pub struct ChildOutcome {
    pub success: bool,
    pub gas_remaining: u64,
    pub should_burn_gas: bool,
    pub erases_return_data: bool,
    pub output: Bytes,
}

impl<'a> Vm<'a> {
    pub fn new(state: &'a mut WorldState, block: BlockContext, rules: &'static ForkRules) -> Self {
        Self {
            state,
            block,
            rules,
            tx_context: TransactionContext::default(),
            block_gas_used: 0,
        }
    }

    /// Builds a VM for the block, selecting the rules by its number.
    pub fn for_block(
        state: &'a mut WorldState,
        block: BlockContext,
        schedule: &ForkSchedule,
    ) -> Result<Self, ExecutionError> {
        let rules = schedule.rules_at(block.number)?;
        Ok(Self::new(state, block, rules))
    }

    pub fn block_gas_used(&self) -> u64 {
        self.block_gas_used
    }

    //
    // Transaction pipeline
    //
    pub fn execute_transaction(
        &mut self,
        transaction: &Transaction,
    ) -> Result<(Receipt, ExecutionReport), ExecutionError> {
        let sender = transaction
            .sender()
            .map_err(InvalidTransaction::Signature)?;
        self.validate_transaction(transaction, sender)?;

        // Buy gas and spend the nonce before anything runs.
        let gas_fee = U256::from(transaction.gas) * transaction.gas_price;
        self.state.sub_balance(sender, gas_fee)?;
        self.state.increment_nonce(sender)?;
        self.tx_context = TransactionContext::new(sender, transaction.gas_price);

        let message_gas = transaction.gas - transaction.intrinsic_gas();
        let (message, created_address) = match transaction.to {
            TxKind::Create => {
                let creation_nonce = self.state.get_nonce(sender)? - 1;
                let contract_address = create_contract_address(sender, creation_nonce);
                let message = Message {
                    gas: message_gas,
                    gas_price: transaction.gas_price,
                    to: TxKind::Create,
                    sender,
                    origin: sender,
                    value: transaction.value,
                    data: Bytes::new(),
                    code: transaction.data.clone(),
                    depth: 0,
                    code_address: None,
                    create_address: Some(contract_address),
                    is_static: false,
                    should_transfer_value: true,
                };
                (message, Some(contract_address))
            }
            TxKind::Call(to) => {
                let message = Message {
                    gas: message_gas,
                    gas_price: transaction.gas_price,
                    to: TxKind::Call(to),
                    sender,
                    origin: sender,
                    value: transaction.value,
                    data: transaction.data.clone(),
                    code: self.state.get_code(to)?,
                    depth: 0,
                    code_address: None,
                    create_address: None,
                    is_static: false,
                    should_transfer_value: true,
                };
                (message, None)
            }
        };

        info!(
            sender = ?sender,
            to = ?transaction.to,
            value = %transaction.value,
            gas = transaction.gas,
            gas_price = %transaction.gas_price,
            "transaction"
        );

        let computation = if message.is_create() {
            self.apply_create_message(message)
        } else {
            self.apply_message(message)
        }
        .map_err(ExecutionError::from)?;

        // Self-destruct refunds.
        let deletions = computation.get_accounts_for_deletion();
        let gas_refunded =
            computation.get_gas_refund() + REFUND_SELFDESTRUCT * deletions.len() as u64;

        // Gas refunds, bounded by half the gas actually used.
        let gas_remaining = computation.get_gas_remaining();
        let gas_used = transaction.gas - gas_remaining;
        let gas_refund = gas_refunded.min(gas_used / 2);
        let refund_amount = U256::from(gas_refund + gas_remaining) * transaction.gas_price;
        if !refund_amount.is_zero() {
            debug!(amount = %refund_amount, "transaction refund");
            self.state.add_balance(sender, refund_amount)?;
        }

        // Miner fees.
        let transaction_fee =
            U256::from(transaction.gas - gas_remaining - gas_refund) * transaction.gas_price;
        debug!(fee = %transaction_fee, coinbase = ?self.block.coinbase, "transaction fee");
        self.state.add_balance(self.block.coinbase, transaction_fee)?;

        // Process self-destructs: beneficiaries are credited only now, so a
        // destroyed contract keeps its balance for the rest of the
        // transaction.
        for (address, beneficiary) in &deletions {
            debug!(account = ?address, "deleting account");
            let balance = self.state.get_balance(*address)?;
            self.state.add_balance(*beneficiary, balance)?;
            self.state.set_balance(*address, U256::zero())?;
            self.state.delete_account(*address)?;
        }

        let net_gas_used = gas_used - gas_refund;
        self.block_gas_used += net_gas_used;
        let logs = computation.logs();
        self.state.persist()?;
        let receipt = Receipt::new(self.state.state_root(), self.block_gas_used, logs.clone());

        let report = ExecutionReport {
            result: match computation.error() {
                None => TxResult::Success,
                Some(error) => TxResult::Halted(error.clone()),
            },
            gas_used: net_gas_used,
            gas_refunded: gas_refund,
            output: computation.output(),
            logs,
            created_address: created_address.filter(|_| computation.is_success()),
        };
        Ok((receipt, report))
    }

    fn validate_transaction(
        &self,
        transaction: &Transaction,
        sender: Address,
    ) -> Result<(), ExecutionError> {
        if self.rules.enforce_low_s && !transaction.has_low_s() {
            return Err(InvalidTransaction::SignatureHighS.into());
        }
        let intrinsic_gas = transaction.intrinsic_gas();
        if transaction.gas < intrinsic_gas {
            return Err(InvalidTransaction::IntrinsicGasTooLow {
                gas_limit: transaction.gas,
                intrinsic_gas,
            }
            .into());
        }
        let sender_nonce = self.state.get_nonce(sender)?;
        if transaction.nonce != sender_nonce {
            return Err(InvalidTransaction::NonceMismatch {
                expected: sender_nonce,
                got: transaction.nonce,
            }
            .into());
        }
        let upfront_cost =
            U256::from(transaction.gas) * transaction.gas_price + transaction.value;
        let balance = self.state.get_balance(sender)?;
        if balance < upfront_cost {
            return Err(InvalidTransaction::InsufficientAccountFunds {
                required: upfront_cost,
                balance,
            }
            .into());
        }
        let block_gas_remaining = self.block.gas_limit.saturating_sub(self.block_gas_used);
        if transaction.gas > block_gas_remaining {
            return Err(InvalidTransaction::BlockGasLimitReached {
                gas_limit: transaction.gas,
                remaining: block_gas_remaining,
            }
            .into());
        }
        Ok(())
    }

    //
    // Message sub-protocol
    //
    /// Runs a call frame: snapshot, depth check, value transfer, dispatch,
    /// then commit or revert.
    pub fn apply_message(&mut self, msg: Message) -> Result<Computation, VMError> {
        let snapshot = self.state.snapshot()?;

        if msg.depth >= STACK_DEPTH_LIMIT {
            let mut computation = Computation::new(msg);
            computation.set_error(VMError::StackDepthLimit);
            self.state.revert(snapshot)?;
            return Ok(computation);
        }

        if msg.should_transfer_value && !msg.value.is_zero() {
            let sender_balance = self.state.get_balance(msg.sender)?;
            if sender_balance < msg.value {
                let mut computation = Computation::new(msg);
                computation.set_error(VMError::InsufficientFunds);
                self.state.revert(snapshot)?;
                return Ok(computation);
            }
            self.state.sub_balance(msg.sender, msg.value)?;
            self.state.add_balance(msg.storage_address(), msg.value)?;
            debug!(
                value = %msg.value,
                from = ?msg.sender,
                to = ?msg.storage_address(),
                "value transferred"
            );
        }

        let computation = self.apply_computation(msg)?;
        if computation.is_error() {
            self.state.revert(snapshot)?;
        } else {
            self.state.commit(snapshot)?;
        }
        Ok(computation)
    }

    /// Runs a create frame: the message protocol plus nonce bump, collision
    /// check and code deposit.
    pub fn apply_create_message(&mut self, msg: Message) -> Result<Computation, VMError> {
        let snapshot = self.state.snapshot()?;
        let contract_address = msg.storage_address();

        // The creator's nonce moves inside the frame for message creates;
        // the transaction pipeline has already bumped the origin's.
        if msg.depth > 0 {
            self.state.increment_nonce(msg.sender)?;
        }

        if self.state.account_has_code_or_nonce(contract_address)? {
            debug!(address = ?contract_address, "contract creation collision");
            let mut computation = Computation::new(msg);
            computation.set_error(VMError::ContractCreationCollision);
            self.state.revert(snapshot)?;
            return Ok(computation);
        }

        let mut computation = self.apply_message(msg)?;
        if computation.is_error() {
            self.state.revert(snapshot)?;
            return Ok(computation);
        }

        let contract_code = computation.output();
        if !contract_code.is_empty() {
            let deposit_cost = GAS_CODE_DEPOSIT_BYTE * contract_code.len() as u64;
            match computation
                .gas_meter
                .consume(deposit_cost, "contract code deposit")
            {
                Ok(()) => {
                    debug!(address = ?contract_address, len = contract_code.len(), "setting code");
                    self.state.set_code(contract_address, &contract_code)?;
                }
                Err(error) => {
                    if self.rules.create_deposit_empties_code {
                        // Homestead and later leave the contract codeless.
                        computation.set_output(Bytes::new());
                    } else {
                        computation.set_error(error);
                        self.state.revert(snapshot)?;
                        return Ok(computation);
                    }
                }
            }
        }
        self.state.commit(snapshot)?;
        Ok(computation)
    }

    /// The dispatch loop for one frame, or the precompile shortcut.
    fn apply_computation(&mut self, msg: Message) -> Result<Computation, VMError> {
        let mut computation = Computation::new(msg);
        debug!(
            gas = computation.msg.gas,
            from = ?computation.msg.sender,
            to = ?computation.msg.to,
            value = %computation.msg.value,
            depth = computation.msg.depth,
            "computation starting"
        );

        if let Some(precompile) = computation
            .msg
            .code_address()
            .and_then(precompiles::precompile_for)
        {
            if let Err(error) = precompile(&mut computation) {
                if error.is_internal() {
                    return Err(error);
                }
                computation.set_error(error);
            }
            return Ok(computation);
        }

        loop {
            let Some(opcode) = computation.code.next_opcode() else {
                // Running off the end of the code halts like STOP.
                break;
            };
            let Some(entry) = self.rules.opcodes.get(opcode).copied() else {
                computation.set_error(VMError::InvalidOpcode(opcode));
                break;
            };
            if let Err(error) = computation.gas_meter.consume(entry.gas_cost, entry.mnemonic) {
                computation.set_error(error);
                break;
            }
            match (entry.handler)(self, &mut computation, opcode) {
                Ok(OpcodeResult::Continue) => {}
                Ok(OpcodeResult::Halt) => break,
                Err(error) => {
                    if error.is_internal() {
                        return Err(error);
                    }
                    computation.set_error(error);
                    break;
                }
            }
        }
        Ok(computation)
    }

    /// Spawns, runs and adopts a child frame, returning what its parent's
    /// opcode handler needs.
    pub fn apply_child_computation(
        &mut self,
        parent: &mut Computation,
        child_msg: Message,
    ) -> Result<ChildOutcome, VMError> {
        let child = if child_msg.is_create() {
            self.apply_create_message(child_msg)?
        } else {
            self.apply_message(child_msg)?
        };
        let outcome = ChildOutcome {
            success: child.is_success(),
            gas_remaining: child.get_gas_remaining(),
            should_burn_gas: child.should_burn_gas(),
            erases_return_data: child.should_erase_return_data(),
            output: child.output(),
        };
        parent.absorb_child(child);
        Ok(outcome)
    }
}
