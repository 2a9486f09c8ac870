use ethereum_types::U256;
use ethrun_common::types::SignatureError;
use ethrun_storage::StoreError;
use thiserror::Error;

/// In-band frame errors: every variant except `Internal` is caught at the
/// frame boundary, reverts the frame's snapshot and burns its remaining gas.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VMError {
    #[error("Out of gas")]
    OutOfGas,
    #[error("Invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),
    #[error("Stack underflow")]
    StackUnderflow,
    #[error("Stack overflow")]
    StackOverflow,
    #[error("Invalid jump destination")]
    InvalidJumpDestination,
    #[error("Stack depth limit reached")]
    StackDepthLimit,
    #[error("Insufficient funds for value transfer")]
    InsufficientFunds,
    #[error("Write attempted inside a static context")]
    WriteProtection,
    #[error("Address collision while creating contract")]
    ContractCreationCollision,
    #[error("Operand does not fit the address space")]
    VeryLargeNumber,
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl VMError {
    /// Whether the error consumes all remaining frame gas. Every VM error
    /// burns in Frontier, Homestead and Tangerine; REVERT arrives later.
    pub fn burns_gas(&self) -> bool {
        !self.is_internal()
    }

    /// Whether the error erases the frame's return data.
    pub fn erases_return_data(&self) -> bool {
        !self.is_internal()
    }

    /// Internal errors are host failures, not consensus outcomes; they abort
    /// transaction processing instead of being recorded on the frame.
    pub fn is_internal(&self) -> bool {
        matches!(self, VMError::Internal(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("State access failed: {0}")]
    Store(String),
    #[error("{0}")]
    Invariant(&'static str),
}

impl From<StoreError> for VMError {
    fn from(err: StoreError) -> Self {
        VMError::Internal(InternalError::Store(err.to_string()))
    }
}

/// Pre-execution rejection: the transaction never runs and no state changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidTransaction {
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("Signature s value is in the upper half of the curve order")]
    SignatureHighS,
    #[error("Gas limit {gas_limit} is below the intrinsic gas {intrinsic_gas}")]
    IntrinsicGasTooLow { gas_limit: u64, intrinsic_gas: u64 },
    #[error("Transaction nonce {got} does not match sender nonce {expected}")]
    NonceMismatch { expected: u64, got: u64 },
    #[error("Sender balance {balance} cannot cover upfront cost {required}")]
    InsufficientAccountFunds { required: U256, balance: U256 },
    #[error("Transaction gas limit {gas_limit} exceeds remaining block gas {remaining}")]
    BlockGasLimitReached { gas_limit: u64, remaining: u64 },
}

/// Failures of the transaction pipeline as a whole.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    InvalidTransaction(#[from] InvalidTransaction),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Internal(InternalError),
    #[error("No VM rules known for block {0}")]
    VmNotFound(u64),
    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),
}

impl From<VMError> for ExecutionError {
    fn from(err: VMError) -> Self {
        match err {
            VMError::Internal(internal) => ExecutionError::Internal(internal),
            // Non-internal VM errors are recorded on the computation and
            // never escape a frame; mapping them here is a fallback.
            other => ExecutionError::Internal(InternalError::Store(other.to_string())),
        }
    }
}
