/// Maximum message-call / create depth.
pub const STACK_DEPTH_LIMIT: usize = 1024;
/// Maximum number of items on the word stack.
pub const STACK_SIZE_LIMIT: usize = 1024;
/// Number of trailing block hashes BLOCKHASH can reach.
pub const BLOCKHASH_WINDOW: u64 = 256;

// Opcode base-cost tiers.
pub const GAS_ZERO: u64 = 0;
pub const GAS_BASE: u64 = 2;
pub const GAS_VERY_LOW: u64 = 3;
pub const GAS_LOW: u64 = 5;
pub const GAS_MID: u64 = 8;
pub const GAS_HIGH: u64 = 10;

pub const GAS_JUMPDEST: u64 = 1;
pub const GAS_SHA3: u64 = 30;
pub const GAS_SHA3_WORD: u64 = 6;
pub const GAS_COPY_WORD: u64 = 3;
pub const GAS_BLOCKHASH: u64 = 20;

pub const GAS_BALANCE: u64 = 20;
pub const GAS_BALANCE_EIP150: u64 = 400;
pub const GAS_SLOAD: u64 = 50;
pub const GAS_SLOAD_EIP150: u64 = 200;
pub const GAS_EXTCODE: u64 = 20;
pub const GAS_EXTCODE_EIP150: u64 = 700;

pub const GAS_SSET: u64 = 20_000;
pub const GAS_SRESET: u64 = 5_000;
pub const REFUND_SCLEAR: u64 = 15_000;

pub const GAS_EXP: u64 = 10;
pub const GAS_EXP_BYTE: u64 = 10;

pub const GAS_LOG: u64 = 375;
pub const GAS_LOG_TOPIC: u64 = 375;
pub const GAS_LOG_DATA_BYTE: u64 = 8;

pub const GAS_CREATE: u64 = 32_000;
pub const GAS_CODE_DEPOSIT_BYTE: u64 = 200;

pub const GAS_CALL: u64 = 40;
pub const GAS_CALL_EIP150: u64 = 700;
pub const GAS_CALL_VALUE: u64 = 9_000;
pub const GAS_CALL_STIPEND: u64 = 2_300;
pub const GAS_NEW_ACCOUNT: u64 = 25_000;

pub const GAS_SELFDESTRUCT_EIP150: u64 = 5_000;
pub const GAS_SELFDESTRUCT_NEW_ACCOUNT: u64 = 25_000;
/// Refund credited per account scheduled for deletion.
pub const REFUND_SELFDESTRUCT: u64 = 24_000;

// Memory pricing.
pub const GAS_MEMORY_WORD: u64 = 3;
pub const GAS_MEMORY_QUADRATIC_DENOMINATOR: u64 = 512;

// CALL success flags pushed on the caller's stack.
pub const SUCCESS_FOR_CALL: u64 = 1;
pub const REVERT_FOR_CALL: u64 = 0;
