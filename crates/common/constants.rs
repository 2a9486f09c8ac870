use ethereum_types::H256;
use lazy_static::lazy_static;

use crate::utils::keccak;

lazy_static! {
    /// keccak of the empty byte string; the code hash of a codeless account.
    pub static ref EMPTY_KECCAK_HASH: H256 = keccak([]);
    /// keccak of the RLP of the empty string; the root of an empty trie.
    pub static ref EMPTY_TRIE_ROOT: H256 = keccak([0x80]);
}

/// Base cost of any transaction.
pub const GAS_TX: u64 = 21_000;
/// Extra intrinsic cost of a contract-creating transaction.
pub const GAS_TX_CREATE: u64 = 32_000;
/// Intrinsic cost per zero byte of transaction data.
pub const GAS_TX_DATA_ZERO: u64 = 4;
/// Intrinsic cost per non-zero byte of transaction data.
pub const GAS_TX_DATA_NON_ZERO: u64 = 68;
