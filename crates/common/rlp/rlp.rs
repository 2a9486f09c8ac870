//! Recursive Length Prefix (RLP) encoding and decoding.
//!
//! RLP is the canonical serialization format for consensus data in this
//! workspace: transactions, account records, receipts, logs and trie nodes
//! all round-trip through it.
//!
//! - [`encode::RLPEncode`] / [`decode::RLPDecode`]: the core traits.
//! - [`structs::Encoder`] / [`structs::Decoder`]: field-by-field builders
//!   for struct types, encoded as RLP lists.

pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod structs;
