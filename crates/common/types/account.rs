use bytes::BufMut;
use ethereum_types::{H256, U256};
use ethrun_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};

use crate::constants::{EMPTY_KECCAK_HASH, EMPTY_TRIE_ROOT};

/// The account record stored in the state trie under keccak(address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub nonce: u64,
    pub balance: U256,
    pub storage_root: H256,
    pub code_hash: H256,
}

impl Default for AccountState {
    fn default() -> Self {
        Self {
            nonce: 0,
            balance: U256::zero(),
            storage_root: *EMPTY_TRIE_ROOT,
            code_hash: *EMPTY_KECCAK_HASH,
        }
    }
}

impl AccountState {
    pub fn has_code(&self) -> bool {
        self.code_hash != *EMPTY_KECCAK_HASH
    }

    pub fn has_code_or_nonce(&self) -> bool {
        self.has_code() || self.nonce != 0
    }

    /// An account is empty iff it has zero nonce, zero balance and no code.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && !self.has_code()
    }
}

impl RLPEncode for AccountState {
    fn encode(&self, buf: &mut dyn BufMut) {
        Encoder::new(buf)
            .encode_field(&self.nonce)
            .encode_field(&self.balance)
            .encode_field(&self.storage_root)
            .encode_field(&self.code_hash)
            .finish();
    }
}

impl RLPDecode for AccountState {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (nonce, decoder) = decoder.decode_field("nonce")?;
        let (balance, decoder) = decoder.decode_field("balance")?;
        let (storage_root, decoder) = decoder.decode_field("storage_root")?;
        let (code_hash, decoder) = decoder.decode_field("code_hash")?;
        Ok((
            Self {
                nonce,
                balance,
                storage_root,
                code_hash,
            },
            decoder.finish()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_account_is_empty() {
        let account = AccountState::default();
        assert!(account.is_empty());
        assert!(!account.has_code_or_nonce());
    }

    #[test]
    fn rlp_roundtrip() {
        let account = AccountState {
            nonce: 5,
            balance: U256::from(1_000_000u64),
            storage_root: H256::repeat_byte(1),
            code_hash: H256::repeat_byte(2),
        };
        let encoded = account.encode_to_vec();
        assert_eq!(AccountState::decode(&encoded).unwrap(), account);
    }
}
