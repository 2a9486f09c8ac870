use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    io::BufReader,
    path::Path,
};

use super::Fork;

/// A genesis specification: chain configuration plus the initial account
/// allocation.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    /// Chain configuration
    pub config: ChainConfig,
    /// The initial state of the accounts in the genesis block.
    pub alloc: BTreeMap<Address, GenesisAccount>,
    /// Genesis header values
    #[serde(default)]
    pub coinbase: Address,
    #[serde(default, deserialize_with = "crate::serde_utils::u256::deser_hex_or_dec_str")]
    pub difficulty: U256,
    #[serde(default, with = "crate::serde_utils::u64::hex_str")]
    pub gas_limit: u64,
    #[serde(default, deserialize_with = "crate::serde_utils::u64::deser_hex_or_dec_str")]
    pub timestamp: u64,
    /// Expected state root; validated against the computed one when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_root: Option<H256>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    #[error("Failed to decode genesis file: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Failed to open genesis file: {0}")]
    File(#[from] std::io::Error),
}

impl TryFrom<&Path> for Genesis {
    type Error = GenesisError;

    fn try_from(genesis_file_path: &Path) -> Result<Self, Self::Error> {
        let genesis_file = std::fs::File::open(genesis_file_path)?;
        let genesis_reader = BufReader::new(genesis_file);
        Ok(serde_json::from_reader(genesis_reader)?)
    }
}

/// Blockchain settings defined per block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Current chain identifier
    #[serde(default)]
    pub chain_id: u64,

    /// Block numbers for the block where each fork was activated
    /// (None = no fork, 0 = fork is already active)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homestead_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eip150_block: Option<u64>,
}

impl ChainConfig {
    /// The fork active at the given block number.
    pub fn fork(&self, block_number: u64) -> Fork {
        let activations = [
            (Fork::Tangerine, self.eip150_block),
            (Fork::Homestead, self.homestead_block),
        ];
        activations
            .into_iter()
            .find_map(|(fork, block)| {
                block
                    .filter(|activation| *activation <= block_number)
                    .map(|_| fork)
            })
            .unwrap_or(Fork::Frontier)
    }

    /// Activation entries as (starting block, fork) pairs, Frontier first.
    pub fn fork_activations(&self) -> Vec<(u64, Fork)> {
        let mut activations = vec![(0, Fork::Frontier)];
        if let Some(block) = self.homestead_block {
            activations.push((block, Fork::Homestead));
        }
        if let Some(block) = self.eip150_block {
            activations.push((block, Fork::Tangerine));
        }
        activations
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct GenesisAccount {
    #[serde(default, with = "crate::serde_utils::bytes")]
    pub code: Bytes,
    #[serde(default)]
    pub storage: HashMap<U256, U256>,
    #[serde(deserialize_with = "crate::serde_utils::u256::deser_hex_or_dec_str")]
    #[serde(serialize_with = "crate::serde_utils::u256::ser_dec_str")]
    pub balance: U256,
    #[serde(default, with = "crate::serde_utils::u64::hex_str")]
    pub nonce: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_genesis_json() {
        let json = r#"{
            "config": { "chainId": 1, "homesteadBlock": 1150000, "eip150Block": 2463000 },
            "alloc": {
                "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa": {
                    "balance": "1000000000000000000",
                    "nonce": "0x1"
                },
                "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb": {
                    "balance": "0xde0b6b3a7640000",
                    "code": "0x6005600055"
                }
            },
            "difficulty": "0x400",
            "gasLimit": "0x1388",
            "timestamp": "0"
        }"#;
        let genesis: Genesis = serde_json::from_str(json).unwrap();
        assert_eq!(genesis.config.chain_id, 1);
        assert_eq!(genesis.alloc.len(), 2);
        let first = &genesis.alloc[&Address::repeat_byte(0xaa)];
        assert_eq!(first.balance, U256::from(10).pow(18.into()));
        assert_eq!(first.nonce, 1);
        let second = &genesis.alloc[&Address::repeat_byte(0xbb)];
        assert_eq!(second.code.as_ref(), &[0x60, 0x05, 0x60, 0x00, 0x55]);
        assert_eq!(genesis.gas_limit, 0x1388);
    }

    #[test]
    fn fork_lookup_by_block() {
        let config = ChainConfig {
            chain_id: 1,
            homestead_block: Some(10),
            eip150_block: Some(20),
        };
        assert_eq!(config.fork(0), Fork::Frontier);
        assert_eq!(config.fork(9), Fork::Frontier);
        assert_eq!(config.fork(10), Fork::Homestead);
        assert_eq!(config.fork(19), Fork::Homestead);
        assert_eq!(config.fork(20), Fork::Tangerine);
        assert_eq!(config.fork(1_000_000_000), Fork::Tangerine);
    }
}
