use ethereum_types::{Address, H256, U256};

use crate::constants::BLOCKHASH_WINDOW;

/// Block-level inputs supplied by the chain layer.
#[derive(Debug, Clone, Default)]
pub struct BlockContext {
    pub number: u64,
    pub coinbase: Address,
    pub timestamp: u64,
    pub difficulty: U256,
    pub gas_limit: u64,
    /// Hashes of the previous blocks, most recent first. Only the last 256
    /// are ever consulted.
    pub parent_hashes: Vec<H256>,
}

impl BlockContext {
    /// Hash of block `number`, or zero when unknown or out of the window.
    pub fn block_hash(&self, number: u64) -> H256 {
        if number >= self.number || self.number - number > BLOCKHASH_WINDOW {
            return H256::zero();
        }
        let back = (self.number - number - 1) as usize;
        self.parent_hashes.get(back).copied().unwrap_or_default()
    }
}

/// Per-transaction context shared by every frame in the call tree.
#[derive(Debug, Clone, Default)]
pub struct TransactionContext {
    pub origin: Address,
    pub gas_price: U256,
    log_counter: u64,
}

impl TransactionContext {
    pub fn new(origin: Address, gas_price: U256) -> Self {
        Self {
            origin,
            gas_price,
            log_counter: 0,
        }
    }

    /// Monotonic counter ordering log entries across the whole transaction.
    pub fn next_log_counter(&mut self) -> u64 {
        let counter = self.log_counter;
        self.log_counter += 1;
        counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_hash_window() {
        let context = BlockContext {
            number: 300,
            parent_hashes: (0..300).rev().map(H256::from_low_u64_be).collect(),
            ..Default::default()
        };
        assert_eq!(context.block_hash(299), H256::from_low_u64_be(299));
        assert_eq!(context.block_hash(44), H256::from_low_u64_be(44));
        // own block, future blocks and anything older than 256 are zero
        assert_eq!(context.block_hash(300), H256::zero());
        assert_eq!(context.block_hash(301), H256::zero());
        assert_eq!(context.block_hash(43), H256::zero());
    }

    #[test]
    fn log_counter_is_monotonic() {
        let mut context = TransactionContext::new(Address::zero(), U256::one());
        assert_eq!(context.next_log_counter(), 0);
        assert_eq!(context.next_log_counter(), 1);
        assert_eq!(context.next_log_counter(), 2);
    }
}
