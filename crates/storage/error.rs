use ethrun_rlp::error::RLPDecodeError;
use ethrun_trie::TrieError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Trie(#[from] TrieError),
    #[error(transparent)]
    RLPDecode(#[from] RLPDecodeError),
    #[error("Lock error: panicked when trying to acquire a lock")]
    LockError,
    #[error("Account balance overflow")]
    BalanceOverflow,
    #[error("Account balance underflow")]
    BalanceUnderflow,
    #[error("Computed genesis state root {computed:#x} does not match declared root {declared:#x}")]
    InvalidGenesisStateRoot {
        computed: ethereum_types::H256,
        declared: ethereum_types::H256,
    },
    #[error("Cannot persist with {0} open journal snapshots")]
    OpenSnapshots(usize),
}
