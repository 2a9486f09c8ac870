use ethrun_rlp::error::RLPDecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrieError {
    #[error(transparent)]
    RLPDecode(#[from] RLPDecodeError),
    #[error("Inconsistent internal tree structure")]
    InconsistentTree,
    #[error("Lock error: panicked when trying to acquire a lock")]
    LockError,
    #[error("Database error: {0}")]
    DbError(String),
}
