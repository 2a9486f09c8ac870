mod account;
mod fork;
mod genesis;
mod receipt;
mod transaction;

pub use account::AccountState;
pub use fork::Fork;
pub use genesis::{ChainConfig, Genesis, GenesisAccount, GenesisError};
pub use receipt::{Log, Receipt, bloom_from_logs};
pub use transaction::{
    SECP256K1_ORDER, SECP256K1_ORDER_HALF, SignatureError, Transaction, TxKind,
    create_contract_address,
};
