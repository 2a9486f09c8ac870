pub mod api;
pub mod error;
mod journal;
mod world_state;

pub use api::{InMemoryKv, KvStore};
pub use error::StoreError;
pub use journal::JournalDb;
pub use world_state::{StateSnapshot, WorldState};
