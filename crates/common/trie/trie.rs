pub mod db;
pub mod error;
mod nibbles;
mod node;
mod node_hash;
mod state;

use ethereum_types::H256;
use ethrun_rlp::constants::RLP_NULL;
use lazy_static::lazy_static;
use sha3::{Digest, Keccak256};

pub use self::db::{InMemoryTrieDB, TrieDB};
pub use self::error::TrieError;
pub use self::nibbles::Nibbles;
pub use self::node::{BranchNode, ExtensionNode, LeafNode, Node};
pub use self::node_hash::NodeHash;
pub use self::state::TrieState;

lazy_static! {
    /// Hash of an empty trie: keccak of the RLP of the empty string.
    pub static ref EMPTY_TRIE_HASH: H256 = H256::from_slice(
        Keccak256::new()
            .chain_update([RLP_NULL])
            .finalize()
            .as_slice(),
    );
}

/// Ethereum-compatible Merkle Patricia Trie over a pluggable node store.
pub struct Trie {
    /// Reference to the current root node.
    root: Option<NodeHash>,
    /// Contains the trie's nodes.
    state: TrieState,
}

impl Trie {
    /// Creates a new Trie from a clean DB.
    pub fn new(db: Box<dyn TrieDB>) -> Self {
        Self {
            root: None,
            state: TrieState::new(db),
        }
    }

    /// Creates a trie rooted at `root` over an already-initialized DB.
    pub fn open(db: Box<dyn TrieDB>, root: H256) -> Self {
        let root = (root != *EMPTY_TRIE_HASH).then(|| root.into());
        Self {
            root,
            state: TrieState::new(db),
        }
    }

    /// Retrieves a value from the trie given its path (the raw key bytes).
    pub fn get(&self, path: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        let Some(root) = &self.root else {
            return Ok(None);
        };
        let root_node = self
            .state
            .get_node(root)?
            .ok_or(TrieError::InconsistentTree)?;
        root_node.get(&self.state, Nibbles::from_bytes(path))
    }

    /// Inserts a value into the trie.
    pub fn insert(&mut self, path: &[u8], value: Vec<u8>) -> Result<(), TrieError> {
        let path = Nibbles::from_bytes(path);
        let root = self.root.take();
        if let Some(root_node) = root
            .map(|root| self.state.get_node(&root))
            .transpose()?
            .flatten()
        {
            let root_node = root_node.insert(&mut self.state, path, value)?;
            self.root = Some(root_node.insert_self(&mut self.state)?);
        } else {
            // An empty trie gets a single leaf.
            let new_leaf = Node::from(LeafNode::new(path, value));
            self.root = Some(new_leaf.insert_self(&mut self.state)?);
        }
        Ok(())
    }

    /// Removes a value from the trie given its path.
    /// Returns the removed value, or None if the path was not present.
    pub fn remove(&mut self, path: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        let Some(root) = self.root.take() else {
            return Ok(None);
        };
        let root_node = self
            .state
            .get_node(&root)?
            .ok_or(TrieError::InconsistentTree)?;
        let (root_node, old_value) = root_node.remove(&mut self.state, Nibbles::from_bytes(path))?;
        self.root = root_node
            .map(|node| node.insert_self(&mut self.state))
            .transpose()?;
        Ok(old_value)
    }

    /// Returns the hash of the trie's root node, committing pending nodes to
    /// the DB. Returns keccak(RLP_NULL) for an empty trie.
    pub fn hash(&mut self) -> Result<H256, TrieError> {
        self.commit()?;
        Ok(self.hash_no_commit())
    }

    /// Returns the hash of the trie's root node without persisting.
    pub fn hash_no_commit(&self) -> H256 {
        self.root
            .as_ref()
            .map(|root| root.finalize())
            .unwrap_or(*EMPTY_TRIE_HASH)
    }

    /// Commits the cached nodes reachable from the root to the DB.
    pub fn commit(&mut self) -> Result<(), TrieError> {
        if let Some(ref root) = self.root {
            self.state.commit(root)?;
        }
        Ok(())
    }

    /// In-memory trie for tests and ephemeral computation.
    pub fn new_temp() -> Self {
        Self::new(Box::new(InMemoryTrieDB::default()))
    }
}
