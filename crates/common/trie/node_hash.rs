use ethereum_types::H256;
use sha3::{Digest, Keccak256};

/// Reference to a trie node from its parent.
///
/// Nodes whose RLP encoding is shorter than 32 bytes are inlined in the
/// parent instead of being hashed and stored separately, per the Merkle
/// Patricia Trie specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeHash {
    Hashed(H256),
    Inline(Vec<u8>),
}

impl NodeHash {
    /// Builds the reference for a node given its RLP encoding.
    pub fn from_encoded_raw(encoded: &[u8]) -> NodeHash {
        if encoded.len() >= 32 {
            NodeHash::Hashed(H256::from_slice(&Keccak256::digest(encoded)))
        } else {
            NodeHash::Inline(encoded.to_vec())
        }
    }

    /// Converts the reference into the 32-byte hash used as a trie root,
    /// hashing inline nodes.
    pub fn finalize(&self) -> H256 {
        match self {
            NodeHash::Hashed(hash) => *hash,
            NodeHash::Inline(encoded) => H256::from_slice(&Keccak256::digest(encoded)),
        }
    }

    /// Returns true if the hash refers to an actual node.
    pub fn is_valid(&self) -> bool {
        !matches!(self, NodeHash::Inline(encoded) if encoded.is_empty())
    }

    /// DB key for the node, only meaningful for hashed nodes.
    pub fn as_key(&self) -> Vec<u8> {
        match self {
            NodeHash::Hashed(hash) => hash.as_bytes().to_vec(),
            NodeHash::Inline(encoded) => encoded.clone(),
        }
    }
}

impl Default for NodeHash {
    fn default() -> Self {
        NodeHash::Inline(Vec::new())
    }
}

impl From<H256> for NodeHash {
    fn from(value: H256) -> Self {
        NodeHash::Hashed(value)
    }
}
