use std::{cell::RefCell, collections::HashMap};

use crate::{db::TrieDB, error::TrieError, node::Node, node_hash::NodeHash};

/// Node store backing a [`Trie`](crate::Trie).
///
/// Mutated nodes live in an in-memory cache until [`commit`](TrieState::commit)
/// writes the subset reachable from the root to the database. Nodes are
/// content-addressed and never removed from the database.
pub struct TrieState {
    db: Box<dyn TrieDB>,
    cache: RefCell<HashMap<NodeHash, Node>>,
}

impl TrieState {
    pub fn new(db: Box<dyn TrieDB>) -> TrieState {
        TrieState {
            db,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Retrieves a node by its reference, decoding inlined nodes in place.
    pub fn get_node(&self, hash: &NodeHash) -> Result<Option<Node>, TrieError> {
        if let NodeHash::Inline(encoded) = hash {
            if encoded.is_empty() {
                return Ok(None);
            }
            return Ok(Some(Node::decode_raw(encoded)?));
        }
        if let Some(node) = self.cache.borrow().get(hash) {
            return Ok(Some(node.clone()));
        }
        let Some(encoded) = self.db.get(hash.as_key())? else {
            return Ok(None);
        };
        let node = Node::decode_raw(&encoded)?;
        self.cache.borrow_mut().insert(hash.clone(), node.clone());
        Ok(Some(node))
    }

    /// Caches a node. Inlined nodes live inside their parent's encoding and
    /// are not stored separately.
    pub fn insert_node(&mut self, node: Node, hash: NodeHash) {
        if matches!(hash, NodeHash::Hashed(_)) {
            self.cache.borrow_mut().insert(hash, node);
        }
    }

    /// Writes every cached node reachable from `root` to the database and
    /// clears the cache.
    pub fn commit(&mut self, root: &NodeHash) -> Result<(), TrieError> {
        let mut to_commit = Vec::new();
        self.collect_commit(root, &mut to_commit)?;
        self.db.put_batch(to_commit)?;
        self.cache.borrow_mut().clear();
        Ok(())
    }

    fn collect_commit(
        &mut self,
        node_hash: &NodeHash,
        acc: &mut Vec<(Vec<u8>, Vec<u8>)>,
    ) -> Result<(), TrieError> {
        // Nodes absent from the cache are already in the database.
        let Some(node) = self.cache.borrow_mut().remove(node_hash) else {
            return Ok(());
        };
        match &node {
            Node::Branch(branch) => {
                for child in branch.choices.iter() {
                    if child.is_valid() {
                        self.collect_commit(child, acc)?;
                    }
                }
            }
            Node::Extension(ext) => self.collect_commit(&ext.child, acc)?,
            Node::Leaf(_) => {}
        }
        acc.push((node_hash.as_key(), node.encode_raw()));
        Ok(())
    }
}
