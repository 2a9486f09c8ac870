use ethrun_rlp::{
    decode::decode_bytes,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};

use crate::{error::TrieError, nibbles::Nibbles, node_hash::NodeHash, state::TrieState};

/// A node in an Ethereum-compatible Merkle Patricia Trie.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Branch(BranchNode),
    Extension(ExtensionNode),
    Leaf(LeafNode),
}

/// Terminal node holding the remainder of a path and its value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeafNode {
    pub partial: Nibbles,
    pub value: Vec<u8>,
}

/// Path-compressing node: a shared nibble prefix in front of a single child.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionNode {
    pub prefix: Nibbles,
    pub child: NodeHash,
}

/// 16-way fanout node, plus the value of the path ending at the branch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BranchNode {
    pub choices: Box<[NodeHash; 16]>,
    pub value: Vec<u8>,
}

impl From<LeafNode> for Node {
    fn from(node: LeafNode) -> Self {
        Node::Leaf(node)
    }
}

impl From<ExtensionNode> for Node {
    fn from(node: ExtensionNode) -> Self {
        Node::Extension(node)
    }
}

impl From<BranchNode> for Node {
    fn from(node: BranchNode) -> Self {
        Node::Branch(node)
    }
}

impl LeafNode {
    pub fn new(partial: Nibbles, value: Vec<u8>) -> Self {
        Self { partial, value }
    }
}

impl ExtensionNode {
    pub fn new(prefix: Nibbles, child: NodeHash) -> Self {
        Self { prefix, child }
    }
}

impl Node {
    /// Retrieves a value from the subtrie originating from this node.
    pub fn get(&self, state: &TrieState, mut path: Nibbles) -> Result<Option<Vec<u8>>, TrieError> {
        match self {
            Node::Leaf(leaf) => Ok((path == leaf.partial).then(|| leaf.value.clone())),
            Node::Extension(ext) => {
                if path.skip_prefix(&ext.prefix) {
                    let child = state
                        .get_node(&ext.child)?
                        .ok_or(TrieError::InconsistentTree)?;
                    child.get(state, path)
                } else {
                    Ok(None)
                }
            }
            Node::Branch(branch) => match path.next_choice() {
                Some(choice) if branch.choices[choice].is_valid() => {
                    let child = state
                        .get_node(&branch.choices[choice])?
                        .ok_or(TrieError::InconsistentTree)?;
                    child.get(state, path)
                }
                Some(_) => Ok(None),
                None => Ok((!branch.value.is_empty()).then(|| branch.value.clone())),
            },
        }
    }

    /// Inserts a value into the subtrie originating from this node and
    /// returns the new root of the subtrie.
    pub fn insert(
        self,
        state: &mut TrieState,
        path: Nibbles,
        value: Vec<u8>,
    ) -> Result<Node, TrieError> {
        match self {
            Node::Leaf(leaf) => leaf.insert(state, path, value),
            Node::Extension(ext) => ext.insert(state, path, value),
            Node::Branch(branch) => branch.insert(state, path, value),
        }
    }

    /// Removes a value from the subtrie originating from this node.
    /// Returns the new root of the subtrie (if any remains) and the removed
    /// value, if it was present.
    pub fn remove(
        self,
        state: &mut TrieState,
        path: Nibbles,
    ) -> Result<(Option<Node>, Option<Vec<u8>>), TrieError> {
        match self {
            Node::Leaf(leaf) => {
                if path == leaf.partial {
                    Ok((None, Some(leaf.value)))
                } else {
                    Ok((Some(leaf.into()), None))
                }
            }
            Node::Extension(ext) => ext.remove(state, path),
            Node::Branch(branch) => branch.remove(state, path),
        }
    }

    /// Computes the node's reference (inline encoding or keccak hash).
    pub fn compute_hash(&self) -> NodeHash {
        NodeHash::from_encoded_raw(&self.encode_raw())
    }

    /// Stores the node in the trie state and returns its reference.
    pub fn insert_self(self, state: &mut TrieState) -> Result<NodeHash, TrieError> {
        let hash = self.compute_hash();
        state.insert_node(self, hash.clone());
        Ok(hash)
    }

    /// RLP-encodes the node.
    pub fn encode_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Node::Leaf(leaf) => {
                Encoder::new(&mut buf)
                    .encode_bytes(&leaf.partial.encode_compact())
                    .encode_bytes(&leaf.value)
                    .finish();
            }
            Node::Extension(ext) => {
                let mut encoder = Encoder::new(&mut buf);
                encoder = encoder.encode_bytes(&ext.prefix.encode_compact());
                encoder = encode_child(encoder, &ext.child);
                encoder.finish();
            }
            Node::Branch(branch) => {
                let mut encoder = Encoder::new(&mut buf);
                for choice in branch.choices.iter() {
                    encoder = encode_child(encoder, choice);
                }
                encoder.encode_bytes(&branch.value).finish();
            }
        }
        buf
    }

    /// Decodes a node from its RLP encoding.
    pub fn decode_raw(rlp: &[u8]) -> Result<Self, RLPDecodeError> {
        let mut items = Vec::with_capacity(17);
        let mut decoder = Decoder::new(rlp)?;
        let mut item;
        loop {
            (item, decoder) = decoder.get_encoded_item()?;
            items.push(item);
            if decoder.is_done() || items.len() > 17 {
                break;
            }
        }
        match items.len() {
            // Leaf or Extension
            2 => {
                let (compact, _) = decode_bytes(&items[0])?;
                let path = Nibbles::decode_compact(compact);
                if path.is_leaf() {
                    let (value, _) = decode_bytes(&items[1])?;
                    Ok(LeafNode::new(path, value.to_vec()).into())
                } else {
                    Ok(ExtensionNode::new(path, decode_child(&items[1])).into())
                }
            }
            // Branch
            17 => {
                let mut choices: [NodeHash; 16] = Default::default();
                for (choice, item) in choices.iter_mut().zip(items.iter()) {
                    *choice = decode_child(item);
                }
                let (value, _) = decode_bytes(&items[16])?;
                Ok(BranchNode {
                    choices: Box::new(choices),
                    value: value.to_vec(),
                }
                .into())
            }
            n => Err(RLPDecodeError::Custom(format!(
                "Invalid arg count for Node, expected 2 or 17, got {n}"
            ))),
        }
    }
}

// Child references encode as a 32-byte string when hashed, or as the raw
// (sub-32-byte) node encoding when inlined. Empty children are the empty
// string.
fn encode_child<'a>(encoder: Encoder<'a>, child: &NodeHash) -> Encoder<'a> {
    match child {
        NodeHash::Hashed(hash) => encoder.encode_bytes(hash.as_bytes()),
        NodeHash::Inline(raw) if !raw.is_empty() => encoder.encode_raw(raw),
        NodeHash::Inline(_) => encoder.encode_bytes(&[]),
    }
}

fn decode_child(rlp: &[u8]) -> NodeHash {
    match decode_bytes(rlp) {
        Ok((hash, &[])) if hash.len() == 32 => {
            NodeHash::Hashed(ethereum_types::H256::from_slice(hash))
        }
        Ok((&[], &[])) => NodeHash::default(),
        _ => NodeHash::Inline(rlp.to_vec()),
    }
}

impl LeafNode {
    fn insert(
        self,
        state: &mut TrieState,
        path: Nibbles,
        value: Vec<u8>,
    ) -> Result<Node, TrieError> {
        if path == self.partial {
            return Ok(LeafNode::new(path, value).into());
        }
        // Paths diverge: introduce a branch at the first mismatching nibble.
        // Both paths carry the terminator, so neither can be a strict prefix
        // of the other and both have a nibble at `match_len`.
        let match_len = path.count_prefix(&self.partial);
        let mut branch = BranchNode::default();
        branch.set_path_value(state, self.partial.offset(match_len), self.value)?;
        branch.set_path_value(state, path.offset(match_len), value)?;
        wrap_in_extension(state, branch.into(), &path, match_len)
    }
}

impl ExtensionNode {
    fn insert(
        self,
        state: &mut TrieState,
        mut path: Nibbles,
        value: Vec<u8>,
    ) -> Result<Node, TrieError> {
        let match_len = path.count_prefix(&self.prefix);
        if match_len == self.prefix.len() {
            // Prefix fully shared: descend into the child.
            path.skip_prefix(&self.prefix);
            let child = state
                .get_node(&self.child)?
                .ok_or(TrieError::InconsistentTree)?;
            let new_child = child.insert(state, path, value)?;
            return Ok(ExtensionNode::new(self.prefix, new_child.insert_self(state)?).into());
        }
        // Split the prefix at the divergence point.
        let prefix_choice = self.prefix.at(match_len);
        let sub_prefix = self.prefix.offset(match_len + 1);
        let old_side = if sub_prefix.is_empty() {
            self.child
        } else {
            Node::from(ExtensionNode::new(sub_prefix, self.child)).insert_self(state)?
        };
        let mut branch = BranchNode::default();
        branch.choices[prefix_choice] = old_side;
        branch.set_path_value(state, path.offset(match_len), value)?;
        wrap_in_extension(state, branch.into(), &path, match_len)
    }

    fn remove(
        self,
        state: &mut TrieState,
        mut path: Nibbles,
    ) -> Result<(Option<Node>, Option<Vec<u8>>), TrieError> {
        if !path.skip_prefix(&self.prefix) {
            return Ok((Some(self.into()), None));
        }
        let child = state
            .get_node(&self.child)?
            .ok_or(TrieError::InconsistentTree)?;
        let (new_child, old_value) = child.remove(state, path)?;
        // An extension may not point at a leaf or another extension; merge
        // the shared path downwards instead.
        let node = match new_child {
            Some(Node::Leaf(leaf)) => {
                Some(LeafNode::new(self.prefix.concat(&leaf.partial), leaf.value).into())
            }
            Some(Node::Extension(ext)) => {
                Some(ExtensionNode::new(self.prefix.concat(&ext.prefix), ext.child).into())
            }
            Some(branch @ Node::Branch(_)) => {
                Some(ExtensionNode::new(self.prefix, branch.insert_self(state)?).into())
            }
            None => None,
        };
        Ok((node, old_value))
    }
}

impl BranchNode {
    fn insert(
        mut self,
        state: &mut TrieState,
        mut path: Nibbles,
        value: Vec<u8>,
    ) -> Result<Node, TrieError> {
        match path.next_choice() {
            Some(choice) if self.choices[choice].is_valid() => {
                let child = state
                    .get_node(&self.choices[choice])?
                    .ok_or(TrieError::InconsistentTree)?;
                let new_child = child.insert(state, path, value)?;
                self.choices[choice] = new_child.insert_self(state)?;
            }
            Some(choice) => {
                self.choices[choice] = Node::from(LeafNode::new(path, value)).insert_self(state)?;
            }
            // Terminator: the path ends at this branch.
            None => self.value = value,
        }
        Ok(self.into())
    }

    fn remove(
        mut self,
        state: &mut TrieState,
        mut path: Nibbles,
    ) -> Result<(Option<Node>, Option<Vec<u8>>), TrieError> {
        let old_value = match path.next_choice() {
            Some(choice) if self.choices[choice].is_valid() => {
                let child = state
                    .get_node(&self.choices[choice])?
                    .ok_or(TrieError::InconsistentTree)?;
                let (new_child, old_value) = child.remove(state, path)?;
                self.choices[choice] = match new_child {
                    Some(node) => node.insert_self(state)?,
                    None => NodeHash::default(),
                };
                old_value
            }
            Some(_) => None,
            None => {
                let value = std::mem::take(&mut self.value);
                (!value.is_empty()).then_some(value)
            }
        };

        let live_choices: Vec<usize> = self
            .choices
            .iter()
            .enumerate()
            .filter(|(_, choice)| choice.is_valid())
            .map(|(i, _)| i)
            .collect();

        // A branch must keep at least two exits; collapse otherwise.
        let new_node = match (live_choices.as_slice(), self.value.is_empty()) {
            ([], true) => None,
            ([], false) => Some(LeafNode::new(Nibbles::from_hex(vec![16]), self.value).into()),
            ([only], true) => {
                let choice = *only;
                let child = state
                    .get_node(&self.choices[choice])?
                    .ok_or(TrieError::InconsistentTree)?;
                Some(match child {
                    Node::Leaf(mut leaf) => {
                        leaf.partial.prepend(choice as u8);
                        leaf.into()
                    }
                    Node::Extension(mut ext) => {
                        ext.prefix.prepend(choice as u8);
                        ext.into()
                    }
                    branch @ Node::Branch(_) => ExtensionNode::new(
                        Nibbles::from_hex(vec![choice as u8]),
                        branch.insert_self(state)?,
                    )
                    .into(),
                })
            }
            _ => Some(self.into()),
        };
        Ok((new_node, old_value))
    }

    // Routes a path remainder into the branch: the value itself when the
    // remainder starts with the terminator, a leaf child otherwise.
    fn set_path_value(
        &mut self,
        state: &mut TrieState,
        mut path: Nibbles,
        value: Vec<u8>,
    ) -> Result<(), TrieError> {
        match path.next_choice() {
            Some(choice) => {
                self.choices[choice] = Node::from(LeafNode::new(path, value)).insert_self(state)?;
            }
            None => self.value = value,
        }
        Ok(())
    }
}

fn wrap_in_extension(
    state: &mut TrieState,
    node: Node,
    path: &Nibbles,
    match_len: usize,
) -> Result<Node, TrieError> {
    if match_len == 0 {
        Ok(node)
    } else {
        Ok(ExtensionNode::new(path.slice(0, match_len), node.insert_self(state)?).into())
    }
}
