use bytes::Bytes;
use ethereum_types::{Address, U256};
use ethrun_common::types::TxKind;

/// Immutable descriptor of a single call or create frame.
#[derive(Debug, Clone)]
pub struct Message {
    pub gas: u64,
    pub gas_price: U256,
    pub to: TxKind,
    pub sender: Address,
    pub origin: Address,
    pub value: U256,
    pub data: Bytes,
    /// The code this frame executes: the target's code for calls, the
    /// init-code for creates.
    pub code: Bytes,
    pub depth: usize,
    /// Where the executed code lives, when it differs from `to`
    /// (CALLCODE / DELEGATECALL).
    pub code_address: Option<Address>,
    /// The address being created; set iff this is a create frame.
    pub create_address: Option<Address>,
    pub is_static: bool,
    pub should_transfer_value: bool,
}

impl Message {
    pub fn is_create(&self) -> bool {
        matches!(self.to, TxKind::Create) || self.create_address.is_some()
    }

    /// The account whose storage (and balance, for value transfers) this
    /// frame operates on.
    pub fn storage_address(&self) -> Address {
        match (self.create_address, self.to) {
            (Some(address), _) => address,
            (None, TxKind::Call(address)) => address,
            // Create frames always carry a create_address.
            (None, TxKind::Create) => Address::zero(),
        }
    }

    /// The account whose code this frame runs; `None` for create frames.
    pub fn code_address(&self) -> Option<Address> {
        if self.is_create() {
            return None;
        }
        self.code_address.or(match self.to {
            TxKind::Call(address) => Some(address),
            TxKind::Create => None,
        })
    }
}
