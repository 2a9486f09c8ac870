use bytes::{BufMut, Bytes};
use ethereum_types::{Address, H256, U256};
use ethrun_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};
use lazy_static::lazy_static;
use secp256k1::{
    Message as SignedMessage, SECP256K1, SecretKey,
    ecdsa::{RecoverableSignature, RecoveryId},
};
use thiserror::Error;

use crate::{
    constants::{GAS_TX, GAS_TX_CREATE, GAS_TX_DATA_NON_ZERO, GAS_TX_DATA_ZERO},
    utils::keccak,
};

lazy_static! {
    /// Order of the secp256k1 group.
    pub static ref SECP256K1_ORDER: U256 = U256::from_big_endian(&[
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c,
        0xd0, 0x36, 0x41, 0x41,
    ]);
    /// Half the group order; Homestead rejects signatures above it.
    pub static ref SECP256K1_ORDER_HALF: U256 = *SECP256K1_ORDER / 2;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature values out of range")]
    OutOfRange,
    #[error("Invalid signature recovery id: {0}")]
    InvalidV(u64),
    #[error("Signature recovery failed: {0}")]
    Recovery(#[from] secp256k1::Error),
}

/// Destination of a transaction or top-level message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Call(Address),
    /// The contract-creation sentinel: an empty `to` field.
    Create,
}

impl RLPEncode for TxKind {
    fn encode(&self, buf: &mut dyn BufMut) {
        match self {
            TxKind::Call(address) => address.encode(buf),
            TxKind::Create => ethrun_rlp::encode::encode_bytes(&[], buf),
        }
    }
}

impl RLPDecode for TxKind {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = ethrun_rlp::decode::decode_bytes(rlp)?;
        match bytes.len() {
            0 => Ok((TxKind::Create, rest)),
            20 => Ok((TxKind::Call(Address::from_slice(bytes)), rest)),
            _ => Err(RLPDecodeError::InvalidLength),
        }
    }
}

/// An RLP-canonical legacy transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas: u64,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl Transaction {
    /// Builds an unsigned transaction; `v`, `r` and `s` are zeroed until
    /// [`sign`](Transaction::sign) fills them in.
    pub fn new_unsigned(
        nonce: u64,
        gas_price: U256,
        gas: u64,
        to: TxKind,
        value: U256,
        data: Bytes,
    ) -> Self {
        Self {
            nonce,
            gas_price,
            gas,
            to,
            value,
            data,
            v: 0,
            r: U256::zero(),
            s: U256::zero(),
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self.to, TxKind::Create)
    }

    /// Hash over which the sender signature is made (pre-EIP-155 scheme).
    pub fn signing_hash(&self) -> H256 {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .finish();
        keccak(&buf)
    }

    /// Hash of the full RLP-encoded transaction.
    pub fn hash(&self) -> H256 {
        keccak(self.encode_to_vec())
    }

    /// Signs the transaction in place with the given secret key.
    pub fn sign(mut self, secret_key: &SecretKey) -> Self {
        let digest = SignedMessage::from_digest(self.signing_hash().0);
        let signature = SECP256K1.sign_ecdsa_recoverable(&digest, secret_key);
        let (recovery_id, bytes) = signature.serialize_compact();
        self.r = U256::from_big_endian(&bytes[..32]);
        self.s = U256::from_big_endian(&bytes[32..]);
        self.v = recovery_id.to_i32() as u64 + 27;
        self
    }

    /// Recovers the sender address from the signature.
    pub fn sender(&self) -> Result<Address, SignatureError> {
        if self.r.is_zero() || self.s.is_zero() {
            return Err(SignatureError::OutOfRange);
        }
        if self.r >= *SECP256K1_ORDER || self.s >= *SECP256K1_ORDER {
            return Err(SignatureError::OutOfRange);
        }
        if self.v != 27 && self.v != 28 {
            return Err(SignatureError::InvalidV(self.v));
        }
        let mut signature = [0u8; 64];
        signature[..32].copy_from_slice(&self.r.to_big_endian());
        signature[32..].copy_from_slice(&self.s.to_big_endian());
        let recovery_id = RecoveryId::from_i32(self.v as i32 - 27)?;
        let signature = RecoverableSignature::from_compact(&signature, recovery_id)?;
        let digest = SignedMessage::from_digest(self.signing_hash().0);
        let public_key = SECP256K1.recover_ecdsa(&digest, &signature)?;
        let hash = keccak(&public_key.serialize_uncompressed()[1..]);
        Ok(Address::from_slice(&hash.as_bytes()[12..]))
    }

    /// True if the signature's `s` value is in the low half of the group
    /// order, as required from Homestead onwards.
    pub fn has_low_s(&self) -> bool {
        self.s <= *SECP256K1_ORDER_HALF
    }

    /// Fixed cost of the transaction before any code runs.
    pub fn intrinsic_gas(&self) -> u64 {
        let data_cost: u64 = self
            .data
            .iter()
            .map(|byte| {
                if *byte == 0 {
                    GAS_TX_DATA_ZERO
                } else {
                    GAS_TX_DATA_NON_ZERO
                }
            })
            .sum();
        let create_cost = if self.is_create() { GAS_TX_CREATE } else { 0 };
        GAS_TX + data_cost + create_cost
    }
}

impl RLPEncode for Transaction {
    fn encode(&self, buf: &mut dyn BufMut) {
        Encoder::new(buf)
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.v)
            .encode_field(&self.r)
            .encode_field(&self.s)
            .finish();
    }
}

impl RLPDecode for Transaction {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (nonce, decoder) = decoder.decode_field("nonce")?;
        let (gas_price, decoder) = decoder.decode_field("gas_price")?;
        let (gas, decoder) = decoder.decode_field("gas")?;
        let (to, decoder) = decoder.decode_field("to")?;
        let (value, decoder) = decoder.decode_field("value")?;
        let (data, decoder) = decoder.decode_field("data")?;
        let (v, decoder) = decoder.decode_field("v")?;
        let (r, decoder) = decoder.decode_field("r")?;
        let (s, decoder) = decoder.decode_field("s")?;
        Ok((
            Self {
                nonce,
                gas_price,
                gas,
                to,
                value,
                data,
                v,
                r,
                s,
            },
            decoder.finish()?,
        ))
    }
}

/// Address of a contract created by `creator` at nonce `nonce`:
/// `last20(keccak(rlp([creator, nonce])))`.
pub fn create_contract_address(creator: Address, nonce: u64) -> Address {
    let mut encoded = Vec::new();
    (creator, nonce).encode(&mut encoded);
    let hash = keccak(&encoded);
    Address::from_slice(&hash.as_bytes()[12..])
}
