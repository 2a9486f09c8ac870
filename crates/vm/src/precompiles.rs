//! Fixed-address native routines replacing bytecode execution at
//! addresses 0x01 through 0x04.

use bytes::Bytes;
use ethereum_types::{Address, U256};
use ethrun_common::{types::SECP256K1_ORDER, utils::keccak};
use ripemd::Ripemd160;
use secp256k1::{
    Message as SignedMessage, SECP256K1,
    ecdsa::{RecoverableSignature, RecoveryId},
};
use sha2::{Digest, Sha256};

use crate::{computation::Computation, errors::VMError, gas_cost::word_count};

pub const GAS_ECRECOVER: u64 = 3_000;
pub const GAS_SHA256: u64 = 60;
pub const GAS_SHA256_WORD: u64 = 12;
pub const GAS_RIPEMD160: u64 = 600;
pub const GAS_RIPEMD160_WORD: u64 = 120;
pub const GAS_IDENTITY: u64 = 15;
pub const GAS_IDENTITY_WORD: u64 = 3;

pub type Precompile = fn(&mut Computation) -> Result<(), VMError>;

/// The native routine registered at `address`, if any.
pub fn precompile_for(address: Address) -> Option<Precompile> {
    let bytes = address.as_bytes();
    if bytes[..19].iter().any(|byte| *byte != 0) {
        return None;
    }
    match bytes[19] {
        0x01 => Some(ecrecover),
        0x02 => Some(sha256),
        0x03 => Some(ripemd160),
        0x04 => Some(identity),
        _ => None,
    }
}

/// Input is 128 bytes `(hash, v, r, s)`; output the recovered address
/// left-padded to 32 bytes. Malformed signatures consume the gas and
/// return empty output rather than failing the frame.
fn ecrecover(computation: &mut Computation) -> Result<(), VMError> {
    computation
        .gas_meter
        .consume(GAS_ECRECOVER, "ECRECOVER precompile")?;
    let mut input = [0u8; 128];
    let data = &computation.msg.data;
    let len = data.len().min(128);
    input[..len].copy_from_slice(&data[..len]);

    if let Some(address) = recover_address(&input) {
        let mut output = [0u8; 32];
        output[12..].copy_from_slice(address.as_bytes());
        computation.set_output(Bytes::copy_from_slice(&output));
    }
    Ok(())
}

fn recover_address(input: &[u8; 128]) -> Option<Address> {
    let v = U256::from_big_endian(&input[32..64]);
    let r = U256::from_big_endian(&input[64..96]);
    let s = U256::from_big_endian(&input[96..128]);
    if v != U256::from(27) && v != U256::from(28) {
        return None;
    }
    if r.is_zero() || s.is_zero() || r >= *SECP256K1_ORDER || s >= *SECP256K1_ORDER {
        return None;
    }
    let mut signature = [0u8; 64];
    signature[..32].copy_from_slice(&input[64..96]);
    signature[32..].copy_from_slice(&input[96..128]);
    let recovery_id = RecoveryId::from_i32(v.low_u64() as i32 - 27).ok()?;
    let signature = RecoverableSignature::from_compact(&signature, recovery_id).ok()?;
    let hash: [u8; 32] = input[..32].try_into().ok()?;
    let digest = SignedMessage::from_digest(hash);
    let public_key = SECP256K1.recover_ecdsa(&digest, &signature).ok()?;
    let hash = keccak(&public_key.serialize_uncompressed()[1..]);
    Some(Address::from_slice(&hash.as_bytes()[12..]))
}

fn sha256(computation: &mut Computation) -> Result<(), VMError> {
    let input = computation.msg.data.clone();
    let gas = GAS_SHA256 + GAS_SHA256_WORD * word_count(input.len() as u64);
    computation.gas_meter.consume(gas, "SHA256 precompile")?;
    let hash = Sha256::digest(&input);
    computation.set_output(Bytes::copy_from_slice(&hash));
    Ok(())
}

/// Output is the 20-byte digest left-padded with 12 zero bytes.
fn ripemd160(computation: &mut Computation) -> Result<(), VMError> {
    let input = computation.msg.data.clone();
    let gas = GAS_RIPEMD160 + GAS_RIPEMD160_WORD * word_count(input.len() as u64);
    computation.gas_meter.consume(gas, "RIPEMD160 precompile")?;
    let hash = Ripemd160::digest(&input);
    let mut output = [0u8; 32];
    output[12..].copy_from_slice(&hash);
    computation.set_output(Bytes::copy_from_slice(&output));
    Ok(())
}

fn identity(computation: &mut Computation) -> Result<(), VMError> {
    let input = computation.msg.data.clone();
    let gas = GAS_IDENTITY + GAS_IDENTITY_WORD * word_count(input.len() as u64);
    computation.gas_meter.consume(gas, "IDENTITY precompile")?;
    computation.set_output(input);
    Ok(())
}
