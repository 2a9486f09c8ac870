use ethereum_types::{U256, U512};

use crate::{
    computation::Computation, errors::VMError, gas_cost::exp_gas_cost, opcodes::OpcodeResult,
    vm::Vm,
};

pub fn add(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    computation.stack.push(left.overflowing_add(right).0)?;
    Ok(OpcodeResult::Continue)
}

pub fn mul(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    computation.stack.push(left.overflowing_mul(right).0)?;
    Ok(OpcodeResult::Continue)
}

pub fn sub(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    computation.stack.push(left.overflowing_sub(right).0)?;
    Ok(OpcodeResult::Continue)
}

pub fn div(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let numerator = computation.stack.pop()?;
    let denominator = computation.stack.pop()?;
    let quotient = if denominator.is_zero() {
        U256::zero()
    } else {
        numerator / denominator
    };
    computation.stack.push(quotient)?;
    Ok(OpcodeResult::Continue)
}

pub fn sdiv(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let numerator = computation.stack.pop()?;
    let denominator = computation.stack.pop()?;
    let quotient = if denominator.is_zero() {
        U256::zero()
    } else {
        let (num_negative, num_abs) = to_sign_magnitude(numerator);
        let (den_negative, den_abs) = to_sign_magnitude(denominator);
        from_sign_magnitude(num_negative ^ den_negative, num_abs / den_abs)
    };
    computation.stack.push(quotient)?;
    Ok(OpcodeResult::Continue)
}

pub fn modulo(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let value = computation.stack.pop()?;
    let modulus = computation.stack.pop()?;
    let remainder = if modulus.is_zero() {
        U256::zero()
    } else {
        value % modulus
    };
    computation.stack.push(remainder)?;
    Ok(OpcodeResult::Continue)
}

pub fn smod(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let value = computation.stack.pop()?;
    let modulus = computation.stack.pop()?;
    let remainder = if modulus.is_zero() {
        U256::zero()
    } else {
        // The result takes the sign of the dividend.
        let (value_negative, value_abs) = to_sign_magnitude(value);
        let (_, modulus_abs) = to_sign_magnitude(modulus);
        from_sign_magnitude(value_negative, value_abs % modulus_abs)
    };
    computation.stack.push(remainder)?;
    Ok(OpcodeResult::Continue)
}

pub fn addmod(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    let modulus = computation.stack.pop()?;
    let result = if modulus.is_zero() {
        U256::zero()
    } else {
        let sum = U512::from(left) + U512::from(right);
        u512_to_u256(sum % U512::from(modulus))
    };
    computation.stack.push(result)?;
    Ok(OpcodeResult::Continue)
}

pub fn mulmod(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let left = computation.stack.pop()?;
    let right = computation.stack.pop()?;
    let modulus = computation.stack.pop()?;
    let result = if modulus.is_zero() {
        U256::zero()
    } else {
        u512_to_u256(left.full_mul(right) % U512::from(modulus))
    };
    computation.stack.push(result)?;
    Ok(OpcodeResult::Continue)
}

pub fn exp(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let base = computation.stack.pop()?;
    let exponent = computation.stack.pop()?;
    computation
        .gas_meter
        .consume(exp_gas_cost(exponent), "EXP exponent bytes")?;
    computation.stack.push(base.overflowing_pow(exponent).0)?;
    Ok(OpcodeResult::Continue)
}

pub fn signextend(_vm: &mut Vm<'_>, computation: &mut Computation, _op: u8) -> Result<OpcodeResult, VMError> {
    let byte_index = computation.stack.pop()?;
    let value = computation.stack.pop()?;
    // Extending from byte 31 (or beyond) is the identity.
    let result = if byte_index >= U256::from(31) {
        value
    } else {
        let sign_bit = byte_index.low_u64() as usize * 8 + 7;
        let mask = (U256::one() << (sign_bit + 1)) - U256::one();
        if value.bit(sign_bit) {
            value | !mask
        } else {
            value & mask
        }
    };
    computation.stack.push(result)?;
    Ok(OpcodeResult::Continue)
}

/// Splits a word into its two's-complement sign and magnitude.
fn to_sign_magnitude(value: U256) -> (bool, U256) {
    if value.bit(255) {
        (true, (!value).overflowing_add(U256::one()).0)
    } else {
        (false, value)
    }
}

fn from_sign_magnitude(negative: bool, magnitude: U256) -> U256 {
    if negative {
        (!magnitude).overflowing_add(U256::one()).0
    } else {
        magnitude
    }
}

pub(crate) fn is_negative(value: U256) -> bool {
    value.bit(255)
}

// The argument is always a remainder below 2^256, so the high half is zero.
fn u512_to_u256(value: U512) -> U256 {
    let bytes = value.to_big_endian();
    U256::from_big_endian(&bytes[32..])
}
