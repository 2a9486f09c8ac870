//! Variable gas-cost formulas charged by opcode handlers on top of the
//! table's base costs.

use ethereum_types::U256;

use crate::{constants::*, errors::VMError};

/// Rounds up to the next multiple of 32, saturating at the type bound.
pub fn ceil32(value: u64) -> u64 {
    value.div_ceil(32).saturating_mul(32)
}

/// Number of 32-byte words needed to hold `size` bytes.
pub fn word_count(size: u64) -> u64 {
    size.div_ceil(32)
}

/// Total cost of a memory of `size_in_bytes`:
/// `words * 3 + words^2 / 512`.
pub fn memory_gas_cost(size_in_bytes: u64) -> Result<u64, VMError> {
    let words = word_count(size_in_bytes) as u128;
    let linear = words * GAS_MEMORY_WORD as u128;
    let quadratic = words * words / GAS_MEMORY_QUADRATIC_DENOMINATOR as u128;
    u64::try_from(linear + quadratic).map_err(|_| VMError::OutOfGas)
}

/// Per-word surcharge of the copy opcodes.
pub fn copy_gas_cost(size: u64) -> u64 {
    GAS_COPY_WORD * word_count(size)
}

/// Per-word surcharge of SHA3.
pub fn sha3_gas_cost(size: u64) -> u64 {
    GAS_SHA3_WORD * word_count(size)
}

/// Per-byte surcharge of EXP, on the minimal big-endian width of the
/// exponent.
pub fn exp_gas_cost(exponent: U256) -> u64 {
    let byte_len = (exponent.bits() as u64).div_ceil(8);
    GAS_EXP_BYTE * byte_len
}

/// EIP-150: a call may forward at most all but one 64th of the gas left.
pub fn all_but_one_64th(gas: u64) -> u64 {
    gas - gas / 64
}
