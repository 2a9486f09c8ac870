use ethereum_types::{Address, H256, U256};
use sha3::{Digest, Keccak256};

/// Keccak-256 (0x01 padding, not NIST SHA3-256).
pub fn keccak(data: impl AsRef<[u8]>) -> H256 {
    H256::from_slice(&Keccak256::digest(data.as_ref()))
}

/// The low 20 bytes of a word, as an address.
pub fn word_to_address(word: U256) -> Address {
    let bytes = word.to_big_endian();
    Address::from_slice(&bytes[12..])
}

/// An address, widened to a word.
pub fn address_to_word(address: Address) -> U256 {
    U256::from_big_endian(address.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn keccak_empty() {
        assert_eq!(
            keccak([]),
            H256(hex!(
                "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
            ))
        );
    }

    #[test]
    fn word_address_roundtrip() {
        let address = Address::repeat_byte(0xab);
        assert_eq!(word_to_address(address_to_word(address)), address);
    }
}
