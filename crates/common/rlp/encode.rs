use bytes::{BufMut, Bytes};
use ethereum_types::{Address, Bloom, H256, U256};

use super::constants::RLP_NULL;

/// Encodes a value to a fresh RLP byte vector.
pub fn encode<T: RLPEncode>(value: &T) -> Vec<u8> {
    value.encode_to_vec()
}

pub trait RLPEncode {
    fn encode(&self, buf: &mut dyn BufMut);

    fn length(&self) -> usize {
        self.encode_to_vec().len()
    }

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}

// Unsigned integers encode as their big-endian bytes without leading zeros.
fn encode_integer<const N: usize>(value_be: [u8; N], buf: &mut dyn BufMut) {
    let start = value_be.iter().position(|&b| b != 0).unwrap_or(N);
    encode_bytes(&value_be[start..], buf);
}

/// Encodes a byte string, the base case of RLP.
pub fn encode_bytes(bytes: &[u8], buf: &mut dyn BufMut) {
    match bytes {
        // a single byte below 0x80 is its own encoding
        [b] if *b < RLP_NULL => buf.put_u8(*b),
        _ if bytes.len() < 56 => {
            buf.put_u8(RLP_NULL + bytes.len() as u8);
            buf.put_slice(bytes);
        }
        _ => {
            let len_be = bytes.len().to_be_bytes();
            let start = len_be.iter().position(|&b| b != 0).unwrap_or(0);
            buf.put_u8(0xb7 + (len_be.len() - start) as u8);
            buf.put_slice(&len_be[start..]);
            buf.put_slice(bytes);
        }
    }
}

/// Writes the list prefix for a payload of `total_len` bytes.
pub fn encode_length(total_len: usize, buf: &mut dyn BufMut) {
    if total_len < 56 {
        buf.put_u8(0xc0 + total_len as u8);
    } else {
        let len_be = total_len.to_be_bytes();
        let start = len_be.iter().position(|&b| b != 0).unwrap_or(0);
        buf.put_u8(0xf7 + (len_be.len() - start) as u8);
        buf.put_slice(&len_be[start..]);
    }
}

impl RLPEncode for u8 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for u64 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for usize {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for U256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer(self.to_big_endian(), buf);
    }
}

impl RLPEncode for [u8] {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self, buf);
    }
}

impl<const N: usize> RLPEncode for [u8; N] {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self.as_ref(), buf);
    }
}

impl RLPEncode for Bytes {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self.as_ref(), buf);
    }
}

impl RLPEncode for H256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self.as_bytes(), buf);
    }
}

impl RLPEncode for Address {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self.as_bytes(), buf);
    }
}

impl RLPEncode for Bloom {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self.as_bytes(), buf);
    }
}

impl<T: RLPEncode> RLPEncode for Vec<T> {
    fn encode(&self, buf: &mut dyn BufMut) {
        let mut payload = Vec::new();
        for item in self {
            item.encode(&mut payload);
        }
        encode_length(payload.len(), buf);
        buf.put_slice(&payload);
    }
}

impl<S: RLPEncode, T: RLPEncode> RLPEncode for (S, T) {
    fn encode(&self, buf: &mut dyn BufMut) {
        super::structs::Encoder::new(buf)
            .encode_field(&self.0)
            .encode_field(&self.1)
            .finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn encode_integers() {
        assert_eq!(0u64.encode_to_vec(), vec![RLP_NULL]);
        assert_eq!(1u64.encode_to_vec(), vec![0x01]);
        assert_eq!(0x7fu64.encode_to_vec(), vec![0x7f]);
        assert_eq!(0x80u64.encode_to_vec(), vec![0x81, 0x80]);
        assert_eq!(0x0400u64.encode_to_vec(), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn encode_byte_strings() {
        assert_eq!(b"dog".as_slice().encode_to_vec(), hex!("83646f67"));
        let long = [0x61u8; 56];
        let mut expected = vec![0xb8, 56];
        expected.extend_from_slice(&long);
        assert_eq!(long.as_slice().encode_to_vec(), expected);
    }

    #[test]
    fn encode_u256() {
        assert_eq!(U256::zero().encode_to_vec(), vec![RLP_NULL]);
        assert_eq!(U256::from(127).encode_to_vec(), vec![0x7f]);
        assert_eq!(
            U256::from(1024).encode_to_vec(),
            vec![0x82, 0x04, 0x00],
        );
    }

    #[test]
    fn encode_list() {
        let list = vec![1u64, 2, 3];
        assert_eq!(list.encode_to_vec(), vec![0xc3, 0x01, 0x02, 0x03]);
        let empty: Vec<u64> = vec![];
        assert_eq!(empty.encode_to_vec(), vec![0xc0]);
    }
}
