use bytes::Bytes;
use ethereum_types::{Bloom, H160, H256, U256};

use super::{
    constants::{RLP_EMPTY_LIST, RLP_NULL},
    error::RLPDecodeError,
};

/// Trait for decoding RLP-encoded slices of data.
///
/// Implementors provide [`decode_unfinished`](RLPDecode::decode_unfinished),
/// which returns the decoded value along with the bytes remaining after it.
/// Consumers usually call [`decode`](RLPDecode::decode), which additionally
/// checks that the whole input was consumed.
pub trait RLPDecode: Sized {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError>;

    fn decode(rlp: &[u8]) -> Result<Self, RLPDecodeError> {
        let (decoded, remaining) = Self::decode_unfinished(rlp)?;
        if !remaining.is_empty() {
            return Err(RLPDecodeError::InvalidLength);
        }
        Ok(decoded)
    }
}

impl RLPDecode for u8 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let padded: [u8; 1] = static_left_pad(bytes)?;
        Ok((padded[0], rest))
    }
}

impl RLPDecode for u64 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((u64::from_be_bytes(static_left_pad(bytes)?), rest))
    }
}

impl RLPDecode for usize {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((usize::from_be_bytes(static_left_pad(bytes)?), rest))
    }
}

impl RLPDecode for U256 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let padded: [u8; 32] = static_left_pad(bytes)?;
        Ok((U256::from_big_endian(&padded), rest))
    }
}

impl<const N: usize> RLPDecode for [u8; N] {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let value = bytes
            .try_into()
            .map_err(|_| RLPDecodeError::InvalidLength)?;
        Ok((value, rest))
    }
}

impl RLPDecode for Bytes {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((Bytes::copy_from_slice(bytes), rest))
    }
}

// Fixed-width hash types decode as exact-length byte strings.
macro_rules! impl_decode_for_hash {
    ($($t:ident),*) => {
        $(impl RLPDecode for $t {
            fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
                let (bytes, rest) = RLPDecode::decode_unfinished(rlp)?;
                Ok(($t(bytes), rest))
            }
        })*
    };
}

impl_decode_for_hash!(H160, H256, Bloom);

// A Vec<T> is interpreted as a homogeneous RLP list. Byte strings go
// through the Bytes / [u8; N] impls instead.
impl<T: RLPDecode> RLPDecode for Vec<T> {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, payload, input_rest) = decode_rlp_item(rlp)?;
        if !is_list {
            return Err(RLPDecodeError::UnexpectedString);
        }
        let mut result = Vec::new();
        let mut current = payload;
        while !current.is_empty() {
            let (item, rest) = T::decode_unfinished(current)?;
            result.push(item);
            current = rest;
        }
        Ok((result, input_rest))
    }
}

impl<T1: RLPDecode, T2: RLPDecode> RLPDecode for (T1, T2) {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, payload, input_rest) = decode_rlp_item(rlp)?;
        if !is_list {
            return Err(RLPDecodeError::UnexpectedString);
        }
        let (first, rest) = T1::decode_unfinished(payload)?;
        let (second, rest) = T2::decode_unfinished(rest)?;
        if !rest.is_empty() {
            return Err(RLPDecodeError::MalformedData);
        }
        Ok(((first, second), input_rest))
    }
}

/// Decodes the header of a single RLP item.
///
/// Returns whether the item is a list, its payload (without the prefix), and
/// the bytes remaining after the item.
pub fn decode_rlp_item(data: &[u8]) -> Result<(bool, &[u8], &[u8]), RLPDecodeError> {
    let first_byte = *data.first().ok_or(RLPDecodeError::InvalidLength)?;
    match first_byte {
        0..=0x7f => Ok((false, &data[..1], &data[1..])),
        0x80..=0xb7 => split_payload(data, false, 1, (first_byte - 0x80) as usize),
        0xb8..=0xbf => split_long_payload(data, false, (first_byte - 0xb7) as usize),
        RLP_EMPTY_LIST..=0xf7 => split_payload(data, true, 1, (first_byte - RLP_EMPTY_LIST) as usize),
        0xf8..=0xff => split_long_payload(data, true, (first_byte - 0xf7) as usize),
    }
}

fn split_payload(
    data: &[u8],
    is_list: bool,
    header_len: usize,
    payload_len: usize,
) -> Result<(bool, &[u8], &[u8]), RLPDecodeError> {
    let end = header_len
        .checked_add(payload_len)
        .ok_or(RLPDecodeError::InvalidLength)?;
    if data.len() < end {
        return Err(RLPDecodeError::InvalidLength);
    }
    Ok((is_list, &data[header_len..end], &data[end..]))
}

fn split_long_payload(
    data: &[u8],
    is_list: bool,
    length_of_length: usize,
) -> Result<(bool, &[u8], &[u8]), RLPDecodeError> {
    let length_bytes = data
        .get(1..length_of_length + 1)
        .ok_or(RLPDecodeError::InvalidLength)?;
    let payload_len = usize::from_be_bytes(static_left_pad(length_bytes)?);
    split_payload(data, is_list, length_of_length + 1, payload_len)
}

/// Splits off a complete RLP item (prefix included) from the input.
pub fn get_item_with_prefix(data: &[u8]) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let (_, _, rest) = decode_rlp_item(data)?;
    let item_len = data.len() - rest.len();
    Ok((&data[..item_len], rest))
}

/// Decodes the payload of a byte-string item, rejecting lists.
pub fn decode_bytes(data: &[u8]) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let (is_list, payload, rest) = decode_rlp_item(data)?;
    if is_list {
        return Err(RLPDecodeError::UnexpectedList);
    }
    Ok((payload, rest))
}

/// Left-pads a big-endian byte slice into a fixed-size array, rejecting
/// leading zeros (RLP integers are canonical).
pub fn static_left_pad<const N: usize>(data: &[u8]) -> Result<[u8; N], RLPDecodeError> {
    let mut result = [0; N];
    if data.is_empty() {
        return Ok(result);
    }
    if data[0] == 0 {
        return Err(RLPDecodeError::MalformedData);
    }
    if data.len() > N {
        return Err(RLPDecodeError::InvalidLength);
    }
    result[N - data.len()..].copy_from_slice(data);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::RLPEncode;
    use ethereum_types::Address;

    #[test]
    fn decode_integers() {
        assert_eq!(u64::decode(&[RLP_NULL]).unwrap(), 0);
        assert_eq!(u64::decode(&[0x0f]).unwrap(), 15);
        assert_eq!(u64::decode(&[0x82, 0x04, 0x00]).unwrap(), 1024);
        // leading zeros are non-canonical
        assert!(u64::decode(&[0x82, 0x00, 0x01]).is_err());
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        assert!(u64::decode(&[0x01, 0x02]).is_err());
    }

    #[test]
    fn roundtrip_vec_of_hashes() {
        let hashes = vec![H256::repeat_byte(1), H256::repeat_byte(2)];
        let encoded = hashes.encode_to_vec();
        assert_eq!(Vec::<H256>::decode(&encoded).unwrap(), hashes);
    }

    #[test]
    fn roundtrip_address() {
        let addr = Address::repeat_byte(0xaa);
        let encoded = addr.encode_to_vec();
        assert_eq!(Address::decode(&encoded).unwrap(), addr);
    }
}
