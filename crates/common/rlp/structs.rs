use bytes::BufMut;

use super::{
    decode::{RLPDecode, decode_rlp_item, get_item_with_prefix},
    encode::{RLPEncode, encode_length},
    error::RLPDecodeError,
};

/// Field-by-field decoder for struct types.
///
/// A struct is decoded from an RLP list whose items are its fields, pulled
/// off in declaration order with [`decode_field`](Decoder::decode_field);
/// [`finish`](Decoder::finish) checks nothing was left behind.
#[derive(Debug)]
#[must_use = "`Decoder` must be consumed with `finish` to perform decoding checks"]
pub struct Decoder<'a> {
    payload: &'a [u8],
    remaining: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self, RLPDecodeError> {
        match decode_rlp_item(buf)? {
            (true, payload, remaining) => Ok(Self { payload, remaining }),
            (false, _, _) => Err(RLPDecodeError::UnexpectedString),
        }
    }

    pub fn decode_field<T: RLPDecode>(self, name: &str) -> Result<(T, Self), RLPDecodeError> {
        match <T as RLPDecode>::decode_unfinished(self.payload) {
            Ok((field, rest)) => Ok((
                field,
                Self {
                    payload: rest,
                    ..self
                },
            )),
            Err(err) => Err(field_decode_error::<T>(name, err)),
        }
    }

    /// Returns the next field without decoding it, prefix included.
    pub fn get_encoded_item(self) -> Result<(Vec<u8>, Self), RLPDecodeError> {
        let (field, rest) = get_item_with_prefix(self.payload)?;
        Ok((
            field.to_vec(),
            Self {
                payload: rest,
                ..self
            },
        ))
    }

    /// Finishes decoding and returns the bytes after the list.
    /// Fails if fields remain undecoded in the payload.
    pub const fn finish(self) -> Result<&'a [u8], RLPDecodeError> {
        if self.payload.is_empty() {
            Ok(self.remaining)
        } else {
            Err(RLPDecodeError::MalformedData)
        }
    }

    /// Returns true if every field of the list has been decoded.
    pub const fn is_done(&self) -> bool {
        self.payload.is_empty()
    }
}

fn field_decode_error<T>(field_name: &str, err: RLPDecodeError) -> RLPDecodeError {
    RLPDecodeError::Custom(format!(
        "error decoding field '{field_name}' of type {}: {err}",
        std::any::type_name::<T>()
    ))
}

/// Field-by-field encoder for struct types, the write-side twin of
/// [`Decoder`].
///
/// Fields accumulate in a scratch buffer so the list prefix can be sized
/// once [`finish`](Encoder::finish) runs.
#[must_use = "`Encoder` must be consumed with `finish` to perform the encoding"]
pub struct Encoder<'a> {
    buf: &'a mut dyn BufMut,
    fields: Vec<u8>,
}

impl<'a> Encoder<'a> {
    pub fn new(buf: &'a mut dyn BufMut) -> Self {
        Self {
            buf,
            fields: Vec::new(),
        }
    }

    pub fn encode_field<T: RLPEncode>(mut self, value: &T) -> Self {
        <T as RLPEncode>::encode(value, &mut self.fields);
        self
    }

    /// Stores a field to be encoded as a byte string.
    /// Bypasses the list interpretation `Vec<u8>` would otherwise get.
    pub fn encode_bytes(mut self, value: &[u8]) -> Self {
        <[u8] as RLPEncode>::encode(value, &mut self.fields);
        self
    }

    /// Adds an already-encoded item to the list payload verbatim.
    pub fn encode_raw(mut self, value: &[u8]) -> Self {
        self.fields.put_slice(value);
        self
    }

    pub fn finish(self) {
        encode_length(self.fields.len(), self.buf);
        self.buf.put_slice(&self.fields);
    }
}
