use bytes::Bytes;
use ethereum_types::{Address, Bloom, BloomInput, H256};
use ethrun_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};

use crate::utils::keccak;

/// Result of a transaction, in the pre-Byzantium layout: the receipt carries
/// the post-transaction state root rather than a status flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub state_root: H256,
    /// Cumulative gas used by this and all previous transactions in the block.
    pub cumulative_gas_used: u64,
    pub bloom: Bloom,
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn new(state_root: H256, cumulative_gas_used: u64, logs: Vec<Log>) -> Self {
        Self {
            state_root,
            cumulative_gas_used,
            bloom: bloom_from_logs(&logs),
            logs,
        }
    }
}

pub fn bloom_from_logs(logs: &[Log]) -> Bloom {
    let mut bloom = Bloom::zero();
    for log in logs {
        let address_hash = keccak(log.address);
        bloom.accrue(BloomInput::Hash(address_hash.as_fixed_bytes()));
        for topic in log.topics.iter() {
            let topic_hash = keccak(topic);
            bloom.accrue(BloomInput::Hash(topic_hash.as_fixed_bytes()));
        }
    }
    bloom
}

impl RLPEncode for Receipt {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.state_root)
            .encode_field(&self.cumulative_gas_used)
            .encode_field(&self.bloom)
            .encode_field(&self.logs)
            .finish();
    }
}

impl RLPDecode for Receipt {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (state_root, decoder) = decoder.decode_field("state_root")?;
        let (cumulative_gas_used, decoder) = decoder.decode_field("cumulative_gas_used")?;
        let (bloom, decoder) = decoder.decode_field("bloom")?;
        let (logs, decoder) = decoder.decode_field("logs")?;
        Ok((
            Self {
                state_root,
                cumulative_gas_used,
                bloom,
                logs,
            },
            decoder.finish()?,
        ))
    }
}

/// Data record produced during the execution of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
}

impl RLPEncode for Log {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.address)
            .encode_field(&self.topics)
            .encode_field(&self.data)
            .finish();
    }
}

impl RLPDecode for Log {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (address, decoder) = decoder.decode_field("address")?;
        let (topics, decoder) = decoder.decode_field("topics")?;
        let (data, decoder) = decoder.decode_field("data")?;
        Ok((
            Log {
                address,
                topics,
                data,
            },
            decoder.finish()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> Log {
        Log {
            address: Address::repeat_byte(0x11),
            topics: vec![H256::repeat_byte(0x22)],
            data: Bytes::from_static(b"payload"),
        }
    }

    #[test]
    fn receipt_rlp_roundtrip() {
        let receipt = Receipt::new(H256::repeat_byte(0x33), 42_000, vec![sample_log()]);
        let encoded = receipt.encode_to_vec();
        assert_eq!(Receipt::decode(&encoded).unwrap(), receipt);
    }

    #[test]
    fn bloom_covers_address_and_topics() {
        let log = sample_log();
        let bloom = bloom_from_logs(std::slice::from_ref(&log));
        assert_ne!(bloom, Bloom::zero());
        let mut expected = Bloom::zero();
        expected.accrue(BloomInput::Hash(keccak(log.address).as_fixed_bytes()));
        expected.accrue(BloomInput::Hash(keccak(log.topics[0]).as_fixed_bytes()));
        assert_eq!(bloom, expected);
    }

    #[test]
    fn empty_logs_empty_bloom() {
        assert_eq!(bloom_from_logs(&[]), Bloom::zero());
    }
}
