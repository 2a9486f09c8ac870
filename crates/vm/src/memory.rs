use bytes::Bytes;

use crate::gas_cost::ceil32;

/// Byte-addressable, implicitly zero, word-aligned frame memory.
///
/// Expansion gas is charged by the computation, not here.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Grows the buffer to cover `[start, start + size)`, rounded up to a
    /// word boundary. A zero `size` is a no-op.
    pub fn extend(&mut self, start: usize, size: usize) {
        if size == 0 {
            return;
        }
        let new_size = ceil32((start + size) as u64) as usize;
        if new_size > self.data.len() {
            self.data.resize(new_size, 0);
        }
    }

    /// Reads `size` bytes at `start`, zero-filling beyond the current end.
    pub fn read(&self, start: usize, size: usize) -> Bytes {
        let mut out = vec![0u8; size];
        if start < self.data.len() {
            let end = (start + size).min(self.data.len());
            out[..end - start].copy_from_slice(&self.data[start..end]);
        }
        Bytes::from(out)
    }

    /// Writes `bytes` at `start`, growing the buffer when the caller did not
    /// extend far enough.
    pub fn write(&mut self, start: usize, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let end = start + bytes.len();
        if end > self.data.len() {
            self.data.resize(ceil32(end as u64) as usize, 0);
        }
        self.data[start..end].copy_from_slice(bytes);
    }
}
