use bitvec::vec::BitVec;
use bytes::Bytes;

use crate::opcodes::opcode_values as op;

/// Sequential reader over contract bytecode with a program counter.
///
/// Distinguishes code from PUSH immediates: bytes consumed as push data are
/// never valid jump destinations.
#[derive(Debug, Clone)]
pub struct CodeStream {
    code: Bytes,
    pc: usize,
    push_data: BitVec,
}

impl CodeStream {
    pub fn new(code: Bytes) -> Self {
        let push_data = scan_push_data(&code);
        Self {
            code,
            pc: 0,
            push_data,
        }
    }

    /// Returns the byte at the program counter and advances past it.
    /// `None` once the stream runs off the end of the code.
    pub fn next_opcode(&mut self) -> Option<u8> {
        let byte = self.code.get(self.pc).copied();
        self.pc += 1;
        byte
    }

    /// Reads up to `size` immediate bytes, zero-padded on the right when the
    /// code ends early, advancing the counter either way.
    pub fn read(&mut self, size: usize) -> Vec<u8> {
        let mut out = vec![0u8; size];
        if self.pc < self.code.len() {
            let end = (self.pc + size).min(self.code.len());
            out[..end - self.pc].copy_from_slice(&self.code[self.pc..end]);
        }
        self.pc += size;
        out
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn seek(&mut self, pc: usize) {
        self.pc = pc;
    }

    /// True only if the byte at `pc` is a JUMPDEST opcode that is not buried
    /// inside a PUSH immediate.
    pub fn is_valid_jumpdest(&self, pc: usize) -> bool {
        self.code.get(pc) == Some(&op::JUMPDEST) && !self.push_data.get(pc).is_some_and(|b| *b)
    }

    pub fn code(&self) -> &Bytes {
        &self.code
    }
}

fn scan_push_data(code: &[u8]) -> BitVec {
    let mut push_data = BitVec::repeat(false, code.len());
    let mut i = 0;
    while i < code.len() {
        let byte = code[i];
        i += 1;
        if (op::PUSH1..=op::PUSH32).contains(&byte) {
            let immediates = (byte - op::PUSH1 + 1) as usize;
            let end = (i + immediates).min(code.len());
            for j in i..end {
                push_data.set(j, true);
            }
            i = end;
        }
    }
    push_data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_reads() {
        let mut code = CodeStream::new(Bytes::from_static(&[0x60, 0x05, 0x00]));
        assert_eq!(code.next_opcode(), Some(0x60));
        assert_eq!(code.read(1), vec![0x05]);
        assert_eq!(code.next_opcode(), Some(0x00));
        assert_eq!(code.next_opcode(), None);
    }

    #[test]
    fn read_past_end_pads_with_zeros() {
        let mut code = CodeStream::new(Bytes::from_static(&[0x7f, 0xaa]));
        code.next_opcode();
        let immediates = code.read(32);
        assert_eq!(immediates[0], 0xaa);
        assert!(immediates[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn jumpdest_inside_push_immediate_is_invalid() {
        // PUSH2 0x5b5b JUMPDEST
        let code = CodeStream::new(Bytes::from_static(&[0x61, 0x5b, 0x5b, 0x5b]));
        assert!(!code.is_valid_jumpdest(1));
        assert!(!code.is_valid_jumpdest(2));
        assert!(code.is_valid_jumpdest(3));
        assert!(!code.is_valid_jumpdest(0));
        assert!(!code.is_valid_jumpdest(100));
    }
}
