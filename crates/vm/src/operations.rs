//! A thin builder for writing bytecode in tests and tools as opcode lists
//! instead of hex strings.

use bytes::Bytes;
use ethereum_types::U256;

use crate::opcodes::opcode_values as op;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Stop,
    Add,
    Mul,
    Sub,
    Div,
    Sdiv,
    Mod,
    SMod,
    Addmod,
    Mulmod,
    Exp,
    SignExtend,
    Lt,
    Gt,
    Slt,
    Sgt,
    Eq,
    IsZero,
    And,
    Or,
    Xor,
    Not,
    Byte,
    Sha3,
    Address,
    Balance,
    Origin,
    Caller,
    Callvalue,
    CalldataLoad,
    CalldataSize,
    CalldataCopy,
    Codesize,
    Codecopy,
    Gasprice,
    ExtcodeSize,
    ExtcodeCopy,
    Blockhash,
    Coinbase,
    Timestamp,
    Number,
    Difficulty,
    Gaslimit,
    Pop,
    Mload,
    Mstore,
    Mstore8,
    Sload,
    Sstore,
    Jump,
    Jumpi,
    PC,
    Msize,
    Gas,
    Jumpdest,
    /// `Push((n, value))` emits PUSHn with the low `n` bytes of `value`.
    Push((u8, U256)),
    Dup(u8),
    Swap(u8),
    Log(u8),
    Create,
    Call,
    CallCode,
    Return,
    DelegateCall,
    SelfDestruct,
}

impl Operation {
    pub fn to_bytecode(&self) -> Vec<u8> {
        match self {
            Operation::Stop => vec![op::STOP],
            Operation::Add => vec![op::ADD],
            Operation::Mul => vec![op::MUL],
            Operation::Sub => vec![op::SUB],
            Operation::Div => vec![op::DIV],
            Operation::Sdiv => vec![op::SDIV],
            Operation::Mod => vec![op::MOD],
            Operation::SMod => vec![op::SMOD],
            Operation::Addmod => vec![op::ADDMOD],
            Operation::Mulmod => vec![op::MULMOD],
            Operation::Exp => vec![op::EXP],
            Operation::SignExtend => vec![op::SIGNEXTEND],
            Operation::Lt => vec![op::LT],
            Operation::Gt => vec![op::GT],
            Operation::Slt => vec![op::SLT],
            Operation::Sgt => vec![op::SGT],
            Operation::Eq => vec![op::EQ],
            Operation::IsZero => vec![op::ISZERO],
            Operation::And => vec![op::AND],
            Operation::Or => vec![op::OR],
            Operation::Xor => vec![op::XOR],
            Operation::Not => vec![op::NOT],
            Operation::Byte => vec![op::BYTE],
            Operation::Sha3 => vec![op::SHA3],
            Operation::Address => vec![op::ADDRESS],
            Operation::Balance => vec![op::BALANCE],
            Operation::Origin => vec![op::ORIGIN],
            Operation::Caller => vec![op::CALLER],
            Operation::Callvalue => vec![op::CALLVALUE],
            Operation::CalldataLoad => vec![op::CALLDATALOAD],
            Operation::CalldataSize => vec![op::CALLDATASIZE],
            Operation::CalldataCopy => vec![op::CALLDATACOPY],
            Operation::Codesize => vec![op::CODESIZE],
            Operation::Codecopy => vec![op::CODECOPY],
            Operation::Gasprice => vec![op::GASPRICE],
            Operation::ExtcodeSize => vec![op::EXTCODESIZE],
            Operation::ExtcodeCopy => vec![op::EXTCODECOPY],
            Operation::Blockhash => vec![op::BLOCKHASH],
            Operation::Coinbase => vec![op::COINBASE],
            Operation::Timestamp => vec![op::TIMESTAMP],
            Operation::Number => vec![op::NUMBER],
            Operation::Difficulty => vec![op::DIFFICULTY],
            Operation::Gaslimit => vec![op::GASLIMIT],
            Operation::Pop => vec![op::POP],
            Operation::Mload => vec![op::MLOAD],
            Operation::Mstore => vec![op::MSTORE],
            Operation::Mstore8 => vec![op::MSTORE8],
            Operation::Sload => vec![op::SLOAD],
            Operation::Sstore => vec![op::SSTORE],
            Operation::Jump => vec![op::JUMP],
            Operation::Jumpi => vec![op::JUMPI],
            Operation::PC => vec![op::PC],
            Operation::Msize => vec![op::MSIZE],
            Operation::Gas => vec![op::GAS],
            Operation::Jumpdest => vec![op::JUMPDEST],
            Operation::Push((size, value)) => {
                let size = (*size).clamp(1, 32);
                let mut code = vec![op::PUSH1 + size - 1];
                let bytes = value.to_big_endian();
                code.extend_from_slice(&bytes[32 - size as usize..]);
                code
            }
            Operation::Dup(depth) => vec![op::DUP1 + depth - 1],
            Operation::Swap(depth) => vec![op::SWAP1 + depth - 1],
            Operation::Log(topics) => vec![op::LOG0 + topics],
            Operation::Create => vec![op::CREATE],
            Operation::Call => vec![op::CALL],
            Operation::CallCode => vec![op::CALLCODE],
            Operation::Return => vec![op::RETURN],
            Operation::DelegateCall => vec![op::DELEGATECALL],
            Operation::SelfDestruct => vec![op::SELFDESTRUCT],
        }
    }
}

pub fn ops_to_bytecode(operations: &[Operation]) -> Bytes {
    operations
        .iter()
        .flat_map(|operation| operation.to_bytecode())
        .collect::<Vec<u8>>()
        .into()
}
