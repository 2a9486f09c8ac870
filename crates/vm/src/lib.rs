mod code_stream;
mod computation;
pub mod constants;
mod environment;
pub mod errors;
mod forks;
pub mod gas_cost;
mod gas_meter;
mod memory;
mod message;
pub mod opcode_handlers;
mod opcodes;
pub mod operations;
pub mod precompiles;
mod stack;
pub mod utils;
mod vm;

pub use code_stream::CodeStream;
pub use computation::Computation;
pub use environment::{BlockContext, TransactionContext};
pub use errors::{ExecutionError, InvalidTransaction, VMError};
pub use forks::{
    FRONTIER_RULES, ForkRules, ForkSchedule, HOMESTEAD_RULES, TANGERINE_RULES, rules_for_fork,
};
pub use gas_meter::GasMeter;
pub use memory::Memory;
pub use message::Message;
pub use opcodes::{OpcodeEntry, OpcodeResult, OpcodeTable};
pub use stack::Stack;
pub use vm::{ChildOutcome, ExecutionReport, TxResult, Vm};
