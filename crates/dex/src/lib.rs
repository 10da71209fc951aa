pub mod cfg;
pub mod code;
pub mod dex;
pub mod disasm;
pub mod errors;
pub mod ir;
pub mod opcodes;

mod leb;

pub use cfg::{BasicBlock, ControlFlowGraph};
pub use dex::{Dex, NO_INDEX};
pub use disasm::{CfgType, Disassembler};
pub use errors::DexError;
