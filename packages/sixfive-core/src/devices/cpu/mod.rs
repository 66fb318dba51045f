//! The 6502 core: the register file and descriptor types, the dispatch
//! table, and the execution engine.

pub mod cpu;
pub mod structs;
pub mod utils;

pub use cpu::Cpu6502;
pub use structs::{
    AddressingMode, CpuSnapshot, CpuState, IllegalOpcode, IllegalOpcodePolicy, Instruction,
    Opcode, Status, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR,
};
pub use utils::{trace_line, OPCODES};
