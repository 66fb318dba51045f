use thiserror::Error;

/// Where the NMI handler address lives.
pub const NMI_VECTOR: u16 = 0xFFFA;
/// Where the reset handler address lives.
pub const RESET_VECTOR: u16 = 0xFFFC;
/// Where the IRQ/BRK handler address lives.
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// A struct holding state information about a 6502 CPU.
///
/// This struct is held internally, but can be copied to power things like
/// debug formatters and, if taken at an instruction boundary, savestates.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct CpuState {
    /// The Accumulator register
    pub acc: u8,

    /// X index register
    pub x: u8,

    /// Y index register
    pub y: u8,

    /// The stack pointer
    ///
    /// # Note
    ///
    /// This register is a pointer to a location in memory on the first page
    /// ($01XX) of memory. The 6502 uses a bottom-up stack, so the 'first'
    /// location on the stack is `$01FF` and the 'last' is `$0100`.
    pub stack: u8,

    /// The program counter
    pub pc: u16,

    /// The program status register.
    pub status: Status,

    /// The total number of clock ticks this CPU has run.
    pub tot_cycles: u64,
}

bitflags! {
    pub struct Status: u8 {
        const CARRY = 0x01;
        const ZERO = 0x02;
        const IRQ_DISABLE = 0x04;
        const DECIMAL = 0x08;
        const BREAK = 0x10;
        const UNUSED = 0x20;
        const OVERFLOW = 0x40;
        const NEGATIVE = 0x80;
    }
}

/// The register file as observed at power-on.
///
/// PC is indeterminate on real silicon until the reset sequence runs; the
/// reset latch is what loads it from $FFFC/$FFFD.
pub const POWERON_CPU_STATE: CpuState = CpuState {
    acc: 0,
    x: 0,
    y: 0,
    stack: 0,
    pc: 0,
    status: Status::UNUSED,
    tot_cycles: 0,
};

/// The addressing mode for the CPU
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum AddressingMode {
    /// Zero-Page
    ZP,
    /// Zero-Page Indexed, X register
    ZPX,
    /// Zero-Page Indexed, Y register
    ZPY,
    /// Absolute Indexed, plus X register
    AbsX,
    /// Absolute Indexed, plus Y register
    AbsY,
    /// Indexed Indirect (d, x)
    IndX,
    /// Indirect Indexed (d), y
    IndY,
    /// Implicit: the instruction names its own operand, or has none
    Impl,
    /// Use the Accumulator
    Accum,
    /// Don't fetch anything and use the operand byte as data
    Imm,
    /// Branch to a signed 8-bit displacement from the next instruction
    Rel,
    /// Absolute Indirect; used by JMP only, and carries the $xxFF wrap bug
    AbsInd,
    /// The 16-bit address is included in the operand
    Abs,
}

/// The CPU opcode mnemonic
///
/// *depends on the BCD flag; binary unless the `bcd` feature is enabled
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Instruction {
    /// ADd with Carry*
    ADC,
    /// bitwise AND w/ acc
    AND,
    /// Arithmetic Shift Left
    ASL,
    /// test BITs
    BIT,

    //region Branch instructions
    /// Branch on PLus
    BPL,
    /// Branch on MInus
    BMI,
    /// Branch on oVerflow Clear
    BVC,
    /// Branch on oVerflow Set
    BVS,
    /// Branch on Carry Clear
    BCC,
    /// Branch on Carry Set
    BCS,
    /// Branch on Not Equal
    BNE,
    /// Branch on EQual
    BEQ,
    //endregion
    /// BReaK
    BRK,
    /// CoMPare acc
    CMP,
    /// ComPare X
    CPX,
    /// ComPare Y
    CPY,
    /// DECrement memory
    DEC,
    /// bitwise Exclusive OR
    EOR,

    //region Flag instructions
    /// CLear Carry
    CLC,
    /// SEt Carry
    SEC,
    /// CLear Interrupt mask
    CLI,
    /// SEt Interrupt mask
    SEI,
    /// CLear oVerflow
    CLV,
    /// CLear Decimal
    CLD,
    /// SEt Decimal
    SED,
    //endregion
    /// INCrement memory
    INC,
    /// JuMP
    JMP,
    /// Jump to SubRoutine
    JSR,
    /// LoaD Acc
    LDA,
    /// LoaD X
    LDX,
    /// LoaD Y
    LDY,
    /// Logical Shift Right
    LSR,
    /// No OPeration
    NOP,
    /// bitwise OR with Acc
    ORA,

    //region Register instructions
    /// Transfer A to X
    TAX,
    /// Transfer X to A
    TXA,
    /// DEcrement X
    DEX,
    /// INcrement X
    INX,
    /// Transfer A to Y
    TAY,
    /// Transfer Y to A
    TYA,
    /// DEcrement Y
    DEY,
    /// INcrement Y
    INY,
    //endregion

    //region Rotation instructions
    // Rotation pulls the carry bit into the vacated position, so a rotate
    // is 9 bits wide, not 8.
    /// ROtate Left
    ROL,
    /// ROtate Right
    ROR,
    //endregion

    //region Returns
    /// ReTurn from Interrupt
    RTI,
    /// ReTurn from Subroutine
    RTS,
    //endregion
    /// SuBtract with Carry*
    SBC,

    //region Store instructions
    /// STore Acc
    STA,
    /// STore X
    STX,
    /// STore Y
    STY,
    //endregion

    //region Stack instructions
    /// Transfer X to Stack pointer
    TXS,
    /// Transfer Stack pointer to X
    TSX,
    /// PusH Acc
    PHA,
    /// PuLl Acc
    PLA,
    /// PusH Processor status
    PHP,
    /// PuLl Processor status
    PLP,
    //endregion
}

/// One slot of the dispatch table.
///
/// The table is the single source of decode truth: mnemonic, addressing
/// mode, base cycle count, and whether the engine should bill one extra
/// cycle when the resolver reports a page cross.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Opcode {
    pub instr: Instruction,
    pub addr_mode: AddressingMode,
    /// Base duration in clock ticks, before penalties.
    pub cycles: u8,
    /// Bill +1 cycle on a page cross (read-class indexed instructions).
    pub page_penalty: bool,
    /// Slot holds no official encoding; executes as a 2-cycle NOP.
    pub illegal: bool,
}

/// What an addressing mode resolved to.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Operand {
    /// No operand (implied instructions).
    Implied,
    /// The A register is the operand.
    Accumulator,
    /// The operand byte itself is the data.
    Immediate(u8),
    /// The operand is the byte at this effective address.
    Memory(u16),
}

/// Resolver output handed to every instruction handler.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Resolved {
    pub operand: Operand,
    /// Indexing carried into a new page. The engine turns this into a
    /// cycle penalty for table entries that ask for it; branch handlers
    /// consult it directly.
    pub page_crossed: bool,
}

impl Resolved {
    pub const IMPLIED: Resolved = Resolved {
        operand: Operand::Implied,
        page_crossed: false,
    };

    /// The effective address, for handlers that only make sense on memory
    /// operands (stores, jumps, branches).
    pub fn addr(&self) -> u16 {
        match self.operand {
            Operand::Memory(addr) => addr,
            // The table never pairs these handlers with another mode.
            _ => unreachable!("operand has no effective address"),
        }
    }
}

/// A diagnostic describing an opcode with no official encoding.
///
/// Only ever delivered through the observer hook registered with
/// [`Cpu6502::on_illegal_opcode`](super::cpu::Cpu6502::on_illegal_opcode);
/// the clock path itself never surfaces errors.
#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
#[error("illegal opcode {opcode:#04X} at {pc:#06X}")]
pub struct IllegalOpcode {
    pub opcode: u8,
    /// Address of the faulting byte.
    pub pc: u16,
}

/// How the engine treats slots with no official encoding.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum IllegalOpcodePolicy {
    /// Execute the table's NOP-2 entry and move on. Matches lenient NMOS
    /// behavior and is the default.
    Lenient,
    /// As Lenient, but also deliver an [`IllegalOpcode`] to the observer
    /// hook if one is registered.
    Report,
}

/// Everything a caller needs to persist to recreate the engine mid-run.
///
/// Flat plain-old-data on purpose: `status` is the raw P byte, so the
/// snapshot serializes without any knowledge of this crate's types.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
#[cfg_attr(
    feature = "savestate-serde",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CpuSnapshot {
    pub acc: u8,
    pub x: u8,
    pub y: u8,
    pub stack: u8,
    pub pc: u16,
    pub status: u8,
    pub tot_cycles: u64,
    pub cycles_remaining: u32,
    pub reset_pending: bool,
    pub nmi_pending: bool,
    pub irq_pending: bool,
}
