use super::super::bus::Bus;
use super::cpu::Cpu6502;
use super::structs::{AddressingMode, Instruction, Opcode};

#[macro_export]
macro_rules! bytes_to_addr {
    ($fst: expr, $snd: expr) => {{
        (u16::from($snd) << 8) | u16::from($fst)
    }};
}

macro_rules! op {
    ($instr: ident, $mode: ident, $cycles: expr) => {
        Opcode {
            instr: Instruction::$instr,
            addr_mode: AddressingMode::$mode,
            cycles: $cycles,
            page_penalty: false,
            illegal: false,
        }
    };
    ($instr: ident, $mode: ident, $cycles: expr, page) => {
        Opcode {
            instr: Instruction::$instr,
            addr_mode: AddressingMode::$mode,
            cycles: $cycles,
            page_penalty: true,
            illegal: false,
        }
    };
}

/// Filler for the 105 slots with no official encoding: a two-cycle NOP.
/// Strict hosts can be told about hits through the observer hook.
const ILLEGAL: Opcode = Opcode {
    instr: Instruction::NOP,
    addr_mode: AddressingMode::Impl,
    cycles: 2,
    page_penalty: false,
    illegal: true,
};

/// The dispatch table: one entry per opcode byte, immutable for the life
/// of the process. Cycle counts are the MOS datasheet numbers; `page`
/// marks the read-class indexed encodings that stretch by one cycle when
/// indexing crosses a page.
#[rustfmt::skip]
pub static OPCODES: [Opcode; 256] = [
    // 0x0_
    op!(BRK, Impl, 7),   op!(ORA, IndX, 6),       ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(ORA, ZP, 3),         op!(ASL, ZP, 5),     ILLEGAL,
    op!(PHP, Impl, 3),   op!(ORA, Imm, 2),        op!(ASL, Accum, 2),  ILLEGAL,
    ILLEGAL,             op!(ORA, Abs, 4),        op!(ASL, Abs, 6),    ILLEGAL,
    // 0x1_
    op!(BPL, Rel, 2),    op!(ORA, IndY, 5, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(ORA, ZPX, 4),        op!(ASL, ZPX, 6),    ILLEGAL,
    op!(CLC, Impl, 2),   op!(ORA, AbsY, 4, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(ORA, AbsX, 4, page), op!(ASL, AbsX, 7),   ILLEGAL,
    // 0x2_
    op!(JSR, Abs, 6),    op!(AND, IndX, 6),       ILLEGAL,             ILLEGAL,
    op!(BIT, ZP, 3),     op!(AND, ZP, 3),         op!(ROL, ZP, 5),     ILLEGAL,
    op!(PLP, Impl, 4),   op!(AND, Imm, 2),        op!(ROL, Accum, 2),  ILLEGAL,
    op!(BIT, Abs, 4),    op!(AND, Abs, 4),        op!(ROL, Abs, 6),    ILLEGAL,
    // 0x3_
    op!(BMI, Rel, 2),    op!(AND, IndY, 5, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(AND, ZPX, 4),        op!(ROL, ZPX, 6),    ILLEGAL,
    op!(SEC, Impl, 2),   op!(AND, AbsY, 4, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(AND, AbsX, 4, page), op!(ROL, AbsX, 7),   ILLEGAL,
    // 0x4_
    op!(RTI, Impl, 6),   op!(EOR, IndX, 6),       ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(EOR, ZP, 3),         op!(LSR, ZP, 5),     ILLEGAL,
    op!(PHA, Impl, 3),   op!(EOR, Imm, 2),        op!(LSR, Accum, 2),  ILLEGAL,
    op!(JMP, Abs, 3),    op!(EOR, Abs, 4),        op!(LSR, Abs, 6),    ILLEGAL,
    // 0x5_
    op!(BVC, Rel, 2),    op!(EOR, IndY, 5, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(EOR, ZPX, 4),        op!(LSR, ZPX, 6),    ILLEGAL,
    op!(CLI, Impl, 2),   op!(EOR, AbsY, 4, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(EOR, AbsX, 4, page), op!(LSR, AbsX, 7),   ILLEGAL,
    // 0x6_
    op!(RTS, Impl, 6),   op!(ADC, IndX, 6),       ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(ADC, ZP, 3),         op!(ROR, ZP, 5),     ILLEGAL,
    op!(PLA, Impl, 4),   op!(ADC, Imm, 2),        op!(ROR, Accum, 2),  ILLEGAL,
    op!(JMP, AbsInd, 5), op!(ADC, Abs, 4),        op!(ROR, Abs, 6),    ILLEGAL,
    // 0x7_
    op!(BVS, Rel, 2),    op!(ADC, IndY, 5, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(ADC, ZPX, 4),        op!(ROR, ZPX, 6),    ILLEGAL,
    op!(SEI, Impl, 2),   op!(ADC, AbsY, 4, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(ADC, AbsX, 4, page), op!(ROR, AbsX, 7),   ILLEGAL,
    // 0x8_
    ILLEGAL,             op!(STA, IndX, 6),       ILLEGAL,             ILLEGAL,
    op!(STY, ZP, 3),     op!(STA, ZP, 3),         op!(STX, ZP, 3),     ILLEGAL,
    op!(DEY, Impl, 2),   ILLEGAL,                 op!(TXA, Impl, 2),   ILLEGAL,
    op!(STY, Abs, 4),    op!(STA, Abs, 4),        op!(STX, Abs, 4),    ILLEGAL,
    // 0x9_
    op!(BCC, Rel, 2),    op!(STA, IndY, 6),       ILLEGAL,             ILLEGAL,
    op!(STY, ZPX, 4),    op!(STA, ZPX, 4),        op!(STX, ZPY, 4),    ILLEGAL,
    op!(TYA, Impl, 2),   op!(STA, AbsY, 5),       op!(TXS, Impl, 2),   ILLEGAL,
    ILLEGAL,             op!(STA, AbsX, 5),       ILLEGAL,             ILLEGAL,
    // 0xA_
    op!(LDY, Imm, 2),    op!(LDA, IndX, 6),       op!(LDX, Imm, 2),    ILLEGAL,
    op!(LDY, ZP, 3),     op!(LDA, ZP, 3),         op!(LDX, ZP, 3),     ILLEGAL,
    op!(TAY, Impl, 2),   op!(LDA, Imm, 2),        op!(TAX, Impl, 2),   ILLEGAL,
    op!(LDY, Abs, 4),    op!(LDA, Abs, 4),        op!(LDX, Abs, 4),    ILLEGAL,
    // 0xB_
    op!(BCS, Rel, 2),    op!(LDA, IndY, 5, page), ILLEGAL,             ILLEGAL,
    op!(LDY, ZPX, 4),    op!(LDA, ZPX, 4),        op!(LDX, ZPY, 4),    ILLEGAL,
    op!(CLV, Impl, 2),   op!(LDA, AbsY, 4, page), op!(TSX, Impl, 2),   ILLEGAL,
    op!(LDY, AbsX, 4, page), op!(LDA, AbsX, 4, page), op!(LDX, AbsY, 4, page), ILLEGAL,
    // 0xC_
    op!(CPY, Imm, 2),    op!(CMP, IndX, 6),       ILLEGAL,             ILLEGAL,
    op!(CPY, ZP, 3),     op!(CMP, ZP, 3),         op!(DEC, ZP, 5),     ILLEGAL,
    op!(INY, Impl, 2),   op!(CMP, Imm, 2),        op!(DEX, Impl, 2),   ILLEGAL,
    op!(CPY, Abs, 4),    op!(CMP, Abs, 4),        op!(DEC, Abs, 6),    ILLEGAL,
    // 0xD_
    op!(BNE, Rel, 2),    op!(CMP, IndY, 5, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(CMP, ZPX, 4),        op!(DEC, ZPX, 6),    ILLEGAL,
    op!(CLD, Impl, 2),   op!(CMP, AbsY, 4, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(CMP, AbsX, 4, page), op!(DEC, AbsX, 7),   ILLEGAL,
    // 0xE_
    op!(CPX, Imm, 2),    op!(SBC, IndX, 6),       ILLEGAL,             ILLEGAL,
    op!(CPX, ZP, 3),     op!(SBC, ZP, 3),         op!(INC, ZP, 5),     ILLEGAL,
    op!(INX, Impl, 2),   op!(SBC, Imm, 2),        op!(NOP, Impl, 2),   ILLEGAL,
    op!(CPX, Abs, 4),    op!(SBC, Abs, 4),        op!(INC, Abs, 6),    ILLEGAL,
    // 0xF_
    op!(BEQ, Rel, 2),    op!(SBC, IndY, 5, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(SBC, ZPX, 4),        op!(INC, ZPX, 6),    ILLEGAL,
    op!(SED, Impl, 2),   op!(SBC, AbsY, 4, page), ILLEGAL,             ILLEGAL,
    ILLEGAL,             op!(SBC, AbsX, 4, page), op!(INC, AbsX, 7),   ILLEGAL,
];

/// Operand bytes following the opcode for a given mode.
pub fn operand_len(mode: AddressingMode) -> u16 {
    match mode {
        AddressingMode::Impl | AddressingMode::Accum => 0,
        AddressingMode::Imm
        | AddressingMode::ZP
        | AddressingMode::ZPX
        | AddressingMode::ZPY
        | AddressingMode::IndX
        | AddressingMode::IndY
        | AddressingMode::Rel => 1,
        AddressingMode::Abs
        | AddressingMode::AbsX
        | AddressingMode::AbsY
        | AddressingMode::AbsInd => 2,
    }
}

/// Render one nestest-style trace line for the instruction at PC.
///
/// Reads go through `peek` so tracing never perturbs the bus; bytes that
/// cannot be peeked print as the $A5 debug pattern.
pub fn trace_line<B: Bus>(cpu: &Cpu6502, bus: &B) -> String {
    let pc = cpu.state.pc;
    let opcode = bus.peek(pc).unwrap_or(0xA5);
    let op = &OPCODES[opcode as usize];
    let lo = bus.peek(pc.wrapping_add(1)).unwrap_or(0xA5);
    let hi = bus.peek(pc.wrapping_add(2)).unwrap_or(0xA5);

    let raw = match operand_len(op.addr_mode) {
        0 => format!("{:02X}      ", opcode),
        1 => format!("{:02X} {:02X}   ", opcode, lo),
        _ => format!("{:02X} {:02X} {:02X}", opcode, lo, hi),
    };

    let disasm = match op.addr_mode {
        AddressingMode::Impl => format!("{:3?}", op.instr),
        AddressingMode::Accum => format!("{:3?} A", op.instr),
        AddressingMode::Imm => format!("{:3?} #${:02X}", op.instr, lo),
        AddressingMode::ZP => format!("{:3?} ${:02X}", op.instr, lo),
        AddressingMode::ZPX => format!("{:3?} ${:02X},X", op.instr, lo),
        AddressingMode::ZPY => format!("{:3?} ${:02X},Y", op.instr, lo),
        AddressingMode::Abs => format!("{:3?} ${:04X}", op.instr, bytes_to_addr!(lo, hi)),
        AddressingMode::AbsX => format!("{:3?} ${:04X},X", op.instr, bytes_to_addr!(lo, hi)),
        AddressingMode::AbsY => format!("{:3?} ${:04X},Y", op.instr, bytes_to_addr!(lo, hi)),
        AddressingMode::AbsInd => format!("{:3?} (${:04X})", op.instr, bytes_to_addr!(lo, hi)),
        AddressingMode::IndX => format!("{:3?} (${:02X},X)", op.instr, lo),
        AddressingMode::IndY => format!("{:3?} (${:02X}),Y", op.instr, lo),
        AddressingMode::Rel => {
            let target = pc.wrapping_add(2).wrapping_add((lo as i8) as u16);
            format!("{:3?} ${:04X}", op.instr, target)
        }
    };

    format!(
        "{:04X}  {:8}  {:14}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
        pc,
        raw,
        disasm,
        cpu.state.acc,
        cpu.state.x,
        cpu.state.y,
        cpu.state.status.bits(),
        cpu.state.stack,
        cpu.state.tot_cycles
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_151_official_entries() {
        let official = OPCODES.iter().filter(|op| !op.illegal).count();
        assert_eq!(official, 151);
    }

    #[test]
    fn every_entry_lasts_at_least_two_cycles() {
        for (byte, op) in OPCODES.iter().enumerate() {
            assert!(op.cycles >= 2, "opcode {:02X} shorter than 2 cycles", byte);
        }
    }

    #[test]
    fn decodes_known_encodings() {
        assert_eq!(OPCODES[0xA9], op!(LDA, Imm, 2));
        assert_eq!(OPCODES[0x6C], op!(JMP, AbsInd, 5));
        assert_eq!(OPCODES[0x91], op!(STA, IndY, 6));
        assert_eq!(OPCODES[0xB1], op!(LDA, IndY, 5, page));
    }

    #[test]
    fn unofficial_slots_are_nop_2() {
        for byte in [0x02u8, 0x80, 0xF2, 0xFF] {
            let op = &OPCODES[byte as usize];
            assert!(op.illegal);
            assert_eq!(op.instr, Instruction::NOP);
            assert_eq!(op.addr_mode, AddressingMode::Impl);
            assert_eq!(op.cycles, 2);
        }
    }

    #[test]
    fn stores_never_take_the_page_penalty() {
        for op in OPCODES.iter() {
            if let Instruction::STA | Instruction::STX | Instruction::STY = op.instr {
                assert!(!op.page_penalty);
            }
        }
    }

    #[test]
    fn branches_are_all_relative() {
        use Instruction::*;
        for op in OPCODES.iter().filter(|op| !op.illegal) {
            let is_branch = matches!(op.instr, BPL | BMI | BVC | BVS | BCC | BCS | BNE | BEQ);
            assert_eq!(is_branch, op.addr_mode == AddressingMode::Rel);
        }
    }
}
