//! Emulator for the MOS 6502
//!
//! Binary-coded decimal is gated behind the `bcd` feature. The default
//! build matches the 2A03 derivative, which latches the D flag but keeps
//! ADC/SBC binary.

use tracing::{debug, warn};

use super::super::bus::Bus;
use super::structs::{
    AddressingMode, CpuSnapshot, CpuState, IllegalOpcode, IllegalOpcodePolicy, Instruction,
    Operand, Resolved, Status, IRQ_VECTOR, NMI_VECTOR, POWERON_CPU_STATE, RESET_VECTOR,
};
use super::utils::OPCODES;
use crate::bytes_to_addr;

/// Observable ticks consumed by a RESET/NMI/IRQ service sequence.
const INTERRUPT_CYCLES: u32 = 7;

macro_rules! op_fn {
    ($mnemonic: ident, $cpu: ident, $bus: ident, $opr: ident, $body: expr) => {
        fn $mnemonic<B: Bus>($cpu: &mut Cpu6502, $bus: &mut B, $opr: Resolved) -> u8 {
            $body
        }
    };
}

/// The execution engine.
///
/// Owns the register file outright; the bus stays with the caller and is
/// lent to every operation that touches memory. The engine must not be
/// clocked from two contexts at once, which `&mut self` already enforces.
pub struct Cpu6502 {
    pub state: CpuState,
    //region internal state
    // The variables below are emulator bookkeeping, not 6502 registers.
    /// Ticks left before the in-flight instruction completes. While
    /// non-zero, `clock` only counts down.
    cycles_remaining: u32,
    /// A reset was requested; honored at the next instruction boundary.
    reset_pending: bool,
    /// Edge-triggered NMI latch; sticks until serviced.
    nmi_pending: bool,
    /// Level-sensitive IRQ line; serviced once the I flag allows.
    irq_pending: bool,
    illegal_policy: IllegalOpcodePolicy,
    on_illegal: Option<Box<dyn FnMut(&IllegalOpcode) + Send>>,
    //endregion
}

impl Cpu6502 {
    /// Create a new CPU in the power-on state.
    ///
    /// The reset sequence is not implied: call [`reset`](Self::reset) and
    /// clock the CPU to load PC from the reset vector.
    pub fn new() -> Cpu6502 {
        Cpu6502 {
            state: POWERON_CPU_STATE,
            cycles_remaining: 0,
            reset_pending: false,
            nmi_pending: false,
            irq_pending: false,
            illegal_policy: IllegalOpcodePolicy::Lenient,
            on_illegal: None,
        }
    }

    /// Schedule a hardware reset, honored at the next instruction
    /// boundary. Loads PC from $FFFC/$FFFD, sets SP=$FD and P=$34; A, X
    /// and Y are left alone, as on the silicon.
    pub fn reset(&mut self) {
        self.reset_pending = true;
    }

    /// Raise the IRQ line. Level-sensitive: the request stays pending
    /// until the I flag permits service.
    pub fn irq(&mut self) {
        self.irq_pending = true;
    }

    /// Raise the NMI line. Edge-triggered: latched until serviced.
    pub fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Advance the CPU by one clock tick.
    ///
    /// On the first tick of an instruction the whole body executes and the
    /// remaining duration is loaded into the countdown; subsequent ticks
    /// only count down. Interrupts are polled at instruction boundaries
    /// only, in priority order RESET > NMI > IRQ.
    pub fn clock<B: Bus>(&mut self, bus: &mut B) {
        self.state.tot_cycles += 1;
        if self.cycles_remaining > 0 {
            self.cycles_remaining -= 1;
            return;
        }
        if self.service_interrupts(bus) {
            return;
        }
        self.dispatch(bus);
    }

    /// Execute one full instruction (or interrupt service) and return the
    /// ticks it consumed.
    ///
    /// The instruction-stepped driver: equivalent to `clock` at every
    /// instruction boundary, for hosts that do not need per-tick pacing.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        // Drain a countdown left over from clock-driven pacing first.
        while self.cycles_remaining > 0 {
            self.clock(bus);
        }
        self.clock(bus);
        let consumed = self.cycles_remaining + 1;
        self.state.tot_cycles += u64::from(self.cycles_remaining);
        self.cycles_remaining = 0;
        consumed
    }

    /// Ticks left on the in-flight instruction.
    pub fn cycles_remaining(&self) -> u32 {
        self.cycles_remaining
    }

    /// The status register.
    pub fn flags(&self) -> Status {
        self.state.status
    }

    /// The program counter.
    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    /// A copy of the register file.
    pub fn registers(&self) -> CpuState {
        self.state
    }

    /// Choose how slots with no official encoding are handled.
    pub fn set_illegal_opcode_policy(&mut self, policy: IllegalOpcodePolicy) {
        self.illegal_policy = policy;
    }

    /// Register an observer for illegal-opcode diagnostics. Only invoked
    /// under [`IllegalOpcodePolicy::Report`].
    pub fn on_illegal_opcode(&mut self, hook: impl FnMut(&IllegalOpcode) + Send + 'static) {
        self.on_illegal = Some(Box::new(hook));
    }

    /// Capture everything needed to recreate the engine mid-run.
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            acc: self.state.acc,
            x: self.state.x,
            y: self.state.y,
            stack: self.state.stack,
            pc: self.state.pc,
            status: self.state.status.bits(),
            tot_cycles: self.state.tot_cycles,
            cycles_remaining: self.cycles_remaining,
            reset_pending: self.reset_pending,
            nmi_pending: self.nmi_pending,
            irq_pending: self.irq_pending,
        }
    }

    /// Restore a snapshot taken with [`snapshot`](Self::snapshot).
    pub fn restore(&mut self, snap: &CpuSnapshot) {
        self.state = CpuState {
            acc: snap.acc,
            x: snap.x,
            y: snap.y,
            stack: snap.stack,
            pc: snap.pc,
            status: Status::from_bits_truncate(snap.status),
            tot_cycles: snap.tot_cycles,
        };
        self.cycles_remaining = snap.cycles_remaining;
        self.reset_pending = snap.reset_pending;
        self.nmi_pending = snap.nmi_pending;
        self.irq_pending = snap.irq_pending;
    }

    /// Poll the interrupt latches and run a service sequence if one is
    /// due. Returns whether a sequence ran.
    fn service_interrupts<B: Bus>(&mut self, bus: &mut B) -> bool {
        if self.reset_pending {
            self.reset_pending = false;
            let fst = bus.read(RESET_VECTOR);
            let snd = bus.read(RESET_VECTOR.wrapping_add(1));
            self.state.pc = bytes_to_addr!(fst, snd);
            // Reset fakes its stack pushes: SP moves, memory does not.
            self.state.stack = 0xFD;
            self.state.status = Status::from_bits_truncate(0x34);
            self.cycles_remaining = INTERRUPT_CYCLES - 1;
            debug!(pc = self.state.pc, "reset");
            return true;
        }
        if self.nmi_pending {
            self.nmi_pending = false;
            self.enter_interrupt(bus, NMI_VECTOR);
            return true;
        }
        if self.irq_pending && !self.state.status.contains(Status::IRQ_DISABLE) {
            self.irq_pending = false;
            self.enter_interrupt(bus, IRQ_VECTOR);
            return true;
        }
        false
    }

    fn enter_interrupt<B: Bus>(&mut self, bus: &mut B, vector: u16) {
        debug!(vector, "servicing interrupt");
        let [lo, hi] = self.state.pc.to_le_bytes();
        push_stack(self, bus, hi);
        push_stack(self, bus, lo);
        // Hardware pushes leave B clear; bit 5 always reads high.
        let pushed = (self.state.status | Status::UNUSED) & !Status::BREAK;
        push_stack(self, bus, pushed.bits());
        set_flag(self, Status::IRQ_DISABLE);
        let fst = bus.read(vector);
        let snd = bus.read(vector.wrapping_add(1));
        self.state.pc = bytes_to_addr!(fst, snd);
        self.cycles_remaining = INTERRUPT_CYCLES - 1;
    }

    /// Fetch, decode, resolve and execute the instruction at PC, then
    /// load the cycle countdown.
    fn dispatch<B: Bus>(&mut self, bus: &mut B) {
        let at = self.state.pc;
        let opcode = bus.read(at);
        self.state.pc = at.wrapping_add(1);
        let op = &OPCODES[opcode as usize];

        if op.illegal {
            warn!(opcode, pc = at, "illegal opcode in instruction stream");
            if self.illegal_policy == IllegalOpcodePolicy::Report {
                let diag = IllegalOpcode { opcode, pc: at };
                if let Some(hook) = self.on_illegal.as_mut() {
                    hook(&diag);
                }
            }
        }

        let resolved = self.resolve(bus, op.addr_mode);
        let handler = match_handler::<B>(op.instr);
        let extra = handler(self, bus, resolved);

        let mut cycles = u32::from(op.cycles) + u32::from(extra);
        if op.page_penalty && resolved.page_crossed {
            cycles += 1;
        }
        // This tick is the first cycle of the instruction.
        self.cycles_remaining = cycles - 1;
    }

    /// Resolve the operand for an addressing mode, consuming operand
    /// bytes from the instruction stream.
    fn resolve<B: Bus>(&mut self, bus: &mut B, mode: AddressingMode) -> Resolved {
        match mode {
            AddressingMode::Impl => Resolved::IMPLIED,
            AddressingMode::Accum => Resolved {
                operand: Operand::Accumulator,
                page_crossed: false,
            },
            AddressingMode::Imm => {
                let data = self.next_byte(bus);
                Resolved {
                    operand: Operand::Immediate(data),
                    page_crossed: false,
                }
            }
            AddressingMode::ZP => {
                let addr = u16::from(self.next_byte(bus));
                Resolved {
                    operand: Operand::Memory(addr),
                    page_crossed: false,
                }
            }
            AddressingMode::ZPX => {
                // Indexing never leaves page zero; the carry is dropped.
                let addr = u16::from(self.next_byte(bus).wrapping_add(self.state.x));
                Resolved {
                    operand: Operand::Memory(addr),
                    page_crossed: false,
                }
            }
            AddressingMode::ZPY => {
                let addr = u16::from(self.next_byte(bus).wrapping_add(self.state.y));
                Resolved {
                    operand: Operand::Memory(addr),
                    page_crossed: false,
                }
            }
            AddressingMode::Abs => {
                let addr = self.next_addr(bus);
                Resolved {
                    operand: Operand::Memory(addr),
                    page_crossed: false,
                }
            }
            AddressingMode::AbsX => {
                let base = self.next_addr(bus);
                let addr = base.wrapping_add(u16::from(self.state.x));
                Resolved {
                    operand: Operand::Memory(addr),
                    page_crossed: crossed_page(base, addr),
                }
            }
            AddressingMode::AbsY => {
                let base = self.next_addr(bus);
                let addr = base.wrapping_add(u16::from(self.state.y));
                Resolved {
                    operand: Operand::Memory(addr),
                    page_crossed: crossed_page(base, addr),
                }
            }
            AddressingMode::AbsInd => {
                let ptr = self.next_addr(bus);
                // A pointer at $xxFF reads its high byte from $xx00: the
                // silicon increments only the low pointer byte.
                let fst = bus.read(ptr);
                let snd = bus.read((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF));
                Resolved {
                    operand: Operand::Memory(bytes_to_addr!(fst, snd)),
                    page_crossed: false,
                }
            }
            AddressingMode::IndX => {
                let zp = self.next_byte(bus).wrapping_add(self.state.x);
                let fst = bus.read(u16::from(zp));
                let snd = bus.read(u16::from(zp.wrapping_add(1)));
                Resolved {
                    operand: Operand::Memory(bytes_to_addr!(fst, snd)),
                    page_crossed: false,
                }
            }
            AddressingMode::IndY => {
                let zp = self.next_byte(bus);
                let fst = bus.read(u16::from(zp));
                let snd = bus.read(u16::from(zp.wrapping_add(1)));
                let base = bytes_to_addr!(fst, snd);
                let addr = base.wrapping_add(u16::from(self.state.y));
                Resolved {
                    operand: Operand::Memory(addr),
                    page_crossed: crossed_page(base, addr),
                }
            }
            AddressingMode::Rel => {
                let offset = self.next_byte(bus) as i8;
                // The displacement is relative to the next instruction.
                let base = self.state.pc;
                let target = base.wrapping_add(offset as u16);
                Resolved {
                    operand: Operand::Memory(target),
                    page_crossed: crossed_page(base, target),
                }
            }
        }
    }

    /// Read the byte at PC and advance.
    fn next_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let data = bus.read(self.state.pc);
        self.state.pc = self.state.pc.wrapping_add(1);
        data
    }

    /// Read the little-endian word at PC and advance.
    fn next_addr<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let fst = self.next_byte(bus);
        let snd = self.next_byte(bus);
        bytes_to_addr!(fst, snd)
    }
}

impl Default for Cpu6502 {
    fn default() -> Self {
        Cpu6502::new()
    }
}

fn crossed_page(base: u16, addr: u16) -> bool {
    base & 0xFF00 != addr & 0xFF00
}

/// Sets a flag in the status register
fn set_flag(cpu: &mut Cpu6502, flag: Status) {
    cpu.state.status |= flag;
}

/// Clears a flag from the status register
fn clear_flag(cpu: &mut Cpu6502, flag: Status) {
    cpu.state.status &= !flag;
}

fn check_carry(cpu: &mut Cpu6502, val: u16) {
    cpu.state.status.set(Status::CARRY, val & 0x100 == 0x100);
}

fn check_zero(cpu: &mut Cpu6502, val: u8) {
    cpu.state.status.set(Status::ZERO, val == 0);
}

/// Signed overflow: the accumulator and the operand agree in sign and the
/// result disagrees. Must run before the accumulator is overwritten.
fn check_overflow(cpu: &mut Cpu6502, operand: u8, result: u8) {
    let overflowed = (cpu.state.acc ^ result) & (operand ^ result) & 0x80 != 0;
    cpu.state.status.set(Status::OVERFLOW, overflowed);
}

fn check_negative(cpu: &mut Cpu6502, val: u8) {
    cpu.state.status.set(Status::NEGATIVE, val & 0x80 != 0);
}

/// Read the data the resolved operand refers to.
fn operand_read<B: Bus>(cpu: &mut Cpu6502, bus: &mut B, opr: Resolved) -> u8 {
    match opr.operand {
        Operand::Immediate(data) => data,
        Operand::Accumulator => cpu.state.acc,
        Operand::Memory(addr) => bus.read(addr),
        // The table never pairs a reading handler with implied mode.
        Operand::Implied => unreachable!("implied operand carries no data"),
    }
}

/// Write the data back to the resolved operand.
fn operand_write<B: Bus>(cpu: &mut Cpu6502, bus: &mut B, opr: Resolved, data: u8) {
    match opr.operand {
        Operand::Accumulator => cpu.state.acc = data,
        Operand::Memory(addr) => bus.write(addr, data),
        _ => unreachable!("operand is not writable"),
    }
}

fn push_stack<B: Bus>(cpu: &mut Cpu6502, bus: &mut B, data: u8) {
    let addr = bytes_to_addr!(cpu.state.stack, 0x01u8);
    bus.write(addr, data);
    cpu.state.stack = cpu.state.stack.wrapping_sub(1);
}

fn pop_stack<B: Bus>(cpu: &mut Cpu6502, bus: &mut B) -> u8 {
    cpu.state.stack = cpu.state.stack.wrapping_add(1);
    let addr = bytes_to_addr!(cpu.state.stack, 0x01u8);
    bus.read(addr)
}

/// Shared body of the eight branch instructions. Taking the branch costs
/// a cycle; landing on a new page costs one more.
fn branch_on(cpu: &mut Cpu6502, opr: Resolved, condition: bool) -> u8 {
    if !condition {
        return 0;
    }
    cpu.state.pc = opr.addr();
    1 + u8::from(opr.page_crossed)
}

/// Shared body of CMP/CPX/CPY: carry means no borrow, i.e. reg >= data.
fn compare(cpu: &mut Cpu6502, reg: u8, data: u8) {
    let diff = reg.wrapping_sub(data);
    cpu.state.status.set(Status::CARRY, reg >= data);
    check_zero(cpu, diff);
    check_negative(cpu, diff);
}

/// Binary ADC. SBC reuses this with the operand inverted: subtraction is
/// addition of the one's complement, with the borrow riding the carry.
fn add_with_carry(cpu: &mut Cpu6502, operand: u8) {
    let carry = u16::from(cpu.state.status.contains(Status::CARRY));
    let sum = u16::from(cpu.state.acc) + u16::from(operand) + carry;
    check_carry(cpu, sum);
    check_overflow(cpu, operand, sum as u8);
    cpu.state.acc = sum as u8;
    check_zero(cpu, cpu.state.acc);
    check_negative(cpu, cpu.state.acc);
}

/// NMOS decimal ADC, per Bruce Clark's decimal-mode note: Z tracks the
/// binary sum, N and V the intermediate before the high-nibble fixup.
#[cfg(feature = "bcd")]
fn add_decimal(cpu: &mut Cpu6502, operand: u8) {
    let acc = cpu.state.acc;
    let carry = u16::from(cpu.state.status.contains(Status::CARRY));
    let binary = u16::from(acc) + u16::from(operand) + carry;
    check_zero(cpu, binary as u8);

    let mut lo = u16::from(acc & 0x0F) + u16::from(operand & 0x0F) + carry;
    if lo >= 0x0A {
        lo = ((lo + 0x06) & 0x0F) + 0x10;
    }
    let mut sum = u16::from(acc & 0xF0) + u16::from(operand & 0xF0) + lo;
    check_negative(cpu, sum as u8);
    check_overflow(cpu, operand, sum as u8);
    if sum >= 0xA0 {
        sum += 0x60;
    }
    cpu.state.status.set(Status::CARRY, sum >= 0x100);
    cpu.state.acc = sum as u8;
}

/// NMOS decimal SBC: every flag comes from the binary subtraction; only
/// the accumulator takes the BCD fixup.
#[cfg(feature = "bcd")]
fn sub_decimal(cpu: &mut Cpu6502, operand: u8) {
    let acc = cpu.state.acc;
    let borrow = i16::from(!cpu.state.status.contains(Status::CARRY));
    let binary = i16::from(acc) - i16::from(operand) - borrow;
    cpu.state.status.set(Status::CARRY, binary >= 0);
    check_overflow(cpu, !operand, binary as u8);
    check_zero(cpu, binary as u8);
    check_negative(cpu, binary as u8);

    let mut lo = i16::from(acc & 0x0F) - i16::from(operand & 0x0F) - borrow;
    if lo < 0 {
        lo = ((lo - 0x06) & 0x0F) - 0x10;
    }
    let mut result = i16::from(acc & 0xF0) - i16::from(operand & 0xF0) + lo;
    if result < 0 {
        result -= 0x60;
    }
    cpu.state.acc = result as u8;
}

#[allow(type_alias_bounds)] // leaving this in for self-documenting reasons
type OpcodeHandler<B: Bus> = fn(cpu: &mut Cpu6502, bus: &mut B, opr: Resolved) -> u8;

fn match_handler<B: Bus>(mnemonic: Instruction) -> OpcodeHandler<B> {
    match mnemonic {
        Instruction::ADC => op_adc,
        Instruction::AND => op_and,
        Instruction::ASL => op_asl,
        Instruction::BIT => op_bit,
        Instruction::BPL => op_bpl,
        Instruction::BMI => op_bmi,
        Instruction::BVC => op_bvc,
        Instruction::BVS => op_bvs,
        Instruction::BCC => op_bcc,
        Instruction::BCS => op_bcs,
        Instruction::BNE => op_bne,
        Instruction::BEQ => op_beq,
        Instruction::BRK => op_brk,
        Instruction::CMP => op_cmp,
        Instruction::CPX => op_cpx,
        Instruction::CPY => op_cpy,
        Instruction::DEC => op_dec,
        Instruction::EOR => op_eor,
        Instruction::CLC => op_clc,
        Instruction::SEC => op_sec,
        Instruction::CLI => op_cli,
        Instruction::SEI => op_sei,
        Instruction::CLV => op_clv,
        Instruction::CLD => op_cld,
        Instruction::SED => op_sed,
        Instruction::INC => op_inc,
        Instruction::JMP => op_jmp,
        Instruction::JSR => op_jsr,
        Instruction::LDA => op_lda,
        Instruction::LDX => op_ldx,
        Instruction::LDY => op_ldy,
        Instruction::LSR => op_lsr,
        Instruction::NOP => op_nop,
        Instruction::ORA => op_ora,
        Instruction::TAX => op_tax,
        Instruction::TXA => op_txa,
        Instruction::DEX => op_dex,
        Instruction::INX => op_inx,
        Instruction::TAY => op_tay,
        Instruction::TYA => op_tya,
        Instruction::DEY => op_dey,
        Instruction::INY => op_iny,
        Instruction::ROL => op_rol,
        Instruction::ROR => op_ror,
        Instruction::RTI => op_rti,
        Instruction::RTS => op_rts,
        Instruction::SBC => op_sbc,
        Instruction::STA => op_sta,
        Instruction::STX => op_stx,
        Instruction::STY => op_sty,
        Instruction::TXS => op_txs,
        Instruction::TSX => op_tsx,
        Instruction::PHA => op_pha,
        Instruction::PLA => op_pla,
        Instruction::PHP => op_php,
        Instruction::PLP => op_plp,
    }
}

//region Arithmetic ops
// ADC SBC
op_fn!(op_adc, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr);
    #[cfg(feature = "bcd")]
    {
        if cpu.state.status.contains(Status::DECIMAL) {
            add_decimal(cpu, data);
            return 0;
        }
    }
    add_with_carry(cpu, data);
    0
});
op_fn!(op_sbc, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr);
    #[cfg(feature = "bcd")]
    {
        if cpu.state.status.contains(Status::DECIMAL) {
            sub_decimal(cpu, data);
            return 0;
        }
    }
    add_with_carry(cpu, !data);
    0
});
//endregion

//region Bitwise ops
// AND BIT EOR ORA
op_fn!(op_and, cpu, bus, opr, {
    cpu.state.acc &= operand_read(cpu, bus, opr);
    check_zero(cpu, cpu.state.acc);
    check_negative(cpu, cpu.state.acc);
    0
});
op_fn!(op_bit, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr);
    check_zero(cpu, cpu.state.acc & data);
    // N and V mirror bits 7 and 6 of the operand, not of the AND result.
    cpu.state.status.set(Status::NEGATIVE, data & 0x80 != 0);
    cpu.state.status.set(Status::OVERFLOW, data & 0x40 != 0);
    0
});
op_fn!(op_eor, cpu, bus, opr, {
    cpu.state.acc ^= operand_read(cpu, bus, opr);
    check_zero(cpu, cpu.state.acc);
    check_negative(cpu, cpu.state.acc);
    0
});
op_fn!(op_ora, cpu, bus, opr, {
    cpu.state.acc |= operand_read(cpu, bus, opr);
    check_zero(cpu, cpu.state.acc);
    check_negative(cpu, cpu.state.acc);
    0
});
//endregion

//region Shifts and rotates
// ASL LSR ROL ROR
op_fn!(op_asl, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr);
    cpu.state.status.set(Status::CARRY, data & 0x80 != 0);
    let data = data << 1;
    check_zero(cpu, data);
    check_negative(cpu, data);
    operand_write(cpu, bus, opr, data);
    0
});
op_fn!(op_lsr, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr);
    cpu.state.status.set(Status::CARRY, data & 0x01 != 0);
    let data = data >> 1;
    check_zero(cpu, data);
    check_negative(cpu, data);
    operand_write(cpu, bus, opr, data);
    0
});
op_fn!(op_rol, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr);
    let carried = cpu.state.status.contains(Status::CARRY);
    cpu.state.status.set(Status::CARRY, data & 0x80 != 0);
    let data = (data << 1) | u8::from(carried);
    check_zero(cpu, data);
    check_negative(cpu, data);
    operand_write(cpu, bus, opr, data);
    0
});
op_fn!(op_ror, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr);
    let carried = cpu.state.status.contains(Status::CARRY);
    cpu.state.status.set(Status::CARRY, data & 0x01 != 0);
    let data = (data >> 1) | (u8::from(carried) << 7);
    check_zero(cpu, data);
    check_negative(cpu, data);
    operand_write(cpu, bus, opr, data);
    0
});
//endregion

//region Branch instructions
// BPL BMI BVC BVS BCC BCS BNE BEQ
op_fn!(op_bpl, cpu, _bus, opr, {
    let taken = !cpu.state.status.contains(Status::NEGATIVE);
    branch_on(cpu, opr, taken)
});
op_fn!(op_bmi, cpu, _bus, opr, {
    let taken = cpu.state.status.contains(Status::NEGATIVE);
    branch_on(cpu, opr, taken)
});
op_fn!(op_bvc, cpu, _bus, opr, {
    let taken = !cpu.state.status.contains(Status::OVERFLOW);
    branch_on(cpu, opr, taken)
});
op_fn!(op_bvs, cpu, _bus, opr, {
    let taken = cpu.state.status.contains(Status::OVERFLOW);
    branch_on(cpu, opr, taken)
});
op_fn!(op_bcc, cpu, _bus, opr, {
    let taken = !cpu.state.status.contains(Status::CARRY);
    branch_on(cpu, opr, taken)
});
op_fn!(op_bcs, cpu, _bus, opr, {
    let taken = cpu.state.status.contains(Status::CARRY);
    branch_on(cpu, opr, taken)
});
op_fn!(op_bne, cpu, _bus, opr, {
    let taken = !cpu.state.status.contains(Status::ZERO);
    branch_on(cpu, opr, taken)
});
op_fn!(op_beq, cpu, _bus, opr, {
    let taken = cpu.state.status.contains(Status::ZERO);
    branch_on(cpu, opr, taken)
});
//endregion

op_fn!(op_brk, cpu, bus, _opr, {
    // The byte after BRK is a signature byte the return address skips.
    cpu.state.pc = cpu.state.pc.wrapping_add(1);
    let [lo, hi] = cpu.state.pc.to_le_bytes();
    push_stack(cpu, bus, hi);
    push_stack(cpu, bus, lo);
    // Software pushes mark B; bit 5 always reads high.
    let pushed = cpu.state.status | Status::BREAK | Status::UNUSED;
    push_stack(cpu, bus, pushed.bits());
    set_flag(cpu, Status::IRQ_DISABLE);
    let fst = bus.read(IRQ_VECTOR);
    let snd = bus.read(IRQ_VECTOR.wrapping_add(1));
    cpu.state.pc = bytes_to_addr!(fst, snd);
    0
});

//region Compare functions
// CMP CPX CPY
op_fn!(op_cmp, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr);
    compare(cpu, cpu.state.acc, data);
    0
});
op_fn!(op_cpx, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr);
    compare(cpu, cpu.state.x, data);
    0
});
op_fn!(op_cpy, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr);
    compare(cpu, cpu.state.y, data);
    0
});
//endregion

//region Memory increment/decrement
// DEC INC
op_fn!(op_dec, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr).wrapping_sub(1);
    operand_write(cpu, bus, opr, data);
    check_zero(cpu, data);
    check_negative(cpu, data);
    0
});
op_fn!(op_inc, cpu, bus, opr, {
    let data = operand_read(cpu, bus, opr).wrapping_add(1);
    operand_write(cpu, bus, opr, data);
    check_zero(cpu, data);
    check_negative(cpu, data);
    0
});
//endregion

//region Flag operations
// CLC SEC CLI SEI CLV CLD SED
op_fn!(op_clc, cpu, _bus, _opr, {
    clear_flag(cpu, Status::CARRY);
    0
});
op_fn!(op_sec, cpu, _bus, _opr, {
    set_flag(cpu, Status::CARRY);
    0
});
op_fn!(op_cli, cpu, _bus, _opr, {
    clear_flag(cpu, Status::IRQ_DISABLE);
    0
});
op_fn!(op_sei, cpu, _bus, _opr, {
    set_flag(cpu, Status::IRQ_DISABLE);
    0
});
op_fn!(op_clv, cpu, _bus, _opr, {
    clear_flag(cpu, Status::OVERFLOW);
    0
});
op_fn!(op_cld, cpu, _bus, _opr, {
    clear_flag(cpu, Status::DECIMAL);
    0
});
op_fn!(op_sed, cpu, _bus, _opr, {
    set_flag(cpu, Status::DECIMAL);
    0
});
//endregion

//region Jumps
// JMP JSR RTI RTS
op_fn!(op_jmp, cpu, _bus, opr, {
    cpu.state.pc = opr.addr();
    0
});
op_fn!(op_jsr, cpu, bus, opr, {
    // The pushed return address is the last byte of this instruction;
    // RTS undoes the off-by-one.
    let [lo, hi] = cpu.state.pc.wrapping_sub(1).to_le_bytes();
    push_stack(cpu, bus, hi);
    push_stack(cpu, bus, lo);
    cpu.state.pc = opr.addr();
    0
});
op_fn!(op_rti, cpu, bus, _opr, {
    let flags = pop_stack(cpu, bus);
    cpu.state.status = Status::from_bits_truncate((flags & 0xEF) | 0x20);
    let fst = pop_stack(cpu, bus);
    let snd = pop_stack(cpu, bus);
    // Unlike RTS, the popped address is exact.
    cpu.state.pc = bytes_to_addr!(fst, snd);
    0
});
op_fn!(op_rts, cpu, bus, _opr, {
    let fst = pop_stack(cpu, bus);
    let snd = pop_stack(cpu, bus);
    cpu.state.pc = bytes_to_addr!(fst, snd).wrapping_add(1);
    0
});
//endregion

//region Loads
op_fn!(op_lda, cpu, bus, opr, {
    cpu.state.acc = operand_read(cpu, bus, opr);
    check_zero(cpu, cpu.state.acc);
    check_negative(cpu, cpu.state.acc);
    0
});
op_fn!(op_ldx, cpu, bus, opr, {
    cpu.state.x = operand_read(cpu, bus, opr);
    check_zero(cpu, cpu.state.x);
    check_negative(cpu, cpu.state.x);
    0
});
op_fn!(op_ldy, cpu, bus, opr, {
    cpu.state.y = operand_read(cpu, bus, opr);
    check_zero(cpu, cpu.state.y);
    check_negative(cpu, cpu.state.y);
    0
});
//endregion

op_fn!(op_nop, _cpu, _bus, _opr, {
    // no operation
    0
});

//region Register instructions
op_fn!(op_tax, cpu, _bus, _opr, {
    cpu.state.x = cpu.state.acc;
    check_zero(cpu, cpu.state.x);
    check_negative(cpu, cpu.state.x);
    0
});
op_fn!(op_txa, cpu, _bus, _opr, {
    cpu.state.acc = cpu.state.x;
    check_zero(cpu, cpu.state.acc);
    check_negative(cpu, cpu.state.acc);
    0
});
op_fn!(op_tay, cpu, _bus, _opr, {
    cpu.state.y = cpu.state.acc;
    check_zero(cpu, cpu.state.y);
    check_negative(cpu, cpu.state.y);
    0
});
op_fn!(op_tya, cpu, _bus, _opr, {
    cpu.state.acc = cpu.state.y;
    check_zero(cpu, cpu.state.acc);
    check_negative(cpu, cpu.state.acc);
    0
});
op_fn!(op_inx, cpu, _bus, _opr, {
    cpu.state.x = cpu.state.x.wrapping_add(1);
    check_zero(cpu, cpu.state.x);
    check_negative(cpu, cpu.state.x);
    0
});
op_fn!(op_dex, cpu, _bus, _opr, {
    cpu.state.x = cpu.state.x.wrapping_sub(1);
    check_zero(cpu, cpu.state.x);
    check_negative(cpu, cpu.state.x);
    0
});
op_fn!(op_iny, cpu, _bus, _opr, {
    cpu.state.y = cpu.state.y.wrapping_add(1);
    check_zero(cpu, cpu.state.y);
    check_negative(cpu, cpu.state.y);
    0
});
op_fn!(op_dey, cpu, _bus, _opr, {
    cpu.state.y = cpu.state.y.wrapping_sub(1);
    check_zero(cpu, cpu.state.y);
    check_negative(cpu, cpu.state.y);
    0
});
//endregion

//region Store instructions
op_fn!(op_sta, cpu, bus, opr, {
    operand_write(cpu, bus, opr, cpu.state.acc);
    0
});
op_fn!(op_stx, cpu, bus, opr, {
    operand_write(cpu, bus, opr, cpu.state.x);
    0
});
op_fn!(op_sty, cpu, bus, opr, {
    operand_write(cpu, bus, opr, cpu.state.y);
    0
});
//endregion

//region Stack instructions
op_fn!(op_txs, cpu, _bus, _opr, {
    // The only transfer that leaves the flags alone.
    cpu.state.stack = cpu.state.x;
    0
});
op_fn!(op_tsx, cpu, _bus, _opr, {
    cpu.state.x = cpu.state.stack;
    check_zero(cpu, cpu.state.x);
    check_negative(cpu, cpu.state.x);
    0
});
op_fn!(op_pha, cpu, bus, _opr, {
    push_stack(cpu, bus, cpu.state.acc);
    0
});
op_fn!(op_pla, cpu, bus, _opr, {
    cpu.state.acc = pop_stack(cpu, bus);
    check_zero(cpu, cpu.state.acc);
    check_negative(cpu, cpu.state.acc);
    0
});
op_fn!(op_php, cpu, bus, _opr, {
    push_stack(cpu, bus, cpu.state.status.bits() | 0x30);
    0
});
op_fn!(op_plp, cpu, bus, _opr, {
    cpu.state.status = Status::from_bits_truncate((pop_stack(cpu, bus) & 0xEF) | 0x20);
    0
});
//endregion
