//! Shared harness: a CPU wired to flat RAM with the reset vector pointing
//! at the program under test.

use sixfive_core::devices::cpu::Cpu6502;
use sixfive_core::devices::mem::Ram;

pub const ORIGIN: u16 = 0x8000;

/// Build a board with `program` at [`ORIGIN`], reset already serviced so
/// PC sits on the first instruction.
pub fn power_on(program: &[u8]) -> (Cpu6502, Ram) {
    power_on_at(ORIGIN, program)
}

pub fn power_on_at(origin: u16, program: &[u8]) -> (Cpu6502, Ram) {
    let mut ram = Ram::with_program(origin, program);
    let mut cpu = Cpu6502::new();
    cpu.reset();
    run_one(&mut cpu, &mut ram);
    (cpu, ram)
}

/// Clock through one instruction (or interrupt service) and return the
/// ticks it consumed.
pub fn run_one(cpu: &mut Cpu6502, ram: &mut Ram) -> u32 {
    let mut ticks = 1;
    cpu.clock(ram);
    while cpu.cycles_remaining() > 0 {
        cpu.clock(ram);
        ticks += 1;
    }
    ticks
}

/// Run `count` whole instructions.
pub fn run(cpu: &mut Cpu6502, ram: &mut Ram, count: usize) {
    for _ in 0..count {
        run_one(cpu, ram);
    }
}
