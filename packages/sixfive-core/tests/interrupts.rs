//! Reset, NMI, IRQ and BRK behavior: latching, priority, masking, stack
//! traffic and the B-flag marking on pushed status bytes.

extern crate sixfive_core;

#[allow(dead_code)]
mod util;

use sixfive_core::devices::bus::Bus;
use sixfive_core::devices::cpu::{Status, IRQ_VECTOR, NMI_VECTOR};

use util::{power_on, run_one, ORIGIN};

const HANDLER: u16 = 0x9000;

fn point_vector(ram: &mut sixfive_core::devices::mem::Ram, vector: u16, addr: u16) {
    let [lo, hi] = addr.to_le_bytes();
    ram.write(vector, lo);
    ram.write(vector.wrapping_add(1), hi);
}

#[test]
fn reset_loads_the_vector_and_seeds_sp_and_p() {
    let (cpu, _ram) = power_on(&[0xEA]);
    assert_eq!(cpu.pc(), ORIGIN);
    assert_eq!(cpu.state.stack, 0xFD);
    assert_eq!(cpu.flags().bits(), 0x34);
    assert!(cpu.flags().contains(Status::IRQ_DISABLE));
}

#[test]
fn reset_takes_seven_ticks_and_waits_for_the_boundary() {
    let mut ram = sixfive_core::devices::mem::Ram::with_program(ORIGIN, &[0xEA]);
    let mut cpu = sixfive_core::devices::cpu::Cpu6502::new();
    cpu.reset();
    // Nothing happens until the CPU is clocked.
    assert_eq!(cpu.pc(), 0x0000);
    let ticks = run_one(&mut cpu, &mut ram);
    assert_eq!(ticks, 7);
    assert_eq!(cpu.pc(), ORIGIN);
}

#[test]
fn masked_irq_stays_latched_until_cli() {
    // NOP; CLI; NOP. I is set coming out of reset.
    let (mut cpu, mut ram) = power_on(&[0xEA, 0x58, 0xEA]);
    point_vector(&mut ram, IRQ_VECTOR, HANDLER);
    cpu.irq();

    // The NOP runs with the request pending but masked.
    run_one(&mut cpu, &mut ram);
    assert_eq!(cpu.pc(), ORIGIN + 1);
    assert!(cpu.snapshot().irq_pending);

    // CLI unmasks; the request is serviced at the next boundary.
    run_one(&mut cpu, &mut ram);
    let ticks = run_one(&mut cpu, &mut ram);
    assert_eq!(ticks, 7);
    assert_eq!(cpu.pc(), HANDLER);
    assert!(!cpu.snapshot().irq_pending);
    assert!(cpu.flags().contains(Status::IRQ_DISABLE));
}

#[test]
fn irq_pushes_pc_and_status_with_b_clear() {
    let (mut cpu, mut ram) = power_on(&[0x58, 0xEA]); // CLI; NOP
    point_vector(&mut ram, IRQ_VECTOR, HANDLER);
    run_one(&mut cpu, &mut ram);
    cpu.irq();
    run_one(&mut cpu, &mut ram);

    assert_eq!(cpu.pc(), HANDLER);
    // Return address ORIGIN+1, then P, pushed downward from $01FD.
    assert_eq!(ram.peek(0x01FD), Some(0x80));
    assert_eq!(ram.peek(0x01FC), Some(0x01));
    let pushed = ram.peek(0x01FB).unwrap();
    assert_eq!(pushed & Status::BREAK.bits(), 0);
    assert_eq!(pushed & Status::UNUSED.bits(), Status::UNUSED.bits());
    assert_eq!(cpu.state.stack, 0xFA);
}

#[test]
fn nmi_is_latched_while_an_instruction_is_in_flight() {
    let (mut cpu, mut ram) = power_on(&[0xA9, 0x01, 0xEA]); // LDA #$01; NOP
    point_vector(&mut ram, NMI_VECTOR, HANDLER);

    // Raise NMI mid-instruction: the first tick dispatches LDA.
    cpu.clock(&mut ram);
    cpu.nmi();
    cpu.clock(&mut ram);
    assert_eq!(cpu.state.acc, 0x01);

    // Serviced at the boundary, not before.
    let ticks = run_one(&mut cpu, &mut ram);
    assert_eq!(ticks, 7);
    assert_eq!(cpu.pc(), HANDLER);
    assert!(!cpu.snapshot().nmi_pending);
}

#[test]
fn nmi_ignores_the_interrupt_mask() {
    let (mut cpu, mut ram) = power_on(&[0xEA]);
    point_vector(&mut ram, NMI_VECTOR, HANDLER);
    assert!(cpu.flags().contains(Status::IRQ_DISABLE));
    cpu.nmi();
    run_one(&mut cpu, &mut ram);
    assert_eq!(cpu.pc(), HANDLER);
}

#[test]
fn nmi_wins_over_a_simultaneous_irq() {
    let (mut cpu, mut ram) = power_on(&[0x58, 0xEA]); // CLI; NOP
    point_vector(&mut ram, NMI_VECTOR, HANDLER);
    point_vector(&mut ram, IRQ_VECTOR, 0xA000);
    run_one(&mut cpu, &mut ram);
    cpu.nmi();
    cpu.irq();
    run_one(&mut cpu, &mut ram);
    assert_eq!(cpu.pc(), HANDLER);
    // The IRQ stays pending; the service sequence set I, so it waits.
    assert!(cpu.snapshot().irq_pending);
}

#[test]
fn reset_wins_over_everything() {
    let (mut cpu, mut ram) = power_on(&[0xEA]);
    point_vector(&mut ram, NMI_VECTOR, HANDLER);
    cpu.nmi();
    cpu.reset();
    run_one(&mut cpu, &mut ram);
    assert_eq!(cpu.pc(), ORIGIN);
    // The NMI latch survives the reset service and fires next.
    assert!(cpu.snapshot().nmi_pending);
}

#[test]
fn brk_and_rti_round_trip() {
    let (mut cpu, mut ram) = power_on(&[0x00, 0xFF, 0xEA]); // BRK + signature
    point_vector(&mut ram, IRQ_VECTOR, HANDLER);
    ram.write(HANDLER, 0x40); // RTI

    let ticks = run_one(&mut cpu, &mut ram);
    assert_eq!(ticks, 7);
    assert_eq!(cpu.pc(), HANDLER);
    assert!(cpu.flags().contains(Status::IRQ_DISABLE));
    // Software interrupt: the pushed status byte carries B and bit 5.
    let pushed = ram.peek(0x01FB).unwrap();
    assert_eq!(pushed & 0x30, 0x30);

    run_one(&mut cpu, &mut ram);
    // The return address skipped the signature byte.
    assert_eq!(cpu.pc(), ORIGIN + 2);
    assert!(!cpu.flags().contains(Status::BREAK));
    assert!(cpu.flags().contains(Status::UNUSED));
    assert_eq!(cpu.state.stack, 0xFD);
}

#[test]
fn snapshot_restore_resumes_identically() {
    let program = &[0xA9, 0x05, 0x69, 0x03, 0x85, 0x40, 0xEA]; // LDA; ADC; STA; NOP
    let (mut cpu, mut ram) = power_on(program);
    run_one(&mut cpu, &mut ram);
    cpu.irq();
    let snap = cpu.snapshot();

    // Run ahead, then rewind and replay.
    util::run(&mut cpu, &mut ram, 2);
    let after = cpu.registers();
    cpu.restore(&snap);
    assert_eq!(cpu.snapshot(), snap);
    util::run(&mut cpu, &mut ram, 2);
    assert_eq!(cpu.registers(), after);
}
