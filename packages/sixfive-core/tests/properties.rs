//! Arithmetic and stack laws, checked across the whole input space where
//! that is cheap and by property search where it is not.

extern crate sixfive_core;

#[allow(dead_code)]
mod util;

use proptest::prelude::*;

use sixfive_core::devices::bus::Bus;
use sixfive_core::devices::cpu::{Cpu6502, Status};
use sixfive_core::devices::mem::Ram;

use util::{power_on, run_one, ORIGIN};

/// ADC then SBC of the same operand, entered with the carry inverted,
/// undoes itself: A + M + C and then A' + !M + !C add up to A + 0x100.
#[test]
fn adc_then_sbc_with_inverted_carry_restores_the_accumulator() {
    let mut ram = Ram::with_program(ORIGIN, &[0x69, 0x00, 0xE9, 0x00]);
    let mut cpu = Cpu6502::new();
    cpu.reset();
    run_one(&mut cpu, &mut ram);

    for a in 0..=255u8 {
        for m in 0..=255u8 {
            for carry in [false, true] {
                ram.write(ORIGIN + 1, m);
                ram.write(ORIGIN + 3, m);
                cpu.state.pc = ORIGIN;
                cpu.state.acc = a;
                cpu.state.status.set(Status::CARRY, carry);
                run_one(&mut cpu, &mut ram);

                let intermediate = cpu.state.acc;
                cpu.state.status.set(Status::CARRY, !carry);
                run_one(&mut cpu, &mut ram);

                assert_eq!(cpu.state.acc, a, "a={} m={} carry={}", a, m, carry);
                // V reflects the signed truth of the final subtraction.
                let signed =
                    i16::from(intermediate as i8) - i16::from(m as i8) - i16::from(carry);
                let expect_v = !(-128..=127).contains(&signed);
                assert_eq!(
                    cpu.flags().contains(Status::OVERFLOW),
                    expect_v,
                    "a={} m={} carry={}",
                    a,
                    m,
                    carry
                );
            }
        }
    }
}

/// CMP/CPX/CPY: carry means the register is at least the operand, zero
/// means equality, and N follows bit 7 of the difference.
#[test]
fn compare_tracks_ordering_for_every_register() {
    // (load-immediate opcode, compare-immediate opcode)
    let variants: [(u8, u8); 3] = [(0xA9, 0xC9), (0xA2, 0xE0), (0xA0, 0xC0)];
    for (load, cmp) in variants {
        let mut ram = Ram::with_program(ORIGIN, &[load, 0x00, cmp, 0x00]);
        let mut cpu = Cpu6502::new();
        cpu.reset();
        run_one(&mut cpu, &mut ram);

        for reg in 0..=255u8 {
            for m in 0..=255u8 {
                ram.write(ORIGIN + 1, reg);
                ram.write(ORIGIN + 3, m);
                cpu.state.pc = ORIGIN;
                run_one(&mut cpu, &mut ram);
                run_one(&mut cpu, &mut ram);

                assert_eq!(cpu.flags().contains(Status::CARRY), reg >= m);
                assert_eq!(cpu.flags().contains(Status::ZERO), reg == m);
                let diff = reg.wrapping_sub(m);
                assert_eq!(cpu.flags().contains(Status::NEGATIVE), diff & 0x80 != 0);
            }
        }
    }
}

proptest! {
    #[test]
    fn binary_adc_matches_the_wide_sum(a in any::<u8>(), m in any::<u8>(), carry in any::<bool>()) {
        let (mut cpu, mut ram) = power_on(&[0x69, m]);
        cpu.state.acc = a;
        cpu.state.status.set(Status::CARRY, carry);
        run_one(&mut cpu, &mut ram);

        let wide = u16::from(a) + u16::from(m) + u16::from(carry);
        prop_assert_eq!(cpu.state.acc, wide as u8);
        prop_assert_eq!(cpu.flags().contains(Status::CARRY), wide > 0xFF);
        prop_assert_eq!(cpu.flags().contains(Status::ZERO), wide as u8 == 0);
        prop_assert_eq!(cpu.flags().contains(Status::NEGATIVE), wide & 0x80 != 0);
        let signed = i16::from(a as i8) + i16::from(m as i8) + i16::from(carry);
        prop_assert_eq!(
            cpu.flags().contains(Status::OVERFLOW),
            !(-128..=127).contains(&signed)
        );
    }

    #[test]
    fn pha_pla_round_trips_the_accumulator(a in any::<u8>(), filler in any::<u8>()) {
        // LDA #a; PHA; LDA #filler; PLA
        let (mut cpu, mut ram) = power_on(&[0xA9, a, 0x48, 0xA9, filler, 0x68]);
        util::run(&mut cpu, &mut ram, 4);
        prop_assert_eq!(cpu.state.acc, a);
        prop_assert_eq!(cpu.state.stack, 0xFD);
        prop_assert_eq!(cpu.flags().contains(Status::ZERO), a == 0);
        prop_assert_eq!(cpu.flags().contains(Status::NEGATIVE), a & 0x80 != 0);
    }

    #[test]
    fn php_plp_round_trips_the_flags_modulo_b_and_bit5(bits in any::<u8>()) {
        let (mut cpu, mut ram) = power_on(&[0x08, 0x28]); // PHP; PLP
        cpu.state.status = Status::from_bits_truncate(bits);
        util::run(&mut cpu, &mut ram, 2);
        prop_assert_eq!(cpu.flags().bits(), (bits & 0xEF) | 0x20);
    }

    #[test]
    fn pushed_status_always_reads_bit5_high(bits in any::<u8>()) {
        let (mut cpu, mut ram) = power_on(&[0x08]); // PHP
        cpu.state.status = Status::from_bits_truncate(bits);
        run_one(&mut cpu, &mut ram);
        let pushed = ram.peek(0x0100 + u16::from(cpu.state.stack) + 1).unwrap();
        prop_assert_eq!(pushed & 0x20, 0x20);
    }

    #[test]
    fn the_stack_lives_in_page_one(sp in any::<u8>(), a in any::<u8>()) {
        let (mut cpu, mut ram) = power_on(&[0x48]); // PHA
        cpu.state.stack = sp;
        cpu.state.acc = a;
        run_one(&mut cpu, &mut ram);
        prop_assert_eq!(ram.peek(0x0100 + u16::from(sp)), Some(a));
        prop_assert_eq!(cpu.state.stack, sp.wrapping_sub(1));
    }
}
