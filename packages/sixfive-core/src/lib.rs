//! A cycle-accurate execution core for the MOS 6502.
//!
//! The crate models the CPU alone: registers, flags, the stack discipline,
//! all 56 official instructions across their 13 addressing modes, and the
//! RESET/NMI/IRQ dispatch machinery. Everything behind the address bus
//! (RAM, ROM, memory-mapped peripherals) is the host's business and is
//! reached through the [`devices::bus::Bus`] trait.

#[macro_use]
extern crate bitflags;

pub mod devices;
