//! Module for memory devices backing the bus in hosts and tests.

use super::bus::Bus;
use crate::devices::cpu::structs::RESET_VECTOR;

/// A flat 64 KiB memory covering the whole address space.
///
/// The simplest possible bus: no mirroring, no mapped I/O. Hosts that need
/// a real memory map implement [`Bus`] themselves; the core never assumes
/// this device.
pub struct Ram {
    buf: Vec<u8>,
}

impl Ram {
    pub fn new() -> Ram {
        Ram {
            buf: vec![0u8; 0x1_0000],
        }
    }

    /// Copy `bytes` into memory starting at `addr`.
    pub fn load(&mut self, addr: u16, bytes: &[u8]) {
        let start = addr as usize;
        self.buf[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Point the reset vector at `addr`.
    pub fn set_reset_vector(&mut self, addr: u16) {
        let [lo, hi] = addr.to_le_bytes();
        self.buf[RESET_VECTOR as usize] = lo;
        self.buf[RESET_VECTOR as usize + 1] = hi;
    }

    /// Build a memory image with `program` at `origin` and the reset
    /// vector already pointing there.
    pub fn with_program(origin: u16, program: &[u8]) -> Ram {
        let mut ram = Ram::new();
        ram.load(origin, program);
        ram.set_reset_vector(origin);
        ram
    }
}

impl Default for Ram {
    fn default() -> Self {
        Ram::new()
    }
}

impl Bus for Ram {
    fn read(&mut self, addr: u16) -> u8 {
        self.buf[addr as usize]
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        Some(self.buf[addr as usize])
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.buf[addr as usize] = data;
    }
}
