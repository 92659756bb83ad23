//! Machine state captured for diagnostics.
use std::fmt;

use crate::state::{Address, MEM_SIZE, NUM_REGISTERS};

const DUMP_WIDTH: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub pc: Address,
    pub index: Address,
    pub registers: [u8; NUM_REGISTERS],
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: Vec<Address>,
    pub memory: Box<[u8; MEM_SIZE]>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "pc={:#05X} i={:#05X} dt={} st={}",
            self.pc, self.index, self.delay_timer, self.sound_timer
        )?;
        for (reg, value) in self.registers.iter().enumerate() {
            write!(f, "v{reg:X}={value:02X} ")?;
        }
        writeln!(f)?;
        writeln!(f, "stack={:03X?}", self.stack)?;

        for (line, chunk) in self.memory.chunks(DUMP_WIDTH).enumerate() {
            // Long runs of zeroes are noise in a 4 KiB dump.
            if chunk.iter().all(|&b| b == 0) {
                continue;
            }
            write!(f, "{:03X}:", line * DUMP_WIDTH)?;
            for byte in chunk {
                write!(f, " {byte:02X}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
