//! Register-file collaborators behind the I/O window.
//!
//! The bus only knows that the video and sound chips expose a small register file
//! that is mirrored across their address windows. Anything that wants to model the
//! chips properly plugs in through [`RegisterDevice`]; the defaults are plain latches.

use std::fmt;

/// Video chip register file size; mirrored through $D000-$D3FF.
pub const VIDEO_REGISTERS: usize = 64;
/// Sound chip register file size; mirrored through $D400-$D7FF.
pub const SOUND_REGISTERS: usize = 32;

/// A chip seen by the CPU as a bank of byte registers.
pub trait RegisterDevice: fmt::Debug {
    fn read_register(&self, index: u8) -> u8;
    fn write_register(&mut self, index: u8, value: u8);

    /// Return to power-on register contents.
    fn reset(&mut self) {}
}

/// Latch model of the VIC-II registers: reads return the last value written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VicRegisters {
    regs: [u8; VIDEO_REGISTERS],
}

impl VicRegisters {
    pub fn new() -> Self {
        Self {
            regs: [0; VIDEO_REGISTERS],
        }
    }

    pub fn registers(&self) -> &[u8] {
        &self.regs
    }
}

impl Default for VicRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterDevice for VicRegisters {
    fn read_register(&self, index: u8) -> u8 {
        self.regs[index as usize % VIDEO_REGISTERS]
    }

    fn write_register(&mut self, index: u8, value: u8) {
        self.regs[index as usize % VIDEO_REGISTERS] = value;
    }

    fn reset(&mut self) {
        self.regs = [0; VIDEO_REGISTERS];
    }
}

/// Latch model of the SID registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidRegisters {
    regs: [u8; SOUND_REGISTERS],
}

impl SidRegisters {
    pub fn new() -> Self {
        Self {
            regs: [0; SOUND_REGISTERS],
        }
    }

    pub fn registers(&self) -> &[u8] {
        &self.regs
    }
}

impl Default for SidRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterDevice for SidRegisters {
    fn read_register(&self, index: u8) -> u8 {
        self.regs[index as usize % SOUND_REGISTERS]
    }

    fn write_register(&mut self, index: u8, value: u8) {
        self.regs[index as usize % SOUND_REGISTERS] = value;
    }

    fn reset(&mut self) {
        self.regs = [0; SOUND_REGISTERS];
    }
}
