//! 6502 register file and packed status byte.

use serde::{Deserialize, Serialize};

/// Named bits of the packed status register (NV-BDIZC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Flag {
    Carry = 0x01,
    Zero = 0x02,
    InterruptDisable = 0x04,
    Decimal = 0x08,
    Break = 0x10,
    Overflow = 0x40,
    Negative = 0x80,
}

impl Flag {
    #[inline]
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

/// Bit 5 of the status byte. Not a flag; always reads back as 1.
pub const STATUS_UNUSED: u8 = 0x20;

/// Packed status register.
///
/// The hardware pushes and pulls this byte as a whole (PHP/PLP/BRK/RTI), so it is
/// stored packed. All per-flag access goes through [`StatusFlags::get`] and
/// [`StatusFlags::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusFlags(u8);

impl StatusFlags {
    /// Status after power-on/reset: interrupts disabled, bit 5 set.
    pub const fn power_on() -> Self {
        Self(Flag::InterruptDisable.mask() | STATUS_UNUSED)
    }

    /// Build from a raw byte. Bit 5 is forced on.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits | STATUS_UNUSED)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn get(self, flag: Flag) -> bool {
        self.0 & flag.mask() != 0
    }

    #[inline]
    pub fn set(&mut self, flag: Flag, on: bool) {
        if on {
            self.0 |= flag.mask();
        } else {
            self.0 &= !flag.mask();
        }
    }

    /// Negative = bit 7 of `value`, Zero = `value == 0`.
    #[inline]
    pub fn set_nz(&mut self, value: u8) {
        self.set(Flag::Zero, value == 0);
        self.set(Flag::Negative, value & 0x80 != 0);
    }

    /// Replace every flag at once (PLP/RTI). Bit 5 stays set.
    #[inline]
    pub fn replace(&mut self, bits: u8) {
        self.0 = bits | STATUS_UNUSED;
    }

    /// The byte pushed by PHP/BRK: B and bit 5 set.
    #[inline]
    pub const fn pushed_by_instruction(self) -> u8 {
        self.0 | Flag::Break.mask() | STATUS_UNUSED
    }

    /// The byte pushed by a hardware IRQ/NMI: B clear, bit 5 set.
    #[inline]
    pub const fn pushed_by_interrupt(self) -> u8 {
        (self.0 & !Flag::Break.mask()) | STATUS_UNUSED
    }
}

impl Default for StatusFlags {
    fn default() -> Self {
        Self::power_on()
    }
}

/// Programmer-visible registers of the 6502.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Program counter
    pub pc: u16,
    /// Accumulator
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Stack pointer (points into 0x0100..=0x01FF)
    pub sp: u8,
    /// Status register (NV-BDIZC)
    pub status: StatusFlags,
}

impl Registers {
    pub const fn new() -> Self {
        Self {
            pc: 0,
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            status: StatusFlags::power_on(),
        }
    }

    #[inline]
    pub fn flag(&self, flag: Flag) -> bool {
        self.status.get(flag)
    }

    #[inline]
    pub fn set_flag(&mut self, flag: Flag, on: bool) {
        self.status.set(flag, on);
    }

    /// Set Negative/Zero from the last result.
    #[inline]
    pub fn set_nz(&mut self, value: u8) {
        self.status.set_nz(value);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
