//! Addressing-mode resolvers.
//!
//! Resolvers never move the program counter. They read the operand bytes at
//! `PC+1`/`PC+2` and the handler advances PC afterwards by the instruction length.

use super::{Cpu6502, Memory6502};

/// How an instruction turns its operand bytes into a value or a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// No operand.
    Implied,
    /// The accumulator itself (ASL A, ROR A, ...).
    Accumulator,
    /// `#$nn`
    Immediate,
    /// `$nn`
    ZeroPage,
    /// `$nn,X`, wraps inside page zero.
    ZeroPageX,
    /// `$nn,Y`, wraps inside page zero.
    ZeroPageY,
    /// `$nnnn`
    Absolute,
    /// `$nnnn,X`
    AbsoluteX,
    /// `$nnnn,Y`
    AbsoluteY,
    /// `($nn,X)`
    IndexedIndirect,
    /// `($nn),Y`
    IndirectIndexed,
    /// Signed branch offset.
    Relative,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode.
    pub const fn operand_bytes(self) -> u8 {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndexedIndirect
            | AddressingMode::IndirectIndexed
            | AddressingMode::Relative => 1,
            AddressingMode::Absolute | AddressingMode::AbsoluteX | AddressingMode::AbsoluteY => 2,
        }
    }
}

/// A writable operand: either the accumulator or a byte on the bus.
///
/// Read-modify-write instructions resolve a `Location` once and then
/// [`Cpu6502::load`] / [`Cpu6502::store`] through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Accumulator,
    Address(u16),
}

impl<M: Memory6502> Cpu6502<M> {
    #[inline]
    fn operand_u8(&self) -> u8 {
        self.memory.read(self.regs.pc.wrapping_add(1))
    }

    #[inline]
    fn operand_u16(&self) -> u16 {
        self.memory.read_word(self.regs.pc.wrapping_add(1))
    }

    /// Read a pointer stored in page zero; the high byte of a pointer at $FF comes from $00.
    #[inline]
    fn zero_page_pointer(&self, zp: u8) -> u16 {
        let lo = self.memory.read(zp as u16) as u16;
        let hi = self.memory.read(zp.wrapping_add(1) as u16) as u16;
        (hi << 8) | lo
    }

    /// Resolve the operand of the current instruction to a location.
    ///
    /// Immediate and relative operands live in the instruction stream at `PC+1`.
    pub fn location(&self, mode: AddressingMode) -> Location {
        let r = &self.regs;
        match mode {
            AddressingMode::Accumulator => Location::Accumulator,
            AddressingMode::Immediate | AddressingMode::Relative => {
                Location::Address(r.pc.wrapping_add(1))
            }
            AddressingMode::ZeroPage => Location::Address(self.operand_u8() as u16),
            AddressingMode::ZeroPageX => {
                Location::Address(self.operand_u8().wrapping_add(r.x) as u16)
            }
            AddressingMode::ZeroPageY => {
                Location::Address(self.operand_u8().wrapping_add(r.y) as u16)
            }
            AddressingMode::Absolute => Location::Address(self.operand_u16()),
            AddressingMode::AbsoluteX => {
                Location::Address(self.operand_u16().wrapping_add(r.x as u16))
            }
            AddressingMode::AbsoluteY => {
                Location::Address(self.operand_u16().wrapping_add(r.y as u16))
            }
            AddressingMode::IndexedIndirect => {
                let zp = self.operand_u8().wrapping_add(r.x);
                Location::Address(self.zero_page_pointer(zp))
            }
            AddressingMode::IndirectIndexed => {
                let base = self.zero_page_pointer(self.operand_u8());
                Location::Address(base.wrapping_add(r.y as u16))
            }
            AddressingMode::Implied => {
                unreachable!("implied addressing has no operand location")
            }
        }
    }

    /// Bus address of the operand. Only meaningful for memory-operand modes.
    pub(crate) fn effective_address(&self, mode: AddressingMode) -> u16 {
        match self.location(mode) {
            Location::Address(addr) => addr,
            Location::Accumulator => unreachable!("accumulator operand has no bus address"),
        }
    }

    /// Resolve and fetch an 8-bit operand value.
    #[inline]
    pub fn operand(&self, mode: AddressingMode) -> u8 {
        self.load(self.location(mode))
    }

    #[inline]
    pub fn load(&self, loc: Location) -> u8 {
        match loc {
            Location::Accumulator => self.regs.a,
            Location::Address(addr) => self.memory.read(addr),
        }
    }

    #[inline]
    pub fn store(&mut self, loc: Location, value: u8) {
        match loc {
            Location::Accumulator => self.regs.a = value,
            Location::Address(addr) => self.memory.write(addr, value),
        }
    }

    /// Target of a taken relative branch: `PC + 2 + sign_extend(offset)`.
    #[inline]
    pub fn branch_target(&self) -> u16 {
        let offset = self.operand_u8() as i8;
        self.regs
            .pc
            .wrapping_add(2)
            .wrapping_add(offset as i16 as u16)
    }

    /// True when an indexed access crossed a page boundary relative to its base.
    pub(crate) fn crosses_page(&self, mode: AddressingMode) -> bool {
        let r = &self.regs;
        let (base, index) = match mode {
            AddressingMode::AbsoluteX => (self.operand_u16(), r.x),
            AddressingMode::AbsoluteY => (self.operand_u16(), r.y),
            AddressingMode::IndirectIndexed => (self.zero_page_pointer(self.operand_u8()), r.y),
            _ => return false,
        };
        (base & 0xFF00) != (base.wrapping_add(index as u16) & 0xFF00)
    }
}
