//! MOS 6502 CPU core implementation
//!
//! This module provides a reusable, table-driven 6502 engine. A system plugs its
//! address decoding in by implementing [`Memory6502`]; the engine owns the
//! registers, dispatches through the fixed [`opcodes::OPCODES`] table and runs one
//! instruction per [`Cpu6502::step`].

pub mod addressing;
pub mod disasm;
mod error;
mod instructions;
pub mod opcodes;
pub mod registers;

#[cfg(test)]
mod tests;

pub use addressing::{AddressingMode, Location};
pub use disasm::{disassemble, trace_line};
pub use error::CpuError;
pub use opcodes::{decode, Instruction, Opcode, OPCODES};
pub use registers::{Flag, Registers, StatusFlags};

use crate::logging::{log, LogCategory, LogLevel};

/// Non-maskable interrupt vector.
pub const NMI_VECTOR: u16 = 0xFFFA;
/// Reset vector.
pub const RESET_VECTOR: u16 = 0xFFFC;
/// IRQ/BRK vector.
pub const IRQ_VECTOR: u16 = 0xFFFE;
/// Base of the hardware stack page.
pub const STACK_BASE: u16 = 0x0100;

/// Memory interface trait for the 6502 CPU
///
/// Systems using the 6502 must implement this trait to provide memory access.
pub trait Memory6502 {
    /// Read a byte from memory at the given address
    fn read(&self, addr: u16) -> u8;

    /// Write a byte to memory at the given address
    fn write(&mut self, addr: u16, val: u8);

    /// Little-endian word at `addr`/`addr+1`.
    fn read_word(&self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    fn write_word(&mut self, addr: u16, val: u16) {
        self.write(addr, (val & 0xFF) as u8);
        self.write(addr.wrapping_add(1), (val >> 8) as u8);
    }

    /// Debugger read. Defaults to the CPU-visible view.
    fn peek(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    /// Raw store used by program loading and debuggers.
    ///
    /// Banked systems override this to land in backing RAM regardless of overlays.
    fn poke(&mut self, addr: u16, val: u8) {
        self.write(addr, val);
    }
}

/// MOS 6502 CPU state and execution engine
///
/// This is a generic, reusable 6502 CPU implementation that works with any
/// system through the `Memory6502` trait.
#[derive(Debug)]
pub struct Cpu6502<M: Memory6502> {
    /// Register file and status flags
    pub regs: Registers,
    /// Total cycles executed
    pub cycles: u64,
    /// Memory interface
    pub memory: M,
}

impl<M: Memory6502> Cpu6502<M> {
    /// Create a new 6502 CPU with the given memory interface.
    ///
    /// PC is taken from the reset vector, as on power-up.
    pub fn new(memory: M) -> Self {
        let mut cpu = Self {
            regs: Registers::new(),
            cycles: 0,
            memory,
        };
        cpu.regs.pc = cpu.memory.read_word(RESET_VECTOR);
        cpu
    }

    /// Reset the CPU to initial state (preserves memory)
    pub fn reset(&mut self) {
        self.regs = Registers::new();
        self.cycles = 0;
        self.regs.pc = self.memory.read_word(RESET_VECTOR);
    }

    /// Replace the memory interface while preserving CPU state
    pub fn with_memory<N: Memory6502>(self, new_memory: N) -> Cpu6502<N> {
        Cpu6502 {
            regs: self.regs,
            cycles: self.cycles,
            memory: new_memory,
        }
    }

    #[inline]
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u16) {
        self.regs.pc = pc;
    }

    /// Raw read for debuggers; never touches flags.
    pub fn peek(&self, addr: u16) -> u8 {
        self.memory.peek(addr)
    }

    /// Raw store for debuggers; never touches flags.
    pub fn poke(&mut self, addr: u16, val: u8) {
        self.memory.poke(addr, val);
    }

    /// Store a run of bytes from `addr`, wrapping at the top of the address space.
    pub fn poke_bytes(&mut self, addr: u16, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            self.memory.poke(addr.wrapping_add(i as u16), *b);
        }
    }

    #[inline]
    pub(crate) fn push_u8(&mut self, v: u8) {
        let addr = STACK_BASE | self.regs.sp as u16;
        self.memory.write(addr, v);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    #[inline]
    pub(crate) fn pop_u8(&mut self) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let addr = STACK_BASE | self.regs.sp as u16;
        self.memory.read(addr)
    }

    #[inline]
    pub(crate) fn push_u16(&mut self, v: u16) {
        self.push_u8((v >> 8) as u8);
        self.push_u8((v & 0xFF) as u8);
    }

    #[inline]
    pub(crate) fn pop_u16(&mut self) -> u16 {
        let lo = self.pop_u8() as u16;
        let hi = self.pop_u8() as u16;
        (hi << 8) | lo
    }

    /// Trigger a Non-Maskable Interrupt (NMI)
    pub fn nmi(&mut self) {
        log(LogCategory::Interrupts, LogLevel::Debug, || {
            format!("CPU: NMI at PC={:04X}", self.regs.pc)
        });
        self.interrupt(NMI_VECTOR);
    }

    /// Trigger a maskable IRQ. Ignored while the I flag is set.
    pub fn irq(&mut self) -> bool {
        if self.regs.flag(Flag::InterruptDisable) {
            return false;
        }
        log(LogCategory::Interrupts, LogLevel::Debug, || {
            format!("CPU: IRQ at PC={:04X}", self.regs.pc)
        });
        self.interrupt(IRQ_VECTOR);
        true
    }

    fn interrupt(&mut self, vector: u16) {
        self.push_u16(self.regs.pc);
        let pushed = self.regs.status.pushed_by_interrupt();
        self.push_u8(pushed);
        self.regs.set_flag(Flag::InterruptDisable, true);
        self.regs.pc = self.memory.read_word(vector);
        self.cycles = self.cycles.wrapping_add(7);
    }

    /// Execute one instruction and return cycles used.
    ///
    /// On an illegal opcode nothing is executed and PC still points at the
    /// offending byte.
    pub fn step(&mut self) -> Result<u32, CpuError> {
        let pc = self.regs.pc;
        let code = self.memory.read(pc);
        let Some(op) = opcodes::decode(code) else {
            log(LogCategory::CPU, LogLevel::Error, || {
                format!(
                    "CPU: illegal opcode {:02X} at PC={:04X} a={:02X} x={:02X} y={:02X} sp={:02X} p={:02X}",
                    code,
                    pc,
                    self.regs.a,
                    self.regs.x,
                    self.regs.y,
                    self.regs.sp,
                    self.regs.status.bits()
                )
            });
            return Err(CpuError::IllegalOpcode { opcode: code, pc });
        };
        log(LogCategory::CPU, LogLevel::Trace, || {
            disasm::trace_line(&self.memory, pc)
        });
        let used = self.execute(op);
        self.cycles = self.cycles.wrapping_add(used as u64);
        Ok(used)
    }

    /// Set PC to `start` and execute up to `max_steps` instructions.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self, start: u16, max_steps: u64) -> Result<u64, CpuError> {
        self.regs.pc = start;
        let mut steps = 0;
        while steps < max_steps {
            self.step()?;
            steps += 1;
        }
        Ok(steps)
    }

    /// Set PC to `start` and step until `stop` returns true.
    ///
    /// `stop` is consulted before every instruction.
    pub fn run_until<F>(&mut self, start: u16, mut stop: F) -> Result<u64, CpuError>
    where
        F: FnMut(&Self) -> bool,
    {
        self.regs.pc = start;
        let mut steps = 0;
        while !stop(self) {
            self.step()?;
            steps += 1;
        }
        Ok(steps)
    }

    /// Copy a `[lo, hi, payload...]` program image into memory.
    ///
    /// Returns the load address. A payload that would run past $FFFF is
    /// rejected before anything is written.
    pub fn load_program(&mut self, image: &[u8]) -> Result<u16, CpuError> {
        if image.len() < 2 {
            return Err(CpuError::ProgramTooShort { len: image.len() });
        }
        let start = u16::from_le_bytes([image[0], image[1]]);
        let payload = &image[2..];
        if start as usize + payload.len() > 0x10000 {
            return Err(CpuError::ProgramOverflow {
                start,
                len: payload.len(),
            });
        }
        self.poke_bytes(start, payload);
        Ok(start)
    }
}

/// Simple array-based memory implementation for testing
#[derive(Debug)]
pub struct ArrayMemory {
    pub data: [u8; 0x10000],
}

impl ArrayMemory {
    pub fn new() -> Self {
        Self { data: [0; 0x10000] }
    }

    /// Copy `data` to `offset` and point the reset vector at it.
    pub fn load_at(&mut self, offset: u16, data: &[u8]) {
        let off = offset as usize;
        self.data[off..off + data.len()].copy_from_slice(data);
        let [lo, hi] = offset.to_le_bytes();
        self.data[RESET_VECTOR as usize] = lo;
        self.data[RESET_VECTOR as usize + 1] = hi;
    }
}

impl Default for ArrayMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory6502 for ArrayMemory {
    fn read(&self, addr: u16) -> u8 {
        self.data[addr as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.data[addr as usize] = val;
    }
}
