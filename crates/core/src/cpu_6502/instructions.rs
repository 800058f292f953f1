//! Instruction semantics.
//!
//! Each handler advances PC by its own instruction length, except the control
//! transfers (branches, JMP, JSR, RTS, RTI, BRK) which assign PC themselves.

use super::addressing::AddressingMode;
use super::opcodes::{Instruction, Opcode};
use super::registers::Flag;
use super::{Cpu6502, Memory6502, IRQ_VECTOR};
use crate::logging::{log, LogCategory, LogLevel};

impl<M: Memory6502> Cpu6502<M> {
    /// Execute one decoded instruction and return the cycles it took.
    pub(crate) fn execute(&mut self, op: &Opcode) -> u32 {
        let mut cycles = op.cycles as u32;
        if op.instruction.page_penalty() && self.crosses_page(op.mode) {
            cycles += 1;
        }

        match op.instruction {
            // Loads and stores
            Instruction::Lda => {
                self.regs.a = self.operand(op.mode);
                self.regs.set_nz(self.regs.a);
                self.advance(op);
            }
            Instruction::Ldx => {
                self.regs.x = self.operand(op.mode);
                self.regs.set_nz(self.regs.x);
                self.advance(op);
            }
            Instruction::Ldy => {
                self.regs.y = self.operand(op.mode);
                self.regs.set_nz(self.regs.y);
                self.advance(op);
            }
            Instruction::Sta => {
                let addr = self.effective_address(op.mode);
                self.memory.write(addr, self.regs.a);
                self.advance(op);
            }
            Instruction::Stx => {
                let addr = self.effective_address(op.mode);
                self.memory.write(addr, self.regs.x);
                self.advance(op);
            }
            Instruction::Sty => {
                let addr = self.effective_address(op.mode);
                self.memory.write(addr, self.regs.y);
                self.advance(op);
            }

            // Arithmetic and logic
            Instruction::Adc => {
                let m = self.operand(op.mode);
                self.add_with_carry(m);
                self.advance(op);
            }
            Instruction::Sbc => {
                let m = self.operand(op.mode);
                self.subtract_with_carry(m);
                self.advance(op);
            }
            Instruction::And => {
                self.regs.a &= self.operand(op.mode);
                self.regs.set_nz(self.regs.a);
                self.advance(op);
            }
            Instruction::Ora => {
                self.regs.a |= self.operand(op.mode);
                self.regs.set_nz(self.regs.a);
                self.advance(op);
            }
            Instruction::Eor => {
                self.regs.a ^= self.operand(op.mode);
                self.regs.set_nz(self.regs.a);
                self.advance(op);
            }
            Instruction::Bit => {
                let m = self.operand(op.mode);
                self.regs.set_flag(Flag::Zero, self.regs.a & m == 0);
                self.regs.set_flag(Flag::Negative, m & 0x80 != 0);
                self.regs.set_flag(Flag::Overflow, m & 0x40 != 0);
                self.advance(op);
            }
            Instruction::Cmp => {
                let m = self.operand(op.mode);
                self.compare(self.regs.a, m);
                self.advance(op);
            }
            Instruction::Cpx => {
                let m = self.operand(op.mode);
                self.compare(self.regs.x, m);
                self.advance(op);
            }
            Instruction::Cpy => {
                let m = self.operand(op.mode);
                self.compare(self.regs.y, m);
                self.advance(op);
            }

            // Read-modify-write
            Instruction::Asl => {
                self.read_modify_write(op.mode, |cpu, v| {
                    cpu.regs.set_flag(Flag::Carry, v & 0x80 != 0);
                    v << 1
                });
                self.advance(op);
            }
            Instruction::Lsr => {
                self.read_modify_write(op.mode, |cpu, v| {
                    cpu.regs.set_flag(Flag::Carry, v & 0x01 != 0);
                    v >> 1
                });
                self.advance(op);
            }
            Instruction::Rol => {
                self.read_modify_write(op.mode, |cpu, v| {
                    let carry_in = cpu.regs.flag(Flag::Carry) as u8;
                    cpu.regs.set_flag(Flag::Carry, v & 0x80 != 0);
                    (v << 1) | carry_in
                });
                self.advance(op);
            }
            Instruction::Ror => {
                self.read_modify_write(op.mode, |cpu, v| {
                    let carry_in = if cpu.regs.flag(Flag::Carry) { 0x80 } else { 0 };
                    cpu.regs.set_flag(Flag::Carry, v & 0x01 != 0);
                    (v >> 1) | carry_in
                });
                self.advance(op);
            }
            Instruction::Inc => {
                self.read_modify_write(op.mode, |_, v| v.wrapping_add(1));
                self.advance(op);
            }
            Instruction::Dec => {
                self.read_modify_write(op.mode, |_, v| v.wrapping_sub(1));
                self.advance(op);
            }

            // Register increments and transfers
            Instruction::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.set_nz(self.regs.x);
                self.advance(op);
            }
            Instruction::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.set_nz(self.regs.y);
                self.advance(op);
            }
            Instruction::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.set_nz(self.regs.x);
                self.advance(op);
            }
            Instruction::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.set_nz(self.regs.y);
                self.advance(op);
            }
            Instruction::Tax => {
                self.regs.x = self.regs.a;
                self.regs.set_nz(self.regs.x);
                self.advance(op);
            }
            Instruction::Tay => {
                self.regs.y = self.regs.a;
                self.regs.set_nz(self.regs.y);
                self.advance(op);
            }
            Instruction::Txa => {
                self.regs.a = self.regs.x;
                self.regs.set_nz(self.regs.a);
                self.advance(op);
            }
            Instruction::Tya => {
                self.regs.a = self.regs.y;
                self.regs.set_nz(self.regs.a);
                self.advance(op);
            }
            Instruction::Tsx => {
                self.regs.x = self.regs.sp;
                self.regs.set_nz(self.regs.x);
                self.advance(op);
            }
            Instruction::Txs => {
                // no flags
                self.regs.sp = self.regs.x;
                self.advance(op);
            }

            // Stack
            Instruction::Pha => {
                self.push_u8(self.regs.a);
                self.advance(op);
            }
            Instruction::Pla => {
                self.regs.a = self.pop_u8();
                self.regs.set_nz(self.regs.a);
                self.advance(op);
            }
            Instruction::Php => {
                let pushed = self.regs.status.pushed_by_instruction();
                self.push_u8(pushed);
                self.advance(op);
            }
            Instruction::Plp => {
                let bits = self.pop_u8();
                self.regs.status.replace(bits);
                self.advance(op);
            }

            // Flag operations
            Instruction::Clc => {
                self.regs.set_flag(Flag::Carry, false);
                self.advance(op);
            }
            Instruction::Sec => {
                self.regs.set_flag(Flag::Carry, true);
                self.advance(op);
            }
            Instruction::Cli => {
                self.regs.set_flag(Flag::InterruptDisable, false);
                self.advance(op);
            }
            Instruction::Sei => {
                self.regs.set_flag(Flag::InterruptDisable, true);
                self.advance(op);
            }
            Instruction::Clv => {
                self.regs.set_flag(Flag::Overflow, false);
                self.advance(op);
            }
            Instruction::Cld => {
                self.regs.set_flag(Flag::Decimal, false);
                self.advance(op);
            }
            Instruction::Sed => {
                self.regs.set_flag(Flag::Decimal, true);
                self.advance(op);
            }
            Instruction::Nop => {
                self.advance(op);
            }

            // Branches
            Instruction::Bpl => cycles += self.branch(op, !self.regs.flag(Flag::Negative)),
            Instruction::Bmi => cycles += self.branch(op, self.regs.flag(Flag::Negative)),
            Instruction::Bvc => cycles += self.branch(op, !self.regs.flag(Flag::Overflow)),
            Instruction::Bvs => cycles += self.branch(op, self.regs.flag(Flag::Overflow)),
            Instruction::Bcc => cycles += self.branch(op, !self.regs.flag(Flag::Carry)),
            Instruction::Bcs => cycles += self.branch(op, self.regs.flag(Flag::Carry)),
            Instruction::Bne => cycles += self.branch(op, !self.regs.flag(Flag::Zero)),
            Instruction::Beq => cycles += self.branch(op, self.regs.flag(Flag::Zero)),

            // Jumps, subroutines and interrupts
            Instruction::Jmp => {
                self.regs.pc = self.effective_address(op.mode);
            }
            Instruction::JmpIndirect => {
                let pointer = self.effective_address(op.mode);
                self.regs.pc = self.memory.read_word(pointer);
            }
            Instruction::Jsr => {
                let target = self.effective_address(op.mode);
                let ret = self.regs.pc.wrapping_add(2);
                self.push_u16(ret);
                self.regs.pc = target;
            }
            Instruction::Rts => {
                self.regs.pc = self.pop_u16().wrapping_add(1);
            }
            Instruction::Rti => {
                let bits = self.pop_u8();
                self.regs.status.replace(bits);
                self.regs.pc = self.pop_u16();
            }
            Instruction::Brk => {
                log(LogCategory::Interrupts, LogLevel::Debug, || {
                    format!("CPU: BRK at PC={:04X}", self.regs.pc)
                });
                self.regs.set_flag(Flag::Break, true);
                self.regs.set_flag(Flag::InterruptDisable, true);
                let ret = self.regs.pc.wrapping_add(2);
                self.push_u16(ret);
                let pushed = self.regs.status.pushed_by_instruction();
                self.push_u8(pushed);
                self.regs.pc = self.memory.read_word(IRQ_VECTOR);
            }
        }

        cycles
    }

    #[inline]
    fn advance(&mut self, op: &Opcode) {
        self.regs.pc = self.regs.pc.wrapping_add(op.bytes as u16);
    }

    /// Load, transform and store back through one resolved location; N/Z follow the result.
    fn read_modify_write<F>(&mut self, mode: AddressingMode, f: F)
    where
        F: FnOnce(&mut Self, u8) -> u8,
    {
        let loc = self.location(mode);
        let value = self.load(loc);
        let result = f(self, value);
        self.store(loc, result);
        self.regs.set_nz(result);
    }

    /// Carry set when `register >= value`; N/Z from the wrapped difference.
    fn compare(&mut self, register: u8, value: u8) {
        let diff = register.wrapping_sub(value);
        self.regs.set_flag(Flag::Carry, register >= value);
        self.regs.set_nz(diff);
    }

    /// Extra cycles for a branch: 0 when not taken, 1 when taken, 2 across a page.
    fn branch(&mut self, op: &Opcode, condition: bool) -> u32 {
        let next = self.regs.pc.wrapping_add(op.bytes as u16);
        if !condition {
            self.regs.pc = next;
            return 0;
        }
        let target = self.branch_target();
        self.regs.pc = target;
        if (next & 0xFF00) != (target & 0xFF00) {
            2
        } else {
            1
        }
    }

    fn add_binary(&mut self, value: u8) {
        let a = self.regs.a;
        let sum = a as u16 + value as u16 + self.regs.flag(Flag::Carry) as u16;
        let result = sum as u8;
        self.regs.set_flag(Flag::Carry, sum > 0xFF);
        self.regs
            .set_flag(Flag::Overflow, (a ^ result) & (value ^ result) & 0x80 != 0);
        self.regs.a = result;
        self.regs.set_nz(result);
    }

    fn add_with_carry(&mut self, value: u8) {
        if !self.regs.flag(Flag::Decimal) {
            self.add_binary(value);
            return;
        }

        // NMOS decimal mode: Z from the binary sum, N and V from the
        // half-adjusted intermediate, C from the fully adjusted result.
        let a = self.regs.a;
        let carry_in = self.regs.flag(Flag::Carry) as u16;
        let binary = (a as u16 + value as u16 + carry_in) as u8;

        let mut lo = (a & 0x0F) as u16 + (value & 0x0F) as u16 + carry_in;
        if lo >= 0x0A {
            lo = ((lo + 0x06) & 0x0F) + 0x10;
        }
        let mut sum = (a & 0xF0) as u16 + (value & 0xF0) as u16 + lo;
        let intermediate = sum as u8;

        self.regs.set_flag(Flag::Zero, binary == 0);
        self.regs.set_flag(Flag::Negative, intermediate & 0x80 != 0);
        self.regs.set_flag(
            Flag::Overflow,
            (a ^ intermediate) & (value ^ intermediate) & 0x80 != 0,
        );

        if sum >= 0xA0 {
            sum += 0x60;
        }
        self.regs.set_flag(Flag::Carry, sum >= 0x100);
        self.regs.a = sum as u8;
    }

    fn subtract_with_carry(&mut self, value: u8) {
        let a = self.regs.a;
        let borrow = !self.regs.flag(Flag::Carry) as i16;

        // Flags are those of the binary subtraction in both modes.
        self.add_binary(!value);
        if !self.regs.flag(Flag::Decimal) {
            return;
        }

        let mut lo = (a & 0x0F) as i16 - (value & 0x0F) as i16 - borrow;
        if lo < 0 {
            lo = ((lo - 0x06) & 0x0F) - 0x10;
        }
        let mut diff = (a & 0xF0) as i16 - (value & 0xF0) as i16 + lo;
        if diff < 0 {
            diff -= 0x60;
        }
        self.regs.a = diff as u8;
    }
}
