//! One-line disassembler and execution trace formatting.

use super::addressing::AddressingMode;
use super::opcodes::{decode, Instruction, Opcode};
use super::Memory6502;

/// Render `op` located at `addr` in assembler syntax, e.g. `LDA ($20),Y`.
///
/// Operands are read with [`Memory6502::peek`] so disassembly has no side effects.
pub fn disassemble<M: Memory6502 + ?Sized>(op: &Opcode, addr: u16, bus: &M) -> String {
    let b1 = bus.peek(addr.wrapping_add(1));
    let word = u16::from_le_bytes([b1, bus.peek(addr.wrapping_add(2))]);
    let m = op.mnemonic;

    match op.mode {
        AddressingMode::Implied => m.to_string(),
        AddressingMode::Accumulator => format!("{} A", m),
        AddressingMode::Immediate => format!("{} #${:02X}", m, b1),
        AddressingMode::ZeroPage => format!("{} ${:02X}", m, b1),
        AddressingMode::ZeroPageX => format!("{} ${:02X},X", m, b1),
        AddressingMode::ZeroPageY => format!("{} ${:02X},Y", m, b1),
        AddressingMode::Absolute if op.instruction == Instruction::JmpIndirect => {
            format!("{} (${:04X})", m, word)
        }
        AddressingMode::Absolute => format!("{} ${:04X}", m, word),
        AddressingMode::AbsoluteX => format!("{} ${:04X},X", m, word),
        AddressingMode::AbsoluteY => format!("{} ${:04X},Y", m, word),
        AddressingMode::IndexedIndirect => format!("{} (${:02X},X)", m, b1),
        AddressingMode::IndirectIndexed => format!("{} (${:02X}),Y", m, b1),
        AddressingMode::Relative => {
            let target = addr.wrapping_add(2).wrapping_add(b1 as i8 as i16 as u16);
            format!("{} ${:04X}", m, target)
        }
    }
}

/// Trace line for the instruction at `pc`: address, raw bytes, disassembly.
///
/// ```text
/// 0800  A9 05     LDA #$05
/// ```
pub fn trace_line<M: Memory6502 + ?Sized>(bus: &M, pc: u16) -> String {
    let code = bus.peek(pc);
    let Some(op) = decode(code) else {
        return format!("{:04X}  {:02X}        ???", pc, code);
    };
    let raw = (0..op.bytes as u16)
        .map(|i| format!("{:02X}", bus.peek(pc.wrapping_add(i))))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{:04X}  {:<8}  {}", pc, raw, disassemble(op, pc, bus))
}
