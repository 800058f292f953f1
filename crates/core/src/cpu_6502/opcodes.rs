//! The 256-entry opcode table.
//!
//! Each populated entry binds one opcode byte to an [`Instruction`] tag, its
//! [`AddressingMode`], byte length and base cycle cost. Empty entries are the
//! undocumented NMOS opcodes, which the engine reports as illegal.

use super::addressing::AddressingMode;
use AddressingMode::*;

/// Handler tag. One variant per documented mnemonic, with JMP split by its
/// absolute/indirect forms because they resolve the target differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    JmpIndirect,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
}

impl Instruction {
    pub const fn mnemonic(self) -> &'static str {
        use Instruction::*;
        match self {
            Adc => "ADC",
            And => "AND",
            Asl => "ASL",
            Bcc => "BCC",
            Bcs => "BCS",
            Beq => "BEQ",
            Bit => "BIT",
            Bmi => "BMI",
            Bne => "BNE",
            Bpl => "BPL",
            Brk => "BRK",
            Bvc => "BVC",
            Bvs => "BVS",
            Clc => "CLC",
            Cld => "CLD",
            Cli => "CLI",
            Clv => "CLV",
            Cmp => "CMP",
            Cpx => "CPX",
            Cpy => "CPY",
            Dec => "DEC",
            Dex => "DEX",
            Dey => "DEY",
            Eor => "EOR",
            Inc => "INC",
            Inx => "INX",
            Iny => "INY",
            Jmp | JmpIndirect => "JMP",
            Jsr => "JSR",
            Lda => "LDA",
            Ldx => "LDX",
            Ldy => "LDY",
            Lsr => "LSR",
            Nop => "NOP",
            Ora => "ORA",
            Pha => "PHA",
            Php => "PHP",
            Pla => "PLA",
            Plp => "PLP",
            Rol => "ROL",
            Ror => "ROR",
            Rti => "RTI",
            Rts => "RTS",
            Sbc => "SBC",
            Sec => "SEC",
            Sed => "SED",
            Sei => "SEI",
            Sta => "STA",
            Stx => "STX",
            Sty => "STY",
            Tax => "TAX",
            Tay => "TAY",
            Tsx => "TSX",
            Txa => "TXA",
            Txs => "TXS",
            Tya => "TYA",
        }
    }

    /// Instructions that assign PC themselves instead of advancing by their length.
    pub const fn transfers_control(self) -> bool {
        use Instruction::*;
        matches!(
            self,
            Bcc | Bcs | Beq | Bmi | Bne | Bpl | Bvc | Bvs | Jmp | JmpIndirect | Jsr | Rts | Rti
                | Brk
        )
    }

    /// Read instructions that take one extra cycle when an indexed access crosses a page.
    pub(crate) const fn page_penalty(self) -> bool {
        use Instruction::*;
        matches!(
            self,
            Adc | And | Cmp | Eor | Lda | Ldx | Ldy | Ora | Sbc
        )
    }
}

/// Immutable descriptor for one opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub code: u8,
    pub mnemonic: &'static str,
    pub instruction: Instruction,
    pub mode: AddressingMode,
    /// Instruction length including the opcode byte (1-3).
    pub bytes: u8,
    /// Base cycle cost before branch/page-cross penalties.
    pub cycles: u8,
}

const fn op(code: u8, instruction: Instruction, mode: AddressingMode, cycles: u8) -> Option<Opcode> {
    Some(Opcode {
        code,
        mnemonic: instruction.mnemonic(),
        instruction,
        mode,
        bytes: 1 + mode.operand_bytes(),
        cycles,
    })
}

/// The eight-mode column shared by ORA/AND/EOR/ADC/STA/LDA/CMP/SBC (`aaa bbb 01`).
const fn group_one(
    mut t: [Option<Opcode>; 256],
    base: u8,
    instruction: Instruction,
) -> [Option<Opcode>; 256] {
    t[base as usize] = op(base, instruction, IndexedIndirect, 6);
    t[(base + 0x04) as usize] = op(base + 0x04, instruction, ZeroPage, 3);
    t[(base + 0x08) as usize] = op(base + 0x08, instruction, Immediate, 2);
    t[(base + 0x0C) as usize] = op(base + 0x0C, instruction, Absolute, 4);
    t[(base + 0x10) as usize] = op(base + 0x10, instruction, IndirectIndexed, 5);
    t[(base + 0x14) as usize] = op(base + 0x14, instruction, ZeroPageX, 4);
    t[(base + 0x18) as usize] = op(base + 0x18, instruction, AbsoluteY, 4);
    t[(base + 0x1C) as usize] = op(base + 0x1C, instruction, AbsoluteX, 4);
    t
}

/// Accumulator/zp/zp,X/abs/abs,X shift and rotate forms.
const fn shift_group(
    mut t: [Option<Opcode>; 256],
    base: u8,
    instruction: Instruction,
) -> [Option<Opcode>; 256] {
    t[(base + 0x04) as usize] = op(base + 0x04, instruction, ZeroPage, 5);
    t[(base + 0x08) as usize] = op(base + 0x08, instruction, Accumulator, 2);
    t[(base + 0x0C) as usize] = op(base + 0x0C, instruction, Absolute, 6);
    t[(base + 0x14) as usize] = op(base + 0x14, instruction, ZeroPageX, 6);
    t[(base + 0x1C) as usize] = op(base + 0x1C, instruction, AbsoluteX, 7);
    t
}

const fn build_table() -> [Option<Opcode>; 256] {
    use Instruction::*;
    let mut t: [Option<Opcode>; 256] = [None; 256];

    t = group_one(t, 0x01, Ora);
    t = group_one(t, 0x21, And);
    t = group_one(t, 0x41, Eor);
    t = group_one(t, 0x61, Adc);
    t = group_one(t, 0xA1, Lda);
    t = group_one(t, 0xC1, Cmp);
    t = group_one(t, 0xE1, Sbc);

    // STA has no immediate form and fixed write timings
    t[0x81] = op(0x81, Sta, IndexedIndirect, 6);
    t[0x85] = op(0x85, Sta, ZeroPage, 3);
    t[0x8D] = op(0x8D, Sta, Absolute, 4);
    t[0x91] = op(0x91, Sta, IndirectIndexed, 6);
    t[0x95] = op(0x95, Sta, ZeroPageX, 4);
    t[0x99] = op(0x99, Sta, AbsoluteY, 5);
    t[0x9D] = op(0x9D, Sta, AbsoluteX, 5);

    t = shift_group(t, 0x02, Asl);
    t = shift_group(t, 0x22, Rol);
    t = shift_group(t, 0x42, Lsr);
    t = shift_group(t, 0x62, Ror);

    t[0xC6] = op(0xC6, Dec, ZeroPage, 5);
    t[0xCE] = op(0xCE, Dec, Absolute, 6);
    t[0xD6] = op(0xD6, Dec, ZeroPageX, 6);
    t[0xDE] = op(0xDE, Dec, AbsoluteX, 7);
    t[0xE6] = op(0xE6, Inc, ZeroPage, 5);
    t[0xEE] = op(0xEE, Inc, Absolute, 6);
    t[0xF6] = op(0xF6, Inc, ZeroPageX, 6);
    t[0xFE] = op(0xFE, Inc, AbsoluteX, 7);

    t[0xA2] = op(0xA2, Ldx, Immediate, 2);
    t[0xA6] = op(0xA6, Ldx, ZeroPage, 3);
    t[0xAE] = op(0xAE, Ldx, Absolute, 4);
    t[0xB6] = op(0xB6, Ldx, ZeroPageY, 4);
    t[0xBE] = op(0xBE, Ldx, AbsoluteY, 4);
    t[0xA0] = op(0xA0, Ldy, Immediate, 2);
    t[0xA4] = op(0xA4, Ldy, ZeroPage, 3);
    t[0xAC] = op(0xAC, Ldy, Absolute, 4);
    t[0xB4] = op(0xB4, Ldy, ZeroPageX, 4);
    t[0xBC] = op(0xBC, Ldy, AbsoluteX, 4);

    t[0x86] = op(0x86, Stx, ZeroPage, 3);
    t[0x8E] = op(0x8E, Stx, Absolute, 4);
    t[0x96] = op(0x96, Stx, ZeroPageY, 4);
    t[0x84] = op(0x84, Sty, ZeroPage, 3);
    t[0x8C] = op(0x8C, Sty, Absolute, 4);
    t[0x94] = op(0x94, Sty, ZeroPageX, 4);

    t[0xE0] = op(0xE0, Cpx, Immediate, 2);
    t[0xE4] = op(0xE4, Cpx, ZeroPage, 3);
    t[0xEC] = op(0xEC, Cpx, Absolute, 4);
    t[0xC0] = op(0xC0, Cpy, Immediate, 2);
    t[0xC4] = op(0xC4, Cpy, ZeroPage, 3);
    t[0xCC] = op(0xCC, Cpy, Absolute, 4);

    t[0x24] = op(0x24, Bit, ZeroPage, 3);
    t[0x2C] = op(0x2C, Bit, Absolute, 4);

    t[0x10] = op(0x10, Bpl, Relative, 2);
    t[0x30] = op(0x30, Bmi, Relative, 2);
    t[0x50] = op(0x50, Bvc, Relative, 2);
    t[0x70] = op(0x70, Bvs, Relative, 2);
    t[0x90] = op(0x90, Bcc, Relative, 2);
    t[0xB0] = op(0xB0, Bcs, Relative, 2);
    t[0xD0] = op(0xD0, Bne, Relative, 2);
    t[0xF0] = op(0xF0, Beq, Relative, 2);

    t[0x00] = op(0x00, Brk, Implied, 7);
    t[0x20] = op(0x20, Jsr, Absolute, 6);
    t[0x40] = op(0x40, Rti, Implied, 6);
    t[0x60] = op(0x60, Rts, Implied, 6);
    t[0x4C] = op(0x4C, Jmp, Absolute, 3);
    t[0x6C] = op(0x6C, JmpIndirect, Absolute, 5);

    t[0x08] = op(0x08, Php, Implied, 3);
    t[0x28] = op(0x28, Plp, Implied, 4);
    t[0x48] = op(0x48, Pha, Implied, 3);
    t[0x68] = op(0x68, Pla, Implied, 4);

    t[0x18] = op(0x18, Clc, Implied, 2);
    t[0x38] = op(0x38, Sec, Implied, 2);
    t[0x58] = op(0x58, Cli, Implied, 2);
    t[0x78] = op(0x78, Sei, Implied, 2);
    t[0xB8] = op(0xB8, Clv, Implied, 2);
    t[0xD8] = op(0xD8, Cld, Implied, 2);
    t[0xF8] = op(0xF8, Sed, Implied, 2);

    t[0xAA] = op(0xAA, Tax, Implied, 2);
    t[0xA8] = op(0xA8, Tay, Implied, 2);
    t[0x8A] = op(0x8A, Txa, Implied, 2);
    t[0x98] = op(0x98, Tya, Implied, 2);
    t[0xBA] = op(0xBA, Tsx, Implied, 2);
    t[0x9A] = op(0x9A, Txs, Implied, 2);

    t[0xE8] = op(0xE8, Inx, Implied, 2);
    t[0xC8] = op(0xC8, Iny, Implied, 2);
    t[0xCA] = op(0xCA, Dex, Implied, 2);
    t[0x88] = op(0x88, Dey, Implied, 2);

    t[0xEA] = op(0xEA, Nop, Implied, 2);

    t
}

/// Opcode byte → descriptor. `None` marks an illegal opcode.
pub static OPCODES: [Option<Opcode>; 256] = build_table();

/// Look up the descriptor for an opcode byte.
#[inline]
pub fn decode(code: u8) -> Option<&'static Opcode> {
    OPCODES[code as usize].as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_holds_every_documented_opcode() {
        let populated = OPCODES.iter().filter(|o| o.is_some()).count();
        assert_eq!(populated, 151);
    }

    #[test]
    fn entries_know_their_own_code() {
        for (i, entry) in OPCODES.iter().enumerate() {
            if let Some(op) = entry {
                assert_eq!(op.code as usize, i, "{} at {:02X}", op.mnemonic, i);
            }
        }
    }

    #[test]
    fn lengths_follow_addressing_mode() {
        let lda_imm = decode(0xA9).unwrap();
        assert_eq!(lda_imm.mnemonic, "LDA");
        assert_eq!(lda_imm.mode, AddressingMode::Immediate);
        assert_eq!(lda_imm.bytes, 2);
        assert_eq!(lda_imm.cycles, 2);

        let sta_abs_x = decode(0x9D).unwrap();
        assert_eq!(sta_abs_x.bytes, 3);
        assert_eq!(sta_abs_x.cycles, 5);

        let asl_a = decode(0x0A).unwrap();
        assert_eq!(asl_a.mode, AddressingMode::Accumulator);
        assert_eq!(asl_a.bytes, 1);
    }

    #[test]
    fn undocumented_opcodes_are_empty() {
        for code in [0x02u8, 0x03, 0x1A, 0x80, 0x89, 0xAB, 0xFF] {
            assert!(decode(code).is_none(), "{:02X} should be illegal", code);
        }
    }

    #[test]
    fn both_jmp_forms_share_mnemonic() {
        assert_eq!(decode(0x4C).unwrap().instruction, Instruction::Jmp);
        assert_eq!(decode(0x6C).unwrap().instruction, Instruction::JmpIndirect);
        assert_eq!(decode(0x6C).unwrap().mnemonic, "JMP");
    }

    #[test]
    fn mnemonic_count_is_fifty_six() {
        let mut seen = std::collections::HashSet::new();
        for op in OPCODES.iter().flatten() {
            seen.insert(op.mnemonic);
        }
        assert_eq!(seen.len(), 56);
    }
}
