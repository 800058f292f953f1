use super::*;

fn cpu_with(origin: u16, program: &[u8]) -> Cpu6502<ArrayMemory> {
    let mut mem = ArrayMemory::new();
    mem.load_at(origin, program);
    Cpu6502::new(mem)
}

#[test]
fn reset_loads_pc_from_vector() {
    let mut cpu = cpu_with(0xC000, &[0xEA]);
    assert_eq!(cpu.pc(), 0xC000);
    cpu.regs.pc = 0x1234;
    cpu.regs.sp = 0x00;
    cpu.cycles = 99;
    cpu.reset();
    assert_eq!(cpu.pc(), 0xC000);
    assert_eq!(cpu.regs.sp, 0xFD);
    assert_eq!(cpu.cycles, 0);
    assert_eq!(cpu.regs.status.bits(), 0x24);
}

#[test]
fn lda_immediate_sets_a_and_flags() {
    let mut cpu = cpu_with(0x0800, &[0xA9, 0x05, 0xA9, 0x00, 0xA9, 0x80]);
    assert_eq!(cpu.step(), Ok(2));
    assert_eq!(cpu.regs.a, 0x05);
    assert!(!cpu.regs.flag(Flag::Zero));
    assert!(!cpu.regs.flag(Flag::Negative));
    cpu.step().unwrap();
    assert!(cpu.regs.flag(Flag::Zero));
    cpu.step().unwrap();
    assert!(cpu.regs.flag(Flag::Negative));
    assert_eq!(cpu.pc(), 0x0806);
    assert_eq!(cpu.cycles, 6);
}

#[test]
fn non_control_instructions_advance_by_their_length() {
    for op in OPCODES.iter().flatten() {
        if op.instruction.transfers_control() {
            continue;
        }
        // operand $0200 keeps every access away from the code
        let mut cpu = cpu_with(0x0800, &[op.code, 0x00, 0x02]);
        cpu.step().unwrap();
        assert_eq!(
            cpu.pc(),
            0x0800 + op.bytes as u16,
            "{} ({:02X})",
            op.mnemonic,
            op.code
        );
    }
}

#[test]
fn adc_binary_matches_arithmetic_for_all_inputs() {
    let mut cpu = cpu_with(0x0800, &[0x69, 0x00]);
    for a in 0..=255u16 {
        for m in 0..=255u16 {
            for carry in [false, true] {
                cpu.regs.pc = 0x0800;
                cpu.memory.data[0x0801] = m as u8;
                cpu.regs.a = a as u8;
                cpu.regs.set_flag(Flag::Carry, carry);
                cpu.step().unwrap();

                let sum = a + m + carry as u16;
                let result = (sum & 0xFF) as u8;
                let overflow = (a as u8 ^ result) & (m as u8 ^ result) & 0x80 != 0;
                assert_eq!(cpu.regs.a, result);
                assert_eq!(cpu.regs.flag(Flag::Carry), sum > 0xFF);
                assert_eq!(cpu.regs.flag(Flag::Overflow), overflow);
                assert_eq!(cpu.regs.flag(Flag::Zero), result == 0);
                assert_eq!(cpu.regs.flag(Flag::Negative), result & 0x80 != 0);
            }
        }
    }
}

#[test]
fn sbc_binary_borrows_through_carry() {
    let mut cpu = cpu_with(0x0800, &[0xE9, 0x01, 0xE9, 0x01]);
    cpu.regs.a = 0x00;
    cpu.regs.set_flag(Flag::Carry, true);
    cpu.step().unwrap();
    assert_eq!(cpu.regs.a, 0xFF);
    assert!(!cpu.regs.flag(Flag::Carry));
    assert!(cpu.regs.flag(Flag::Negative));

    // carry clear subtracts one more
    cpu.step().unwrap();
    assert_eq!(cpu.regs.a, 0xFD);
    assert!(cpu.regs.flag(Flag::Carry));
}

#[test]
fn sbc_sets_overflow_on_signed_wrap() {
    let mut cpu = cpu_with(0x0800, &[0xE9, 0x01]);
    cpu.regs.a = 0x80;
    cpu.regs.set_flag(Flag::Carry, true);
    cpu.step().unwrap();
    assert_eq!(cpu.regs.a, 0x7F);
    assert!(cpu.regs.flag(Flag::Overflow));
}

#[test]
fn adc_decimal_mode_adjusts_digits() {
    // SED; CLC; LDA #$09; ADC #$01; ADC #$89
    let mut cpu = cpu_with(0x0800, &[0xF8, 0x18, 0xA9, 0x09, 0x69, 0x01, 0x69, 0x89]);
    cpu.run(0x0800, 4).unwrap();
    assert_eq!(cpu.regs.a, 0x10);
    assert!(!cpu.regs.flag(Flag::Carry));
    cpu.step().unwrap();
    assert_eq!(cpu.regs.a, 0x99);
    assert!(!cpu.regs.flag(Flag::Carry));

    cpu.regs.pc = 0x0804;
    cpu.memory.data[0x0805] = 0x01;
    cpu.step().unwrap();
    assert_eq!(cpu.regs.a, 0x00);
    assert!(cpu.regs.flag(Flag::Carry));
}

#[test]
fn sbc_decimal_mode_adjusts_digits() {
    // SED; SEC; LDA #$10; SBC #$01; SBC #$10
    let mut cpu = cpu_with(0x0800, &[0xF8, 0x38, 0xA9, 0x10, 0xE9, 0x01, 0xE9, 0x10]);
    cpu.run(0x0800, 4).unwrap();
    assert_eq!(cpu.regs.a, 0x09);
    assert!(cpu.regs.flag(Flag::Carry));
    cpu.step().unwrap();
    assert_eq!(cpu.regs.a, 0x99);
    assert!(!cpu.regs.flag(Flag::Carry));
}

#[test]
fn compare_sets_carry_zero_and_negative() {
    let mut cpu = cpu_with(0x0800, &[0xC9, 0x40, 0xC9, 0x41, 0xC9, 0x3F]);
    cpu.regs.a = 0x40;
    cpu.step().unwrap();
    assert!(cpu.regs.flag(Flag::Carry));
    assert!(cpu.regs.flag(Flag::Zero));
    cpu.step().unwrap();
    assert!(!cpu.regs.flag(Flag::Carry));
    assert!(cpu.regs.flag(Flag::Negative));
    cpu.step().unwrap();
    assert!(cpu.regs.flag(Flag::Carry));
    assert!(!cpu.regs.flag(Flag::Zero));
    assert_eq!(cpu.regs.a, 0x40);
}

#[test]
fn bit_copies_high_bits_of_memory() {
    let mut cpu = cpu_with(0x0800, &[0x24, 0x10]);
    cpu.memory.data[0x10] = 0xC0;
    cpu.regs.a = 0x01;
    cpu.step().unwrap();
    assert!(cpu.regs.flag(Flag::Negative));
    assert!(cpu.regs.flag(Flag::Overflow));
    assert!(cpu.regs.flag(Flag::Zero));
    assert_eq!(cpu.regs.a, 0x01);
}

#[test]
fn asl_of_0x80_sets_carry_and_zero() {
    let mut cpu = cpu_with(0x0800, &[0x0A]);
    cpu.regs.a = 0x80;
    cpu.step().unwrap();
    assert_eq!(cpu.regs.a, 0x00);
    assert!(cpu.regs.flag(Flag::Carry));
    assert!(cpu.regs.flag(Flag::Zero));
    assert!(!cpu.regs.flag(Flag::Negative));
}

#[test]
fn rotates_move_carry_through_memory() {
    // ROL $10 ; ROR $10
    let mut cpu = cpu_with(0x0800, &[0x26, 0x10, 0x66, 0x10]);
    cpu.memory.data[0x10] = 0x81;
    cpu.regs.set_flag(Flag::Carry, false);
    assert_eq!(cpu.step(), Ok(5));
    assert_eq!(cpu.memory.data[0x10], 0x02);
    assert!(cpu.regs.flag(Flag::Carry));
    cpu.step().unwrap();
    assert_eq!(cpu.memory.data[0x10], 0x81);
    assert!(!cpu.regs.flag(Flag::Carry));
    assert!(cpu.regs.flag(Flag::Negative));
}

#[test]
fn inc_dec_wrap_and_set_flags() {
    // INC $10 ; DEC $11
    let mut cpu = cpu_with(0x0800, &[0xE6, 0x10, 0xC6, 0x11]);
    cpu.memory.data[0x10] = 0xFF;
    cpu.memory.data[0x11] = 0x00;
    cpu.step().unwrap();
    assert_eq!(cpu.memory.data[0x10], 0x00);
    assert!(cpu.regs.flag(Flag::Zero));
    cpu.step().unwrap();
    assert_eq!(cpu.memory.data[0x11], 0xFF);
    assert!(cpu.regs.flag(Flag::Negative));
}

#[test]
fn txs_leaves_flags_alone_tsx_does_not() {
    // LDX #$00 ; LDA #$01 ; TXS ; TSX
    let mut cpu = cpu_with(0x0800, &[0xA2, 0x00, 0xA9, 0x01, 0x9A, 0xBA]);
    cpu.run(0x0800, 3).unwrap();
    assert_eq!(cpu.regs.sp, 0x00);
    assert!(!cpu.regs.flag(Flag::Zero));
    cpu.step().unwrap();
    assert!(cpu.regs.flag(Flag::Zero));
}

#[test]
fn pha_pla_wraps_the_stack_page() {
    let mut program = vec![0x48u8; 256];
    program.extend(std::iter::repeat(0x68u8).take(256));
    let mut cpu = cpu_with(0x0800, &program);
    let start_sp = cpu.regs.sp;

    for value in 0..=255u8 {
        cpu.regs.a = value;
        cpu.step().unwrap();
    }
    assert_eq!(cpu.regs.sp, start_sp);

    for expected in (0..=255u8).rev() {
        cpu.step().unwrap();
        assert_eq!(cpu.regs.a, expected);
    }
    assert_eq!(cpu.regs.sp, start_sp);
}

#[test]
fn php_plp_round_trips_with_break_and_bit5() {
    // SEC ; PHP ; CLC ; PLP
    let mut cpu = cpu_with(0x0800, &[0x38, 0x08, 0x18, 0x28]);
    cpu.run(0x0800, 2).unwrap();
    let pushed = cpu.memory.data[0x01FD];
    assert_eq!(pushed & 0x30, 0x30);
    assert_eq!(pushed & 0x01, 0x01);

    cpu.run(0x0802, 2).unwrap();
    assert!(cpu.regs.flag(Flag::Carry));
    assert_eq!(cpu.regs.status.bits() & 0x20, 0x20);
    assert_eq!(cpu.regs.sp, 0xFD);
}

#[test]
fn bne_to_itself_spins_and_costs_three_cycles() {
    let mut cpu = cpu_with(0x0800, &[0xD0, 0xFE]);
    cpu.regs.set_flag(Flag::Zero, false);
    for _ in 0..4 {
        assert_eq!(cpu.step(), Ok(3));
        assert_eq!(cpu.pc(), 0x0800);
    }

    cpu.regs.set_flag(Flag::Zero, true);
    assert_eq!(cpu.step(), Ok(2));
    assert_eq!(cpu.pc(), 0x0802);
}

#[test]
fn branch_across_page_costs_extra_cycle() {
    let mut cpu = cpu_with(0x08F0, &[0xF0, 0x20]);
    cpu.regs.set_flag(Flag::Zero, true);
    assert_eq!(cpu.step(), Ok(4));
    assert_eq!(cpu.pc(), 0x0912);
}

#[test]
fn indexed_read_across_page_costs_extra_cycle() {
    // LDA $12F0,X ; STA $12F0,X
    let mut cpu = cpu_with(0x0800, &[0xBD, 0xF0, 0x12, 0x9D, 0xF0, 0x12]);
    cpu.memory.data[0x1310] = 0x77;
    cpu.regs.x = 0x20;
    assert_eq!(cpu.step(), Ok(5));
    assert_eq!(cpu.regs.a, 0x77);
    // stores always pay the fixed cost
    assert_eq!(cpu.step(), Ok(5));
}

#[test]
fn jsr_pushes_last_byte_and_rts_returns_after_it() {
    let mut cpu = cpu_with(0x1000, &[0x20, 0x00, 0x20, 0xEA]);
    cpu.memory.data[0x2000] = 0x60;
    assert_eq!(cpu.step(), Ok(6));
    assert_eq!(cpu.pc(), 0x2000);
    assert_eq!(cpu.regs.sp, 0xFB);
    assert_eq!(cpu.memory.data[0x01FD], 0x10);
    assert_eq!(cpu.memory.data[0x01FC], 0x02);

    assert_eq!(cpu.step(), Ok(6));
    assert_eq!(cpu.pc(), 0x1003);
    assert_eq!(cpu.regs.sp, 0xFD);
}

#[test]
fn jmp_absolute_and_indirect() {
    let mut cpu = cpu_with(0x0800, &[0x4C, 0x00, 0x30]);
    cpu.memory.data[0x3000] = 0x6C;
    cpu.memory.data[0x3001] = 0x00;
    cpu.memory.data[0x3002] = 0x40;
    cpu.memory.data[0x4000] = 0x34;
    cpu.memory.data[0x4001] = 0x12;
    assert_eq!(cpu.step(), Ok(3));
    assert_eq!(cpu.pc(), 0x3000);
    assert_eq!(cpu.step(), Ok(5));
    assert_eq!(cpu.pc(), 0x1234);
}

#[test]
fn brk_and_rti_round_trip() {
    let mut cpu = cpu_with(0x0800, &[0x00, 0xEA, 0xEA]);
    cpu.memory.data[0xFFFE] = 0x00;
    cpu.memory.data[0xFFFF] = 0x90;
    cpu.memory.data[0x9000] = 0x40;
    cpu.regs.set_flag(Flag::InterruptDisable, false);
    cpu.regs.set_flag(Flag::Carry, true);

    assert_eq!(cpu.step(), Ok(7));
    assert_eq!(cpu.pc(), 0x9000);
    assert!(cpu.regs.flag(Flag::InterruptDisable));
    assert!(cpu.regs.flag(Flag::Break));
    assert_eq!(cpu.memory.data[0x01FD], 0x08);
    assert_eq!(cpu.memory.data[0x01FC], 0x02);
    // B, bit 5, I and C all set in the pushed byte
    assert_eq!(cpu.memory.data[0x01FB], 0x35);

    assert_eq!(cpu.step(), Ok(6));
    assert_eq!(cpu.pc(), 0x0802);
    assert!(cpu.regs.flag(Flag::Carry));
    assert!(cpu.regs.flag(Flag::InterruptDisable));
    assert_eq!(cpu.regs.sp, 0xFD);
}

#[test]
fn irq_is_masked_by_interrupt_disable() {
    let mut cpu = cpu_with(0x0800, &[0xEA]);
    cpu.memory.data[0xFFFE] = 0x00;
    cpu.memory.data[0xFFFF] = 0xA0;
    assert!(cpu.regs.flag(Flag::InterruptDisable));
    assert!(!cpu.irq());
    assert_eq!(cpu.pc(), 0x0800);

    cpu.regs.set_flag(Flag::InterruptDisable, false);
    assert!(cpu.irq());
    assert_eq!(cpu.pc(), 0xA000);
    // hardware interrupts push B clear
    assert_eq!(cpu.memory.data[0x01FB] & 0x30, 0x20);
}

#[test]
fn nmi_ignores_interrupt_disable() {
    let mut cpu = cpu_with(0x0800, &[0xEA]);
    cpu.memory.data[0xFFFA] = 0x43;
    cpu.memory.data[0xFFFB] = 0xFE;
    cpu.nmi();
    assert_eq!(cpu.pc(), 0xFE43);
    assert_eq!(cpu.cycles, 7);
}

#[test]
fn illegal_opcode_stops_without_side_effects() {
    let mut cpu = cpu_with(0x0800, &[0x02]);
    let before = cpu.regs;
    assert_eq!(
        cpu.step(),
        Err(CpuError::IllegalOpcode {
            opcode: 0x02,
            pc: 0x0800
        })
    );
    assert_eq!(cpu.regs, before);
    assert_eq!(cpu.cycles, 0);
}

#[test]
fn run_stops_on_illegal_opcode() {
    let mut cpu = cpu_with(0x0800, &[0xEA, 0xEA, 0xFF]);
    let err = cpu.run(0x0800, 10).unwrap_err();
    assert_eq!(
        err,
        CpuError::IllegalOpcode {
            opcode: 0xFF,
            pc: 0x0802
        }
    );
    assert_eq!(cpu.pc(), 0x0802);
}

#[test]
fn run_executes_exactly_max_steps() {
    let mut cpu = cpu_with(0x0800, &[0xE8, 0xE8, 0xE8, 0xE8]);
    assert_eq!(cpu.run(0x0800, 3), Ok(3));
    assert_eq!(cpu.regs.x, 3);
    assert_eq!(cpu.run(0x0800, 0), Ok(0));
}

#[test]
fn run_until_checks_predicate_before_each_step() {
    // LDX #$00 ; INX ; CPX #$05 ; BNE -5 ; NOP
    let mut cpu = cpu_with(0x0800, &[0xA2, 0x00, 0xE8, 0xE0, 0x05, 0xD0, 0xFB, 0xEA]);
    let steps = cpu.run_until(0x0800, |c| c.pc() == 0x0807).unwrap();
    assert_eq!(cpu.regs.x, 5);
    assert_eq!(steps, 1 + 5 * 3);
}

#[test]
fn load_program_places_payload_at_header_address() {
    let mut cpu = Cpu6502::new(ArrayMemory::new());
    assert_eq!(cpu.load_program(&[0x01, 0x08, 0xA9, 0x05]), Ok(0x0801));
    assert_eq!(cpu.peek(0x0801), 0xA9);
    assert_eq!(cpu.peek(0x0802), 0x05);
    assert_eq!(cpu.peek(0x0800), 0x00);
}

#[test]
fn load_program_rejects_short_and_overflowing_images() {
    let mut cpu = Cpu6502::new(ArrayMemory::new());
    assert_eq!(
        cpu.load_program(&[0x01]),
        Err(CpuError::ProgramTooShort { len: 1 })
    );
    assert_eq!(
        cpu.load_program(&[0xFF, 0xFF, 0x11, 0x22]),
        Err(CpuError::ProgramOverflow {
            start: 0xFFFF,
            len: 2
        })
    );
    assert_eq!(cpu.peek(0xFFFF), 0x00);
    // exactly reaching $FFFF is fine
    assert_eq!(cpu.load_program(&[0xFE, 0xFF, 0x11, 0x22]), Ok(0xFFFE));
    assert_eq!(cpu.peek(0xFFFF), 0x22);
}

#[test]
fn header_only_image_writes_nothing() {
    let mut cpu = Cpu6502::new(ArrayMemory::new());
    assert_eq!(cpu.load_program(&[0x00, 0xC0]), Ok(0xC000));
    assert!(cpu.memory.data.iter().all(|&b| b == 0));
}

#[test]
fn with_memory_keeps_registers() {
    let mut cpu = cpu_with(0x0800, &[0xA9, 0x33]);
    cpu.step().unwrap();
    let moved = cpu.with_memory(ArrayMemory::new());
    assert_eq!(moved.regs.a, 0x33);
    assert_eq!(moved.cycles, 2);
}
