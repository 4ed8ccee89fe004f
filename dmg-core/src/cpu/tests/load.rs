use super::{hash_map, run_test, set_in_state, ExpectedState, ALL_REGISTERS};

use crate::cpu::registers::CpuRegister;

#[test]
fn load_register_immediate() {
    for (i, r) in ALL_REGISTERS.into_iter().enumerate() {
        let opcode = 0x06 | (r.to_opcode_bits() << 3);
        let n = 0x31 + 0x11 * i as u8;

        let mut expected_state = ExpectedState::empty();
        set_in_state(&mut expected_state, r, n);

        // LD <r>, <n>
        run_test(&format!("{opcode:02x}{n:02x}"), &expected_state);
    }
}

#[test]
fn load_register_register() {
    for src in ALL_REGISTERS {
        // LD <src>, 0x9C
        let preload = 0x06 | (src.to_opcode_bits() << 3);
        let preload_hex = format!("{preload:02x}9C");

        for dst in ALL_REGISTERS {
            // LD <dst>, <src>
            let opcode = 0x40 | (dst.to_opcode_bits() << 3) | src.to_opcode_bits();

            let mut expected_state = ExpectedState::empty();
            set_in_state(&mut expected_state, src, 0x9C);
            set_in_state(&mut expected_state, dst, 0x9C);

            run_test(&format!("{preload_hex}{opcode:02x}"), &expected_state);
        }
    }
}

#[test]
fn load_register_pair_immediate() {
    run_test(
        // LD BC, 0x1357; LD DE, 0x9BDF; LD HL, 0x0246; LD SP, 0xC8E0
        "01571311DF9B21460231E0C8",
        &ExpectedState {
            b: Some(0x13),
            c: Some(0x57),
            d: Some(0x9B),
            e: Some(0xDF),
            h: Some(0x02),
            l: Some(0x46),
            sp: Some(0xC8E0),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_register_indirect_hl() {
    for r in ALL_REGISTERS {
        let opcode = 0x46 | (r.to_opcode_bits() << 3);

        // LD HL, 0xC2F0; LD (HL), 0x6D; LD <r>, (HL)
        let mut expected_state = ExpectedState {
            memory: hash_map! { 0xC2F0: 0x6D },
            ..ExpectedState::empty()
        };
        set_in_state(&mut expected_state, r, 0x6D);

        run_test(&format!("21F0C2366D{opcode:02x}"), &expected_state);
    }
}

#[test]
fn load_register_from_rom() {
    run_test(
        // LD HL, 0x0157; LD A, (HL); JP 0x0200; <data 0xE4>
        "2157017EC30002E4",
        &ExpectedState {
            a: Some(0xE4),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_hl_register() {
    for r in ALL_REGISTERS {
        let preload = 0x06 | (r.to_opcode_bits() << 3);
        let opcode = 0x70 | r.to_opcode_bits();

        // Writing H or L stores the half of the address itself
        let expected_value = match r {
            CpuRegister::H => 0xDA,
            CpuRegister::L => 0x13,
            _ => 0x5E,
        };

        // LD <r>, 0x5E; LD HL, 0xDA13; LD (HL), <r>
        run_test(
            &format!("{preload:02x}5E2113DA{opcode:02x}"),
            &ExpectedState {
                memory: hash_map! { 0xDA13: expected_value },
                ..ExpectedState::empty()
            },
        );
    }
}

#[test]
fn load_indirect_hl_immediate() {
    run_test(
        // LD HL, 0xFF90; LD (HL), 0xA1
        "2190FF36A1",
        &ExpectedState {
            memory: hash_map! { 0xFF90: 0xA1 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn rom_writes_ignored() {
    run_test(
        // LD HL, 0x0150; LD (HL), 0xFF; LD A, (HL)
        "21500136FF7E",
        &ExpectedState {
            // 0x21 is the first byte of the program itself
            a: Some(0x21),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_accumulator_indirect_bc_de() {
    run_test(
        // LD HL, 0xC400; LD (HL), 0x4B; LD BC, 0xC400; LD A, (BC)
        "2100C4364B0100C40A",
        &ExpectedState {
            a: Some(0x4B),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xD801; LD (HL), 0xB4; LD DE, 0xD801; LD A, (DE)
        "2101D836B41101D81A",
        &ExpectedState {
            a: Some(0xB4),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_bc_de_accumulator() {
    run_test(
        // LD A, 0x3C; LD BC, 0xC0FE; LD (BC), A; LD A, 0xC3; LD DE, 0xD0FE; LD (DE), A
        "3E3C01FEC0023EC311FED012",
        &ExpectedState {
            memory: hash_map! {
                0xC0FE: 0x3C,
                0xD0FE: 0xC3,
            },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_accumulator_direct() {
    run_test(
        // LD A, 0x88; LD (0xC77A), A; LD A, 0x00; LD A, (0xC77A)
        "3E88EA7AC73E00FA7AC7",
        &ExpectedState {
            a: Some(0x88),
            memory: hash_map! { 0xC77A: 0x88 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn ldh() {
    run_test(
        // LD A, 0x1F; LDH (0x85), A; LD A, 0x00; LDH A, (0x85)
        "3E1FE0853E00F085",
        &ExpectedState {
            a: Some(0x1F),
            memory: hash_map! { 0xFF85: 0x1F },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x2E; LD C, 0x86; LDH (C), A; LD A, 0x00; LDH A, (C)
        "3E2E0E86E23E00F2",
        &ExpectedState {
            a: Some(0x2E),
            c: Some(0x86),
            memory: hash_map! { 0xFF86: 0x2E },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn ldh_to_io_registers() {
    run_test(
        // LD A, 0x42; LDH (0x06), A; LDH A, (0x06)
        "3E42E006F006",
        &ExpectedState {
            a: Some(0x42),
            memory: hash_map! { 0xFF06: 0x42 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x99; LDH (0x44), A; LDH A, (0x44)
        // LY is read-only for the CPU
        "3E99E044F044",
        &ExpectedState {
            a: Some(0x00),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_hl_inc_dec() {
    run_test(
        // LD A, 0x71; LD HL, 0xCFFF; LD (HL+), A; LD (HL+), A
        "3E7121FFCF2222",
        &ExpectedState {
            h: Some(0xD0),
            l: Some(0x01),
            memory: hash_map! {
                0xCFFF: 0x71,
                0xD000: 0x71,
            },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x17; LD HL, 0xD000; LD (HL-), A; LD (HL-), A
        "3E172100D03232",
        &ExpectedState {
            h: Some(0xCF),
            l: Some(0xFE),
            memory: hash_map! {
                0xD000: 0x17,
                0xCFFF: 0x17,
            },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC010; LD (HL), 0xAB; LD A, (HL+)
        "2110C036AB2A",
        &ExpectedState {
            a: Some(0xAB),
            h: Some(0xC0),
            l: Some(0x11),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC100; LD (HL), 0xBA; LD A, (HL-)
        "2100C136BA3A",
        &ExpectedState {
            a: Some(0xBA),
            h: Some(0xC0),
            l: Some(0xFF),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_stack_pointer() {
    run_test(
        // LD HL, 0xDFF0; LD SP, HL
        "21F0DFF9",
        &ExpectedState {
            sp: Some(0xDFF0),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xBEEF; LD (0xC200), SP
        "31EFBE0800C2",
        &ExpectedState {
            memory: hash_map! {
                0xC200: 0xEF,
                0xC201: 0xBE,
            },
            ..ExpectedState::empty()
        },
    );
}
