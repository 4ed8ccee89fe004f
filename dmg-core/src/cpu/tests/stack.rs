use super::{hash_map, run_program, run_test, ExpectedState};

use crate::cpu::registers::CpuRegisterPair;

// (pair, LD rr opcode, PUSH opcode, POP opcode)
const LOADABLE_PAIRS: [(CpuRegisterPair, u8, u8, u8); 3] = [
    (CpuRegisterPair::BC, 0x01, 0xC5, 0xC1),
    (CpuRegisterPair::DE, 0x11, 0xD5, 0xD1),
    (CpuRegisterPair::HL, 0x21, 0xE5, 0xE1),
];

#[test]
fn push_pop_round_trip() {
    for (src, load_opcode, push_opcode, _) in LOADABLE_PAIRS {
        for (dst, _, _, pop_opcode) in LOADABLE_PAIRS {
            let value: u16 = rand::random();
            let [lsb, msb] = value.to_le_bytes();

            // LD <src>, <value>; PUSH <src>; POP <dst>
            let program = format!("{load_opcode:02x}{lsb:02x}{msb:02x}{push_opcode:02x}{pop_opcode:02x}");

            run_program(&program, |cpu_registers, address_space, _| {
                assert_eq!(
                    value,
                    cpu_registers.read_register_pair(dst),
                    "PUSH {src} / POP {dst} with value {value:04X}"
                );
                assert_eq!(0xFFFE, cpu_registers.sp);
                assert_eq!(Ok(value), address_space.read_address_u16(0xFFFC));
            })
            .unwrap();
        }
    }
}

#[test]
fn push_pop_af() {
    for _ in 0..16 {
        let value: u16 = rand::random();
        let [lsb, msb] = value.to_le_bytes();

        // LD BC, <value>; PUSH BC; POP AF; PUSH AF; POP DE
        let program = format!("01{lsb:02x}{msb:02x}C5F1F5D1");

        run_program(&program, |cpu_registers, _, _| {
            // Low nibble of F does not exist
            assert_eq!(value & 0xFFF0, cpu_registers.af());
            assert_eq!(value & 0xFFF0, cpu_registers.de());
            assert_eq!(0xFFFE, cpu_registers.sp);
        })
        .unwrap();
    }
}

#[test]
fn push_layout() {
    run_test(
        // LD SP, 0xD000; LD DE, 0xA1B2; PUSH DE
        "3100D011B2A1D5",
        &ExpectedState {
            sp: Some(0xCFFE),
            memory: hash_map! {
                0xCFFE: 0xB2,
                0xCFFF: 0xA1,
            },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // SCF; PUSH AF
        "37F5",
        &ExpectedState {
            sp: Some(0xFFFC),
            memory: hash_map! {
                // Power-on A=0x01 with Z and C set
                0xFFFC: 0x90,
                0xFFFD: 0x01,
            },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn pop_layout() {
    run_test(
        // LD HL, 0xFF90; LD (HL), 0x5F; INC HL; LD (HL), 0x3C; LD SP, 0xFF90; POP AF
        "2190FF365F23363C3190FFF1",
        &ExpectedState {
            a: Some(0x3C),
            f: Some(0x50),
            sp: Some(0xFF92),
            ..ExpectedState::empty()
        },
    );
}
