use crate::cpu::instructions::{Instruction, JumpCondition, ModifyTarget, ReadTarget, WriteTarget};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair};
use crate::memory::{AddressSpace, MemoryError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unimplemented opcode 0x{opcode:02X} at address 0x{address:04X}")]
    UnimplementedOpcode { opcode: u8, address: u16 },
    #[error("unimplemented CB-prefixed opcode 0x{opcode:02X} at address 0x{address:04X}")]
    UnimplementedCbOpcode { opcode: u8, address: u16 },
    #[error("memory fault while fetching instruction: {source}")]
    Memory {
        #[from]
        source: MemoryError,
    },
}

/// Decode the instruction at `pc`. Returns the instruction along with the address of the
/// instruction that follows it.
pub fn parse_next_instruction(
    address_space: &AddressSpace<'_>,
    pc: u16,
) -> Result<(Instruction, u16), ParseError> {
    let opcode = address_space.read_address_u8(pc)?;

    let read_u8_operand = || address_space.read_address_u8(pc.wrapping_add(1));
    let read_u16_operand = || -> Result<u16, MemoryError> {
        let lsb = address_space.read_address_u8(pc.wrapping_add(1))?;
        let msb = address_space.read_address_u8(pc.wrapping_add(2))?;
        Ok(u16::from_le_bytes([lsb, msb]))
    };

    let (instruction, length) = match opcode {
        0x00 => (Instruction::NoOp, 1),
        0x01 | 0x11 | 0x21 | 0x31 => {
            let rr = register_pair_for_other_ops(opcode);
            let nn = read_u16_operand()?;
            (Instruction::LoadRegisterPairImmediate(rr, nn), 3)
        }
        0x02 => (
            Instruction::Load(WriteTarget::IndirectBC, ReadTarget::Register(CpuRegister::A)),
            1,
        ),
        0x03 | 0x13 | 0x23 | 0x33 => {
            let rr = register_pair_for_other_ops(opcode);
            (Instruction::IncRegisterPair(rr), 1)
        }
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            let modify_target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register);
            (Instruction::Increment(modify_target), 1)
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            let modify_target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register);
            (Instruction::Decrement(modify_target), 1)
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            let write_target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(WriteTarget::IndirectHL, WriteTarget::Register);
            let n = read_u8_operand()?;
            (Instruction::Load(write_target, ReadTarget::Immediate(n)), 2)
        }
        0x08 => {
            let nn = read_u16_operand()?;
            (Instruction::LoadDirectStackPointer(nn), 3)
        }
        0x09 | 0x19 | 0x29 | 0x39 => {
            let rr = register_pair_for_other_ops(opcode);
            (Instruction::AddHLRegister(rr), 1)
        }
        0x0A => (
            Instruction::Load(WriteTarget::Register(CpuRegister::A), ReadTarget::IndirectBC),
            1,
        ),
        0x0B | 0x1B | 0x2B | 0x3B => {
            let rr = register_pair_for_other_ops(opcode);
            (Instruction::DecRegisterPair(rr), 1)
        }
        0x12 => (
            Instruction::Load(WriteTarget::IndirectDE, ReadTarget::Register(CpuRegister::A)),
            1,
        ),
        0x18 => {
            let e = read_u8_operand()? as i8;
            (Instruction::RelativeJump(e), 2)
        }
        0x1A => (
            Instruction::Load(WriteTarget::Register(CpuRegister::A), ReadTarget::IndirectDE),
            1,
        ),
        0x20 | 0x28 | 0x30 | 0x38 => {
            let cc = parse_jump_condition(opcode);
            let e = read_u8_operand()? as i8;
            (Instruction::RelativeJumpCond(cc, e), 2)
        }
        0x22 => (
            Instruction::Load(WriteTarget::IndirectHLInc, ReadTarget::Register(CpuRegister::A)),
            1,
        ),
        0x2A => (
            Instruction::Load(WriteTarget::Register(CpuRegister::A), ReadTarget::IndirectHLInc),
            1,
        ),
        0x2F => (Instruction::ComplementAccumulator, 1),
        0x32 => (
            Instruction::Load(WriteTarget::IndirectHLDec, ReadTarget::Register(CpuRegister::A)),
            1,
        ),
        0x37 => (Instruction::SetCarryFlag, 1),
        0x3A => (
            Instruction::Load(WriteTarget::Register(CpuRegister::A), ReadTarget::IndirectHLDec),
            1,
        ),
        0x3F => (Instruction::ComplementCarryFlag, 1),
        // 0x76 (HALT) sits in the middle of the LD block
        opcode @ (0x40..=0x75 | 0x77..=0x7F) => {
            let write_target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(WriteTarget::IndirectHL, WriteTarget::Register);
            let read_target = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(ReadTarget::IndirectHL, ReadTarget::Register);
            (Instruction::Load(write_target, read_target), 1)
        }
        opcode @ 0x80..=0xBF => {
            let read_target = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(ReadTarget::IndirectHL, ReadTarget::Register);
            (alu_instruction(opcode, read_target), 1)
        }
        0xC0 | 0xC8 | 0xD0 | 0xD8 => {
            let cc = parse_jump_condition(opcode);
            (Instruction::ReturnCond(cc), 1)
        }
        0xC1 | 0xD1 | 0xE1 | 0xF1 => {
            let rr = register_pair_for_push_pop(opcode);
            (Instruction::PopStack(rr), 1)
        }
        0xC2 | 0xCA | 0xD2 | 0xDA => {
            let cc = parse_jump_condition(opcode);
            let nn = read_u16_operand()?;
            (Instruction::JumpCond(cc, nn), 3)
        }
        0xC3 => {
            let nn = read_u16_operand()?;
            (Instruction::Jump(nn), 3)
        }
        0xC4 | 0xCC | 0xD4 | 0xDC => {
            let cc = parse_jump_condition(opcode);
            let nn = read_u16_operand()?;
            (Instruction::CallCond(cc, nn), 3)
        }
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            let rr = register_pair_for_push_pop(opcode);
            (Instruction::PushStack(rr), 1)
        }
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            let n = read_u8_operand()?;
            (alu_instruction(opcode, ReadTarget::Immediate(n)), 2)
        }
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            let rst_address = opcode & 0x38;
            (Instruction::RestartCall(rst_address), 1)
        }
        0xC9 => (Instruction::Return, 1),
        0xCB => (parse_cb_prefixed_opcode(address_space, pc)?, 2),
        0xCD => {
            let nn = read_u16_operand()?;
            (Instruction::Call(nn), 3)
        }
        0xD9 => (Instruction::ReturnFromInterruptHandler, 1),
        0xE0 => {
            let n = read_u8_operand()?;
            (
                Instruction::Load(WriteTarget::FFDirect(n), ReadTarget::Register(CpuRegister::A)),
                2,
            )
        }
        0xE2 => (
            Instruction::Load(WriteTarget::FFIndirectC, ReadTarget::Register(CpuRegister::A)),
            1,
        ),
        0xE9 => (Instruction::JumpHL, 1),
        0xEA => {
            let nn = read_u16_operand()?;
            (
                Instruction::Load(WriteTarget::Direct(nn), ReadTarget::Register(CpuRegister::A)),
                3,
            )
        }
        0xF0 => {
            let n = read_u8_operand()?;
            (
                Instruction::Load(WriteTarget::Register(CpuRegister::A), ReadTarget::FFDirect(n)),
                2,
            )
        }
        0xF2 => (
            Instruction::Load(WriteTarget::Register(CpuRegister::A), ReadTarget::FFIndirectC),
            1,
        ),
        0xF3 => (Instruction::DisableInterrupts, 1),
        0xF9 => (Instruction::LoadStackPointerHL, 1),
        0xFA => {
            let nn = read_u16_operand()?;
            (
                Instruction::Load(WriteTarget::Register(CpuRegister::A), ReadTarget::Direct(nn)),
                3,
            )
        }
        0xFB => (Instruction::EnableInterrupts, 1),
        _ => {
            return Err(ParseError::UnimplementedOpcode {
                opcode,
                address: pc,
            });
        }
    };

    Ok((instruction, pc.wrapping_add(length)))
}

fn parse_cb_prefixed_opcode(
    address_space: &AddressSpace<'_>,
    pc: u16,
) -> Result<Instruction, ParseError> {
    let opcode = address_space.read_address_u8(pc.wrapping_add(1))?;
    let bit = (opcode & 0x38) >> 3;

    let instruction = match opcode {
        opcode @ 0x30..=0x37 => {
            let modify_target = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register);
            Instruction::Swap(modify_target)
        }
        opcode @ 0x40..=0x7F => {
            let read_target = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(ReadTarget::IndirectHL, ReadTarget::Register);
            Instruction::TestBit(bit, read_target)
        }
        opcode @ 0x80..=0xBF => {
            let modify_target = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register);
            Instruction::ResetBit(bit, modify_target)
        }
        opcode @ 0xC0..=0xFF => {
            let modify_target = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register);
            Instruction::SetBit(bit, modify_target)
        }
        // Rotates and shifts
        _ => {
            return Err(ParseError::UnimplementedCbOpcode {
                opcode,
                address: pc,
            });
        }
    };

    Ok(instruction)
}

// ADD/ADC/SUB/SBC/AND/XOR/OR/CP share bits 3-5 between the register and immediate forms
fn alu_instruction(opcode: u8, read_target: ReadTarget) -> Instruction {
    match opcode & 0x38 {
        0x00 => Instruction::Add(read_target),
        0x08 => Instruction::AddWithCarry(read_target),
        0x10 => Instruction::Subtract(read_target),
        0x18 => Instruction::SubtractWithCarry(read_target),
        0x20 => Instruction::And(read_target),
        0x28 => Instruction::Xor(read_target),
        0x30 => Instruction::Or(read_target),
        0x38 => Instruction::Compare(read_target),
        _ => unreachable!("opcode & 0x38 is always one of the eight values above"),
    }
}

fn register_pair_for_other_ops(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        0x30 => CpuRegisterPair::SP,
        _ => unreachable!("opcode & 0x30 is always 0x00/0x10/0x20/0x30"),
    }
}

fn register_pair_for_push_pop(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        0x30 => CpuRegisterPair::AF,
        _ => unreachable!("opcode & 0x30 is always 0x00/0x10/0x20/0x30"),
    }
}

fn parse_jump_condition(opcode: u8) -> JumpCondition {
    match opcode & 0x18 {
        0x00 => JumpCondition::NZ,
        0x08 => JumpCondition::Z,
        0x10 => JumpCondition::NC,
        0x18 => JumpCondition::C,
        _ => unreachable!("opcode & 0x18 is always 0x00/0x08/0x10/0x18"),
    }
}
