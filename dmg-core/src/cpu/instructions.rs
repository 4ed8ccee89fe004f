mod parse;

use crate::cpu::registers::{CpuRegister, CpuRegisterPair, CpuRegisters};
use crate::interrupts::InterruptController;
use crate::memory::{AddressSpace, MemoryError};
use std::fmt::Formatter;
use thiserror::Error;

pub use parse::{parse_next_instruction, ParseError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("memory fault while executing instruction: {source}")]
    Memory {
        #[from]
        source: MemoryError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCondition {
    NZ,
    Z,
    NC,
    C,
}

impl JumpCondition {
    fn check(self, cpu_registers: &CpuRegisters) -> bool {
        match self {
            Self::NZ => !cpu_registers.zero_flag(),
            Self::Z => cpu_registers.zero_flag(),
            Self::NC => !cpu_registers.carry_flag(),
            Self::C => cpu_registers.carry_flag(),
        }
    }
}

impl std::fmt::Display for JumpCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NZ => "NZ",
            Self::Z => "Z",
            Self::NC => "NC",
            Self::C => "C",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    Register(CpuRegister),
    Immediate(u8),
    IndirectHL,
    IndirectBC,
    IndirectDE,
    IndirectHLInc,
    IndirectHLDec,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
}

impl ReadTarget {
    fn read_value(
        self,
        cpu_registers: &mut CpuRegisters,
        address_space: &AddressSpace<'_>,
    ) -> Result<u8, MemoryError> {
        let value = match self {
            Self::Register(register) => cpu_registers.read_register(register),
            Self::Immediate(n) => n,
            Self::IndirectHL => address_space.read_address_u8(cpu_registers.hl())?,
            Self::IndirectBC => address_space.read_address_u8(cpu_registers.bc())?,
            Self::IndirectDE => address_space.read_address_u8(cpu_registers.de())?,
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                let value = address_space.read_address_u8(hl)?;
                cpu_registers.set_hl(hl.wrapping_add(1));
                value
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                let value = address_space.read_address_u8(hl)?;
                cpu_registers.set_hl(hl.wrapping_sub(1));
                value
            }
            Self::Direct(nn) => address_space.read_address_u8(nn)?,
            Self::FFDirect(n) => address_space.read_address_u8(u16::from_be_bytes([0xFF, n]))?,
            Self::FFIndirectC => {
                address_space.read_address_u8(u16::from_be_bytes([0xFF, cpu_registers.c]))?
            }
        };

        Ok(value)
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(_) => 0,
            Self::Immediate(_)
            | Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::FFIndirectC => 1,
            Self::FFDirect(_) => 2,
            Self::Direct(_) => 3,
        }
    }
}

impl std::fmt::Display for ReadTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register(register) => write!(f, "{register}"),
            Self::Immediate(n) => write!(f, "0x{n:02X}"),
            Self::IndirectHL => write!(f, "(HL)"),
            Self::IndirectBC => write!(f, "(BC)"),
            Self::IndirectDE => write!(f, "(DE)"),
            Self::IndirectHLInc => write!(f, "(HL+)"),
            Self::IndirectHLDec => write!(f, "(HL-)"),
            Self::Direct(nn) => write!(f, "(0x{nn:04X})"),
            Self::FFDirect(n) => write!(f, "(0xFF{n:02X})"),
            Self::FFIndirectC => write!(f, "(0xFF00+C)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Register(CpuRegister),
    IndirectHL,
    IndirectBC,
    IndirectDE,
    IndirectHLInc,
    IndirectHLDec,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
}

impl WriteTarget {
    fn write_value(
        self,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace<'_>,
        value: u8,
    ) -> Result<(), MemoryError> {
        match self {
            Self::Register(register) => {
                cpu_registers.set_register(register, value);
            }
            Self::IndirectHL => {
                address_space.write_address_u8(cpu_registers.hl(), value)?;
            }
            Self::IndirectBC => {
                address_space.write_address_u8(cpu_registers.bc(), value)?;
            }
            Self::IndirectDE => {
                address_space.write_address_u8(cpu_registers.de(), value)?;
            }
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value)?;
                cpu_registers.set_hl(hl.wrapping_add(1));
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value)?;
                cpu_registers.set_hl(hl.wrapping_sub(1));
            }
            Self::Direct(nn) => {
                address_space.write_address_u8(nn, value)?;
            }
            Self::FFDirect(n) => {
                address_space.write_address_u8(u16::from_be_bytes([0xFF, n]), value)?;
            }
            Self::FFIndirectC => {
                address_space
                    .write_address_u8(u16::from_be_bytes([0xFF, cpu_registers.c]), value)?;
            }
        }

        Ok(())
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(_) => 0,
            Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::FFIndirectC => 1,
            Self::FFDirect(_) => 2,
            Self::Direct(_) => 3,
        }
    }
}

impl std::fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register(register) => write!(f, "{register}"),
            Self::IndirectHL => write!(f, "(HL)"),
            Self::IndirectBC => write!(f, "(BC)"),
            Self::IndirectDE => write!(f, "(DE)"),
            Self::IndirectHLInc => write!(f, "(HL+)"),
            Self::IndirectHLDec => write!(f, "(HL-)"),
            Self::Direct(nn) => write!(f, "(0x{nn:04X})"),
            Self::FFDirect(n) => write!(f, "(0xFF{n:02X})"),
            Self::FFIndirectC => write!(f, "(0xFF00+C)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyTarget {
    Register(CpuRegister),
    IndirectHL,
}

impl ModifyTarget {
    fn read_value(
        self,
        cpu_registers: &CpuRegisters,
        address_space: &AddressSpace<'_>,
    ) -> Result<u8, MemoryError> {
        match self {
            Self::Register(register) => Ok(cpu_registers.read_register(register)),
            Self::IndirectHL => address_space.read_address_u8(cpu_registers.hl()),
        }
    }

    fn write_value(
        self,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace<'_>,
        value: u8,
    ) -> Result<(), MemoryError> {
        match self {
            Self::Register(register) => {
                cpu_registers.set_register(register, value);
                Ok(())
            }
            Self::IndirectHL => address_space.write_address_u8(cpu_registers.hl(), value),
        }
    }
}

impl std::fmt::Display for ModifyTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register(register) => write!(f, "{register}"),
            Self::IndirectHL => write!(f, "(HL)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // LD r, r' / LD r, n / LD r, (HL) / LD (HL), r / LD (HL), n / LD A, (rr) / LD (rr), A /
    // LD A, (nn) / LD (nn), A / LDH A, (n) / LDH (n), A / LDH A, (C) / LDH (C), A /
    // LD A, (HL+) / LD (HL+), A / LD A, (HL-) / LD (HL-), A
    Load(WriteTarget, ReadTarget),
    // LD rr, nn
    LoadRegisterPairImmediate(CpuRegisterPair, u16),
    // LD (nn), SP
    LoadDirectStackPointer(u16),
    // LD SP, HL
    LoadStackPointerHL,
    // PUSH rr
    PushStack(CpuRegisterPair),
    // POP rr
    PopStack(CpuRegisterPair),
    // ADD r / ADD (HL) / ADD n
    Add(ReadTarget),
    // ADC r / ADC (HL) / ADC n
    AddWithCarry(ReadTarget),
    // SUB r / SUB (HL) / SUB n
    Subtract(ReadTarget),
    // SBC r / SBC (HL) / SBC n
    SubtractWithCarry(ReadTarget),
    // CP r / CP (HL) / CP n
    Compare(ReadTarget),
    // INC r / INC (HL)
    Increment(ModifyTarget),
    // DEC r / DEC (HL)
    Decrement(ModifyTarget),
    // AND r / AND (HL) / AND n
    And(ReadTarget),
    // OR r / OR (HL) / OR n
    Or(ReadTarget),
    // XOR r / XOR (HL) / XOR n
    Xor(ReadTarget),
    // ADD HL, rr
    AddHLRegister(CpuRegisterPair),
    // INC rr
    IncRegisterPair(CpuRegisterPair),
    // DEC rr
    DecRegisterPair(CpuRegisterPair),
    // SWAP r / SWAP (HL)
    Swap(ModifyTarget),
    // BIT n, r / BIT n, (HL)
    TestBit(u8, ReadTarget),
    // SET n, r / SET n, (HL)
    SetBit(u8, ModifyTarget),
    // RES n, r / RES n, (HL)
    ResetBit(u8, ModifyTarget),
    // CCF
    ComplementCarryFlag,
    // SCF
    SetCarryFlag,
    // CPL
    ComplementAccumulator,
    // JP nn
    Jump(u16),
    // JP HL
    JumpHL,
    // JP cc, nn
    JumpCond(JumpCondition, u16),
    // JR e
    RelativeJump(i8),
    // JR cc, e
    RelativeJumpCond(JumpCondition, i8),
    // CALL nn
    Call(u16),
    // CALL cc, nn
    CallCond(JumpCondition, u16),
    // RET
    Return,
    // RET cc
    ReturnCond(JumpCondition),
    // RETI
    ReturnFromInterruptHandler,
    // RST n
    RestartCall(u8),
    // DI
    DisableInterrupts,
    // EI
    EnableInterrupts,
    // NOP
    NoOp,
}

impl Instruction {
    /// Apply this instruction's effects. PC must already point past the instruction's bytes.
    pub fn execute(
        self,
        address_space: &mut AddressSpace<'_>,
        cpu_registers: &mut CpuRegisters,
        interrupt_controller: &mut InterruptController,
    ) -> Result<(), ExecutionError> {
        match self {
            Self::Load(write_target, read_target) => {
                let value = read_target.read_value(cpu_registers, address_space)?;
                write_target.write_value(cpu_registers, address_space, value)?;
            }
            Self::LoadRegisterPairImmediate(rr, nn) => {
                cpu_registers.set_register_pair(rr, nn);
            }
            Self::LoadDirectStackPointer(nn) => {
                address_space.write_address_u16(nn, cpu_registers.sp)?;
            }
            Self::LoadStackPointerHL => {
                cpu_registers.sp = cpu_registers.hl();
            }
            Self::PushStack(rr) => {
                let value = cpu_registers.read_register_pair(rr);
                push_stack(cpu_registers, address_space, value)?;
            }
            Self::PopStack(rr) => {
                let value = pop_stack(cpu_registers, address_space)?;
                cpu_registers.set_register_pair(rr, value);
            }
            Self::Add(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space)?;
                let (sum, carry, h_flag) = add(cpu_registers.accumulator, value, false);
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, carry);
            }
            Self::AddWithCarry(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space)?;
                let (sum, carry, h_flag) =
                    add(cpu_registers.accumulator, value, cpu_registers.carry_flag());
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, carry);
            }
            Self::Subtract(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space)?;
                let (difference, carry, h_flag) = sub(cpu_registers.accumulator, value, false);
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::SubtractWithCarry(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space)?;
                let (difference, carry, h_flag) =
                    sub(cpu_registers.accumulator, value, cpu_registers.carry_flag());
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::Compare(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space)?;
                let (difference, carry, h_flag) = sub(cpu_registers.accumulator, value, false);
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::Increment(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space)?;
                let incremented = value.wrapping_add(1);
                modify_target.write_value(cpu_registers, address_space, incremented)?;

                let h_flag = value & 0x0F == 0x0F;
                cpu_registers.set_some_flags(
                    Some(incremented == 0),
                    Some(false),
                    Some(h_flag),
                    None,
                );
            }
            Self::Decrement(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space)?;
                let decremented = value.wrapping_sub(1);
                modify_target.write_value(cpu_registers, address_space, decremented)?;

                let h_flag = value & 0x0F == 0x00;
                cpu_registers.set_some_flags(
                    Some(decremented == 0),
                    Some(true),
                    Some(h_flag),
                    None,
                );
            }
            Self::And(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space)?;
                cpu_registers.accumulator &= value;
                cpu_registers.set_flags(cpu_registers.accumulator == 0, false, true, false);
            }
            Self::Or(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space)?;
                cpu_registers.accumulator |= value;
                cpu_registers.set_flags(cpu_registers.accumulator == 0, false, false, false);
            }
            Self::Xor(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space)?;
                cpu_registers.accumulator ^= value;
                cpu_registers.set_flags(cpu_registers.accumulator == 0, false, false, false);
            }
            Self::AddHLRegister(rr) => {
                let hl = cpu_registers.hl();
                let value = cpu_registers.read_register_pair(rr);
                let (sum, carry) = hl.overflowing_add(value);
                let h_flag = (hl & 0x0FFF) + (value & 0x0FFF) >= 0x1000;

                cpu_registers.set_hl(sum);
                cpu_registers.set_some_flags(None, Some(false), Some(h_flag), Some(carry));
            }
            Self::IncRegisterPair(rr) => {
                let value = cpu_registers.read_register_pair(rr);
                cpu_registers.set_register_pair(rr, value.wrapping_add(1));
            }
            Self::DecRegisterPair(rr) => {
                let value = cpu_registers.read_register_pair(rr);
                cpu_registers.set_register_pair(rr, value.wrapping_sub(1));
            }
            Self::Swap(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space)?;
                let swapped = value.rotate_left(4);
                modify_target.write_value(cpu_registers, address_space, swapped)?;
                cpu_registers.set_flags(swapped == 0, false, false, false);
            }
            Self::TestBit(bit, read_target) => {
                let value = read_target.read_value(cpu_registers, address_space)?;
                let is_set = value & (1 << bit) != 0;
                cpu_registers.set_some_flags(Some(!is_set), Some(false), Some(true), None);
            }
            Self::SetBit(bit, modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space)?;
                modify_target.write_value(cpu_registers, address_space, value | (1 << bit))?;
            }
            Self::ResetBit(bit, modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space)?;
                modify_target.write_value(cpu_registers, address_space, value & !(1 << bit))?;
            }
            Self::ComplementCarryFlag => {
                let carry = cpu_registers.carry_flag();
                cpu_registers.set_some_flags(None, Some(false), Some(false), Some(!carry));
            }
            Self::SetCarryFlag => {
                cpu_registers.set_some_flags(None, Some(false), Some(false), Some(true));
            }
            Self::ComplementAccumulator => {
                cpu_registers.accumulator = !cpu_registers.accumulator;
                cpu_registers.set_some_flags(None, Some(true), Some(true), None);
            }
            Self::Jump(nn) => {
                cpu_registers.pc = nn;
            }
            Self::JumpHL => {
                cpu_registers.pc = cpu_registers.hl();
            }
            Self::JumpCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = nn;
                }
            }
            Self::RelativeJump(e) => {
                cpu_registers.pc = cpu_registers.pc.wrapping_add_signed(e.into());
            }
            Self::RelativeJumpCond(cc, e) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = cpu_registers.pc.wrapping_add_signed(e.into());
                }
            }
            Self::Call(nn) => {
                let return_address = cpu_registers.pc;
                push_stack(cpu_registers, address_space, return_address)?;
                cpu_registers.pc = nn;
            }
            Self::CallCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    let return_address = cpu_registers.pc;
                    push_stack(cpu_registers, address_space, return_address)?;
                    cpu_registers.pc = nn;
                }
            }
            Self::Return => {
                cpu_registers.pc = pop_stack(cpu_registers, address_space)?;
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = pop_stack(cpu_registers, address_space)?;
                }
            }
            Self::ReturnFromInterruptHandler => {
                cpu_registers.pc = pop_stack(cpu_registers, address_space)?;
                interrupt_controller.enable();
            }
            Self::RestartCall(rst_address) => {
                let return_address = cpu_registers.pc;
                push_stack(cpu_registers, address_space, return_address)?;
                cpu_registers.pc = u16::from(rst_address);
            }
            Self::DisableInterrupts => {
                interrupt_controller.disable();
            }
            Self::EnableInterrupts => {
                interrupt_controller.enable();
            }
            Self::NoOp => {}
        }

        Ok(())
    }

    /// Return the number of machine cycles this instruction takes. Must be called before
    /// `execute`, since conditional branches depend on the flags as they were before the
    /// instruction ran.
    pub fn cycles_required(self, cpu_registers: &CpuRegisters) -> u32 {
        match self {
            Self::Load(write_target, read_target) => {
                1 + write_target.cycles_required() + read_target.cycles_required()
            }
            Self::Add(read_target)
            | Self::AddWithCarry(read_target)
            | Self::Subtract(read_target)
            | Self::SubtractWithCarry(read_target)
            | Self::Compare(read_target)
            | Self::And(read_target)
            | Self::Or(read_target)
            | Self::Xor(read_target) => 1 + read_target.cycles_required(),
            Self::Increment(modify_target) | Self::Decrement(modify_target) => match modify_target
            {
                ModifyTarget::Register(_) => 1,
                ModifyTarget::IndirectHL => 3,
            },
            Self::Swap(modify_target)
            | Self::SetBit(_, modify_target)
            | Self::ResetBit(_, modify_target) => match modify_target {
                ModifyTarget::Register(_) => 2,
                ModifyTarget::IndirectHL => 4,
            },
            Self::TestBit(_, read_target) => 2 + read_target.cycles_required(),
            Self::LoadRegisterPairImmediate(..) => 3,
            Self::LoadDirectStackPointer(..) => 5,
            Self::LoadStackPointerHL
            | Self::AddHLRegister(..)
            | Self::IncRegisterPair(..)
            | Self::DecRegisterPair(..) => 2,
            Self::PushStack(..)
            | Self::Jump(..)
            | Self::Return
            | Self::ReturnFromInterruptHandler
            | Self::RestartCall(..) => 4,
            Self::PopStack(..) | Self::RelativeJump(..) => 3,
            Self::JumpCond(cc, _) => {
                if cc.check(cpu_registers) {
                    4
                } else {
                    3
                }
            }
            Self::RelativeJumpCond(cc, _) => {
                if cc.check(cpu_registers) {
                    3
                } else {
                    2
                }
            }
            Self::Call(..) => 6,
            Self::CallCond(cc, _) => {
                if cc.check(cpu_registers) {
                    6
                } else {
                    3
                }
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    5
                } else {
                    2
                }
            }
            Self::JumpHL
            | Self::ComplementCarryFlag
            | Self::SetCarryFlag
            | Self::ComplementAccumulator
            | Self::DisableInterrupts
            | Self::EnableInterrupts
            | Self::NoOp => 1,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(write_target, ReadTarget::FFDirect(n)) => {
                write!(f, "LDH {write_target}, (0xFF{n:02X})")
            }
            Self::Load(WriteTarget::FFDirect(n), read_target) => {
                write!(f, "LDH (0xFF{n:02X}), {read_target}")
            }
            Self::Load(write_target, read_target) => write!(f, "LD {write_target}, {read_target}"),
            Self::LoadRegisterPairImmediate(rr, nn) => write!(f, "LD {rr}, 0x{nn:04X}"),
            Self::LoadDirectStackPointer(nn) => write!(f, "LD (0x{nn:04X}), SP"),
            Self::LoadStackPointerHL => write!(f, "LD SP, HL"),
            Self::PushStack(rr) => write!(f, "PUSH {rr}"),
            Self::PopStack(rr) => write!(f, "POP {rr}"),
            Self::Add(read_target) => write!(f, "ADD A, {read_target}"),
            Self::AddWithCarry(read_target) => write!(f, "ADC A, {read_target}"),
            Self::Subtract(read_target) => write!(f, "SUB {read_target}"),
            Self::SubtractWithCarry(read_target) => write!(f, "SBC A, {read_target}"),
            Self::Compare(read_target) => write!(f, "CP {read_target}"),
            Self::Increment(modify_target) => write!(f, "INC {modify_target}"),
            Self::Decrement(modify_target) => write!(f, "DEC {modify_target}"),
            Self::And(read_target) => write!(f, "AND {read_target}"),
            Self::Or(read_target) => write!(f, "OR {read_target}"),
            Self::Xor(read_target) => write!(f, "XOR {read_target}"),
            Self::AddHLRegister(rr) => write!(f, "ADD HL, {rr}"),
            Self::IncRegisterPair(rr) => write!(f, "INC {rr}"),
            Self::DecRegisterPair(rr) => write!(f, "DEC {rr}"),
            Self::Swap(modify_target) => write!(f, "SWAP {modify_target}"),
            Self::TestBit(bit, read_target) => write!(f, "BIT {bit}, {read_target}"),
            Self::SetBit(bit, modify_target) => write!(f, "SET {bit}, {modify_target}"),
            Self::ResetBit(bit, modify_target) => write!(f, "RES {bit}, {modify_target}"),
            Self::ComplementCarryFlag => write!(f, "CCF"),
            Self::SetCarryFlag => write!(f, "SCF"),
            Self::ComplementAccumulator => write!(f, "CPL"),
            Self::Jump(nn) => write!(f, "JP 0x{nn:04X}"),
            Self::JumpHL => write!(f, "JP HL"),
            Self::JumpCond(cc, nn) => write!(f, "JP {cc}, 0x{nn:04X}"),
            Self::RelativeJump(e) => write!(f, "JR {e}"),
            Self::RelativeJumpCond(cc, e) => write!(f, "JR {cc}, {e}"),
            Self::Call(nn) => write!(f, "CALL 0x{nn:04X}"),
            Self::CallCond(cc, nn) => write!(f, "CALL {cc}, 0x{nn:04X}"),
            Self::Return => write!(f, "RET"),
            Self::ReturnCond(cc) => write!(f, "RET {cc}"),
            Self::ReturnFromInterruptHandler => write!(f, "RETI"),
            Self::RestartCall(rst_address) => write!(f, "RST 0x{rst_address:02X}"),
            Self::DisableInterrupts => write!(f, "DI"),
            Self::EnableInterrupts => write!(f, "EI"),
            Self::NoOp => write!(f, "NOP"),
        }
    }
}

/// Decrement SP by 2, then write the value at the new SP.
pub(crate) fn push_stack(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace<'_>,
    value: u16,
) -> Result<(), MemoryError> {
    cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
    address_space.write_address_u16(cpu_registers.sp, value)
}

/// Read the value at SP, then increment SP by 2.
fn pop_stack(
    cpu_registers: &mut CpuRegisters,
    address_space: &AddressSpace<'_>,
) -> Result<u16, MemoryError> {
    let value = address_space.read_address_u16(cpu_registers.sp)?;
    cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
    Ok(value)
}

// Returns (sum, carry, half_carry)
fn add(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);

    let (sum, overflowed_r) = l_value.overflowing_add(r_value);
    let (sum, overflowed_c) = sum.overflowing_add(carry);

    let h_flag = (l_value & 0x0F) + (r_value & 0x0F) + carry > 0x0F;

    (sum, overflowed_r || overflowed_c, h_flag)
}

// Returns (difference, borrow, half_borrow)
fn sub(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);

    let (difference, underflowed_r) = l_value.overflowing_sub(r_value);
    let (difference, underflowed_c) = difference.overflowing_sub(carry);

    let h_flag = l_value & 0x0F < (r_value & 0x0F) + carry;

    (difference, underflowed_r || underflowed_c, h_flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disassembly() {
        let cases = [
            (Instruction::NoOp, "NOP"),
            (
                Instruction::Load(
                    WriteTarget::Register(CpuRegister::A),
                    ReadTarget::IndirectHLInc,
                ),
                "LD A, (HL+)",
            ),
            (
                Instruction::Load(WriteTarget::FFDirect(0x40), ReadTarget::Register(CpuRegister::A)),
                "LDH (0xFF40), A",
            ),
            (
                Instruction::LoadRegisterPairImmediate(CpuRegisterPair::SP, 0xDFFF),
                "LD SP, 0xDFFF",
            ),
            (Instruction::JumpCond(JumpCondition::NZ, 0x1234), "JP NZ, 0x1234"),
            (Instruction::RelativeJump(-2), "JR -2"),
            (Instruction::TestBit(7, ReadTarget::IndirectHL), "BIT 7, (HL)"),
            (Instruction::RestartCall(0x38), "RST 0x38"),
        ];

        for (instruction, expected) in cases {
            assert_eq!(expected, instruction.to_string());
        }
    }

    #[test]
    fn add_sub_helpers() {
        assert_eq!((0x10, false, true), add(0x0F, 0x01, false));
        assert_eq!((0x00, true, true), add(0xFF, 0x00, true));
        assert_eq!((0x0F, false, true), sub(0x10, 0x01, false));
        assert_eq!((0xFF, true, true), sub(0x00, 0x00, true));
        assert_eq!((0x20, false, false), sub(0x30, 0x10, false));
    }
}
