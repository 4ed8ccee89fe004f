use serde::{Deserialize, Serialize};
use std::fmt::Formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegister {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl CpuRegister {
    /// Decode the 3-bit register field in bits 3-5 of an opcode. Returns None for (HL).
    pub fn from_mid_opcode_bits(opcode: u8) -> Option<Self> {
        Self::from_opcode_bits(opcode >> 3)
    }

    /// Decode the 3-bit register field in bits 0-2 of an opcode. Returns None for (HL).
    pub fn from_low_opcode_bits(opcode: u8) -> Option<Self> {
        Self::from_opcode_bits(opcode)
    }

    /// The 3-bit field value that selects this register in an opcode.
    pub fn to_opcode_bits(self) -> u8 {
        match self {
            Self::B => 0x00,
            Self::C => 0x01,
            Self::D => 0x02,
            Self::E => 0x03,
            Self::H => 0x04,
            Self::L => 0x05,
            Self::A => 0x07,
        }
    }

    fn from_opcode_bits(bits: u8) -> Option<Self> {
        match bits & 0x07 {
            0x00 => Some(Self::B),
            0x01 => Some(Self::C),
            0x02 => Some(Self::D),
            0x03 => Some(Self::E),
            0x04 => Some(Self::H),
            0x05 => Some(Self::L),
            0x07 => Some(Self::A),
            _ => None,
        }
    }
}

impl std::fmt::Display for CpuRegister {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::H => "H",
            Self::L => "L",
        };
        write!(f, "{name}")
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegisterPair {
    AF,
    BC,
    DE,
    HL,
    SP,
}

impl std::fmt::Display for CpuRegisterPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AF => "AF",
            Self::BC => "BC",
            Self::DE => "DE",
            Self::HL => "HL",
            Self::SP => "SP",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuRegisters {
    pub accumulator: u8,
    pub flags: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl CpuRegisters {
    const ZERO_FLAG: u8 = 0x80;
    const SUBTRACT_FLAG: u8 = 0x40;
    const HALF_CARRY_FLAG: u8 = 0x20;
    const CARRY_FLAG: u8 = 0x10;

    /// Create a new `CpuRegisters` with the values the DMG boot ROM leaves behind.
    pub fn new() -> Self {
        Self {
            accumulator: 0x01,
            flags: 0xB0,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0100,
        }
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.accumulator, self.flags])
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    pub fn set_hl(&mut self, hl: u16) {
        let [h, l] = hl.to_be_bytes();
        self.h = h;
        self.l = l;
    }

    pub fn read_register(&self, register: CpuRegister) -> u8 {
        match register {
            CpuRegister::A => self.accumulator,
            CpuRegister::B => self.b,
            CpuRegister::C => self.c,
            CpuRegister::D => self.d,
            CpuRegister::E => self.e,
            CpuRegister::H => self.h,
            CpuRegister::L => self.l,
        }
    }

    pub fn set_register(&mut self, register: CpuRegister, value: u8) {
        *self.get_register_mut(register) = value;
    }

    pub fn get_register_mut(&mut self, register: CpuRegister) -> &mut u8 {
        match register {
            CpuRegister::A => &mut self.accumulator,
            CpuRegister::B => &mut self.b,
            CpuRegister::C => &mut self.c,
            CpuRegister::D => &mut self.d,
            CpuRegister::E => &mut self.e,
            CpuRegister::H => &mut self.h,
            CpuRegister::L => &mut self.l,
        }
    }

    pub fn read_register_pair(&self, register_pair: CpuRegisterPair) -> u16 {
        match register_pair {
            CpuRegisterPair::AF => self.af(),
            CpuRegisterPair::BC => self.bc(),
            CpuRegisterPair::DE => self.de(),
            CpuRegisterPair::HL => self.hl(),
            CpuRegisterPair::SP => self.sp,
        }
    }

    /// Assign a 16-bit value to a register pair. Writes to AF drop the low nibble of F, which the
    /// hardware always reads as zero.
    pub fn set_register_pair(&mut self, register_pair: CpuRegisterPair, value: u16) {
        match register_pair {
            CpuRegisterPair::AF => {
                let [a, f] = value.to_be_bytes();
                self.accumulator = a;
                self.flags = f & 0xF0;
            }
            CpuRegisterPair::BC => {
                let [b, c] = value.to_be_bytes();
                self.b = b;
                self.c = c;
            }
            CpuRegisterPair::DE => {
                let [d, e] = value.to_be_bytes();
                self.d = d;
                self.e = e;
            }
            CpuRegisterPair::HL => {
                self.set_hl(value);
            }
            CpuRegisterPair::SP => {
                self.sp = value;
            }
        }
    }

    pub fn set_flags(&mut self, z: bool, n: bool, h: bool, c: bool) {
        self.flags =
            (u8::from(z) << 7) | (u8::from(n) << 6) | (u8::from(h) << 5) | (u8::from(c) << 4);
    }

    /// Set only the flags that are `Some`, leaving the others untouched.
    pub fn set_some_flags(
        &mut self,
        z: Option<bool>,
        n: Option<bool>,
        h: Option<bool>,
        c: Option<bool>,
    ) {
        for (value, mask) in [
            (z, Self::ZERO_FLAG),
            (n, Self::SUBTRACT_FLAG),
            (h, Self::HALF_CARRY_FLAG),
            (c, Self::CARRY_FLAG),
        ] {
            match value {
                Some(true) => {
                    self.flags |= mask;
                }
                Some(false) => {
                    self.flags &= !mask;
                }
                None => {}
            }
        }
    }

    pub fn zero_flag(&self) -> bool {
        self.flags & Self::ZERO_FLAG != 0
    }

    pub fn subtract_flag(&self) -> bool {
        self.flags & Self::SUBTRACT_FLAG != 0
    }

    pub fn half_carry_flag(&self) -> bool {
        self.flags & Self::HALF_CARRY_FLAG != 0
    }

    pub fn carry_flag(&self) -> bool {
        self.flags & Self::CARRY_FLAG != 0
    }
}

impl Default for CpuRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CpuRegisters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AF={:04X} BC={:04X} DE={:04X} HL={:04X} SP={:04X} PC={:04X} [{}{}{}{}]",
            self.af(),
            self.bc(),
            self.de(),
            self.hl(),
            self.sp,
            self.pc,
            if self.zero_flag() { 'Z' } else { '-' },
            if self.subtract_flag() { 'N' } else { '-' },
            if self.half_carry_flag() { 'H' } else { '-' },
            if self.carry_flag() { 'C' } else { '-' },
        )
    }
}
