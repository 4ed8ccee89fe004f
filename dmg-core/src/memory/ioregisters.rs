mod lcdc;

use crate::interrupts::InterruptType;
use crate::memory::address;
use crate::serialize;
use serde::{Deserialize, Serialize};

pub use lcdc::{Lcdc, TileDataAddressing};

/// Mask of the five interrupt bits that IF/IE actually define.
pub const INTERRUPT_BITS_MASK: u8 = 0x1F;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoRegister {
    JOYP,
    SB,
    SC,
    DIV,
    TIMA,
    TMA,
    TAC,
    IF,
    LCDC,
    STAT,
    SCY,
    SCX,
    LY,
    LYC,
    DMA,
    BGP,
    OBP0,
    OBP1,
    WY,
    WX,
}

// Register addresses, in address order
const REGISTER_ADDRESSES: [(IoRegister, u16); 20] = [
    (IoRegister::JOYP, 0xFF00),
    (IoRegister::SB, 0xFF01),
    (IoRegister::SC, 0xFF02),
    (IoRegister::DIV, 0xFF04),
    (IoRegister::TIMA, 0xFF05),
    (IoRegister::TMA, 0xFF06),
    (IoRegister::TAC, 0xFF07),
    (IoRegister::IF, 0xFF0F),
    (IoRegister::LCDC, 0xFF40),
    (IoRegister::STAT, 0xFF41),
    (IoRegister::SCY, 0xFF42),
    (IoRegister::SCX, 0xFF43),
    (IoRegister::LY, 0xFF44),
    (IoRegister::LYC, 0xFF45),
    (IoRegister::DMA, 0xFF46),
    (IoRegister::BGP, 0xFF47),
    (IoRegister::OBP0, 0xFF48),
    (IoRegister::OBP1, 0xFF49),
    (IoRegister::WY, 0xFF4A),
    (IoRegister::WX, 0xFF4B),
];

impl IoRegister {
    /// The named register at `address`, if there is one.
    pub fn from_address(address: u16) -> Option<Self> {
        REGISTER_ADDRESSES
            .iter()
            .find(|&&(_, register_address)| register_address == address)
            .map(|&(register, _)| register)
    }

    pub fn to_address(self) -> u16 {
        REGISTER_ADDRESSES
            .iter()
            .find(|&&(register, _)| register == self)
            .map_or(address::IO_REGISTERS_START, |&(_, register_address)| register_address)
    }

    /// LY is driven by the PPU alone.
    pub fn is_cpu_writable(self) -> bool {
        self != Self::LY
    }
}

/// Mutable view of IF used to request and acknowledge interrupts.
pub struct InterruptFlags<'a>(&'a mut u8);

impl<'a> InterruptFlags<'a> {
    /// Requested bits that IE also enables.
    pub fn pending(&self, ie_value: u8) -> u8 {
        *self.0 & ie_value & INTERRUPT_BITS_MASK
    }

    /// The first pending interrupt in priority order.
    pub fn highest_priority_interrupt(&self, ie_value: u8) -> Option<InterruptType> {
        let pending = self.pending(ie_value);
        InterruptType::PRIORITY_ORDER
            .into_iter()
            .find(|interrupt_type| pending & interrupt_type.bit() != 0)
    }

    pub fn get(&self, interrupt_type: InterruptType) -> bool {
        *self.0 & interrupt_type.bit() != 0
    }

    pub fn set(&mut self, interrupt_type: InterruptType) {
        *self.0 |= interrupt_type.bit();
    }

    pub fn clear(&mut self, interrupt_type: InterruptType) {
        *self.0 &= !interrupt_type.bit();
    }
}

// Values the boot ROM leaves in the register window; everything else starts at 0
const POST_BOOT_VALUES: [(IoRegister, u8); 8] = [
    (IoRegister::JOYP, 0xCF),
    (IoRegister::DIV, 0xAB),
    (IoRegister::TAC, 0xF8),
    (IoRegister::IF, 0xE1),
    (IoRegister::LCDC, 0x91),
    (IoRegister::STAT, 0x82),
    (IoRegister::DMA, 0xFF),
    (IoRegister::BGP, 0xFC),
];

fn window_offset(address: u16) -> usize {
    usize::from(address - address::IO_REGISTERS_START)
}

/// The 0xFF00-0xFF7F register window. Addresses without a named register behave as plain RAM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoRegisters {
    #[serde(
        serialize_with = "serialize::serialize_array",
        deserialize_with = "serialize::deserialize_array"
    )]
    contents: [u8; address::IO_REGISTERS_SIZE],
    joyp_select_written: bool,
}

impl IoRegisters {
    pub fn new() -> Self {
        let mut io_registers = Self {
            contents: [0; address::IO_REGISTERS_SIZE],
            joyp_select_written: false,
        };
        for (register, value) in POST_BOOT_VALUES {
            *io_registers.raw_mut(register) = value;
        }
        io_registers
    }

    fn raw(&self, register: IoRegister) -> u8 {
        self.contents[window_offset(register.to_address())]
    }

    fn raw_mut(&mut self, register: IoRegister) -> &mut u8 {
        &mut self.contents[window_offset(register.to_address())]
    }

    /// CPU view of the byte at `address`. Unused JOYP and STAT bits read as 1.
    pub fn read_address(&self, address: u16) -> u8 {
        let byte = self.contents[window_offset(address)];
        match IoRegister::from_address(address) {
            Some(IoRegister::JOYP) => byte | 0xC0,
            Some(IoRegister::STAT) => byte | 0x80,
            _ => byte,
        }
    }

    /// CPU write to the byte at `address`. Bits owned by the hardware keep their current values.
    pub fn write_address(&mut self, address: u16, value: u8) {
        let offset = window_offset(address);

        let Some(register) = IoRegister::from_address(address) else {
            self.contents[offset] = value;
            return;
        };

        if !register.is_cpu_writable() {
            log::trace!("Ignoring CPU write of {value:02X} to read-only register {register:?}");
            return;
        }

        let current = self.contents[offset];
        let new_value = match register {
            // Group select bits only; the key lines are recomputed from the joypad
            IoRegister::JOYP => {
                self.joyp_select_written = true;
                (current & 0x0F) | (value & 0x30)
            }
            // Mode bits and the LY=LYC flag belong to the PPU
            IoRegister::STAT => (current & 0x07) | (value & 0x78),
            _ => value,
        };
        self.contents[offset] = new_value;
    }

    pub fn read_register(&self, register: IoRegister) -> u8 {
        self.read_address(register.to_address())
    }

    /// Same rules as a CPU write to the register's address.
    pub fn write_register(&mut self, register: IoRegister, value: u8) {
        self.write_address(register.to_address(), value);
    }

    /// JOYP including the key lines, for the joypad update.
    pub fn privileged_read_joyp(&self) -> u8 {
        self.raw(IoRegister::JOYP) | 0xC0
    }

    pub fn privileged_set_joyp(&mut self, value: u8) {
        *self.raw_mut(IoRegister::JOYP) = value & 0x3F;
    }

    /// Whether the CPU has written JOYP since power-on.
    pub fn joyp_select_written(&self) -> bool {
        self.joyp_select_written
    }

    /// PPU-side STAT update, mode and coincidence bits included.
    pub fn privileged_set_stat(&mut self, value: u8) {
        *self.raw_mut(IoRegister::STAT) = value & 0x7F;
    }

    /// PPU-side LY update.
    pub fn privileged_set_ly(&mut self, value: u8) {
        *self.raw_mut(IoRegister::LY) = value;
    }

    pub fn lcdc(&self) -> Lcdc {
        Lcdc(self.raw(IoRegister::LCDC))
    }

    pub fn interrupt_flags(&mut self) -> InterruptFlags<'_> {
        InterruptFlags(self.raw_mut(IoRegister::IF))
    }
}

impl Default for IoRegisters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed() -> IoRegisters {
        IoRegisters {
            contents: [0; address::IO_REGISTERS_SIZE],
            joyp_select_written: false,
        }
    }

    #[test]
    fn address_table_round_trips() {
        for (register, address) in REGISTER_ADDRESSES {
            assert_eq!(Some(register), IoRegister::from_address(address));
            assert_eq!(address, register.to_address());
        }
        assert_eq!(None, IoRegister::from_address(0xFF03));
        assert_eq!(None, IoRegister::from_address(0xFF7F));
    }

    #[test]
    fn post_boot_values() {
        let io_registers = IoRegisters::new();
        assert_eq!(0xCF, io_registers.read_register(IoRegister::JOYP));
        assert_eq!(0xAB, io_registers.read_register(IoRegister::DIV));
        assert_eq!(0xE1, io_registers.read_register(IoRegister::IF));
        assert_eq!(0x91, io_registers.read_register(IoRegister::LCDC));
        assert_eq!(0x82, io_registers.read_register(IoRegister::STAT));
        assert_eq!(0x00, io_registers.read_register(IoRegister::LY));
        assert_eq!(0xFC, io_registers.read_register(IoRegister::BGP));
    }

    #[test]
    fn joyp_select_bits() {
        let mut io_registers = zeroed();
        assert_eq!(0xC0, io_registers.read_register(IoRegister::JOYP));
        assert!(!io_registers.joyp_select_written());

        // Key lines ignore CPU writes
        io_registers.write_register(IoRegister::JOYP, 0xDF);
        assert_eq!(0xD0, io_registers.read_register(IoRegister::JOYP));
        assert!(io_registers.joyp_select_written());

        io_registers.privileged_set_joyp(0x2A);
        assert_eq!(0xEA, io_registers.read_register(IoRegister::JOYP));
        assert_eq!(0xEA, io_registers.privileged_read_joyp());
    }

    #[test]
    fn stat_bits() {
        let mut io_registers = zeroed();
        io_registers.privileged_set_stat(0x03);

        // CPU can set the interrupt enables but not the mode bits or bit 2
        io_registers.write_register(IoRegister::STAT, 0x7C);
        assert_eq!(0xFB, io_registers.read_register(IoRegister::STAT));

        io_registers.write_register(IoRegister::STAT, 0x00);
        assert_eq!(0x83, io_registers.read_register(IoRegister::STAT));

        // Bit 7 is never stored
        io_registers.privileged_set_stat(0xFF);
        assert_eq!(0x7F, io_registers.contents[0x41]);
    }

    #[test]
    fn ly_is_read_only_for_cpu() {
        let mut io_registers = zeroed();
        io_registers.privileged_set_ly(0x90);
        io_registers.write_address(0xFF44, 0x12);
        assert_eq!(0x90, io_registers.read_address(0xFF44));
    }

    #[test]
    fn unnamed_addresses_are_storage() {
        let mut io_registers = zeroed();
        for address in [0xFF03, 0xFF30, 0xFF7F] {
            io_registers.write_address(address, 0x5A);
            assert_eq!(0x5A, io_registers.read_address(address));
        }
    }

    #[test]
    fn interrupt_flag_view() {
        let mut io_registers = zeroed();

        io_registers.interrupt_flags().set(InterruptType::LcdStatus);
        io_registers.interrupt_flags().set(InterruptType::Serial);
        assert_eq!(0x0A, io_registers.read_register(IoRegister::IF));

        // Only IE-enabled bits count, and never bits 5-7
        io_registers.write_register(IoRegister::IF, 0xEA);
        assert_eq!(0x08, io_registers.interrupt_flags().pending(0xF8));
        assert_eq!(
            Some(InterruptType::LcdStatus),
            io_registers.interrupt_flags().highest_priority_interrupt(0xFF)
        );
        assert_eq!(None, io_registers.interrupt_flags().highest_priority_interrupt(0xE0));

        io_registers.interrupt_flags().clear(InterruptType::LcdStatus);
        assert!(!io_registers.interrupt_flags().get(InterruptType::LcdStatus));
        assert!(io_registers.interrupt_flags().get(InterruptType::Serial));
    }
}
