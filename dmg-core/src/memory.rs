pub mod address;
pub mod ioregisters;

use crate::cartridge::RomBank;
use crate::memory::ioregisters::{IoRegister, IoRegisters};
use crate::serialize;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use thiserror::Error;

/// Extra machine cycles charged for an OAM DMA transfer.
pub const OAM_DMA_CYCLES: u32 = 160;

const OAM_DMA_LENGTH: u16 = 0xA0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl std::fmt::Display for AccessKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("couldn't {access} at unmapped address 0x{address:04X}")]
    Unmapped { address: u16, access: AccessKind },
    #[error("16-bit {access} at 0x{address:04X} crosses a memory region boundary")]
    CrossesRegionBoundary { address: u16, access: AccessKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    RomBank0,
    RomBankN,
    Vram,
    WorkingRam0,
    WorkingRamN,
    Oam,
    Unusable,
    IoRegisters,
    Hram,
    InterruptEnable,
}

// Half-open ranges; the first match wins
const REGIONS: [(MemoryRegion, u16, u32); 10] = [
    (MemoryRegion::RomBank0, address::ROM_BANK_0_START, address::ROM_BANK_0_END as u32),
    (MemoryRegion::RomBankN, address::ROM_BANK_N_START, address::ROM_BANK_N_END as u32),
    (MemoryRegion::Vram, address::VRAM_START, address::VRAM_END as u32),
    (MemoryRegion::WorkingRam0, address::WORKING_RAM_0_START, address::WORKING_RAM_0_END as u32),
    (MemoryRegion::WorkingRamN, address::WORKING_RAM_N_START, address::WORKING_RAM_N_END as u32),
    (MemoryRegion::Oam, address::OAM_START, address::OAM_END as u32),
    (MemoryRegion::Unusable, address::UNUSABLE_START, address::UNUSABLE_END as u32),
    (MemoryRegion::IoRegisters, address::IO_REGISTERS_START, address::IO_REGISTERS_END as u32),
    (MemoryRegion::Hram, address::HRAM_START, address::HRAM_END as u32),
    (MemoryRegion::InterruptEnable, address::IE_REGISTER, 0x10000),
];

impl MemoryRegion {
    /// Return the region containing the given address along with the address's offset into that
    /// region, or None if the address is unmapped.
    pub fn from_address(address: u16) -> Option<(Self, usize)> {
        REGIONS
            .iter()
            .find(|&&(_, start, end)| address >= start && u32::from(address) < end)
            .map(|&(region, start, _)| (region, usize::from(address - start)))
    }
}

/// The mutable portion of the address space, i.e. everything except the borrowed ROM banks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ram {
    #[serde(
        serialize_with = "serialize::serialize_array",
        deserialize_with = "serialize::deserialize_array"
    )]
    vram: [u8; address::VRAM_SIZE],
    #[serde(
        serialize_with = "serialize::serialize_array",
        deserialize_with = "serialize::deserialize_array"
    )]
    working_ram_0: [u8; address::WORKING_RAM_BANK_SIZE],
    #[serde(
        serialize_with = "serialize::serialize_array",
        deserialize_with = "serialize::deserialize_array"
    )]
    working_ram_n: [u8; address::WORKING_RAM_BANK_SIZE],
    #[serde(
        serialize_with = "serialize::serialize_array",
        deserialize_with = "serialize::deserialize_array"
    )]
    oam: [u8; address::OAM_SIZE],
    io_registers: IoRegisters,
    #[serde(
        serialize_with = "serialize::serialize_array",
        deserialize_with = "serialize::deserialize_array"
    )]
    hram: [u8; address::HRAM_SIZE],
    ie_register: u8,
    dma_cycle_surcharge: u32,
}

impl Ram {
    pub fn new() -> Self {
        Self {
            vram: [0; address::VRAM_SIZE],
            working_ram_0: [0; address::WORKING_RAM_BANK_SIZE],
            working_ram_n: [0; address::WORKING_RAM_BANK_SIZE],
            oam: [0; address::OAM_SIZE],
            io_registers: IoRegisters::new(),
            hram: [0; address::HRAM_SIZE],
            ie_register: 0x00,
            dma_cycle_surcharge: 0,
        }
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

/// The 16-bit address space. ROM banks are borrowed from the cartridge, which must outlive it.
#[derive(Debug, Clone)]
pub struct AddressSpace<'rom> {
    rom_bank_0: &'rom RomBank,
    rom_bank_n: &'rom RomBank,
    ram: Ram,
}

impl<'rom> AddressSpace<'rom> {
    pub fn new(rom_bank_0: &'rom RomBank, rom_bank_n: &'rom RomBank) -> Self {
        Self::from_ram(rom_bank_0, rom_bank_n, Ram::new())
    }

    /// Rebuild an address space around previously captured RAM contents.
    pub fn from_ram(rom_bank_0: &'rom RomBank, rom_bank_n: &'rom RomBank, ram: Ram) -> Self {
        Self {
            rom_bank_0,
            rom_bank_n,
            ram,
        }
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn read_address_u8(&self, address: u16) -> Result<u8, MemoryError> {
        let Some((region, offset)) = MemoryRegion::from_address(address) else {
            return Err(MemoryError::Unmapped {
                address,
                access: AccessKind::Read,
            });
        };

        let value = match region {
            MemoryRegion::RomBank0 => self.rom_bank_0[offset],
            MemoryRegion::RomBankN => self.rom_bank_n[offset],
            MemoryRegion::Vram => self.ram.vram[offset],
            MemoryRegion::WorkingRam0 => self.ram.working_ram_0[offset],
            MemoryRegion::WorkingRamN => self.ram.working_ram_n[offset],
            MemoryRegion::Oam => self.ram.oam[offset],
            MemoryRegion::Unusable => {
                return Err(MemoryError::Unmapped {
                    address,
                    access: AccessKind::Read,
                });
            }
            MemoryRegion::IoRegisters => self.ram.io_registers.read_address(address),
            MemoryRegion::Hram => self.ram.hram[offset],
            MemoryRegion::InterruptEnable => self.ram.ie_register,
        };

        Ok(value)
    }

    pub fn write_address_u8(&mut self, address: u16, value: u8) -> Result<(), MemoryError> {
        let Some((region, offset)) = MemoryRegion::from_address(address) else {
            return Err(MemoryError::Unmapped {
                address,
                access: AccessKind::Write,
            });
        };

        match region {
            MemoryRegion::RomBank0 | MemoryRegion::RomBankN => {
                log::trace!("Ignoring write of {value:02X} to ROM address {address:04X}");
            }
            MemoryRegion::Vram => {
                self.ram.vram[offset] = value;
            }
            MemoryRegion::WorkingRam0 => {
                self.ram.working_ram_0[offset] = value;
            }
            MemoryRegion::WorkingRamN => {
                self.ram.working_ram_n[offset] = value;
            }
            MemoryRegion::Oam => {
                self.ram.oam[offset] = value;
            }
            MemoryRegion::Unusable => {
                log::warn!("Writing in a forbidden area! (0x{address:04X})");
            }
            MemoryRegion::IoRegisters => {
                if address == IoRegister::DMA.to_address() {
                    self.start_oam_dma(value)?;
                }
                self.ram.io_registers.write_address(address, value);
            }
            MemoryRegion::Hram => {
                self.ram.hram[offset] = value;
            }
            MemoryRegion::InterruptEnable => {
                self.ram.ie_register = value;
            }
        }

        Ok(())
    }

    /// Read a little-endian 16-bit value. Both bytes must lie in the same region.
    pub fn read_address_u16(&self, address: u16) -> Result<u16, MemoryError> {
        self.check_same_region(address, AccessKind::Read)?;

        let lsb = self.read_address_u8(address)?;
        let msb = self.read_address_u8(address + 1)?;
        Ok(u16::from_le_bytes([lsb, msb]))
    }

    /// Write a little-endian 16-bit value. Both bytes must lie in the same region.
    pub fn write_address_u16(&mut self, address: u16, value: u16) -> Result<(), MemoryError> {
        self.check_same_region(address, AccessKind::Write)?;

        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb)?;
        self.write_address_u8(address + 1, msb)?;
        Ok(())
    }

    fn check_same_region(&self, address: u16, access: AccessKind) -> Result<(), MemoryError> {
        let Some((region, _)) = MemoryRegion::from_address(address) else {
            return Err(MemoryError::Unmapped { address, access });
        };

        let next_region = address
            .checked_add(1)
            .and_then(MemoryRegion::from_address)
            .map(|(next_region, _)| next_region);
        if next_region != Some(region) {
            return Err(MemoryError::CrossesRegionBoundary { address, access });
        }

        Ok(())
    }

    fn start_oam_dma(&mut self, source: u8) -> Result<(), MemoryError> {
        let source_address = u16::from(source) << 8;
        log::debug!("OAM DMA transfer from {source_address:04X}");

        for i in 0..OAM_DMA_LENGTH {
            self.ram.oam[usize::from(i)] = self.read_address_u8(source_address + i)?;
        }

        self.ram.dma_cycle_surcharge += OAM_DMA_CYCLES;

        Ok(())
    }

    /// Returns the extra cycles owed for DMA transfers started since the last call, and resets
    /// the surcharge to zero.
    pub fn take_dma_cycle_surcharge(&mut self) -> u32 {
        std::mem::take(&mut self.ram.dma_cycle_surcharge)
    }

    pub fn vram(&self) -> &[u8; address::VRAM_SIZE] {
        &self.ram.vram
    }

    pub fn oam(&self) -> &[u8; address::OAM_SIZE] {
        &self.ram.oam
    }

    pub fn io_registers(&self) -> &IoRegisters {
        &self.ram.io_registers
    }

    pub fn io_registers_mut(&mut self) -> &mut IoRegisters {
        &mut self.ram.io_registers
    }

    pub fn ie_register(&self) -> u8 {
        self.ram.ie_register
    }
}
