//
// Cartridge header addresses
//

pub const ENTRY_POINT: u16 = 0x0100;

//
// Address space boundaries (end addresses are exclusive)
//

pub const ROM_BANK_0_START: u16 = 0x0000;
pub const ROM_BANK_0_END: u16 = 0x4000;

pub const ROM_BANK_N_START: u16 = 0x4000;
pub const ROM_BANK_N_END: u16 = 0x8000;

pub const VRAM_START: u16 = 0x8000;
pub const VRAM_END: u16 = 0xA000;

pub const WORKING_RAM_0_START: u16 = 0xC000;
pub const WORKING_RAM_0_END: u16 = 0xD000;

pub const WORKING_RAM_N_START: u16 = 0xD000;
pub const WORKING_RAM_N_END: u16 = 0xE000;

pub const OAM_START: u16 = 0xFE00;
pub const OAM_END: u16 = 0xFEA0;

pub const UNUSABLE_START: u16 = 0xFEA0;
pub const UNUSABLE_END: u16 = 0xFF00;

pub const IO_REGISTERS_START: u16 = 0xFF00;
pub const IO_REGISTERS_END: u16 = 0xFF80;

pub const HRAM_START: u16 = 0xFF80;
pub const HRAM_END: u16 = 0xFFFF;

pub const IE_REGISTER: u16 = 0xFFFF;

//
// Region sizes
//

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const VRAM_SIZE: usize = (VRAM_END - VRAM_START) as usize;
pub const WORKING_RAM_BANK_SIZE: usize = 0x1000;
pub const OAM_SIZE: usize = (OAM_END - OAM_START) as usize;
pub const IO_REGISTERS_SIZE: usize = (IO_REGISTERS_END - IO_REGISTERS_START) as usize;
pub const HRAM_SIZE: usize = (HRAM_END - HRAM_START) as usize;

//
// VRAM layout
//

pub const TILE_DATA_UNSIGNED_BASE: u16 = 0x8000;
pub const TILE_DATA_SIGNED_BASE: u16 = 0x9000;

pub const TILE_MAP_0: u16 = 0x9800;
pub const TILE_MAP_1: u16 = 0x9C00;

//
// Interrupt handler vectors
//

pub const VBLANK_VECTOR: u16 = 0x0040;
pub const LCD_STATUS_VECTOR: u16 = 0x0048;
pub const TIMER_VECTOR: u16 = 0x0050;
pub const SERIAL_VECTOR: u16 = 0x0058;
pub const JOYPAD_VECTOR: u16 = 0x0060;
