mod render;

use crate::graphics::PixelSink;
use crate::interrupts::InterruptType;
use crate::memory::address;
use crate::memory::ioregisters::{IoRegister, IoRegisters};
use crate::memory::AddressSpace;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tinyvec::ArrayVec;

pub const SCREEN_WIDTH: u8 = 160;
pub const SCREEN_HEIGHT: u8 = 144;

const LINES_PER_FRAME: u8 = 154;
const VBLANK_LINES: u32 = (LINES_PER_FRAME - SCREEN_HEIGHT) as u32;

// Each mode's length in dots, scaled by the number of emulator cycles per dot
const CYCLES_PER_DOT: u32 = 4;
const OAM_SCAN_CYCLES: u32 = 80 * CYCLES_PER_DOT;
const DRAWING_PIXELS_CYCLES: u32 = 172 * CYCLES_PER_DOT;
const HBLANK_CYCLES: u32 = 204 * CYCLES_PER_DOT;
const VBLANK_LINE_CYCLES: u32 = 4560 * CYCLES_PER_DOT / VBLANK_LINES;

const OAM_ENTRIES: usize = 40;
const MAX_SPRITES_PER_LINE: usize = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PpuError {
    #[error("pixel color index {color_index} is outside of the 4-color palette")]
    InvalidColorIndex { color_index: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PpuMode {
    HBlank,
    VBlank,
    OamScan,
    DrawingPixels,
}

impl PpuMode {
    /// The value of the STAT register's mode bits in this mode.
    pub fn stat_bits(self) -> u8 {
        match self {
            Self::HBlank => 0x00,
            Self::VBlank => 0x01,
            Self::OamScan => 0x02,
            Self::DrawingPixels => 0x03,
        }
    }

    fn cycle_budget(self) -> u32 {
        match self {
            Self::OamScan => OAM_SCAN_CYCLES,
            Self::DrawingPixels => DRAWING_PIXELS_CYCLES,
            Self::HBlank => HBLANK_CYCLES,
            Self::VBlank => VBLANK_LINE_CYCLES,
        }
    }

    // STAT bit that enables the LCD status interrupt on entering this mode
    fn stat_interrupt_bit(self) -> Option<u8> {
        match self {
            Self::HBlank => Some(0x08),
            Self::VBlank => Some(0x10),
            Self::OamScan => Some(0x20),
            Self::DrawingPixels => None,
        }
    }
}

/// An OAM entry as it was when the OAM scan selected it. Drawing uses this copy, so OAM writes
/// during the drawing mode don't affect the current line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteData {
    oam_index: u8,
    y: u8,
    x: u8,
    tile_index: u8,
    flags: u8,
}

impl SpriteData {
    fn from_oam(oam: &[u8; address::OAM_SIZE], oam_index: u8) -> Self {
        let i = 4 * usize::from(oam_index);
        Self {
            oam_index,
            y: oam[i],
            x: oam[i + 1],
            tile_index: oam[i + 2],
            flags: oam[i + 3],
        }
    }

    pub fn oam_index(self) -> u8 {
        self.oam_index
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpuState {
    mode: PpuMode,
    ly: u8,
    cycles: u32,
    sprites: ArrayVec<[SpriteData; MAX_SPRITES_PER_LINE]>,
    frames_completed: u64,
}

impl PpuState {
    pub fn new() -> Self {
        Self {
            mode: PpuMode::OamScan,
            ly: 0,
            cycles: 0,
            sprites: ArrayVec::new(),
            frames_completed: 0,
        }
    }

    pub fn mode(&self) -> PpuMode {
        self.mode
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    /// Sprites selected for the current scanline, in OAM order.
    pub fn sprites(&self) -> &[SpriteData] {
        &self.sprites
    }

    /// Number of VBlank entries since power-on.
    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    /// Advance the PPU by the given number of cycles. Does nothing while the LCD is disabled.
    pub fn run(
        &mut self,
        address_space: &mut AddressSpace<'_>,
        sink: &mut impl PixelSink,
        cycles: u32,
    ) -> Result<(), PpuError> {
        if !address_space.io_registers().lcdc().lcd_enabled() {
            return Ok(());
        }

        self.cycles += cycles;

        while self.cycles >= self.mode.cycle_budget() {
            self.cycles -= self.mode.cycle_budget();

            let previous_ly = self.ly;
            let next_mode = match self.mode {
                PpuMode::OamScan => {
                    self.scan_oam(address_space);
                    PpuMode::DrawingPixels
                }
                PpuMode::DrawingPixels => {
                    render::render_scanline(self.ly, &self.sprites, address_space, sink)?;
                    PpuMode::HBlank
                }
                PpuMode::HBlank => {
                    self.ly += 1;
                    if self.ly == SCREEN_HEIGHT {
                        address_space
                            .io_registers_mut()
                            .interrupt_flags()
                            .set(InterruptType::VBlank);
                        sink.present_frame();
                        self.frames_completed += 1;

                        log::trace!("Frame {} complete", self.frames_completed);

                        PpuMode::VBlank
                    } else {
                        PpuMode::OamScan
                    }
                }
                PpuMode::VBlank => {
                    self.ly = (self.ly + 1) % LINES_PER_FRAME;
                    if self.ly == 0 {
                        PpuMode::OamScan
                    } else {
                        PpuMode::VBlank
                    }
                }
            };

            if next_mode != self.mode {
                log::trace!(
                    "PPU transitioning from {:?} to {next_mode:?} at LY={}",
                    self.mode,
                    self.ly
                );
            }

            self.mode = next_mode;
            self.update_registers(address_space.io_registers_mut(), previous_ly);
        }

        Ok(())
    }

    fn scan_oam(&mut self, address_space: &AddressSpace<'_>) {
        let oam = address_space.oam();

        // Sprites are 8 rows tall and OAM Y is the sprite's top row + 16
        let ly = u16::from(self.ly);
        self.sprites.clear();
        for i in 0..OAM_ENTRIES {
            let y = u16::from(oam[4 * i]);
            if ly + 8 < y && y <= ly + 16 {
                self.sprites.push(SpriteData::from_oam(oam, i as u8));
                if self.sprites.len() == MAX_SPRITES_PER_LINE {
                    break;
                }
            }
        }
    }

    // Persist LY and the STAT mode / coincidence bits, and request an LCD status interrupt on the
    // transitions that STAT has enabled
    fn update_registers(&self, io_registers: &mut IoRegisters, previous_ly: u8) {
        io_registers.privileged_set_ly(self.ly);

        let stat = io_registers.read_register(IoRegister::STAT);
        let lyc_match = self.ly == io_registers.read_register(IoRegister::LYC);
        let new_stat = (stat & 0x78) | (u8::from(lyc_match) << 2) | self.mode.stat_bits();
        io_registers.privileged_set_stat(new_stat);

        let mode_changed = stat & 0x03 != self.mode.stat_bits();
        let mode_interrupt = mode_changed
            && self
                .mode
                .stat_interrupt_bit()
                .is_some_and(|bit| stat & bit != 0);
        let lyc_interrupt = lyc_match && self.ly != previous_ly && stat & 0x40 != 0;

        if mode_interrupt || lyc_interrupt {
            io_registers
                .interrupt_flags()
                .set(InterruptType::LcdStatus);
        }
    }
}

impl Default for PpuState {
    fn default() -> Self {
        Self::new()
    }
}
