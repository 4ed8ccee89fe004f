use crate::memory::address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileDataAddressing {
    // Tile indices are unsigned offsets from 0x8000
    Unsigned,
    // Tile indices are signed offsets from 0x9000
    Signed,
}

impl TileDataAddressing {
    /// Return the address of the first byte of the given tile.
    pub fn tile_address(self, tile_index: u8) -> u16 {
        match self {
            Self::Unsigned => address::TILE_DATA_UNSIGNED_BASE + 16 * u16::from(tile_index),
            Self::Signed => {
                let offset = 16 * i32::from(tile_index as i8);
                (i32::from(address::TILE_DATA_SIGNED_BASE) + offset) as u16
            }
        }
    }
}

/// A read-only view of the LCDC register (LCD control).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lcdc(pub(super) u8);

impl Lcdc {
    pub fn lcd_enabled(self) -> bool {
        self.0 & 0x80 != 0
    }

    pub fn window_tile_map_address(self) -> u16 {
        if self.0 & 0x40 != 0 {
            address::TILE_MAP_1
        } else {
            address::TILE_MAP_0
        }
    }

    pub fn window_enabled(self) -> bool {
        self.0 & 0x20 != 0
    }

    pub fn tile_data_addressing(self) -> TileDataAddressing {
        if self.0 & 0x10 != 0 {
            TileDataAddressing::Unsigned
        } else {
            TileDataAddressing::Signed
        }
    }

    pub fn bg_tile_map_address(self) -> u16 {
        if self.0 & 0x08 != 0 {
            address::TILE_MAP_1
        } else {
            address::TILE_MAP_0
        }
    }

    pub fn sprites_enabled(self) -> bool {
        self.0 & 0x02 != 0
    }

    pub fn bg_enabled(self) -> bool {
        self.0 & 0x01 != 0
    }
}
