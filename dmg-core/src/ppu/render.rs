use crate::graphics::{self, PixelSink};
use crate::memory::address;
use crate::memory::ioregisters::{IoRegister, TileDataAddressing};
use crate::memory::AddressSpace;
use crate::ppu::{PpuError, SpriteData, MAX_SPRITES_PER_LINE, SCREEN_WIDTH};
use tinyvec::ArrayVec;

const TILE_MAP_WIDTH: u16 = 32;

impl SpriteData {
    fn bg_over_obj(self) -> bool {
        self.flags & 0x80 != 0
    }

    fn y_flip(self) -> bool {
        self.flags & 0x40 != 0
    }

    fn x_flip(self) -> bool {
        self.flags & 0x20 != 0
    }

    // Sprite X is the sprite's left column + 8
    fn covers_column(self, x: u8) -> bool {
        let x = u16::from(x) + 8;
        let sprite_x = u16::from(self.x);
        sprite_x <= x && x < sprite_x + 8
    }
}

fn vram_byte(vram: &[u8; address::VRAM_SIZE], address: u16) -> u8 {
    // Every tile map / tile data address lies within 0x8000-0x9FFF
    vram[usize::from(address - address::VRAM_START)]
}

// Two bitplanes: bit 0 of the color index comes from the first byte, bit 1 from the second
fn tile_pixel(vram: &[u8; address::VRAM_SIZE], tile_address: u16, row: u8, col: u8) -> u8 {
    let row_address = tile_address + 2 * u16::from(row);
    let low = vram_byte(vram, row_address);
    let high = vram_byte(vram, row_address + 1);

    let bit = 7 - col;
    (((high >> bit) & 0x01) << 1) | ((low >> bit) & 0x01)
}

fn tile_map_pixel(
    vram: &[u8; address::VRAM_SIZE],
    tile_map_address: u16,
    tile_data_addressing: TileDataAddressing,
    x: u8,
    y: u8,
) -> u8 {
    let map_offset = u16::from(y / 8) * TILE_MAP_WIDTH + u16::from(x / 8);
    let tile_index = vram_byte(vram, tile_map_address + map_offset);
    let tile_address = tile_data_addressing.tile_address(tile_index);

    tile_pixel(vram, tile_address, y % 8, x % 8)
}

/// Compose scanline `ly` from the background, window and the given sprites and draw it to the
/// sink.
pub(super) fn render_scanline(
    ly: u8,
    sprites: &[SpriteData],
    address_space: &AddressSpace<'_>,
    sink: &mut impl PixelSink,
) -> Result<(), PpuError> {
    let io_registers = address_space.io_registers();
    let lcdc = io_registers.lcdc();
    let vram = address_space.vram();

    let scx = io_registers.read_register(IoRegister::SCX);
    let scy = io_registers.read_register(IoRegister::SCY);
    let wx = io_registers.read_register(IoRegister::WX);
    let wy = io_registers.read_register(IoRegister::WY);

    let window_on_line = lcdc.window_enabled() && ly >= wy;

    let mut sprites: ArrayVec<[SpriteData; MAX_SPRITES_PER_LINE]> = if lcdc.sprites_enabled()
    {
        sprites.iter().copied().take(MAX_SPRITES_PER_LINE).collect()
    } else {
        ArrayVec::new()
    };
    // Lower X wins, then lower OAM index
    sprites.sort_by_key(|sprite| (sprite.x, sprite.oam_index));

    for x in 0..SCREEN_WIDTH {
        let bg_color = if !lcdc.bg_enabled() {
            0
        } else if window_on_line && u16::from(x) + 7 >= u16::from(wx) {
            let window_x = (u16::from(x) + 7 - u16::from(wx)) as u8;
            tile_map_pixel(
                vram,
                lcdc.window_tile_map_address(),
                lcdc.tile_data_addressing(),
                window_x,
                ly - wy,
            )
        } else {
            tile_map_pixel(
                vram,
                lcdc.bg_tile_map_address(),
                lcdc.tile_data_addressing(),
                x.wrapping_add(scx),
                ly.wrapping_add(scy),
            )
        };

        let sprite_pixel = sprites
            .iter()
            .filter(|sprite| sprite.covers_column(x))
            .find_map(|&sprite| {
                // Entries restored from a save state aren't guaranteed to cover this line
                let row = (ly + 16).checked_sub(sprite.y).filter(|&row| row < 8)?;
                let row = if sprite.y_flip() { 7 - row } else { row };
                let col = x + 8 - sprite.x;
                let col = if sprite.x_flip() { 7 - col } else { col };

                let tile_address = TileDataAddressing::Unsigned.tile_address(sprite.tile_index);
                let color = tile_pixel(vram, tile_address, row, col);

                // Color 0 is transparent for sprites
                (color != 0).then_some((sprite, color))
            });

        let color_index = match sprite_pixel {
            Some((sprite, _)) if sprite.bg_over_obj() && bg_color != 0 => bg_color,
            Some((_, sprite_color)) => sprite_color,
            None => bg_color,
        };

        sink.draw_pixel(x, ly, graphics::palette_color(color_index)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::RomBank;
    use crate::graphics::{Color, FrameBuffer};

    const SHADE_0: Color = Color::rgb(0x0F, 0x38, 0x0F);
    const SHADE_1: Color = Color::rgb(0x30, 0x62, 0x30);
    const SHADE_2: Color = Color::rgb(0x8B, 0xAC, 0x0F);
    const SHADE_3: Color = Color::rgb(0x9B, 0xBC, 0x0F);

    fn write_all(address_space: &mut AddressSpace<'_>, start: u16, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            address_space.write_address_u8(start + i as u16, byte).unwrap();
        }
    }

    fn scanned(address_space: &AddressSpace<'_>, oam_indices: &[u8]) -> Vec<SpriteData> {
        oam_indices
            .iter()
            .map(|&oam_index| SpriteData::from_oam(address_space.oam(), oam_index))
            .collect()
    }

    fn empty_banks() -> (Box<RomBank>, Box<RomBank>) {
        (
            Box::new([0; address::ROM_BANK_SIZE]),
            Box::new([0; address::ROM_BANK_SIZE]),
        )
    }

    #[test]
    fn tile_bitplanes() {
        let mut vram = [0; address::VRAM_SIZE];
        // Row 0: low = 0b1010_0000, high = 0b1100_0000
        vram[0x10] = 0xA0;
        vram[0x11] = 0xC0;

        assert_eq!(3, tile_pixel(&vram, 0x8010, 0, 0));
        assert_eq!(2, tile_pixel(&vram, 0x8010, 0, 1));
        assert_eq!(1, tile_pixel(&vram, 0x8010, 0, 2));
        assert_eq!(0, tile_pixel(&vram, 0x8010, 0, 3));
    }

    #[test]
    fn background_with_scroll() {
        let (bank_0, bank_n) = empty_banks();
        let mut address_space = AddressSpace::new(&bank_0, &bank_n);

        // Tile 1 is solid color 3; map entry (1, 0) uses it
        write_all(&mut address_space, 0x8010, &[0xFF; 16]);
        address_space.write_address_u8(0x9801, 0x01).unwrap();

        let mut frame_buffer = FrameBuffer::new();
        render_scanline(0, &[], &address_space, &mut frame_buffer).unwrap();
        assert_eq!(Some(SHADE_0), frame_buffer.pixel(7, 0));
        assert_eq!(Some(SHADE_3), frame_buffer.pixel(8, 0));
        assert_eq!(Some(SHADE_3), frame_buffer.pixel(15, 0));
        assert_eq!(Some(SHADE_0), frame_buffer.pixel(16, 0));

        // SCX=4 shifts the tile four pixels left
        address_space.write_address_u8(0xFF43, 0x04).unwrap();
        render_scanline(0, &[], &address_space, &mut frame_buffer).unwrap();
        assert_eq!(Some(SHADE_3), frame_buffer.pixel(4, 0));
        assert_eq!(Some(SHADE_0), frame_buffer.pixel(12, 0));
    }

    #[test]
    fn signed_tile_addressing() {
        let (bank_0, bank_n) = empty_banks();
        let mut address_space = AddressSpace::new(&bank_0, &bank_n);

        // LCDC: display on, BG on, 0x9000-based tile data
        address_space.write_address_u8(0xFF40, 0x81).unwrap();
        // Tile 0xFF in signed mode lives at 0x8FF0: color 1 in every pixel
        write_all(&mut address_space, 0x8FF0, &[0xFF, 0x00].repeat(8));
        address_space.write_address_u8(0x9800, 0xFF).unwrap();

        let mut frame_buffer = FrameBuffer::new();
        render_scanline(0, &[], &address_space, &mut frame_buffer).unwrap();
        assert_eq!(Some(SHADE_1), frame_buffer.pixel(0, 0));
        assert_eq!(Some(SHADE_0), frame_buffer.pixel(8, 0));
    }

    #[test]
    fn window_over_background() {
        let (bank_0, bank_n) = empty_banks();
        let mut address_space = AddressSpace::new(&bank_0, &bank_n);

        // Tile 2 is solid color 2
        write_all(&mut address_space, 0x8020, &[0x00, 0xFF].repeat(8));
        // Window map at 0x9C00 filled with tile 2
        write_all(&mut address_space, 0x9C00, &[0x02; 32]);

        // LCDC: display on, window map 0x9C00, window on, unsigned tile data, BG on
        address_space.write_address_u8(0xFF40, 0xF1).unwrap();
        // WY=0, WX=87 places the window's left edge at x=80
        address_space.write_address_u8(0xFF4A, 0x00).unwrap();
        address_space.write_address_u8(0xFF4B, 87).unwrap();

        let mut frame_buffer = FrameBuffer::new();
        render_scanline(0, &[], &address_space, &mut frame_buffer).unwrap();
        assert_eq!(Some(SHADE_0), frame_buffer.pixel(79, 0));
        assert_eq!(Some(SHADE_2), frame_buffer.pixel(80, 0));
        assert_eq!(Some(SHADE_2), frame_buffer.pixel(159, 0));
    }

    #[test]
    fn sprites() {
        let (bank_0, bank_n) = empty_banks();
        let mut address_space = AddressSpace::new(&bank_0, &bank_n);

        // LCDC: display on, unsigned tile data, sprites on, BG on
        address_space.write_address_u8(0xFF40, 0x93).unwrap();

        // Tile 3: leftmost column color 3, the rest transparent
        write_all(&mut address_space, 0x8030, &[0x80, 0x80].repeat(8));

        // OAM entries 0 and 1 (through DMA from WRAM): sprite 0 at screen x=10, sprite 1 at
        // screen x=20 with X flip
        write_all(&mut address_space, 0xC000, &[16, 18, 0x03, 0x00, 16, 28, 0x03, 0x20]);
        address_space.write_address_u8(0xFF46, 0xC0).unwrap();

        let mut frame_buffer = FrameBuffer::new();
        let sprites = scanned(&address_space, &[0, 1]);
        render_scanline(0, &sprites, &address_space, &mut frame_buffer).unwrap();
        assert_eq!(Some(SHADE_0), frame_buffer.pixel(9, 0));
        assert_eq!(Some(SHADE_3), frame_buffer.pixel(10, 0));
        assert_eq!(Some(SHADE_0), frame_buffer.pixel(11, 0));
        assert_eq!(Some(SHADE_0), frame_buffer.pixel(20, 0));
        assert_eq!(Some(SHADE_3), frame_buffer.pixel(27, 0));

        // Sprites that weren't selected during the OAM scan aren't drawn
        let sprites = scanned(&address_space, &[1]);
        render_scanline(0, &sprites, &address_space, &mut frame_buffer).unwrap();
        assert_eq!(Some(SHADE_0), frame_buffer.pixel(10, 0));
    }

    #[test]
    fn sprite_clipped_at_left_edge() {
        let (bank_0, bank_n) = empty_banks();
        let mut address_space = AddressSpace::new(&bank_0, &bank_n);
        address_space.write_address_u8(0xFF40, 0x93).unwrap();

        // Tile 4: rightmost column color 2
        write_all(&mut address_space, 0x8040, &[0x00, 0x01].repeat(8));

        // X=1 leaves only the rightmost column on screen, at x=0
        write_all(&mut address_space, 0xC000, &[16, 1, 0x04, 0x00]);
        address_space.write_address_u8(0xFF46, 0xC0).unwrap();

        let mut frame_buffer = FrameBuffer::new();
        let sprites = scanned(&address_space, &[0]);
        render_scanline(0, &sprites, &address_space, &mut frame_buffer).unwrap();
        assert_eq!(Some(SHADE_2), frame_buffer.pixel(0, 0));
        assert_eq!(Some(SHADE_0), frame_buffer.pixel(1, 0));
    }

    #[test]
    fn bg_over_obj_priority() {
        let (bank_0, bank_n) = empty_banks();
        let mut address_space = AddressSpace::new(&bank_0, &bank_n);
        address_space.write_address_u8(0xFF40, 0x93).unwrap();

        // Tile 1 solid color 1 covering BG columns 0-7, tile 3 solid color 3 for the sprite
        write_all(&mut address_space, 0x8010, &[0xFF, 0x00].repeat(8));
        write_all(&mut address_space, 0x8030, &[0xFF; 16]);
        address_space.write_address_u8(0x9800, 0x01).unwrap();

        // Sprite at screen x=4 behind non-zero BG
        write_all(&mut address_space, 0xC000, &[16, 12, 0x03, 0x80]);
        address_space.write_address_u8(0xFF46, 0xC0).unwrap();

        let mut frame_buffer = FrameBuffer::new();
        let sprites = scanned(&address_space, &[0]);
        render_scanline(0, &sprites, &address_space, &mut frame_buffer).unwrap();
        assert_eq!(Some(SHADE_1), frame_buffer.pixel(4, 0));
        assert_eq!(Some(SHADE_1), frame_buffer.pixel(7, 0));
        assert_eq!(Some(SHADE_3), frame_buffer.pixel(8, 0));
    }

    #[test]
    fn sprite_off_the_line_is_skipped() {
        let (bank_0, bank_n) = empty_banks();
        let mut address_space = AddressSpace::new(&bank_0, &bank_n);
        address_space.write_address_u8(0xFF40, 0x93).unwrap();
        write_all(&mut address_space, 0x8010, &[0xFF; 16]);

        // Y=100 and Y=0 both miss line 0, with and without Y flip
        write_all(&mut address_space, 0xC000, &[100, 8, 0x01, 0x00, 0, 8, 0x01, 0x40]);
        address_space.write_address_u8(0xFF46, 0xC0).unwrap();

        let mut frame_buffer = FrameBuffer::new();
        let sprites = scanned(&address_space, &[0, 1]);
        render_scanline(0, &sprites, &address_space, &mut frame_buffer).unwrap();
        assert_eq!(Some(SHADE_0), frame_buffer.pixel(0, 0));
    }
}
