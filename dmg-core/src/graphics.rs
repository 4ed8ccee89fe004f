use crate::ppu::PpuError;
use std::sync::Arc;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

const BYTES_PER_PIXEL: usize = 3;
const FRAME_LEN: usize = SCREEN_WIDTH * SCREEN_HEIGHT * BYTES_PER_PIXEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

// Index 0 is the darkest shade
const PALETTE: [Color; 4] = [
    Color::rgb(0x0F, 0x38, 0x0F),
    Color::rgb(0x30, 0x62, 0x30),
    Color::rgb(0x8B, 0xAC, 0x0F),
    Color::rgb(0x9B, 0xBC, 0x0F),
];

/// Map a 2-bit color index to its display color.
pub fn palette_color(color_index: u8) -> Result<Color, PpuError> {
    PALETTE
        .get(usize::from(color_index))
        .copied()
        .ok_or(PpuError::InvalidColorIndex { color_index })
}

/// Destination for the pixels the PPU produces. The PPU draws each pixel of a scanline as it
/// renders it and calls `present_frame` once per frame, on VBlank entry.
pub trait PixelSink {
    fn draw_pixel(&mut self, x: u8, y: u8, color: Color);

    fn present_frame(&mut self);
}

/// A 160x144 RGB24 pixel sink. Pixels are drawn into a working buffer; presenting a frame copies
/// the working buffer into an immutable snapshot that can be handed off to another thread.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    working: Vec<u8>,
    last_frame: Option<Arc<[u8]>>,
    frames_presented: u64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            working: vec![0; FRAME_LEN],
            last_frame: None,
            frames_presented: 0,
        }
    }

    /// The most recently presented frame as packed RGB24 rows, or None if no frame has been
    /// presented yet.
    pub fn last_frame(&self) -> Option<Arc<[u8]>> {
        self.last_frame.clone()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Read back a pixel from the working buffer.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return None;
        }

        let i = (y * SCREEN_WIDTH + x) * BYTES_PER_PIXEL;
        Some(Color::rgb(
            self.working[i],
            self.working[i + 1],
            self.working[i + 2],
        ))
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelSink for FrameBuffer {
    fn draw_pixel(&mut self, x: u8, y: u8, color: Color) {
        let (x, y) = (usize::from(x), usize::from(y));
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            log::warn!("Ignoring out-of-bounds pixel draw at ({x}, {y})");
            return;
        }

        let i = (y * SCREEN_WIDTH + x) * BYTES_PER_PIXEL;
        self.working[i..i + BYTES_PER_PIXEL].copy_from_slice(&[color.r, color.g, color.b]);
    }

    fn present_frame(&mut self) {
        self.last_frame = Some(Arc::from(self.working.as_slice()));
        self.frames_presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette() {
        assert_eq!(Ok(Color::rgb(0x0F, 0x38, 0x0F)), palette_color(0));
        assert_eq!(Ok(Color::rgb(0x9B, 0xBC, 0x0F)), palette_color(3));
        assert_eq!(
            Err(PpuError::InvalidColorIndex { color_index: 4 }),
            palette_color(4)
        );
    }

    #[test]
    fn frame_snapshot_is_immutable() {
        let mut frame_buffer = FrameBuffer::new();
        assert_eq!(None, frame_buffer.last_frame());

        let color = Color::rgb(1, 2, 3);
        frame_buffer.draw_pixel(159, 143, color);
        frame_buffer.present_frame();

        let frame = frame_buffer.last_frame().unwrap();
        assert_eq!(FRAME_LEN, frame.len());
        assert_eq!(&[1, 2, 3], &frame[FRAME_LEN - 3..]);

        frame_buffer.draw_pixel(159, 143, Color::rgb(9, 9, 9));
        assert_eq!(&[1, 2, 3], &frame[FRAME_LEN - 3..]);
        assert_eq!(Some(Color::rgb(9, 9, 9)), frame_buffer.pixel(159, 143));
        assert_eq!(1, frame_buffer.frames_presented());
    }

    #[test]
    fn out_of_bounds_draw_ignored() {
        let mut frame_buffer = FrameBuffer::new();
        frame_buffer.draw_pixel(160, 0, Color::rgb(0xFF, 0xFF, 0xFF));
        frame_buffer.draw_pixel(0, 144, Color::rgb(0xFF, 0xFF, 0xFF));
        assert!(frame_buffer.working.iter().all(|&b| b == 0));
        assert_eq!(None, frame_buffer.pixel(160, 0));
    }
}
