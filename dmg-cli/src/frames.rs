use dmg_core::graphics::{PixelSink, SCREEN_HEIGHT, SCREEN_WIDTH};
use dmg_core::{Color, FrameBuffer};
use std::fs;
use std::path::PathBuf;

/// Headless pixel sink. Keeps the frames in memory and optionally writes each presented frame to
/// disk as a binary PPM image.
#[derive(Debug)]
pub struct HeadlessSink {
    frame_buffer: FrameBuffer,
    dump_dir: Option<PathBuf>,
}

impl HeadlessSink {
    pub fn new(dump_dir: Option<PathBuf>) -> Self {
        Self {
            frame_buffer: FrameBuffer::new(),
            dump_dir,
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.frame_buffer.frames_presented()
    }

    fn dump_last_frame(&self) {
        let (Some(dump_dir), Some(frame)) = (&self.dump_dir, self.frame_buffer.last_frame()) else {
            return;
        };

        let path = dump_dir.join(format!(
            "frame{:06}.ppm",
            self.frame_buffer.frames_presented()
        ));

        let mut contents = format!("P6\n{SCREEN_WIDTH} {SCREEN_HEIGHT}\n255\n").into_bytes();
        contents.extend_from_slice(&frame);

        // A failed dump shouldn't stop emulation
        if let Err(err) = fs::write(&path, contents) {
            log::warn!("Unable to write frame to '{}': {err}", path.display());
        }
    }
}

impl PixelSink for HeadlessSink {
    fn draw_pixel(&mut self, x: u8, y: u8, color: Color) {
        self.frame_buffer.draw_pixel(x, y, color);
    }

    fn present_frame(&mut self) {
        self.frame_buffer.present_frame();
        self.dump_last_frame();
    }
}
