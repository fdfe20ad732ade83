use super::surface::BoothSurface;
use super::DisplayRenderer;
use crate::config::DisplayConfig;
use crate::error::Result;
use crate::session::PhotoRecord;
use image::{Rgb, RgbaImage};
use tracing::{debug, warn};

/// Display backend without a physical screen.
///
/// Renders to the off-screen surface only; useful for development boxes and
/// tests. The prompt font is optional here, a missing font only downgrades
/// prompts to their speech box.
pub struct HeadlessDisplay {
    surface: BoothSurface,
    frames_presented: u64,
}

impl HeadlessDisplay {
    pub fn new(config: &DisplayConfig, picture_height: u32) -> Result<Self> {
        let font = match BoothSurface::load_font(&config.font_path) {
            Ok(font) => Some(font),
            Err(e) => {
                warn!("Headless display runs without a prompt font: {}", e);
                None
            }
        };

        Ok(Self {
            surface: BoothSurface::new(config, picture_height, font)?,
            frames_presented: 0,
        })
    }

    /// The last composed frame, for inspection.
    pub fn frame(&self) -> &RgbaImage {
        self.surface.canvas()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl DisplayRenderer for HeadlessDisplay {
    fn draw_idle_background(&mut self) -> Result<()> {
        self.surface.reset();
        Ok(())
    }

    fn draw_photo_grid(&mut self, photos: &[PhotoRecord]) -> Result<()> {
        self.surface.insert_photos(photos);
        self.surface.reset();
        Ok(())
    }

    fn draw_capture_border(&mut self) -> Result<()> {
        self.surface.draw_capture_border();
        Ok(())
    }

    fn draw_prompt(&mut self, text: &str, background: Rgb<u8>) -> Result<()> {
        self.surface.draw_prompt(text, background);
        Ok(())
    }

    fn reset_photo_grid(&mut self) -> Result<()> {
        self.surface.rebuild_photo_space();
        self.surface.reset();
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.frames_presented += 1;
        debug!("Headless display frame {}", self.frames_presented);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        debug!(
            "Headless display released after {} frames",
            self.frames_presented
        );
        Ok(())
    }
}
