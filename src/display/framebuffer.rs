use super::surface::BoothSurface;
use super::DisplayRenderer;
use crate::config::DisplayConfig;
use crate::error::{BoothError, Result};
use crate::session::PhotoRecord;
use image::{Rgb, RgbaImage};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use tracing::{debug, info, warn};

/// Display backend writing RGB565 frames to a Linux framebuffer device.
pub struct FramebufferDisplay {
    surface: BoothSurface,
    device_path: String,
    device: Option<File>,
}

impl FramebufferDisplay {
    pub fn new(config: &DisplayConfig, picture_height: u32) -> Result<Self> {
        // The kiosk is useless without prompts, so the font is mandatory here
        let font = BoothSurface::load_font(&config.font_path)?;
        let surface = BoothSurface::new(config, picture_height, Some(font))?;

        let device = OpenOptions::new()
            .write(true)
            .open(&config.framebuffer_device)
            .map_err(|e| {
                BoothError::hardware(
                    "display",
                    format!(
                        "failed to open framebuffer {}: {}",
                        config.framebuffer_device, e
                    ),
                )
            })?;

        info!(
            "Framebuffer display opened: {} at {}x{}",
            config.framebuffer_device, config.resolution.0, config.resolution.1
        );

        Ok(Self {
            surface,
            device_path: config.framebuffer_device.clone(),
            device: Some(device),
        })
    }

    fn write_frame(&mut self, data: &[u8]) -> Result<()> {
        let device = self.device.as_mut().ok_or_else(|| {
            BoothError::hardware("display", "framebuffer already released".to_string())
        })?;

        device.seek(SeekFrom::Start(0)).map_err(|e| {
            BoothError::hardware("display", format!("failed to seek framebuffer: {}", e))
        })?;
        device.write_all(data).map_err(|e| {
            BoothError::hardware("display", format!("failed to write framebuffer: {}", e))
        })?;
        device.flush().map_err(|e| {
            BoothError::hardware("display", format!("failed to flush framebuffer: {}", e))
        })?;

        Ok(())
    }
}

impl DisplayRenderer for FramebufferDisplay {
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
        let data = rgba_to_rgb565(self.surface.canvas());
        self.write_frame(&data)?;
        debug!("Presented frame to {}", self.device_path);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        if self.device.is_none() {
            return Ok(());
        }

        // blank the screen before letting go of the device
        let (width, height) = self.surface.dimensions();
        let blank = vec![0u8; (width * height * 2) as usize];
        if let Err(e) = self.write_frame(&blank) {
            warn!("Could not blank framebuffer on release: {}", e);
        }

        self.device = None;
        info!("Framebuffer display released: {}", self.device_path);
        Ok(())
    }
}

/// Pack an RGBA surface into little-endian RGB565, the kiosk panel's format.
fn rgba_to_rgb565(surface: &RgbaImage) -> Vec<u8> {
    let mut data = Vec::with_capacity((surface.width() * surface.height() * 2) as usize);

    for pixel in surface.pixels() {
        let r = pixel[0] >> 3;
        let g = pixel[1] >> 2;
        let b = pixel[2] >> 3;

        let rgb565 = ((r as u16) << 11) | ((g as u16) << 5) | (b as u16);

        data.push((rgb565 & 0xFF) as u8);
        data.push((rgb565 >> 8) as u8);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb565_packing() {
        let surface = RgbaImage::from_pixel(2, 1, image::Rgba([255, 0, 0, 255]));
        let data = rgba_to_rgb565(&surface);

        assert_eq!(data.len(), 4);
        // pure red: five high bits set, little-endian
        assert_eq!(data[0], 0x00);
        assert_eq!(data[1], 0xF8);
    }

    #[test]
    fn test_rgb565_white_and_black() {
        let mut surface = RgbaImage::new(2, 1);
        surface.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        surface.put_pixel(1, 0, image::Rgba([0, 0, 0, 255]));

        let data = rgba_to_rgb565(&surface);
        assert_eq!(&data[0..2], &[0xFF, 0xFF]);
        assert_eq!(&data[2..4], &[0x00, 0x00]);
    }
}
