use crate::config::DisplayConfig;
use crate::error::{BoothError, Result};
use crate::layout::{screen_cell, PHOTO_INSET_PERCENT};
use crate::session::{PhotoRecord, PHOTOS_PER_SESSION};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const BACKGROUND_FILL: Rgba<u8> = Rgba([40, 40, 48, 255]);
const FRAME_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TEXT_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Off-screen drawing surface shared by the display backends.
///
/// Mirrors the layering of the kiosk screen: a tiled background, a photo
/// grid pinned on top of it, and transient overlays (prompts, letterbox
/// bars) painted onto the composed canvas.
pub(crate) struct BoothSurface {
    width: u32,
    height: u32,
    picture_height: u32,
    font: Option<Font<'static>>,
    font_size: f32,
    sample_dir: Option<PathBuf>,
    background: RgbaImage,
    photo_space: RgbaImage,
    canvas: RgbaImage,
}

impl BoothSurface {
    pub(crate) fn new(
        config: &DisplayConfig,
        picture_height: u32,
        font: Option<Font<'static>>,
    ) -> Result<Self> {
        let (width, height) = config.resolution;
        let background =
            Self::build_background(width, height, config.background_image.as_deref())?;

        let mut surface = Self {
            width,
            height,
            picture_height,
            font,
            font_size: config.font_size,
            sample_dir: config.sample_dir.as_ref().map(PathBuf::from),
            background,
            photo_space: RgbaImage::new(width, height),
            canvas: RgbaImage::new(width, height),
        };

        surface.rebuild_photo_space();
        surface.reset();
        Ok(surface)
    }

    /// Load the prompt font from disk.
    pub(crate) fn load_font(path: &str) -> Result<Font<'static>> {
        let data = fs::read(path).map_err(|e| {
            BoothError::hardware("display", format!("failed to read font file '{}': {}", path, e))
        })?;
        Font::try_from_vec(data).ok_or_else(|| {
            BoothError::hardware("display", format!("failed to parse font file '{}'", path))
        })
    }

    fn build_background(
        width: u32,
        height: u32,
        background_image: Option<&str>,
    ) -> Result<RgbaImage> {
        let mut background = RgbaImage::from_pixel(width, height, BACKGROUND_FILL);

        if let Some(path) = background_image {
            let tile = image::open(path)?.to_rgba8();
            imageops::tile(&mut background, &tile);
            debug!("Tiled background from {}", path);
        }

        Ok(background)
    }

    pub(crate) fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Compose the canvas from the background and the photo grid.
    pub(crate) fn reset(&mut self) {
        self.canvas.copy_from_slice(&self.background);
        imageops::overlay(&mut self.canvas, &self.photo_space, 0, 0);
    }

    /// Insert captured photos into their grid frames.
    pub(crate) fn insert_photos(&mut self, photos: &[PhotoRecord]) {
        for photo in photos {
            if !(1..=PHOTOS_PER_SESSION).contains(&photo.slot) {
                warn!("Ignoring photo with out-of-range slot {}", photo.slot);
                continue;
            }
            self.insert_photo(&photo.image, photo.slot);
        }
    }

    /// Rebuild the photo grid from sample images (or generated stand-ins).
    pub(crate) fn rebuild_photo_space(&mut self) {
        self.photo_space = RgbaImage::new(self.width, self.height);
        for slot in 1..=PHOTOS_PER_SESSION {
            let sample = self.load_sample(slot);
            self.insert_photo(&sample, slot);
        }
    }

    fn load_sample(&self, slot: u8) -> RgbImage {
        if let Some(dir) = &self.sample_dir {
            let path = dir.join(format!("sample{}.png", slot));
            match image::open(&path) {
                Ok(sample) => return sample.to_rgb8(),
                Err(e) => {
                    warn!(
                        "Could not load sample image {}: {}, using a stand-in",
                        path.display(),
                        e
                    );
                }
            }
        }
        placeholder_tile(slot, 320, 240)
    }

    fn insert_photo(&mut self, photo: &RgbImage, slot: u8) {
        let cell = screen_cell(self.width, self.height, slot);

        // instant-film frame: white card with a strip above and below the print
        let mut frame = RgbaImage::from_pixel(cell.width, cell.height, FRAME_WHITE);
        let inset = cell.height * PHOTO_INSET_PERCENT / 100;
        let photo_height = cell.height.saturating_sub(2 * inset).max(1);

        let scaled = imageops::resize(photo, cell.width, photo_height, FilterType::Triangle);
        let scaled = DynamicImage::ImageRgb8(scaled).to_rgba8();
        imageops::replace(&mut frame, &scaled, 0, inset as i64);

        imageops::replace(&mut self.photo_space, &frame, cell.x as i64, cell.y as i64);
    }

    /// White letterbox bars above and below the live preview area.
    pub(crate) fn draw_capture_border(&mut self) {
        let bar_height = self.height.saturating_sub(self.picture_height) / 2;
        if bar_height == 0 {
            return;
        }

        draw_filled_rect_mut(
            &mut self.canvas,
            Rect::at(0, 0).of_size(self.width, bar_height),
            FRAME_WHITE,
        );
        draw_filled_rect_mut(
            &mut self.canvas,
            Rect::at(0, (bar_height + self.picture_height) as i32).of_size(self.width, bar_height),
            FRAME_WHITE,
        );
    }

    /// Centered multi-line prompt in a rounded speech box.
    pub(crate) fn draw_prompt(&mut self, text: &str, background: Rgb<u8>) {
        // Font is Arc-backed, the clone shares the face data
        let font = match &self.font {
            Some(font) => font.clone(),
            None => {
                debug!("No prompt font loaded, skipping prompt: {:?}", text);
                return;
            }
        };

        let scale = Scale::uniform(self.font_size);
        let lines: Vec<&str> = text.split('\n').collect();

        let mut text_width = 0i32;
        for line in &lines {
            let (line_width, _) = text_size(scale, &font, line);
            text_width = text_width.max(line_width);
        }
        let line_height = self.font_size.ceil() as i32;
        let text_height = line_height * lines.len() as i32;

        let box_width = text_width + text_width / 10;
        let box_height = text_height + text_height / 10;
        let x = (self.width as i32 - box_width) / 2;
        let y = (self.height as i32 - box_height) / 2;

        let fill = Rgba([background[0], background[1], background[2], 255]);
        self.draw_rounded_rect(x, y, box_width, box_height, fill);

        let mut line_y = y + text_height / 20;
        for line in &lines {
            let (line_width, _) = text_size(scale, &font, line);
            let line_x = (self.width as i32 - line_width) / 2;
            draw_text_mut(
                &mut self.canvas,
                TEXT_WHITE,
                line_x,
                line_y,
                scale,
                &font,
                line,
            );
            line_y += line_height;
        }
    }

    fn draw_rounded_rect(&mut self, x: i32, y: i32, width: i32, height: i32, fill: Rgba<u8>) {
        if width <= 0 || height <= 0 {
            return;
        }

        let radius = ((width.min(height) as f32) * 0.2) as i32;
        let radius = radius.min(width / 2).min(height / 2).max(0);

        if width > 2 * radius {
            draw_filled_rect_mut(
                &mut self.canvas,
                Rect::at(x + radius, y).of_size((width - 2 * radius) as u32, height as u32),
                fill,
            );
        }
        if height > 2 * radius {
            draw_filled_rect_mut(
                &mut self.canvas,
                Rect::at(x, y + radius).of_size(width as u32, (height - 2 * radius) as u32),
                fill,
            );
        }

        if radius > 0 {
            let corners = [
                (x + radius, y + radius),
                (x + width - radius - 1, y + radius),
                (x + radius, y + height - radius - 1),
                (x + width - radius - 1, y + height - radius - 1),
            ];
            for center in corners {
                draw_filled_circle_mut(&mut self.canvas, center, radius, fill);
            }
        }
    }
}

/// Generated stand-in for a missing sample image: a gradient tinted per slot.
pub(crate) fn placeholder_tile(slot: u8, width: u32, height: u32) -> RgbImage {
    let mut tile = RgbImage::new(width, height);
    for (x, y, pixel) in tile.enumerate_pixels_mut() {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x + y) * 255 / (width + height).max(1)) as u8;
        *pixel = match slot % 3 {
            0 => Rgb([r, g, b]),
            1 => Rgb([b, r, g]),
            _ => Rgb([g, b, r]),
        };
    }
    tile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoothConfig;
    use crate::layout::screen_cell;

    fn test_surface() -> BoothSurface {
        let mut config = BoothConfig::default().display;
        config.resolution = (200, 160);
        BoothSurface::new(&config, 120, None).unwrap()
    }

    #[test]
    fn test_reset_composes_background_and_grid() {
        let mut surface = test_surface();
        surface.reset();

        // outside the grid the background fill shows through
        assert_eq!(surface.canvas().get_pixel(0, 0).0, BACKGROUND_FILL.0);

        // each cell carries a white frame strip at its top edge
        for slot in 1..=PHOTOS_PER_SESSION {
            let cell = screen_cell(200, 160, slot);
            assert_eq!(
                surface.canvas().get_pixel(cell.x + 1, cell.y + 1).0,
                FRAME_WHITE.0,
                "slot {} frame",
                slot
            );
        }
    }

    #[test]
    fn test_inserted_photo_fills_its_cell() {
        let mut surface = test_surface();
        let red = RgbImage::from_pixel(40, 30, Rgb([255, 0, 0]));
        surface.insert_photos(&[PhotoRecord::new(2, red)]);
        surface.reset();

        let cell = screen_cell(200, 160, 2);
        let center = surface
            .canvas()
            .get_pixel(cell.x + cell.width / 2, cell.y + cell.height / 2);
        assert_eq!(center.0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_capture_border_paints_letterbox_bars() {
        let mut surface = test_surface();
        surface.reset();
        surface.draw_capture_border();

        // (160 - 120) / 2 = 20 pixel bars top and bottom
        assert_eq!(surface.canvas().get_pixel(100, 0).0, FRAME_WHITE.0);
        assert_eq!(surface.canvas().get_pixel(100, 19).0, FRAME_WHITE.0);
        assert_eq!(surface.canvas().get_pixel(100, 159).0, FRAME_WHITE.0);
    }

    #[test]
    fn test_prompt_without_font_is_skipped() {
        let mut surface = test_surface();
        surface.reset();
        let before = surface.canvas().clone();
        surface.draw_prompt("Ready?", Rgb([255, 140, 0]));
        assert_eq!(surface.canvas().as_raw(), before.as_raw());
    }

    #[test]
    fn test_rebuild_photo_space_restores_samples() {
        let mut surface = test_surface();
        let red = RgbImage::from_pixel(40, 30, Rgb([255, 0, 0]));
        surface.insert_photos(&[PhotoRecord::new(1, red)]);
        surface.rebuild_photo_space();
        surface.reset();

        let cell = screen_cell(200, 160, 1);
        let center = surface
            .canvas()
            .get_pixel(cell.x + cell.width / 2, cell.y + cell.height / 2);
        // the captured red still has been replaced by the generated stand-in
        assert_ne!(center.0, [255, 0, 0, 255]);
    }
}
