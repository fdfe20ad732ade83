//! Print sheet compositing.
//!
//! Four captured stills are scaled into a 2x2 grid on a white canvas sized
//! from the printer's dpi and physical paper dimensions. Every cell is
//! mirrored horizontally; the print path on the kiosk printer reverses
//! left and right, so the sheet has to be pre-flipped.

use crate::config::PrintConfig;
use crate::layout::print_cell;
use crate::session::PhotoRecord;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::{debug, warn};

/// Target geometry of the print sheet.
#[derive(Debug, Clone, Copy)]
pub struct PrintLayout {
    pub dpi: f32,
    pub width_inch: f32,
    pub height_inch: f32,
}

impl PrintLayout {
    /// Canvas size in pixels, rounded to the nearest pixel per axis.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.dpi * self.width_inch).round() as u32,
            (self.dpi * self.height_inch).round() as u32,
        )
    }
}

impl From<&PrintConfig> for PrintLayout {
    fn from(config: &PrintConfig) -> Self {
        Self {
            dpi: config.dpi,
            width_inch: config.width_inch,
            height_inch: config.height_inch,
        }
    }
}

/// Compose captured stills into one print-ready sheet.
///
/// Photos land in the cell derived from their slot; slots without a photo
/// stay white. Identical inputs produce a byte-identical canvas.
pub fn compose_print(photos: &[PhotoRecord], layout: &PrintLayout) -> RgbImage {
    let (width, height) = layout.pixel_size();
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    for photo in photos {
        if !(1..=4).contains(&photo.slot) {
            warn!("Ignoring photo with out-of-range slot {}", photo.slot);
            continue;
        }

        let cell = print_cell(width, height, photo.slot);
        let scaled = imageops::resize(&photo.image, cell.width, cell.height, FilterType::Triangle);
        let mirrored = imageops::flip_horizontal(&scaled);
        imageops::replace(&mut canvas, &mirrored, cell.x as i64, cell.y as i64);

        debug!(
            "Placed slot {} at ({}, {}) as {}x{}",
            photo.slot, cell.x, cell.y, cell.width, cell.height
        );
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::print_cell;

    const LAYOUT: PrintLayout = PrintLayout {
        dpi: 300.0,
        width_inch: 6.0,
        height_inch: 4.0,
    };

    fn solid_photo(slot: u8, color: [u8; 3]) -> PhotoRecord {
        PhotoRecord::new(slot, RgbImage::from_pixel(40, 30, Rgb(color)))
    }

    fn full_set() -> Vec<PhotoRecord> {
        vec![
            solid_photo(1, [255, 0, 0]),
            solid_photo(2, [0, 255, 0]),
            solid_photo(3, [0, 0, 255]),
            solid_photo(4, [255, 255, 0]),
        ]
    }

    #[test]
    fn test_canvas_matches_dpi_times_inches() {
        let sheet = compose_print(&full_set(), &LAYOUT);
        assert_eq!(sheet.dimensions(), (1800, 1200));

        let odd = PrintLayout {
            dpi: 300.0,
            width_inch: 6.1,
            height_inch: 4.1,
        };
        let sheet = compose_print(&full_set(), &odd);
        assert_eq!(sheet.dimensions(), (1830, 1230));
    }

    #[test]
    fn test_each_slot_lands_in_its_cell() {
        let sheet = compose_print(&full_set(), &LAYOUT);
        let expected = [
            (1u8, [255u8, 0, 0]),
            (2, [0, 255, 0]),
            (3, [0, 0, 255]),
            (4, [255, 255, 0]),
        ];

        for (slot, color) in expected {
            let cell = print_cell(1800, 1200, slot);
            let center = sheet.get_pixel(cell.x + cell.width / 2, cell.y + cell.height / 2);
            assert_eq!(center.0, color, "slot {} center", slot);
        }
    }

    #[test]
    fn test_cells_are_mirrored_horizontally() {
        // left half red, right half blue
        let mut image = RgbImage::from_pixel(40, 30, Rgb([255, 0, 0]));
        for y in 0..30 {
            for x in 20..40 {
                image.put_pixel(x, y, Rgb([0, 0, 255]));
            }
        }
        let sheet = compose_print(&[PhotoRecord::new(1, image)], &LAYOUT);

        let cell = print_cell(1800, 1200, 1);
        let mid_y = cell.y + cell.height / 2;
        // after the flip the blue half ends up on the left
        assert_eq!(sheet.get_pixel(cell.x + 4, mid_y).0, [0, 0, 255]);
        assert_eq!(sheet.get_pixel(cell.x + cell.width - 4, mid_y).0, [255, 0, 0]);
    }

    #[test]
    fn test_missing_slots_stay_white() {
        let photos = vec![solid_photo(1, [10, 20, 30]), solid_photo(2, [40, 50, 60])];
        let sheet = compose_print(&photos, &LAYOUT);

        for slot in [3u8, 4] {
            let cell = print_cell(1800, 1200, slot);
            let center = sheet.get_pixel(cell.x + cell.width / 2, cell.y + cell.height / 2);
            assert_eq!(center.0, [255, 255, 255], "slot {} should be empty", slot);
        }
    }

    #[test]
    fn test_compose_is_deterministic() {
        let first = compose_print(&full_set(), &LAYOUT);
        let second = compose_print(&full_set(), &LAYOUT);
        assert_eq!(first.as_raw(), second.as_raw());
    }
}
