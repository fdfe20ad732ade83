//! 2x2 grid geometry shared by the live screen and the print sheet.
//!
//! Both layouts place slot k (1..=4) at column `(k-1) % 2` and row
//! `(k-1) / 2`. The screen layout keeps outer margins (three gaps per axis),
//! the print layout only keeps the central gap so the photos bleed to the
//! paper edge.

/// Percentage gap between cells on the live screen.
pub const SCREEN_GAP_PERCENT: u32 = 5;

/// Percentage gap between cells on the print sheet.
pub const PRINT_GAP_PERCENT: u32 = 2;

/// Vertical inset of a photo inside its screen frame, leaving a white strip
/// above and below like an instant-film border.
pub const PHOTO_INSET_PERCENT: u32 = 8;

/// Pixel rectangle of a grid cell within a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Grid column for a capture slot (1..=4)
pub fn slot_column(slot: u8) -> u32 {
    debug_assert!((1..=4).contains(&slot));
    ((slot - 1) % 2) as u32
}

/// Grid row for a capture slot (1..=4)
pub fn slot_row(slot: u8) -> u32 {
    debug_assert!((1..=4).contains(&slot));
    ((slot - 1) / 2) as u32
}

/// Cell rectangle in the screen layout: outer margins plus a central gap.
pub fn screen_cell(width: u32, height: u32, slot: u8) -> CellRect {
    let gap_w = width * SCREEN_GAP_PERCENT / 100;
    let gap_h = height * SCREEN_GAP_PERCENT / 100;
    let frame_w = (width - 3 * gap_w) / 2;
    let frame_h = (height - 3 * gap_h) / 2;

    let x = if slot_column(slot) == 0 {
        gap_w
    } else {
        2 * gap_w + frame_w
    };
    let y = if slot_row(slot) == 0 {
        gap_h
    } else {
        2 * gap_h + frame_h
    };

    CellRect {
        x,
        y,
        width: frame_w,
        height: frame_h,
    }
}

/// Cell rectangle in the print layout: no outer margin, central gap only.
pub fn print_cell(width: u32, height: u32, slot: u8) -> CellRect {
    let gap_w = width * PRINT_GAP_PERCENT / 100;
    let gap_h = height * PRINT_GAP_PERCENT / 100;
    let frame_w = (width - gap_w) / 2;
    let frame_h = (height - gap_h) / 2;

    let x = if slot_column(slot) == 0 {
        0
    } else {
        gap_w + frame_w
    };
    let y = if slot_row(slot) == 0 {
        0
    } else {
        gap_h + frame_h
    };

    CellRect {
        x,
        y,
        width: frame_w,
        height: frame_h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_positions_follow_capture_order() {
        // slot 1 top-left, 2 top-right, 3 bottom-left, 4 bottom-right
        assert_eq!((slot_column(1), slot_row(1)), (0, 0));
        assert_eq!((slot_column(2), slot_row(2)), (1, 0));
        assert_eq!((slot_column(3), slot_row(3)), (0, 1));
        assert_eq!((slot_column(4), slot_row(4)), (1, 1));
    }

    #[test]
    fn test_screen_cells_keep_outer_margin() {
        let width = 1000;
        let height = 800;
        let gap_w = width * SCREEN_GAP_PERCENT / 100;
        let gap_h = height * SCREEN_GAP_PERCENT / 100;

        let first = screen_cell(width, height, 1);
        assert_eq!(first.x, gap_w);
        assert_eq!(first.y, gap_h);

        let last = screen_cell(width, height, 4);
        assert_eq!(last.x, 2 * gap_w + first.width);
        assert_eq!(last.y, 2 * gap_h + first.height);

        // two frames and three gaps fill the axis up to rounding
        assert!(2 * first.width + 3 * gap_w <= width);
    }

    #[test]
    fn test_print_cells_touch_the_edges() {
        let width = 1800;
        let height = 1200;
        let gap_w = width * PRINT_GAP_PERCENT / 100;

        let first = print_cell(width, height, 1);
        assert_eq!((first.x, first.y), (0, 0));

        let second = print_cell(width, height, 2);
        assert_eq!(second.x, gap_w + first.width);
        assert_eq!(second.x + second.width, width);
    }

    #[test]
    fn test_same_slot_same_cell_across_calls() {
        for slot in 1..=4 {
            assert_eq!(
                print_cell(1800, 1200, slot),
                print_cell(1800, 1200, slot)
            );
            assert_eq!(
                screen_cell(1024, 768, slot),
                screen_cell(1024, 768, slot)
            );
        }
    }
}
