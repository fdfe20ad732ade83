mod framebuffer;
mod headless;
mod surface;

pub use framebuffer::FramebufferDisplay;
pub use headless::HeadlessDisplay;

use crate::error::Result;
use crate::session::PhotoRecord;
use image::Rgb;

/// Accent colour for the greeting/farewell speech box.
pub const PROMPT_ACCENT: Rgb<u8> = Rgb([255, 140, 0]);

/// Neutral colour for the capture announcement box.
pub const PROMPT_DARK: Rgb<u8> = Rgb([20, 20, 20]);

/// Fullscreen renderer for the kiosk.
///
/// All drawing happens on an off-screen surface; `present` pushes the result
/// to the physical screen. Implementations own their device handles for the
/// process lifetime and release them idempotently.
pub trait DisplayRenderer: Send {
    /// Repaint the tiled background and the current photo grid.
    fn draw_idle_background(&mut self) -> Result<()>;

    /// Insert captured photos into their grid frames and repaint.
    fn draw_photo_grid(&mut self, photos: &[PhotoRecord]) -> Result<()>;

    /// Paint the white letterbox bars framing the live camera preview.
    fn draw_capture_border(&mut self) -> Result<()>;

    /// Paint a centered multi-line prompt in a rounded speech box.
    fn draw_prompt(&mut self, text: &str, background: Rgb<u8>) -> Result<()>;

    /// Rebuild the idle photo grid from the sample images.
    fn reset_photo_grid(&mut self) -> Result<()>;

    /// Push the off-screen surface to the screen.
    fn present(&mut self) -> Result<()>;

    /// Release the screen. Safe to call more than once.
    fn release(&mut self) -> Result<()>;
}
