use super::CaptureBackend;
use crate::config::CameraConfig;
use crate::error::{BoothError, Result};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Camera backend shelling out to a still-capture command.
///
/// The configured argv is run with the target path appended as the final
/// argument, matching the wrapper-script convention used for the printer.
/// The command is expected to leave a decodable image at the path.
pub struct CommandCamera {
    command: Vec<String>,
    previewing: bool,
}

impl CommandCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            command: config.capture_command.clone(),
            previewing: false,
        }
    }
}

#[async_trait]
impl CaptureBackend for CommandCamera {
    async fn start_preview(&mut self) -> Result<()> {
        // the capture command owns the sensor; there is no separate preview stream
        debug!("Command camera: preview window not supported");
        self.previewing = true;
        Ok(())
    }

    async fn stop_preview(&mut self) -> Result<()> {
        self.previewing = false;
        Ok(())
    }

    async fn annotate(&mut self, text: &str) -> Result<()> {
        debug!("Command camera: annotation not supported ({:?})", text);
        Ok(())
    }

    async fn capture(&mut self, path: &Path) -> Result<RgbImage> {
        let (program, args) = self.command.split_first().ok_or_else(|| {
            BoothError::hardware("camera", "capture command is empty".to_string())
        })?;

        let status = Command::new(program)
            .args(args)
            .arg(path)
            .status()
            .await
            .map_err(|e| {
                BoothError::hardware("camera", format!("failed to run '{}': {}", program, e))
            })?;

        if !status.success() {
            return Err(BoothError::hardware(
                "camera",
                format!("capture command exited with {}", status),
            ));
        }

        let image = image::open(path)
            .map_err(|e| {
                BoothError::hardware(
                    "camera",
                    format!("captured still {} is unreadable: {}", path.display(), e),
                )
            })?
            .to_rgb8();

        info!(
            "Captured {}x{} still to {}",
            image.width(),
            image.height(),
            path.display()
        );
        Ok(image)
    }

    async fn cleanup(&mut self) -> Result<()> {
        if self.previewing {
            warn!("Camera released while previewing");
            self.previewing = false;
        }
        Ok(())
    }
}

/// Synthetic camera producing gradient stills, for development and tests.
pub struct MockCamera {
    resolution: (u32, u32),
    captures: u32,
    previewing: bool,
    annotations: Vec<String>,
}

impl MockCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            resolution: config.picture_resolution,
            captures: 0,
            previewing: false,
            annotations: Vec::new(),
        }
    }

    pub fn captures(&self) -> u32 {
        self.captures
    }

    pub fn annotations(&self) -> &[String] {
        &self.annotations
    }

    fn synthetic_still(&self) -> RgbImage {
        let (width, height) = self.resolution;
        let shift = (self.captures * 40) as u32;
        let mut still = RgbImage::new(width, height);
        for (x, y, pixel) in still.enumerate_pixels_mut() {
            let r = ((x + shift) * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = ((x + y) * 255 / (width + height).max(1)) as u8;
            *pixel = Rgb([r, g, b]);
        }
        still
    }
}

#[async_trait]
impl CaptureBackend for MockCamera {
    async fn start_preview(&mut self) -> Result<()> {
        self.previewing = true;
        Ok(())
    }

    async fn stop_preview(&mut self) -> Result<()> {
        self.previewing = false;
        Ok(())
    }

    async fn annotate(&mut self, text: &str) -> Result<()> {
        self.annotations.push(text.to_string());
        Ok(())
    }

    async fn capture(&mut self, path: &Path) -> Result<RgbImage> {
        let still = self.synthetic_still();
        still.save(path)?;
        self.captures += 1;
        debug!("Mock camera wrote still {} to {}", self.captures, path.display());
        Ok(still)
    }

    async fn cleanup(&mut self) -> Result<()> {
        self.previewing = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoothConfig;
    use tempfile::TempDir;

    fn camera_config() -> CameraConfig {
        let mut config = BoothConfig::default().camera;
        config.picture_resolution = (64, 48);
        config
    }

    #[tokio::test]
    async fn test_mock_camera_writes_decodable_still() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo_1.jpg");

        let mut camera = MockCamera::new(&camera_config());
        let still = camera.capture(&path).await.unwrap();

        assert_eq!(still.dimensions(), (64, 48));
        assert_eq!(camera.captures(), 1);

        let reloaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(reloaded.dimensions(), (64, 48));
    }

    #[tokio::test]
    async fn test_mock_camera_records_annotations() {
        let mut camera = MockCamera::new(&camera_config());
        camera.annotate("3").await.unwrap();
        camera.annotate("2").await.unwrap();
        camera.annotate("").await.unwrap();

        assert_eq!(camera.annotations(), &["3", "2", ""]);
    }

    #[tokio::test]
    async fn test_command_camera_copies_still_into_place() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        let target = tmp.path().join("photo_1.jpg");

        RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]))
            .save(&source)
            .unwrap();

        let mut config = camera_config();
        config.capture_command = vec!["cp".to_string(), source.display().to_string()];

        let mut camera = CommandCamera::new(&config);
        let still = camera.capture(&target).await.unwrap();
        assert_eq!(still.dimensions(), (8, 8));
        assert!(target.is_file());
    }

    #[tokio::test]
    async fn test_command_camera_propagates_command_failure() {
        let tmp = TempDir::new().unwrap();
        let mut config = camera_config();
        config.capture_command = vec!["false".to_string()];

        let mut camera = CommandCamera::new(&config);
        let result = camera.capture(&tmp.path().join("photo_1.jpg")).await;

        assert!(matches!(result, Err(BoothError::Hardware { .. })));
    }
}
