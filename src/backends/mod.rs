mod camera;
mod input;
mod output;

pub use camera::{CommandCamera, MockCamera};
pub use input::{GpioButton, KeyboardInput, MockInput};
pub use output::{CommandPrinter, DirectorySaver, MockOutput};

use crate::config::BoothConfig;
use crate::display::{DisplayRenderer, FramebufferDisplay, HeadlessDisplay};
use crate::error::{BoothError, Result};
use async_trait::async_trait;
use image::RgbImage;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Camera hardware behind the capture stages.
#[async_trait]
pub trait CaptureBackend: Send {
    async fn start_preview(&mut self) -> Result<()>;

    async fn stop_preview(&mut self) -> Result<()>;

    /// Overlay text on the live preview (countdown digits); empty clears it.
    async fn annotate(&mut self, text: &str) -> Result<()>;

    /// Capture one still to `path` and hand back the decoded image.
    async fn capture(&mut self, path: &Path) -> Result<RgbImage>;

    /// Release the camera. Safe to call more than once.
    async fn cleanup(&mut self) -> Result<()>;
}

/// Physical trigger button and ready indicator.
#[async_trait]
pub trait InputBackend: Send {
    /// Non-blocking check whether the trigger has fired.
    async fn poll_trigger(&mut self) -> Result<bool>;

    async fn set_indicator(&mut self, on: bool) -> Result<()>;

    /// Release the input hardware. Safe to call more than once.
    async fn cleanup(&mut self) -> Result<()>;
}

/// Delivery of the finished print sheet.
#[async_trait]
pub trait OutputBackend: Send {
    async fn deliver(&mut self, composite: &Path) -> Result<()>;
}

/// The four collaborators the state machine drives.
pub struct BackendSet {
    pub camera: Box<dyn CaptureBackend>,
    pub input: Box<dyn InputBackend>,
    pub output: Box<dyn OutputBackend>,
    pub display: Box<dyn DisplayRenderer>,
}

type CameraFactory = fn(&BoothConfig) -> Result<Box<dyn CaptureBackend>>;
type InputFactory = fn(&BoothConfig, CancellationToken) -> Result<Box<dyn InputBackend>>;
type OutputFactory = fn(&BoothConfig) -> Result<Box<dyn OutputBackend>>;
type DisplayFactory = fn(&BoothConfig) -> Result<Box<dyn DisplayRenderer>>;

fn make_command_camera(config: &BoothConfig) -> Result<Box<dyn CaptureBackend>> {
    Ok(Box::new(CommandCamera::new(&config.camera)))
}

fn make_mock_camera(config: &BoothConfig) -> Result<Box<dyn CaptureBackend>> {
    Ok(Box::new(MockCamera::new(&config.camera)))
}

fn make_gpio_input(
    config: &BoothConfig,
    _shutdown: CancellationToken,
) -> Result<Box<dyn InputBackend>> {
    Ok(Box::new(GpioButton::new(&config.input)?))
}

fn make_keyboard_input(
    _config: &BoothConfig,
    shutdown: CancellationToken,
) -> Result<Box<dyn InputBackend>> {
    Ok(Box::new(KeyboardInput::new(shutdown)?))
}

fn make_mock_input(
    _config: &BoothConfig,
    _shutdown: CancellationToken,
) -> Result<Box<dyn InputBackend>> {
    Ok(Box::new(MockInput::new()))
}

fn make_printer_output(config: &BoothConfig) -> Result<Box<dyn OutputBackend>> {
    Ok(Box::new(CommandPrinter::new(&config.output)))
}

fn make_directory_output(config: &BoothConfig) -> Result<Box<dyn OutputBackend>> {
    Ok(Box::new(DirectorySaver::new(&config.output)))
}

fn make_mock_output(_config: &BoothConfig) -> Result<Box<dyn OutputBackend>> {
    Ok(Box::new(MockOutput::new()))
}

fn make_framebuffer_display(config: &BoothConfig) -> Result<Box<dyn DisplayRenderer>> {
    Ok(Box::new(FramebufferDisplay::new(
        &config.display,
        config.camera.picture_resolution.1,
    )?))
}

fn make_headless_display(config: &BoothConfig) -> Result<Box<dyn DisplayRenderer>> {
    Ok(Box::new(HeadlessDisplay::new(
        &config.display,
        config.camera.picture_resolution.1,
    )?))
}

const CAMERA_REGISTRY: &[(&str, CameraFactory)] = &[
    ("command", make_command_camera),
    ("mock", make_mock_camera),
];

const INPUT_REGISTRY: &[(&str, InputFactory)] = &[
    ("gpio", make_gpio_input),
    ("keyboard", make_keyboard_input),
    ("mock", make_mock_input),
];

const OUTPUT_REGISTRY: &[(&str, OutputFactory)] = &[
    ("printer", make_printer_output),
    ("directory", make_directory_output),
    ("mock", make_mock_output),
];

const DISPLAY_REGISTRY: &[(&str, DisplayFactory)] = &[
    ("framebuffer", make_framebuffer_display),
    ("headless", make_headless_display),
];

fn lookup<F: Copy>(registry: &[(&str, F)], name: &str, category: &str) -> Result<F> {
    registry
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, factory)| *factory)
        .ok_or_else(|| {
            let known: Vec<&str> = registry.iter().map(|(name, _)| *name).collect();
            BoothError::Config(config::ConfigError::Message(format!(
                "unknown {} backend '{}' (known: {})",
                category,
                name,
                known.join(", ")
            )))
        })
}

/// Check the configured backend names against the registries without
/// touching any hardware.
pub fn validate_selection(config: &BoothConfig) -> Result<()> {
    lookup(CAMERA_REGISTRY, &config.camera.backend, "camera")?;
    lookup(INPUT_REGISTRY, &config.input.backend, "input")?;
    lookup(OUTPUT_REGISTRY, &config.output.backend, "output")?;
    lookup(DISPLAY_REGISTRY, &config.display.backend, "display")?;
    Ok(())
}

/// Resolve the configured backend names into live collaborators.
///
/// Resolution happens exactly once, at startup; the state machine only ever
/// sees the trait objects.
pub fn resolve_backends(config: &BoothConfig, shutdown: CancellationToken) -> Result<BackendSet> {
    let camera = lookup(CAMERA_REGISTRY, &config.camera.backend, "camera")?(config)?;
    let input = lookup(INPUT_REGISTRY, &config.input.backend, "input")?(config, shutdown)?;
    let output = lookup(OUTPUT_REGISTRY, &config.output.backend, "output")?(config)?;
    let display = lookup(DISPLAY_REGISTRY, &config.display.backend, "display")?(config)?;

    info!(
        "Backends resolved: camera={}, input={}, output={}, display={}",
        config.camera.backend, config.input.backend, config.output.backend, config.display.backend
    );

    Ok(BackendSet {
        camera,
        input,
        output,
        display,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_config() -> BoothConfig {
        let mut config = BoothConfig::default();
        config.camera.backend = "mock".to_string();
        config.input.backend = "mock".to_string();
        config.output.backend = "mock".to_string();
        config.display.backend = "headless".to_string();
        config
    }

    #[test]
    fn test_validate_selection_accepts_known_names() {
        assert!(validate_selection(&mock_config()).is_ok());
    }

    #[test]
    fn test_validate_selection_rejects_unknown_camera() {
        let mut config = mock_config();
        config.camera.backend = "polaroid".to_string();

        let err = validate_selection(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("camera"));
        assert!(message.contains("polaroid"));
    }

    #[test]
    fn test_resolve_backends_with_mocks() {
        let set = resolve_backends(&mock_config(), CancellationToken::new());
        assert!(set.is_ok());
    }
}
