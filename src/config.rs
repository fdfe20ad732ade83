use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BoothConfig {
    pub booth: StageConfig,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub display: DisplayConfig,
    pub print: PrintConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StageConfig {
    /// Maximum main loop iterations per second
    #[serde(default = "default_max_fps")]
    pub max_fps: f32,

    /// Pause between the "photo n of 4" prompt and the preview start
    #[serde(default = "default_settle_seconds")]
    pub settle_seconds: u64,

    /// Countdown length before each capture
    #[serde(default = "default_countdown_seconds")]
    pub countdown_seconds: u32,

    /// Pause on the farewell screen before the next greeting
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Capture backend name ("command" or "mock")
    #[serde(default = "default_camera_backend")]
    pub backend: String,

    /// Still capture command; the target path is appended as the final argument
    #[serde(default = "default_capture_command")]
    pub capture_command: Vec<String>,

    /// Still resolution (width, height)
    #[serde(default = "default_picture_resolution")]
    pub picture_resolution: (u32, u32),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InputConfig {
    /// Trigger backend name ("gpio", "keyboard" or "mock")
    #[serde(default = "default_input_backend")]
    pub backend: String,

    /// BCM pin wired to the start button
    #[serde(default = "default_switch_pin")]
    pub switch_pin: u32,

    /// BCM pin wired to the ready LED (active-low)
    #[serde(default = "default_led_pin")]
    pub led_pin: u32,

    /// Sysfs GPIO root
    #[serde(default = "default_gpio_root")]
    pub gpio_root: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    /// Output backend name ("printer", "directory" or "mock")
    #[serde(default = "default_output_backend")]
    pub backend: String,

    /// Print command; the composite path is appended as the final argument
    #[serde(default = "default_print_command")]
    pub print_command: Vec<String>,

    /// Export directory for the "directory" backend
    #[serde(default = "default_save_dir")]
    pub save_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    /// Display backend name ("framebuffer" or "headless")
    #[serde(default = "default_display_backend")]
    pub backend: String,

    /// Framebuffer device path
    #[serde(default = "default_framebuffer_device")]
    pub framebuffer_device: String,

    /// Screen resolution (width, height)
    #[serde(default = "default_display_resolution")]
    pub resolution: (u32, u32),

    /// Path to a TrueType font for prompts
    #[serde(default = "default_font_path")]
    pub font_path: String,

    /// Prompt font size
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Background tile image; a flat fill is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,

    /// Directory holding sample1.png..sample4.png for the idle grid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_dir: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrintConfig {
    /// Printer resolution in dots per inch
    #[serde(default = "default_print_dpi")]
    pub dpi: f32,

    /// Physical print width in inches
    #[serde(default = "default_print_width_inch")]
    pub width_inch: f32,

    /// Physical print height in inches
    #[serde(default = "default_print_height_inch")]
    pub height_inch: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    /// Scratch directory for per-slot stills (RAM-backed on the kiosk)
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,

    /// Base directory for session output directories
    #[serde(default = "default_target_dir")]
    pub target_dir: String,

    /// Persisted runtime counter file
    #[serde(default = "default_runtime_id_file")]
    pub runtime_id_file: String,
}

impl BoothConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("photobooth.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("booth.max_fps", default_max_fps() as f64)?
            .set_default("booth.settle_seconds", default_settle_seconds() as i64)?
            .set_default("booth.countdown_seconds", default_countdown_seconds())?
            .set_default("booth.cooldown_seconds", default_cooldown_seconds() as i64)?
            .set_default("camera.backend", default_camera_backend())?
            .set_default("camera.capture_command", default_capture_command())?
            .set_default(
                "camera.picture_resolution",
                vec![
                    default_picture_resolution().0,
                    default_picture_resolution().1,
                ],
            )?
            .set_default("input.backend", default_input_backend())?
            .set_default("input.switch_pin", default_switch_pin())?
            .set_default("input.led_pin", default_led_pin())?
            .set_default("input.gpio_root", default_gpio_root())?
            .set_default("output.backend", default_output_backend())?
            .set_default("output.print_command", default_print_command())?
            .set_default("output.save_dir", default_save_dir())?
            .set_default("display.backend", default_display_backend())?
            .set_default("display.framebuffer_device", default_framebuffer_device())?
            .set_default(
                "display.resolution",
                vec![
                    default_display_resolution().0,
                    default_display_resolution().1,
                ],
            )?
            .set_default("display.font_path", default_font_path())?
            .set_default("display.font_size", default_font_size() as f64)?
            .set_default("print.dpi", default_print_dpi() as f64)?
            .set_default("print.width_inch", default_print_width_inch() as f64)?
            .set_default("print.height_inch", default_print_height_inch() as f64)?
            .set_default("paths.temp_dir", default_temp_dir())?
            .set_default("paths.target_dir", default_target_dir())?
            .set_default("paths.runtime_id_file", default_runtime_id_file())?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(Environment::with_prefix("PHOTOBOOTH").separator("_"))
            .build()?;

        let config: BoothConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.booth.max_fps <= 0.0 {
            return Err(ConfigError::Message(
                "booth.max_fps must be greater than 0".to_string(),
            ));
        }

        if self.booth.countdown_seconds == 0 {
            return Err(ConfigError::Message(
                "booth.countdown_seconds must be greater than 0".to_string(),
            ));
        }

        if self.camera.picture_resolution.0 == 0 || self.camera.picture_resolution.1 == 0 {
            return Err(ConfigError::Message(
                "camera.picture_resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.capture_command.is_empty() {
            return Err(ConfigError::Message(
                "camera.capture_command must not be empty".to_string(),
            ));
        }

        if self.output.print_command.is_empty() {
            return Err(ConfigError::Message(
                "output.print_command must not be empty".to_string(),
            ));
        }

        if self.display.resolution.0 == 0 || self.display.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "display.resolution must be greater than 0".to_string(),
            ));
        }

        if self.display.font_size <= 0.0 {
            return Err(ConfigError::Message(
                "display.font_size must be greater than 0".to_string(),
            ));
        }

        if self.print.dpi <= 0.0 {
            return Err(ConfigError::Message(
                "print.dpi must be greater than 0".to_string(),
            ));
        }

        if self.print.width_inch <= 0.0 || self.print.height_inch <= 0.0 {
            return Err(ConfigError::Message(
                "print dimensions must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            booth: StageConfig {
                max_fps: default_max_fps(),
                settle_seconds: default_settle_seconds(),
                countdown_seconds: default_countdown_seconds(),
                cooldown_seconds: default_cooldown_seconds(),
            },
            camera: CameraConfig {
                backend: default_camera_backend(),
                capture_command: default_capture_command(),
                picture_resolution: default_picture_resolution(),
            },
            input: InputConfig {
                backend: default_input_backend(),
                switch_pin: default_switch_pin(),
                led_pin: default_led_pin(),
                gpio_root: default_gpio_root(),
            },
            output: OutputConfig {
                backend: default_output_backend(),
                print_command: default_print_command(),
                save_dir: default_save_dir(),
            },
            display: DisplayConfig {
                backend: default_display_backend(),
                framebuffer_device: default_framebuffer_device(),
                resolution: default_display_resolution(),
                font_path: default_font_path(),
                font_size: default_font_size(),
                background_image: None,
                sample_dir: None,
            },
            print: PrintConfig {
                dpi: default_print_dpi(),
                width_inch: default_print_width_inch(),
                height_inch: default_print_height_inch(),
            },
            paths: PathsConfig {
                temp_dir: default_temp_dir(),
                target_dir: default_target_dir(),
                runtime_id_file: default_runtime_id_file(),
            },
        }
    }
}

// Default value functions
fn default_max_fps() -> f32 {
    60.0
}
fn default_settle_seconds() -> u64 {
    2
}
fn default_countdown_seconds() -> u32 {
    5
}
fn default_cooldown_seconds() -> u64 {
    10
}

fn default_camera_backend() -> String {
    "command".to_string()
}
fn default_capture_command() -> Vec<String> {
    vec![
        "libcamera-still".to_string(),
        "-n".to_string(),
        "-o".to_string(),
    ]
}
fn default_picture_resolution() -> (u32, u32) {
    (1024, 768)
}

fn default_input_backend() -> String {
    "gpio".to_string()
}
fn default_switch_pin() -> u32 {
    23
}
fn default_led_pin() -> u32 {
    24
}
fn default_gpio_root() -> String {
    "/sys/class/gpio".to_string()
}

fn default_output_backend() -> String {
    "printer".to_string()
}
fn default_print_command() -> Vec<String> {
    vec!["lp".to_string()]
}
fn default_save_dir() -> String {
    "./prints".to_string()
}

fn default_display_backend() -> String {
    "framebuffer".to_string()
}
fn default_framebuffer_device() -> String {
    "/dev/fb0".to_string()
}
fn default_display_resolution() -> (u32, u32) {
    (1024, 768)
}
fn default_font_path() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string()
}
fn default_font_size() -> f32 {
    115.0
}

fn default_print_dpi() -> f32 {
    300.0
}
fn default_print_width_inch() -> f32 {
    6.0
}
fn default_print_height_inch() -> f32 {
    4.0
}

fn default_temp_dir() -> String {
    "/dev/shm/photobooth".to_string()
}
fn default_target_dir() -> String {
    "./photos".to_string()
}
fn default_runtime_id_file() -> String {
    "./runtime_id".to_string()
}
