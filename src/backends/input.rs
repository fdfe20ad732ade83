use super::InputBackend;
use crate::config::InputConfig;
use crate::error::{BoothError, Result};
use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Start button and ready LED on sysfs GPIO.
///
/// The LED is wired active-low: driving the pin low lights it up.
pub struct GpioButton {
    gpio_root: PathBuf,
    switch_pin: u32,
    led_pin: u32,
    released: bool,
}

impl GpioButton {
    pub fn new(config: &InputConfig) -> Result<Self> {
        let button = Self {
            gpio_root: PathBuf::from(&config.gpio_root),
            switch_pin: config.switch_pin,
            led_pin: config.led_pin,
            released: false,
        };

        button.export_pin(config.switch_pin, "in")?;
        button.export_pin(config.led_pin, "out")?;
        button.write_led(false)?;

        info!(
            "GPIO button ready: switch on pin {}, LED on pin {}",
            config.switch_pin, config.led_pin
        );
        Ok(button)
    }

    fn pin_path(&self, pin: u32) -> PathBuf {
        self.gpio_root.join(format!("gpio{}", pin))
    }

    fn export_pin(&self, pin: u32, direction: &str) -> Result<()> {
        let pin_path = self.pin_path(pin);
        if !pin_path.exists() {
            fs::write(self.gpio_root.join("export"), pin.to_string()).map_err(|e| {
                BoothError::hardware("gpio", format!("failed to export pin {}: {}", pin, e))
            })?;
        }
        fs::write(pin_path.join("direction"), direction).map_err(|e| {
            BoothError::hardware(
                "gpio",
                format!("failed to set pin {} direction: {}", pin, e),
            )
        })?;
        Ok(())
    }

    fn write_led(&self, on: bool) -> Result<()> {
        let value = if on { "0" } else { "1" };
        fs::write(self.pin_path(self.led_pin).join("value"), value).map_err(|e| {
            BoothError::hardware(
                "gpio",
                format!("failed to write LED pin {}: {}", self.led_pin, e),
            )
        })
    }
}

#[async_trait]
impl InputBackend for GpioButton {
    async fn poll_trigger(&mut self) -> Result<bool> {
        let value = fs::read_to_string(self.pin_path(self.switch_pin).join("value"))
            .map_err(|e| {
                BoothError::hardware(
                    "gpio",
                    format!("failed to read switch pin {}: {}", self.switch_pin, e),
                )
            })?;
        Ok(value.trim() == "1")
    }

    async fn set_indicator(&mut self, on: bool) -> Result<()> {
        debug!("Ready LED {}", if on { "on" } else { "off" });
        self.write_led(on)
    }

    async fn cleanup(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }

        if let Err(e) = self.write_led(false) {
            warn!("Could not switch LED off during cleanup: {}", e);
        }
        for pin in [self.switch_pin, self.led_pin] {
            if let Err(e) = fs::write(self.gpio_root.join("unexport"), pin.to_string()) {
                warn!("Could not unexport GPIO pin {}: {}", pin, e);
            }
        }

        self.released = true;
        info!("GPIO pins released");
        Ok(())
    }
}

/// Keyboard stand-in for the physical button, for kiosks without GPIO.
///
/// Space or enter acts as the trigger; q, escape or ctrl-c requests quit via
/// the shared cancellation token. Runs the terminal in raw mode for the
/// process lifetime.
pub struct KeyboardInput {
    shutdown: CancellationToken,
    raw_mode: bool,
}

impl KeyboardInput {
    pub fn new(shutdown: CancellationToken) -> Result<Self> {
        enable_raw_mode().map_err(|e| {
            BoothError::hardware("keyboard", format!("failed to enable raw mode: {}", e))
        })?;
        debug!("Raw mode enabled, keyboard trigger active");

        Ok(Self {
            shutdown,
            raw_mode: true,
        })
    }
}

#[async_trait]
impl InputBackend for KeyboardInput {
    async fn poll_trigger(&mut self) -> Result<bool> {
        let mut triggered = false;

        // drain everything that queued up since the last poll
        while event::poll(Duration::from_millis(0)).map_err(|e| {
            BoothError::hardware("keyboard", format!("failed to poll events: {}", e))
        })? {
            let Ok(Event::Key(key_event)) = event::read() else {
                continue;
            };
            if key_event.kind != KeyEventKind::Press {
                continue;
            }

            match key_event.code {
                KeyCode::Char(' ') | KeyCode::Enter => {
                    info!("Keyboard trigger pressed");
                    triggered = true;
                }
                KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                    info!("Ctrl-C pressed, requesting shutdown");
                    self.shutdown.cancel();
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    info!("Quit key pressed, requesting shutdown");
                    self.shutdown.cancel();
                }
                other => {
                    debug!("Ignoring key: {:?}", other);
                }
            }
        }

        Ok(triggered)
    }

    async fn set_indicator(&mut self, on: bool) -> Result<()> {
        debug!("Ready indicator (virtual) {}", if on { "on" } else { "off" });
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<()> {
        if self.raw_mode {
            if let Err(e) = disable_raw_mode() {
                warn!("Failed to disable raw mode: {}", e);
            }
            self.raw_mode = false;
            debug!("Raw mode disabled");
        }
        Ok(())
    }
}

impl Drop for KeyboardInput {
    fn drop(&mut self) {
        if self.raw_mode {
            let _ = disable_raw_mode();
        }
    }
}

/// Self-firing trigger for development runs without any input hardware.
///
/// Fires on every 50th poll, roughly every five seconds at the greeting
/// stage's polling rate.
pub struct MockInput {
    polls: u32,
    indicator: bool,
    cleanups: u32,
}

impl MockInput {
    pub fn new() -> Self {
        Self {
            polls: 0,
            indicator: false,
            cleanups: 0,
        }
    }

    pub fn indicator(&self) -> bool {
        self.indicator
    }

    pub fn cleanups(&self) -> u32 {
        self.cleanups
    }
}

impl Default for MockInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputBackend for MockInput {
    async fn poll_trigger(&mut self) -> Result<bool> {
        self.polls += 1;
        Ok(self.polls % 50 == 0)
    }

    async fn set_indicator(&mut self, on: bool) -> Result<()> {
        self.indicator = on;
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<()> {
        self.cleanups += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoothConfig;
    use tempfile::TempDir;

    fn sysfs_stub(root: &std::path::Path, pins: &[u32]) {
        for pin in pins {
            let pin_dir = root.join(format!("gpio{}", pin));
            fs::create_dir_all(&pin_dir).unwrap();
            fs::write(pin_dir.join("direction"), "in").unwrap();
            fs::write(pin_dir.join("value"), "0").unwrap();
        }
    }

    fn gpio_config(root: &std::path::Path) -> InputConfig {
        let mut config = BoothConfig::default().input;
        config.gpio_root = root.display().to_string();
        config
    }

    #[tokio::test]
    async fn test_gpio_button_reads_switch_level() {
        let tmp = TempDir::new().unwrap();
        let config = gpio_config(tmp.path());
        sysfs_stub(tmp.path(), &[config.switch_pin, config.led_pin]);

        let mut button = GpioButton::new(&config).unwrap();
        assert!(!button.poll_trigger().await.unwrap());

        fs::write(
            tmp.path()
                .join(format!("gpio{}", config.switch_pin))
                .join("value"),
            "1",
        )
        .unwrap();
        assert!(button.poll_trigger().await.unwrap());
    }

    #[tokio::test]
    async fn test_gpio_led_is_active_low() {
        let tmp = TempDir::new().unwrap();
        let config = gpio_config(tmp.path());
        sysfs_stub(tmp.path(), &[config.switch_pin, config.led_pin]);
        let led_value = tmp
            .path()
            .join(format!("gpio{}", config.led_pin))
            .join("value");

        let mut button = GpioButton::new(&config).unwrap();
        // construction leaves the LED off, which drives the pin high
        assert_eq!(fs::read_to_string(&led_value).unwrap(), "1");

        button.set_indicator(true).await.unwrap();
        assert_eq!(fs::read_to_string(&led_value).unwrap(), "0");

        button.set_indicator(false).await.unwrap();
        assert_eq!(fs::read_to_string(&led_value).unwrap(), "1");
    }

    #[tokio::test]
    async fn test_gpio_cleanup_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let config = gpio_config(tmp.path());
        sysfs_stub(tmp.path(), &[config.switch_pin, config.led_pin]);

        let mut button = GpioButton::new(&config).unwrap();
        button.cleanup().await.unwrap();
        button.cleanup().await.unwrap();

        let unexported = fs::read_to_string(tmp.path().join("unexport")).unwrap();
        // second cleanup did not unexport again
        assert_eq!(unexported, config.led_pin.to_string());
    }

    #[tokio::test]
    async fn test_mock_input_fires_periodically() {
        let mut input = MockInput::new();
        let mut fired = 0;
        for _ in 0..100 {
            if input.poll_trigger().await.unwrap() {
                fired += 1;
            }
        }
        assert_eq!(fired, 2);
    }
}
