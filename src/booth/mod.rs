mod clock;


pub use clock::TickClock;

use crate::backends::{BackendSet, CaptureBackend, InputBackend, OutputBackend};
use crate::compose::{compose_print, PrintLayout};
use crate::config::BoothConfig;
use crate::display::{DisplayRenderer, PROMPT_ACCENT, PROMPT_DARK};
use crate::error::{BoothError, Result};
use crate::session::{
    PhotoRecord, Session, SessionDirectoryAllocator, SessionManifest, PHOTOS_PER_SESSION,
};
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Poll interval while waiting for the trigger at the greeting stage.
const TRIGGER_POLL_INTERVAL: Duration = Duration::from_millis(100);

const GREETING_PROMPT: &str = "Ready?\nPress the button!";
const FAREWELL_PROMPT: &str = "Thank you!\nPrinting...";

/// Discrete step in a session's linear sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Greeting,
    Capture(u8),
    Farewell,
}

impl Stage {
    /// The strictly forward transition, wrapping back to the greeting.
    pub fn next(self) -> Stage {
        match self {
            Stage::Greeting => Stage::Capture(1),
            Stage::Capture(slot) if slot < PHOTOS_PER_SESSION => Stage::Capture(slot + 1),
            Stage::Capture(_) => Stage::Farewell,
            Stage::Farewell => Stage::Greeting,
        }
    }
}

/// The kiosk state machine.
///
/// Owns all four hardware collaborators and drives them from a single task:
/// greeting, four captures, farewell, forever. The cancellation token is the
/// only way out; it is honoured between stages and between trigger polls,
/// never mid-capture.
pub struct Booth {
    config: BoothConfig,
    camera: Box<dyn CaptureBackend>,
    input: Box<dyn InputBackend>,
    output: Box<dyn OutputBackend>,
    display: Box<dyn DisplayRenderer>,
    allocator: SessionDirectoryAllocator,
    session: Session,
    stage: Stage,
    clock: TickClock,
    shutdown: CancellationToken,
    cleaned_up: bool,
}

impl Booth {
    pub fn new(
        config: BoothConfig,
        backends: BackendSet,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        fs::create_dir_all(&config.paths.temp_dir).map_err(|e| {
            BoothError::directory(config.paths.temp_dir.clone(), e.to_string())
        })?;

        let mut allocator = SessionDirectoryAllocator::new(
            &config.paths.target_dir,
            &config.paths.runtime_id_file,
        );
        let directory = allocator.allocate()?;
        let session = Session::new(allocator.runtime_id() as u64, directory);
        let clock = TickClock::new(config.booth.max_fps);

        Ok(Self {
            config,
            camera: backends.camera,
            input: backends.input,
            output: backends.output,
            display: backends.display,
            allocator,
            session,
            stage: Stage::Greeting,
            clock,
            shutdown,
            cleaned_up: false,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Drive the stage loop until quit, then release the hardware.
    ///
    /// A fatal error takes the same cleanup path as a deliberate quit.
    pub async fn run(&mut self) -> Result<()> {
        info!("Photobooth running, starting at the greeting stage");

        let result = self.run_loop().await;
        if let Err(e) = &result {
            error!("Fatal error in the booth loop: {}", e);
        }

        self.cleanup().await;
        result
    }

    async fn run_loop(&mut self) -> Result<()> {
        while !self.shutdown.is_cancelled() {
            self.clock.tick().await;
            self.step().await?;
        }
        info!("Quit requested, leaving the booth loop");
        Ok(())
    }

    /// Execute the current stage, then advance unless quit arrived meanwhile.
    pub async fn step(&mut self) -> Result<()> {
        match self.stage {
            Stage::Greeting => self.run_greeting().await?,
            Stage::Capture(slot) => self.run_capture(slot).await?,
            Stage::Farewell => self.run_farewell().await?,
        }

        if !self.shutdown.is_cancelled() {
            self.stage = self.stage.next();
        }
        Ok(())
    }

    async fn run_greeting(&mut self) -> Result<()> {
        debug!("Stage: greeting");
        self.session.clear_photos();

        self.display.draw_idle_background()?;
        self.display.draw_prompt(GREETING_PROMPT, PROMPT_ACCENT)?;
        self.display.present()?;

        self.input.set_indicator(true).await?;
        self.wait_for_trigger().await?;
        self.input.set_indicator(false).await?;
        Ok(())
    }

    /// Poll the trigger, keeping the screen fresh and the quit signal
    /// honoured between polls.
    async fn wait_for_trigger(&mut self) -> Result<()> {
        loop {
            if self.shutdown.is_cancelled() {
                return Ok(());
            }
            if self.input.poll_trigger().await? {
                info!("Trigger fired, starting the capture sequence");
                return Ok(());
            }
            self.display.present()?;
            sleep(TRIGGER_POLL_INTERVAL).await;
        }
    }

    async fn run_capture(&mut self, slot: u8) -> Result<()> {
        debug!("Stage: capture {} of {}", slot, PHOTOS_PER_SESSION);

        self.display.draw_idle_background()?;
        self.display.draw_prompt(
            &format!("Photo {} of {}", slot, PHOTOS_PER_SESSION),
            PROMPT_DARK,
        )?;
        self.display.present()?;
        sleep(Duration::from_secs(self.config.booth.settle_seconds)).await;

        self.camera.start_preview().await?;
        self.display.draw_idle_background()?;
        self.display.draw_capture_border()?;
        self.display.present()?;

        for remaining in (1..=self.config.booth.countdown_seconds).rev() {
            self.camera.annotate(&remaining.to_string()).await?;
            sleep(Duration::from_secs(1)).await;
        }
        self.camera.annotate("").await?;

        let still_path = self.slot_path(slot);
        let image = self.camera.capture(&still_path).await?;
        self.camera.stop_preview().await?;

        self.session.add_photo(PhotoRecord::new(slot, image));
        self.display.draw_photo_grid(self.session.photos())?;
        self.display.present()?;
        Ok(())
    }

    async fn run_farewell(&mut self) -> Result<()> {
        debug!("Stage: farewell");

        self.display.draw_idle_background()?;
        self.display.draw_prompt(FAREWELL_PROMPT, PROMPT_ACCENT)?;
        self.display.present()?;

        if !self.session.is_complete() {
            warn!(
                "Farewell reached with {} of {} photos",
                self.session.photos().len(),
                PHOTOS_PER_SESSION
            );
        }

        let composite_file = format!("{}.jpg", Utc::now().timestamp());
        let composite_path = self.session.directory.join(&composite_file);
        let sheet = compose_print(self.session.photos(), &PrintLayout::from(&self.config.print));
        sheet.save(&composite_path)?;
        info!("Print sheet written to {}", composite_path.display());

        let mut photo_files = Vec::new();
        for photo in self.session.photos() {
            let source = self.slot_path(photo.slot);
            match self.session.archive_still(photo.slot, &source) {
                Ok(archived) => {
                    photo_files.push(archived.file_name().unwrap_or_default().to_string_lossy().into_owned());
                }
                Err(e) => warn!("Could not archive slot {} still: {}", photo.slot, e),
            }
        }

        // delivery is fire-and-forget; the kiosk resets regardless
        if let Err(e) = self.output.deliver(&composite_path).await {
            warn!("Delivery failed: {}", e);
        }

        let manifest = SessionManifest {
            session_id: self.session.id,
            started_at: self.session.started_at(),
            delivered_at: Utc::now(),
            composite_file,
            photo_files,
        };
        if let Err(e) = manifest.save(&self.session.directory) {
            warn!("Could not write session manifest: {}", e);
        }

        self.session.clear_photos();
        sleep(Duration::from_secs(self.config.booth.cooldown_seconds)).await;

        self.display.reset_photo_grid()?;
        self.display.present()?;

        // fresh output directory once per session cycle
        let directory = self.allocator.allocate()?;
        self.session = Session::new(self.allocator.runtime_id() as u64, directory);
        Ok(())
    }

    fn slot_path(&self, slot: u8) -> PathBuf {
        PathBuf::from(&self.config.paths.temp_dir).join(format!("photo_{}.jpg", slot))
    }

    /// Ordered release of every collaborator. Safe to call more than once.
    pub async fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        info!("Releasing hardware");

        if let Err(e) = self.camera.cleanup().await {
            warn!("Camera cleanup failed: {}", e);
        }
        if let Err(e) = self.input.set_indicator(false).await {
            warn!("Could not switch the indicator off: {}", e);
        }
        if let Err(e) = self.input.cleanup().await {
            warn!("Input cleanup failed: {}", e);
        }
        if let Err(e) = self.display.release() {
            warn!("Display release failed: {}", e);
        }

        self.cleaned_up = true;
        info!("Hardware released");
    }
}
