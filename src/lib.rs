pub mod backends;
pub mod booth;
pub mod compose;
pub mod config;
pub mod display;
pub mod error;
pub mod layout;
pub mod session;

pub use backends::{BackendSet, CaptureBackend, InputBackend, OutputBackend};
pub use booth::{Booth, Stage, TickClock};
pub use compose::{compose_print, PrintLayout};
pub use config::BoothConfig;
pub use display::DisplayRenderer;
pub use error::{BoothError, Result};
pub use session::{
    PhotoRecord, Session, SessionDirectoryAllocator, SessionManifest, PHOTOS_PER_SESSION,
};
