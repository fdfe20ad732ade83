use crate::error::{BoothError, Result};
use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fixed number of stills per session, matching the 2x2 print sheet.
pub const PHOTOS_PER_SESSION: u8 = 4;

/// One captured still and the grid slot it was taken for.
///
/// Immutable once captured; the display and print positions are both derived
/// from the slot index.
pub struct PhotoRecord {
    pub slot: u8,
    pub image: RgbImage,
}

impl PhotoRecord {
    pub fn new(slot: u8, image: RgbImage) -> Self {
        Self { slot, image }
    }
}

/// One full greeting -> captures -> farewell cycle.
///
/// The session owns its output directory exclusively and the ordered photo
/// list collected during the capture stages.
pub struct Session {
    pub id: u64,
    pub directory: PathBuf,
    started_at: DateTime<Utc>,
    photos: Vec<PhotoRecord>,
}

impl Session {
    pub fn new(id: u64, directory: PathBuf) -> Self {
        info!(
            "Session {} started, output directory: {}",
            id,
            directory.display()
        );
        Self {
            id,
            directory,
            started_at: Utc::now(),
            photos: Vec::with_capacity(PHOTOS_PER_SESSION as usize),
        }
    }

    pub fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Insert a captured photo at its slot position.
    ///
    /// Captures arrive in slot order during normal operation; insertion keeps
    /// the list sorted regardless, and a repeated slot replaces the earlier
    /// still.
    pub fn add_photo(&mut self, record: PhotoRecord) {
        match self.photos.binary_search_by_key(&record.slot, |p| p.slot) {
            Ok(existing) => {
                warn!("Replacing photo already captured for slot {}", record.slot);
                self.photos[existing] = record;
            }
            Err(position) => self.photos.insert(position, record),
        }
    }

    pub fn clear_photos(&mut self) {
        debug!("Session {}: clearing {} photos", self.id, self.photos.len());
        self.photos.clear();
    }

    pub fn is_complete(&self) -> bool {
        self.photos.len() == PHOTOS_PER_SESSION as usize
    }

    /// Copy a slot still from the scratch directory into the session directory.
    pub fn archive_still(&self, slot: u8, source: &Path) -> Result<PathBuf> {
        let destination = self.directory.join(format!("photo_{}.jpg", slot));
        fs::copy(source, &destination).map_err(|e| {
            BoothError::directory(
                destination.display().to_string(),
                format!("failed to archive slot {} still: {}", slot, e),
            )
        })?;
        Ok(destination)
    }
}

/// Record of a delivered session, written as `session.json` next to the
/// composite.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionManifest {
    pub session_id: u64,
    pub started_at: DateTime<Utc>,
    pub delivered_at: DateTime<Utc>,
    pub composite_file: String,
    pub photo_files: Vec<String>,
}

impl SessionManifest {
    pub fn save(&self, directory: &Path) -> Result<()> {
        let path = directory.join("session.json");
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        debug!("Wrote session manifest: {}", path.display());
        Ok(())
    }
}

/// Allocates a non-colliding output directory per session.
///
/// Candidate names are `photos-%04d` derived from a runtime counter persisted
/// in a single text file. A missing or unreadable counter file counts as 0.
/// The counter is only rewritten when a candidate has to be skipped, so the
/// persisted value always reflects the last name that was probed.
pub struct SessionDirectoryAllocator {
    base_dir: PathBuf,
    counter_file: PathBuf,
    runtime_id: u32,
}

impl SessionDirectoryAllocator {
    pub fn new<B: Into<PathBuf>, C: Into<PathBuf>>(base_dir: B, counter_file: C) -> Self {
        let counter_file = counter_file.into();
        let runtime_id = Self::read_runtime_id(&counter_file);
        debug!("Runtime counter starts at {}", runtime_id);
        Self {
            base_dir: base_dir.into(),
            counter_file,
            runtime_id,
        }
    }

    pub fn runtime_id(&self) -> u32 {
        self.runtime_id
    }

    /// Pick the next usable session directory, creating it if necessary.
    ///
    /// A candidate that exists and is an empty directory is reused; anything
    /// else occupying the name bumps the counter and retries.
    pub fn allocate(&mut self) -> Result<PathBuf> {
        loop {
            let candidate = self.candidate();

            if !candidate.exists() {
                fs::create_dir_all(&candidate).map_err(|e| {
                    BoothError::directory(candidate.display().to_string(), e.to_string())
                })?;
                info!("Allocated session directory: {}", candidate.display());
                return Ok(candidate);
            }

            if candidate.is_dir() && Self::is_empty_dir(&candidate)? {
                info!("Reusing empty session directory: {}", candidate.display());
                return Ok(candidate);
            }

            debug!(
                "Session directory {} already in use, skipping",
                candidate.display()
            );
            self.runtime_id += 1;
            self.persist_runtime_id()?;
        }
    }

    fn candidate(&self) -> PathBuf {
        self.base_dir.join(format!("photos-{:04}", self.runtime_id))
    }

    fn read_runtime_id(path: &Path) -> u32 {
        match fs::read_to_string(path) {
            Ok(contents) => match contents.trim().parse() {
                Ok(id) => id,
                Err(_) => {
                    warn!(
                        "Runtime counter file {} is corrupt, starting from 0",
                        path.display()
                    );
                    0
                }
            },
            Err(_) => 0,
        }
    }

    fn persist_runtime_id(&self) -> Result<()> {
        fs::write(&self.counter_file, self.runtime_id.to_string())?;
        Ok(())
    }

    fn is_empty_dir(path: &Path) -> Result<bool> {
        Ok(fs::read_dir(path)?.next().is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn solid_image(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb([value, value, value]))
    }

    #[test]
    fn test_allocator_starts_at_zero_without_counter_file() {
        let tmp = TempDir::new().unwrap();
        let mut allocator =
            SessionDirectoryAllocator::new(tmp.path(), tmp.path().join("runtime_id"));

        let dir = allocator.allocate().unwrap();
        assert_eq!(dir, tmp.path().join("photos-0000"));
        assert!(dir.is_dir());
        assert_eq!(allocator.runtime_id(), 0);
    }

    #[test]
    fn test_allocator_treats_corrupt_counter_as_zero() {
        let tmp = TempDir::new().unwrap();
        let counter = tmp.path().join("runtime_id");
        fs::write(&counter, "not a number").unwrap();

        let allocator = SessionDirectoryAllocator::new(tmp.path(), &counter);
        assert_eq!(allocator.runtime_id(), 0);
    }

    #[test]
    fn test_allocator_skips_nonempty_directories() {
        let tmp = TempDir::new().unwrap();
        let counter = tmp.path().join("runtime_id");

        let taken = tmp.path().join("photos-0000");
        fs::create_dir(&taken).unwrap();
        fs::write(taken.join("1700000000.jpg"), b"jpeg").unwrap();

        let mut allocator = SessionDirectoryAllocator::new(tmp.path(), &counter);
        let dir = allocator.allocate().unwrap();

        assert_eq!(dir, tmp.path().join("photos-0001"));
        assert_eq!(fs::read_to_string(&counter).unwrap(), "1");
    }

    #[test]
    fn test_allocator_persists_one_increment_per_skip() {
        let tmp = TempDir::new().unwrap();
        let counter = tmp.path().join("runtime_id");

        for id in 0..3 {
            let taken = tmp.path().join(format!("photos-{:04}", id));
            fs::create_dir(&taken).unwrap();
            fs::write(taken.join("occupied"), b"x").unwrap();
        }

        let mut allocator = SessionDirectoryAllocator::new(tmp.path(), &counter);
        let dir = allocator.allocate().unwrap();

        assert_eq!(dir, tmp.path().join("photos-0003"));
        assert_eq!(fs::read_to_string(&counter).unwrap(), "3");
    }

    #[test]
    fn test_allocator_reuses_empty_directory() {
        let tmp = TempDir::new().unwrap();
        let counter = tmp.path().join("runtime_id");
        fs::write(&counter, "2").unwrap();
        fs::create_dir(tmp.path().join("photos-0002")).unwrap();

        let mut allocator = SessionDirectoryAllocator::new(tmp.path(), &counter);
        let dir = allocator.allocate().unwrap();

        assert_eq!(dir, tmp.path().join("photos-0002"));
        // no skip happened, so the counter file is untouched
        assert_eq!(fs::read_to_string(&counter).unwrap(), "2");
    }

    #[test]
    fn test_allocator_resumes_from_persisted_counter() {
        let tmp = TempDir::new().unwrap();
        let counter = tmp.path().join("runtime_id");
        fs::write(&counter, "41").unwrap();

        let mut allocator = SessionDirectoryAllocator::new(tmp.path(), &counter);
        let dir = allocator.allocate().unwrap();
        assert_eq!(dir, tmp.path().join("photos-0041"));
    }

    #[test]
    fn test_session_orders_photos_by_slot() {
        let mut session = Session::new(0, PathBuf::from("/tmp/unused"));
        session.add_photo(PhotoRecord::new(3, solid_image(2, 2, 3)));
        session.add_photo(PhotoRecord::new(1, solid_image(2, 2, 1)));
        session.add_photo(PhotoRecord::new(4, solid_image(2, 2, 4)));
        session.add_photo(PhotoRecord::new(2, solid_image(2, 2, 2)));

        let slots: Vec<u8> = session.photos().iter().map(|p| p.slot).collect();
        assert_eq!(slots, vec![1, 2, 3, 4]);
        assert!(session.is_complete());

        session.clear_photos();
        assert!(session.photos().is_empty());
        assert!(!session.is_complete());
    }

    #[test]
    fn test_session_replaces_duplicate_slot() {
        let mut session = Session::new(0, PathBuf::from("/tmp/unused"));
        session.add_photo(PhotoRecord::new(2, solid_image(2, 2, 10)));
        session.add_photo(PhotoRecord::new(2, solid_image(2, 2, 20)));

        assert_eq!(session.photos().len(), 1);
        assert_eq!(session.photos()[0].image.get_pixel(0, 0)[0], 20);
    }

    #[test]
    fn test_manifest_round_trip() {
        let tmp = TempDir::new().unwrap();
        let manifest = SessionManifest {
            session_id: 7,
            started_at: Utc::now(),
            delivered_at: Utc::now(),
            composite_file: "1700000000.jpg".to_string(),
            photo_files: (1..=4).map(|n| format!("photo_{}.jpg", n)).collect(),
        };

        manifest.save(tmp.path()).unwrap();

        let raw = fs::read_to_string(tmp.path().join("session.json")).unwrap();
        let restored: SessionManifest = serde_json::from_str(&raw).unwrap();
        assert_eq!(restored, manifest);
    }
}
