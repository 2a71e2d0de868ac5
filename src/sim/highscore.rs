/// High-score persistence.
///
/// The simulation never sees I/O failures: `load` yields 0 when the
/// record is missing or unreadable, and `save` logs and moves on.
///
/// ## File format
///   A single decimal integer (`highscore.txt`), surrounding whitespace
///   ignored.

use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

const SCORE_FILE: &str = "highscore.txt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("high score file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("high score file holds {0:?}, not a number")]
    Parse(String),
}

/// Persistence collaborator for the session high score.
pub trait HighScoreStore {
    /// Stored record, or 0 on any failure.
    fn load(&self) -> u32;
    /// Best effort; failures are logged, never returned.
    fn save(&self, score: u32);
}

// ══════════════════════════════════════════════════════════════
// File store
// ══════════════════════════════════════════════════════════════

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    /// `highscore.txt` in the per-user data directory.
    pub fn in_data_dir() -> Self {
        FileStore::new(data_dir().join(SCORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_load(&self) -> Result<u32, StoreError> {
        let text = std::fs::read_to_string(&self.path)?;
        let trimmed = text.trim();
        trimmed.parse::<u32>().map_err(|_| StoreError::Parse(trimmed.to_string()))
    }

    pub fn try_save(&self, score: u32) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        std::fs::write(&self.path, score.to_string())?;
        Ok(())
    }
}

impl HighScoreStore for FileStore {
    fn load(&self) -> u32 {
        match self.try_load() {
            Ok(v) => v,
            Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => {
                warn!("{}: {e}", self.path.display());
                0
            }
        }
    }

    fn save(&self, score: u32) {
        match self.try_save(score) {
            Ok(()) => info!("high score {score} saved to {}", self.path.display()),
            Err(e) => warn!("could not save high score to {}: {e}", self.path.display()),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// In-memory store (tests, --no-save runs)
// ══════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct MemoryStore {
    value: std::cell::Cell<u32>,
}

impl MemoryStore {
    pub fn with(score: u32) -> Self {
        MemoryStore { value: std::cell::Cell::new(score) }
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&self) -> u32 {
        self.value.get()
    }

    fn save(&self, score: u32) {
        self.value.set(score);
    }
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Per-user data directory for the record and the log file.
pub fn data_dir() -> PathBuf {
    // 1. Exe directory when writable (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_mazechase");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/mazechase)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/mazechase");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
