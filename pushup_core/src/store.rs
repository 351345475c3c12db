//! Persistence gateway for the workout snapshot.
//!
//! The engine talks to a [`StateStore`]. [`JsonFileStore`] keeps the whole
//! [`PersistedState`] in one JSON file written atomically under a file
//! lock; [`MemoryStore`] keeps it in memory for tests and dry runs.

use crate::types::{
    PersistedState, WorkoutSession, DEFAULT_DAILY_GOAL, DEFAULT_REST_DURATION_SECS,
    STATE_VERSION,
};
use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Load-at-startup / save-after-mutation contract
pub trait StateStore {
    /// Load the snapshot, falling back to defaults instead of failing
    fn load(&self) -> Result<PersistedState>;

    fn save(&mut self, state: &PersistedState) -> Result<()>;
}

/// Deserialize history entry by entry, dropping the ones that don't parse
pub(crate) fn lenient_history<'de, D>(deserializer: D) -> std::result::Result<Vec<WorkoutSession>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut sessions = Vec::with_capacity(raw.len());

    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<WorkoutSession>(value) {
            Ok(session) if session.count >= 1 => sessions.push(session),
            Ok(session) => {
                tracing::warn!("Skipping history entry {} with zero count", session.id);
            }
            Err(e) => {
                tracing::warn!("Skipping corrupt history entry {}: {}", index, e);
            }
        }
    }

    Ok(sessions)
}

impl PersistedState {
    /// Replace out-of-range values with documented defaults
    pub fn normalized(mut self) -> Self {
        if self.version != STATE_VERSION {
            tracing::debug!(
                "Upgrading state snapshot from version {} to {}",
                self.version,
                STATE_VERSION
            );
            self.version = STATE_VERSION;
        }
        if self.settings.daily_goal == 0 {
            self.settings.daily_goal = DEFAULT_DAILY_GOAL;
        }
        if self.settings.rest_duration_secs == 0 {
            self.settings.rest_duration_secs = DEFAULT_REST_DURATION_SECS;
        }
        self.countdown = self.countdown.normalized();
        for session in &mut self.session_history {
            session.duration_seconds = session.duration_seconds.max(0.0);
        }
        // Stable: equal timestamps keep their stored order
        self.session_history
            .sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        self
    }

    /// Parse and normalise a snapshot
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str::<PersistedState>(contents)?.normalized())
    }
}

// ============================================================================
// JSON File Store
// ============================================================================

/// Single-file JSON store with shared/exclusive locking and atomic replace
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Used when no state file exists yet
    seed: PersistedState,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed: PersistedState::default(),
        }
    }

    /// Use `seed` as the initial state when the file does not exist
    pub fn with_seed(mut self, seed: PersistedState) -> Self {
        self.seed = seed;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_locked(&self) -> std::io::Result<String> {
        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        let _ = file.unlock();
        read.map(|_| contents)
    }

    /// Where an unparsable snapshot is copied before it gets overwritten
    pub fn corrupt_backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    fn back_up_unreadable(&self) {
        let backup = self.corrupt_backup_path();
        match std::fs::copy(&self.path, &backup) {
            Ok(_) => tracing::warn!("Unreadable state kept at {:?}", backup),
            Err(e) => tracing::error!("Failed to back up {:?}: {}", self.path, e),
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<PersistedState> {
        if !self.path.exists() {
            tracing::info!("No state file at {:?}, starting fresh", self.path);
            return Ok(self.seed.clone().normalized());
        }

        match self.read_locked() {
            Ok(contents) => match PersistedState::from_json(&contents) {
                Ok(state) => {
                    tracing::debug!(
                        "Loaded state from {:?} ({} sessions)",
                        self.path,
                        state.session_history.len()
                    );
                    Ok(state)
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse state file {:?}: {}. Using defaults.",
                        self.path,
                        e
                    );
                    self.back_up_unreadable();
                    Ok(PersistedState::default())
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Unable to read state file {:?}: {}. Using defaults.",
                    self.path,
                    e
                );
                Ok(PersistedState::default())
            }
        }
    }

    /// Write to a temp file, fsync, then rename over the original
    fn save(&mut self, state: &PersistedState) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::State(format!("state path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, state)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved state to {:?}", self.path);
        Ok(())
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-memory store; remembers the last snapshot and how often it was saved
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Option<PersistedState>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Some(state),
            saves: 0,
        }
    }

    pub fn saved(&self) -> Option<&PersistedState> {
        self.state.as_ref()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<PersistedState> {
        Ok(self.state.clone().unwrap_or_default().normalized())
    }

    fn save(&mut self, state: &PersistedState) -> Result<()> {
        self.state = Some(state.clone());
        self.saves += 1;
        Ok(())
    }
}
