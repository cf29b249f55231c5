//! Persistence of [`AppState`] as a single document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::state::AppState;
use crate::Result;

/// Loads and saves the whole application state at once.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns the stored state, or the default state when nothing usable is stored.
    async fn load(&self) -> Result<AppState>;

    /// Replaces the stored state.
    async fn save(&self, state: &AppState) -> Result<()>;
}

/// Stores the state as pretty-printed JSON in one file.
///
/// A missing, blank or undecodable file loads as [`AppState::default`].
/// Saves go through a sibling temp file and a rename so a crash mid-write
/// leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<AppState> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AppState::default()),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(AppState::default());
        }

        match AppState::from_slice(&bytes) {
            Ok(state) => Ok(state),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(path = %self.path.display(), error = %_err, "state file unreadable, using defaults");
                Ok(AppState::default())
            }
        }
    }

    async fn save(&self, state: &AppState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(state)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

/// Keeps the state in memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Option<AppState>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that loads `state` until something else is saved.
    pub fn with_state(state: AppState) -> Self {
        Self {
            state: Arc::new(Mutex::new(Some(state))),
        }
    }

    /// The last saved (or initial) state, if any.
    pub fn snapshot(&self) -> Option<AppState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<AppState> {
        Ok(self.snapshot().unwrap_or_default())
    }

    async fn save(&self, state: &AppState) -> Result<()> {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(state.clone());
        Ok(())
    }
}
