//! JSON snapshot file backing the memory store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::memory::StoreState;
use crate::infrastructure::traits::FileSystem;

/// Location and filesystem used to persist a `StoreState`.
pub struct SnapshotFile {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or None if the file does not exist yet.
    pub fn load(&self) -> StoreResult<Option<StoreState>> {
        if !self.fs.exists(&self.path) {
            debug!("load: no snapshot at {}", self.path.display());
            return Ok(None);
        }
        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|source| StoreError::Io {
                context: format!("read {}", self.path.display()),
                source,
            })?;
        let state = serde_json::from_str(&content).map_err(|source| StoreError::Encoding {
            context: format!("parse {}", self.path.display()),
            source,
        })?;
        Ok(Some(state))
    }

    pub fn save(&self, state: &StoreState) -> StoreResult<()> {
        let content =
            serde_json::to_string_pretty(state).map_err(|source| StoreError::Encoding {
                context: format!("serialize {}", self.path.display()),
                source,
            })?;
        self.fs
            .write_atomic(&self.path, &content)
            .map_err(|source| StoreError::Io {
                context: format!("write {}", self.path.display()),
                source,
            })?;
        debug!("save: wrote snapshot to {}", self.path.display());
        Ok(())
    }
}
