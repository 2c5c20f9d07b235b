use crate::domain::error::{SwapError, SwapResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable home of the preferred RPC endpoint index.
pub trait PreferenceStore: Send + Sync {
    fn load_rpc_index(&self) -> SwapResult<Option<usize>>;

    fn save_rpc_index(&self, index: usize) -> SwapResult<()>;
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Preferences {
    pub rpc_index: usize,
    pub updated_at: DateTime<Utc>,
}

pub struct FilePreferenceStore {
    path: PathBuf,
    // serialises writers within the process
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    pub const FILE_NAME: &'static str = "preferences.json";

    pub fn new(data_dir: impl AsRef<Path>) -> SwapResult<Self> {
        fs::create_dir_all(data_dir.as_ref())?;
        Ok(Self {
            path: data_dir.as_ref().join(Self::FILE_NAME),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load_rpc_index(&self) -> SwapResult<Option<usize>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Preferences>(&data) {
            Ok(prefs) => Ok(Some(prefs.rpc_index)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable preferences file");
                Ok(None)
            }
        }
    }

    fn save_rpc_index(&self, index: usize) -> SwapResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| SwapError::storage("preferences lock poisoned"))?;
        let prefs = Preferences {
            rpc_index: index,
            updated_at: Utc::now(),
        };
        let data = serde_json::to_string_pretty(&prefs)?;
        // readers only ever see a complete file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    rpc_index: Mutex<Option<usize>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(index: usize) -> Self {
        Self {
            rpc_index: Mutex::new(Some(index)),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load_rpc_index(&self) -> SwapResult<Option<usize>> {
        self.rpc_index
            .lock()
            .map(|v| *v)
            .map_err(|_| SwapError::storage("preferences lock poisoned"))
    }

    fn save_rpc_index(&self, index: usize) -> SwapResult<()> {
        let mut slot = self
            .rpc_index
            .lock()
            .map_err(|_| SwapError::storage("preferences lock poisoned"))?;
        *slot = Some(index);
        Ok(())
    }
}
