use parking_lot::Mutex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::interfaces::persistence::Persistence;
use crate::observability::tracing::trace_persistence;
use crate::store::app_data::AppData;

/// Stores the blob as pretty JSON in a single file.
///
/// ## Atomicity
/// Saves write a sibling `*.tmp` file, flush it, then rename it over the
/// target, so a crash mid-save leaves the previous blob intact.
///
/// ## Missing data
/// A missing file loads as `AppData::default()`. Missing sections inside the
/// file take their defaults.
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonFilePersistence {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Persistence for JsonFilePersistence {
    fn load(&self) -> Result<AppData> {
        let _span = trace_persistence().entered();
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no stored data, starting empty");
                return Ok(AppData::default());
            }
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(AppData::default());
        }

        let data: AppData = serde_json::from_str(&raw)?;
        tracing::debug!(
            path = %self.path.display(),
            deals = data.deals.len(),
            entries = data.ledger.len(),
            "loaded stored data"
        );
        Ok(data)
    }

    fn save(&self, data: &AppData) -> Result<()> {
        let _span = trace_persistence().entered();
        let body = serde_json::to_vec_pretty(data)?;
        let tmp = self.temp_path();

        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&body)?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        };

        write().map_err(|e| Error::Persistence(format!("write {}: {e}", self.path.display())))?;
        tracing::debug!(path = %self.path.display(), bytes = body.len(), "saved data");
        Ok(())
    }
}

/// Keeps the blob in memory; used by tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryPersistence {
    data: Mutex<Option<AppData>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: AppData) -> Self {
        MemoryPersistence {
            data: Mutex::new(Some(data)),
        }
    }

    /// Last saved blob, if any.
    pub fn snapshot(&self) -> Option<AppData> {
        self.data.lock().clone()
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> Result<AppData> {
        Ok(self.data.lock().clone().unwrap_or_default())
    }

    fn save(&self, data: &AppData) -> Result<()> {
        *self.data.lock() = Some(data.clone());
        Ok(())
    }
}
