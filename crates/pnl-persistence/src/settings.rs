//! Settings document storage.
//!
//! The schedule state is a single small JSON document. Writes go to a
//! sibling temp file first and are renamed into place, so a crash never
//! leaves a half-written document behind.

use crate::error::{PersistenceError, PersistenceResult};
use parking_lot::Mutex;
use pnl_core::ScheduleConfig;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Durable key-value document holding the schedule state.
pub trait SettingsStore: Send + Sync {
    /// Current settings, or defaults when nothing was saved yet.
    fn get(&self) -> PersistenceResult<ScheduleConfig>;

    /// Replace the stored settings.
    fn put(&self, config: &ScheduleConfig) -> PersistenceResult<()>;
}

/// File-backed settings document.
pub struct JsonSettingsStore {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl JsonSettingsStore {
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        info!(path = %path.display(), "Using settings document");

        Ok(Self {
            path,
            io_lock: Mutex::new(()),
        })
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

impl SettingsStore for JsonSettingsStore {
    fn get(&self) -> PersistenceResult<ScheduleConfig> {
        let _guard = self.io_lock.lock();

        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(ScheduleConfig::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ScheduleConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, config: &ScheduleConfig) -> PersistenceResult<()> {
        let _guard = self.io_lock.lock();

        let json = serde_json::to_string_pretty(config)?;
        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), mode = %config.mode, "Settings saved");
        Ok(())
    }
}

/// In-memory settings.
///
/// `fail_writes` makes every `put` fail, for exercising error paths.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    config: Mutex<ScheduleConfig>,
    fail_writes: AtomicBool,
}

impl MemorySettingsStore {
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            config: Mutex::new(config),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self) -> PersistenceResult<ScheduleConfig> {
        Ok(self.config.lock().clone())
    }

    fn put(&self, config: &ScheduleConfig) -> PersistenceResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "settings writes disabled".to_string(),
            ));
        }
        *self.config.lock() = config.clone();
        Ok(())
    }
}
