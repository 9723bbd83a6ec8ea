//! Ledger storage.
//!
//! Uses JSON Lines format (.jsonl):
//! - One entry per line, appended and flushed immediately
//! - A corrupt line only loses that entry; the scan skips it with a warning
//! - Clearing truncates the file

use crate::error::PersistenceResult;
use parking_lot::Mutex;
use pnl_core::LedgerEntry;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Append-only record store of ledger entries.
pub trait LedgerStore: Send + Sync {
    /// Append one entry.
    fn append(&self, entry: &LedgerEntry) -> PersistenceResult<()>;

    /// Read every entry currently stored.
    fn scan(&self) -> PersistenceResult<Vec<LedgerEntry>>;

    /// Remove every entry.
    fn clear(&self) -> PersistenceResult<()>;
}

/// File-backed ledger in JSON Lines format.
pub struct JsonLinesLedger {
    path: PathBuf,
    /// Serializes file access between append/scan/clear.
    io_lock: Mutex<()>,
}

impl JsonLinesLedger {
    /// Open (or create) the ledger file at `path`.
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Create the file up front so permission problems surface at startup
        OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), "Opened ledger (append mode)");

        Ok(Self {
            path,
            io_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonLinesLedger {
    fn append(&self, entry: &LedgerEntry) -> PersistenceResult<()> {
        let _guard = self.io_lock.lock();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);

        let json = serde_json::to_string(entry)?;
        writeln!(writer, "{json}")?;
        writer.flush()?;

        debug!(
            pair = %entry.instrument_pair,
            amount = %entry.amount,
            currency = %entry.currency,
            "Ledger entry appended"
        );
        Ok(())
    }

    fn scan(&self) -> PersistenceResult<Vec<LedgerEntry>> {
        let _guard = self.io_lock.lock();

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LedgerEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(line = idx + 1, error = %e, "Skipping corrupt ledger line"),
            }
        }

        Ok(entries)
    }

    fn clear(&self) -> PersistenceResult<()> {
        let _guard = self.io_lock.lock();
        File::create(&self.path)?;
        info!(path = %self.path.display(), "Ledger cleared");
        Ok(())
    }
}

/// In-memory ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl LedgerStore for MemoryLedger {
    fn append(&self, entry: &LedgerEntry) -> PersistenceResult<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }

    fn scan(&self) -> PersistenceResult<Vec<LedgerEntry>> {
        Ok(self.entries.lock().clone())
    }

    fn clear(&self) -> PersistenceResult<()> {
        self.entries.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn sample() -> Vec<LedgerEntry> {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        vec![
            LedgerEntry::recorded_at("SOL/USDT", dec!(10.5), "USDT", at),
            LedgerEntry::recorded_at("BTC/USDT", dec!(-2.0), "USDT", at),
            LedgerEntry::recorded_at("ETH/BTC", dec!(0.01), "BTC", at),
        ]
    }

    #[test]
    fn test_append_and_scan_preserves_entries() {
        let dir = TempDir::new().unwrap();
        let ledger = JsonLinesLedger::open(dir.path().join("ledger.jsonl")).unwrap();
        assert!(ledger.scan().unwrap().is_empty());

        for entry in &sample() {
            ledger.append(entry).unwrap();
        }

        // Order and decimal precision are kept
        assert_eq!(ledger.scan().unwrap(), sample());
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("ledger.jsonl");

        {
            let ledger = JsonLinesLedger::open(&path).unwrap();
            for entry in &sample() {
                ledger.append(entry).unwrap();
            }
        }

        let reopened = JsonLinesLedger::open(&path).unwrap();
        assert_eq!(reopened.scan().unwrap(), sample());
    }

    #[test]
    fn test_clear_empties_file() {
        let dir = TempDir::new().unwrap();
        let ledger = JsonLinesLedger::open(dir.path().join("ledger.jsonl")).unwrap();
        for entry in &sample() {
            ledger.append(entry).unwrap();
        }

        ledger.clear().unwrap();
        assert!(ledger.scan().unwrap().is_empty());

        // Clearing an empty ledger is harmless
        ledger.clear().unwrap();
        assert!(ledger.scan().unwrap().is_empty());

        // Appends continue after a clear
        ledger.append(&sample()[0]).unwrap();
        assert_eq!(ledger.scan().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = JsonLinesLedger::open(&path).unwrap();
        ledger.append(&sample()[0]).unwrap();

        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{\"instrument_pair\": \"BROKEN").unwrap();
            writeln!(file).unwrap();
        }
        ledger.append(&sample()[1]).unwrap();

        let entries = ledger.scan().unwrap();
        assert_eq!(entries, vec![sample()[0].clone(), sample()[1].clone()]);
    }

    #[test]
    fn test_memory_ledger() {
        let ledger = MemoryLedger::new();
        assert!(ledger.is_empty());
        for entry in &sample() {
            ledger.append(entry).unwrap();
        }
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.scan().unwrap(), sample());

        ledger.clear().unwrap();
        assert!(ledger.is_empty());
    }
}
