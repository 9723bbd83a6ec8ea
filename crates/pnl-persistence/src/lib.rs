//! Ledger and settings storage.
//!
//! - Ledger: JSON Lines file, append-only, cleared in bulk after each
//!   summary cycle
//! - Settings: a single JSON document replaced atomically on every write
//!
//! Both come with in-memory variants for tests and dry runs.

pub mod error;
pub mod ledger;
pub mod settings;

pub use error::{PersistenceError, PersistenceResult};
pub use ledger::{JsonLinesLedger, LedgerStore, MemoryLedger};
pub use settings::{JsonSettingsStore, MemorySettingsStore, SettingsStore};
