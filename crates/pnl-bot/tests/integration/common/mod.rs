//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use mockall::mock;
use pnl_bot::{SummaryOptions, SummaryService};
use pnl_core::{LedgerEntry, ScheduleConfig};
use pnl_notify::MockDispatcher;
use pnl_persistence::{
    LedgerStore, MemoryLedger, MemorySettingsStore, PersistenceResult, SettingsStore,
};
use pnl_scheduler::{FixedClock, TriggerFired, TriggerRegistry, Tz};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Chat id summaries are delivered to.
pub const CHAT_ID: &str = "42";

mock! {
    pub Ledger {}

    impl LedgerStore for Ledger {
        fn append(&self, entry: &LedgerEntry) -> PersistenceResult<()>;
        fn scan(&self) -> PersistenceResult<Vec<LedgerEntry>>;
        fn clear(&self) -> PersistenceResult<()>;
    }
}

/// 2026-10-16 14:00 in Europe/Kyiv (UTC+3).
pub fn kyiv_afternoon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 11, 0, 0).unwrap()
}

/// Service plus handles on every collaborator.
pub struct Harness {
    pub service: SummaryService,
    pub ledger: Arc<dyn LedgerStore>,
    pub settings: Arc<MemorySettingsStore>,
    pub dispatcher: Arc<MockDispatcher>,
    pub registry: Arc<TriggerRegistry>,
    pub clock: Arc<FixedClock>,
    pub fire_rx: mpsc::Receiver<TriggerFired>,
}

impl Harness {
    /// Fresh service with an empty in-memory ledger. Needs a tokio runtime.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::build(now, Arc::new(MemoryLedger::new()), ScheduleConfig::default())
    }

    pub fn with_settings(now: DateTime<Utc>, config: ScheduleConfig) -> Self {
        Self::build(now, Arc::new(MemoryLedger::new()), config)
    }

    pub fn with_ledger(now: DateTime<Utc>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self::build(now, ledger, ScheduleConfig::default())
    }

    pub fn build(now: DateTime<Utc>, ledger: Arc<dyn LedgerStore>, config: ScheduleConfig) -> Self {
        let clock = Arc::new(FixedClock::new(now));
        let (fire_tx, fire_rx) = mpsc::channel(8);
        let registry = Arc::new(TriggerRegistry::new(clock.clone(), fire_tx).unwrap());
        let settings = Arc::new(MemorySettingsStore::new(config));
        let dispatcher = Arc::new(MockDispatcher::new());

        let service = SummaryService::new(
            ledger.clone(),
            settings.clone(),
            dispatcher.clone(),
            registry.clone(),
            clock.clone(),
            SummaryOptions {
                destination: CHAT_ID.to_string(),
                default_timezone: Tz::UTC,
            },
        );

        Self {
            service,
            ledger,
            settings,
            dispatcher,
            registry,
            clock,
            fire_rx,
        }
    }

    pub fn stored_settings(&self) -> ScheduleConfig {
        self.settings.get().unwrap()
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.scan().unwrap().len()
    }
}
