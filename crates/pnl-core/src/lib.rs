//! Core domain types for the PnL summary bot.
//!
//! This crate provides the types shared by every other crate:
//! - `LedgerEntry`: one recorded trade close (pair, signed amount, currency)
//! - `DailySummary` / `CurrencySummary`: per-currency profit/loss/net figures
//! - `ScheduleConfig` / `ScheduleMode`: persisted scheduling state
//! - `TriggerRole`, `DailyTime`, `ResetReason`: scheduling vocabulary
//!
//! It also hosts the aggregation engine (`summarize`), the Markdown report
//! renderer and the parser for inbound "Realized PNL" messages.

pub mod error;
pub mod format;
pub mod ledger;
pub mod parser;
pub mod schedule;
pub mod summary;

pub use error::{CoreError, Result};
pub use format::{format_summary, DAILY_SUMMARY_TITLE, MANUAL_SUMMARY_TITLE};
pub use ledger::LedgerEntry;
pub use parser::{parse_pnl_message, ParsedPnl, PNL_MARKER};
pub use schedule::{
    DailyTime, ResetReason, ScheduleConfig, ScheduleDocument, ScheduleMode, TriggerRole,
};
pub use summary::{summarize, CurrencySummary, DailySummary};
