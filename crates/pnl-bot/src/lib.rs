//! Daily PnL summary bot.
//!
//! Wires the components together:
//! - Ledger ingestion from "Realized PNL" chat messages
//! - Timezone-aware daily summary trigger with a nightly fallback cleanup
//! - Summary delivery through the Telegram Bot API
//! - Chat commands for configuration and on-demand summaries

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod reset;
pub mod service;

pub use app::Application;
pub use commands::{execute, Command};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use reset::ResetCoordinator;
pub use service::{FireOutcome, ScheduledFire, ServiceStatus, SummaryOptions, SummaryService};
