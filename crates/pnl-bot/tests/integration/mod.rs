//! Integration tests for pnl-bot.
//!
//! These tests drive `SummaryService` end to end with in-memory stores,
//! a recording dispatcher and a real trigger registry:
//! - Delivery/clear coupling on trigger fires
//! - Schedule configuration, restore and reset

pub mod common;
