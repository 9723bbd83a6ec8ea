//! Prometheus metrics for the PnL summary bot.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a fatal configuration error that should
//! crash on first use rather than silently drop data.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};
use serde::Serialize;

/// Total trades appended to the ledger.
pub static TRADES_RECORDED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pnl_trades_recorded_total",
        "Total trade-close events appended to the ledger"
    )
    .unwrap()
});

/// Total trigger fires handled.
/// Labels: role (daily_summary/fallback_cleanup)
pub static TRIGGERS_FIRED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pnl_triggers_fired_total",
        "Total scheduled trigger fires handled",
        &["role"]
    )
    .unwrap()
});

/// Total summaries delivered.
pub static SUMMARIES_DISPATCHED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pnl_summaries_dispatched_total",
        "Total daily summaries delivered"
    )
    .unwrap()
});

/// Total failed summary deliveries.
pub static DISPATCH_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pnl_dispatch_failures_total",
        "Total summary deliveries that failed"
    )
    .unwrap()
});

/// Total ledger resets.
/// Labels: reason (user_requested/post_summary/fallback_nightly)
pub static LEDGER_RESETS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pnl_ledger_resets_total",
        "Total ledger resets",
        &["reason"]
    )
    .unwrap()
});

/// Metrics helper for recording.
pub struct Metrics;

impl Metrics {
    pub fn trade_recorded() {
        TRADES_RECORDED_TOTAL.inc();
    }

    pub fn trigger_fired(role: &str) {
        TRIGGERS_FIRED_TOTAL.with_label_values(&[role]).inc();
    }

    pub fn summary_dispatched() {
        SUMMARIES_DISPATCHED_TOTAL.inc();
    }

    pub fn dispatch_failed() {
        DISPATCH_FAILURES_TOTAL.inc();
    }

    pub fn ledger_reset(reason: &str) {
        LEDGER_RESETS_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Read the current counter values.
    pub fn snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            trades_recorded: TRADES_RECORDED_TOTAL.get(),
            triggers_fired: sum_vec(&TRIGGERS_FIRED_TOTAL, &["daily_summary", "fallback_cleanup"]),
            summaries_dispatched: SUMMARIES_DISPATCHED_TOTAL.get(),
            dispatch_failures: DISPATCH_FAILURES_TOTAL.get(),
            ledger_resets: sum_vec(
                &LEDGER_RESETS_TOTAL,
                &["user_requested", "post_summary", "fallback_nightly"],
            ),
        }
    }
}

fn sum_vec(vec: &IntCounterVec, labels: &[&str]) -> u64 {
    labels
        .iter()
        .map(|label| vec.with_label_values(&[label]).get())
        .sum()
}

/// Point-in-time copy of the counters, for periodic log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub trades_recorded: u64,
    pub triggers_fired: u64,
    pub summaries_dispatched: u64,
    pub dispatch_failures: u64,
    pub ledger_resets: u64,
}
