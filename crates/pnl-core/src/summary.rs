//! Ledger aggregation.
//!
//! Reduces a full ledger scan into per-currency profit/loss/net figures.
//! All arithmetic uses `Decimal` so that summing many small fills never
//! drifts the way binary floating point would.

use crate::error::{CoreError, Result};
use crate::ledger::LedgerEntry;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};

/// Profit/loss figures for a single currency.
///
/// Invariants: `profit >= 0`, `loss <= 0`, `net == profit + loss`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencySummary {
    pub currency: String,
    /// Sum of all non-negative amounts.
    pub profit: Decimal,
    /// Sum of all negative amounts.
    pub loss: Decimal,
    pub net: Decimal,
}

impl CurrencySummary {
    fn empty(currency: &str) -> Self {
        Self {
            currency: currency.to_string(),
            profit: Decimal::ZERO,
            loss: Decimal::ZERO,
            net: Decimal::ZERO,
        }
    }

    fn add(&mut self, amount: Decimal) -> Result<()> {
        let side = if amount >= Decimal::ZERO {
            &mut self.profit
        } else {
            &mut self.loss
        };
        *side = side
            .checked_add(amount)
            .ok_or_else(|| overflow(&self.currency))?;
        Ok(())
    }
}

fn overflow(currency: &str) -> CoreError {
    CoreError::Overflow(format!("{currency} total exceeds the decimal range"))
}

/// Per-currency summary of the whole ledger.
///
/// An empty summary means "nothing to report" and is a normal result.
/// Keys are kept ordered only so reports render deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DailySummary(BTreeMap<String, CurrencySummary>);

impl DailySummary {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, currency: &str) -> Option<&CurrencySummary> {
        self.0.get(currency)
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, CurrencySummary> {
        self.0.values()
    }
}

impl<'a> IntoIterator for &'a DailySummary {
    type Item = &'a CurrencySummary;
    type IntoIter = btree_map::Values<'a, String, CurrencySummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Summarize ledger entries by currency.
///
/// Pure function of its input: the result does not depend on entry order.
/// Returns an empty summary for an empty ledger, and `Overflow` when a
/// currency's totals leave the `Decimal` range.
pub fn summarize<'a, I>(entries: I) -> Result<DailySummary>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut by_currency: BTreeMap<String, CurrencySummary> = BTreeMap::new();

    for entry in entries {
        by_currency
            .entry(entry.currency.clone())
            .or_insert_with(|| CurrencySummary::empty(&entry.currency))
            .add(entry.amount)?;
    }

    // Net is derived once all amounts are folded in
    for summary in by_currency.values_mut() {
        summary.net = summary
            .profit
            .checked_add(summary.loss)
            .ok_or_else(|| overflow(&summary.currency))?;
    }

    Ok(DailySummary(by_currency))
}
