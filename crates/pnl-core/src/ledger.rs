//! Ledger entry type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One recorded trade close.
///
/// Entries are immutable once written. The ledger only ever grows by
/// appending entries and shrinks by a bulk clear; single entries are never
/// edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Instrument pair as reported by the exchange (e.g., "SOL/USDT").
    pub instrument_pair: String,
    /// Signed realized amount. Negative values are losses.
    pub amount: Decimal,
    /// Currency the amount is denominated in (e.g., "USDT").
    pub currency: String,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        instrument_pair: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self::recorded_at(instrument_pair, amount, currency, Utc::now())
    }

    /// Create an entry with an explicit timestamp.
    pub fn recorded_at(
        instrument_pair: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            instrument_pair: instrument_pair.into(),
            amount,
            currency: currency.into(),
            recorded_at,
        }
    }

    #[inline]
    pub fn is_loss(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_is_loss() {
        assert!(LedgerEntry::new("BTC/USDT", dec!(-2.0), "USDT").is_loss());
        assert!(!LedgerEntry::new("SOL/USDT", dec!(10.5), "USDT").is_loss());
        // Zero counts as profit side
        assert!(!LedgerEntry::new("SOL/USDT", Decimal::ZERO, "USDT").is_loss());
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let entry = LedgerEntry::new("ETH/BTC", dec!(0.01), "BTC");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"amount\":\"0.01\""));

        let back: LedgerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
