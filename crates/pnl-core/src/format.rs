//! Markdown rendering of summaries for chat delivery.

use crate::summary::DailySummary;
use rust_decimal::Decimal;
use std::fmt::Write;

/// Title used for the scheduled daily report.
pub const DAILY_SUMMARY_TITLE: &str = "📊 Daily Summary:";

/// Title used for on-demand reports.
pub const MANUAL_SUMMARY_TITLE: &str = "📊 Manual Summary by Currency:";

/// Fractional digits shown for every figure.
const DISPLAY_DP: u32 = 4;

fn fixed(value: Decimal) -> String {
    format!("{:.4}", value.round_dp(DISPLAY_DP))
}

/// Render a summary as a Markdown message, one block per currency.
pub fn format_summary(title: &str, summary: &DailySummary) -> String {
    let mut msg = String::with_capacity(64 + summary.len() * 96);
    msg.push_str(title);
    msg.push('\n');

    for s in summary {
        // Writing into a String cannot fail
        let _ = write!(
            msg,
            "\n💰 *{}*\n🟢 Profit: `{}`\n🔴 Loss: `{}`\n📈 Net: `{}`\n",
            s.currency,
            fixed(s.profit),
            fixed(s.loss),
            fixed(s.net),
        );
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerEntry;
    use crate::summary::summarize;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_single_currency() {
        let ledger = vec![
            LedgerEntry::new("SOL/USDT", dec!(10.5), "USDT"),
            LedgerEntry::new("BTC/USDT", dec!(-2.0), "USDT"),
        ];
        let text = format_summary(DAILY_SUMMARY_TITLE, &summarize(&ledger).unwrap());

        assert_eq!(
            text,
            "📊 Daily Summary:\n\
             \n💰 *USDT*\n🟢 Profit: `10.5000`\n🔴 Loss: `-2.0000`\n📈 Net: `8.5000`\n"
        );
    }

    #[test]
    fn test_format_rounds_to_four_places() {
        let ledger = vec![LedgerEntry::new("SOL/USDT", dec!(1.124658), "USDT")];
        let text = format_summary(MANUAL_SUMMARY_TITLE, &summarize(&ledger).unwrap());
        assert!(text.starts_with(MANUAL_SUMMARY_TITLE));
        assert!(text.contains("Profit: `1.1247`"));
        assert!(text.contains("Loss: `0.0000`"));
    }

    #[test]
    fn test_format_empty_is_title_only() {
        let text = format_summary(DAILY_SUMMARY_TITLE, &DailySummary::default());
        assert_eq!(text, "📊 Daily Summary:\n");
    }
}
