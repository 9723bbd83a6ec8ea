//! Parser for exchange "Realized PNL" notifications.
//!
//! Recognised shape, anywhere after the marker:
//!
//! ```text
//! Realized PNL ... <BASE>/<QUOTE>[:<SETTLE>] <signed amount>
//! ```
//!
//! The amount is denominated in the quote asset of the pair.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Marker that identifies a PnL notification.
pub const PNL_MARKER: &str = "Realized PNL";

/// A successfully parsed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPnl {
    pub instrument_pair: String,
    pub amount: Decimal,
    pub currency: String,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Extract `(base, quote)` from a token such as `SOL/USDT`, `#SOL/USDT:USDT`.
///
/// The quote must be followed by nothing or by a `:<settle>` suffix.
fn extract_pair(token: &str) -> Option<(&str, &str)> {
    let slash = token.find('/')?;
    let (left, right) = (&token[..slash], &token[slash + 1..]);

    let base_start = left
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map(|(i, _)| i)?;
    let base = &left[base_start..];

    let quote_end = right
        .char_indices()
        .find(|(_, c)| !is_word_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(right.len());
    let quote = &right[..quote_end];
    if quote.is_empty() {
        return None;
    }

    let rest = &right[quote_end..];
    if !rest.is_empty() {
        let settle = rest.strip_prefix(':')?;
        if settle.is_empty() || !settle.chars().all(is_word_char) {
            return None;
        }
    }

    Some((base, quote))
}

/// Parse the leading signed decimal of a token (`+1.25`, `-0.5USDT`, `3.`).
fn leading_amount(token: &str) -> Option<Decimal> {
    let bytes = token.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    let literal = token[..end].trim_start_matches('+').trim_end_matches('.');
    Decimal::from_str(literal).ok()
}

/// Parse a PnL notification.
///
/// Returns `None` when the marker is missing or no `<pair> <amount>`
/// sequence follows it.
pub fn parse_pnl_message(message: &str) -> Option<ParsedPnl> {
    let start = message.find(PNL_MARKER)?;
    let tail = &message[start + PNL_MARKER.len()..];
    let tokens: Vec<&str> = tail.split_whitespace().collect();

    tokens.windows(2).find_map(|pair| {
        let (base, quote) = extract_pair(pair[0])?;
        let amount = leading_amount(pair[1])?;
        Some(ParsedPnl {
            instrument_pair: format!("{base}/{quote}"),
            amount,
            currency: quote.to_string(),
        })
    })
}
