//! Chat command parsing and execution.
//!
//! Replies are sent with Markdown parse mode, so free text that may carry
//! underscores (zone names, error messages) is wrapped in code spans.

use crate::error::AppError;
use crate::service::{ServiceStatus, SummaryService};
use pnl_core::{
    format_summary, parse_pnl_message, ParsedPnl, MANUAL_SUMMARY_TITLE, PNL_MARKER,
};
use std::fmt::Write as _;
use tracing::{info, warn};

const HELP: &str = "👋 *PnL summary bot*\n\n\
`/set_timezone <Zone>` set your timezone (e.g. `Europe/Kyiv`)\n\
`/set_time HH:MM` daily summary time in that zone\n\
`/manual_calc` summary of the ledger right now\n\
`/status` current schedule\n\
`/reset` clear the ledger and the daily schedule\n\n\
Forwarded \"Realized PNL\" messages are recorded automatically.";

/// Inbound chat text, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    ManualCalc,
    SetTimezone(Option<String>),
    SetTime(Option<String>),
    Reset,
    Status,
    /// A "Realized PNL" notification.
    Trade(ParsedPnl),
    /// Carries the marker but not a pair and amount.
    Unrecognized,
    Unknown(String),
}

impl Command {
    /// Classify a chat message. Plain text without the PnL marker yields
    /// `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let Some(body) = text.strip_prefix('/') else {
            return match parse_pnl_message(text) {
                Some(pnl) => Some(Self::Trade(pnl)),
                None if text.contains(PNL_MARKER) => Some(Self::Unrecognized),
                None => None,
            };
        };

        let (head, rest) = match body.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (body, ""),
        };
        // "/status@my_bot" in group chats
        let name = head.split('@').next().unwrap_or(head);
        let arg = (!rest.is_empty()).then(|| rest.to_string());

        Some(match name {
            "start" | "help" => Self::Start,
            "manual_calc" => Self::ManualCalc,
            "set_timezone" => Self::SetTimezone(arg),
            "set_time" => Self::SetTime(arg),
            "reset" => Self::Reset,
            "status" => Self::Status,
            other => Self::Unknown(other.to_string()),
        })
    }
}

/// Run `command` against the service and build the reply, if any.
///
/// Errors become a reply, as does every trade message.
pub async fn execute(service: &SummaryService, command: Command) -> Option<String> {
    let reply = match command {
        Command::Start => HELP.to_string(),
        Command::ManualCalc => match service.get_summary_now() {
            Ok(summary) if summary.is_empty() => "📭 No trades recorded yet.".to_string(),
            Ok(summary) => format_summary(MANUAL_SUMMARY_TITLE, &summary),
            Err(e) => failure("manual_calc", &e),
        },
        Command::SetTimezone(None) => "Usage: `/set_timezone Europe/Kyiv`".to_string(),
        Command::SetTimezone(Some(name)) => match service.configure_timezone(&name) {
            Ok(tz) => format!("✅ Timezone set to `{}`", tz.name()),
            Err(e) => failure("set_timezone", &e),
        },
        Command::SetTime(None) => "Usage: `/set_time 21:00`".to_string(),
        Command::SetTime(Some(text)) => match service.configure_schedule_str(&text) {
            Ok(fire) => format!(
                "✅ Daily summary at {} (`{}`)\nNext: {}",
                fire.time,
                fire.timezone.name(),
                fire.fire_at.with_timezone(&fire.timezone).format("%Y-%m-%d %H:%M %Z")
            ),
            Err(e) => failure("set_time", &e),
        },
        Command::Reset => match service.force_reset() {
            Ok(_) => "🧹 Ledger cleared. Daily summary removed; nightly cleanup at 23:59 is active."
                .to_string(),
            Err(e) => failure("reset", &e),
        },
        Command::Status => match service.status() {
            Ok(status) => render_status(&status),
            Err(e) => failure("status", &e),
        },
        Command::Trade(pnl) => {
            match service.record_trade(&pnl.instrument_pair, pnl.amount, &pnl.currency) {
                Ok(entry) => format!(
                    "Saved: `{} {}{}`",
                    entry.instrument_pair, entry.amount, entry.currency
                ),
                Err(e) => failure("record_trade", &e),
            }
        }
        Command::Unrecognized => {
            warn!("PnL message did not match the expected format");
            "⚠️ Message format not recognized.".to_string()
        }
        Command::Unknown(name) => unknown(&name),
    };

    Some(reply)
}

fn failure(command: &str, err: &AppError) -> String {
    if err.is_config_error() {
        info!(command, error = %err, "Command rejected");
    } else {
        warn!(command, error = %err, "Command failed");
    }
    format!("❌ `{}`", err.to_string().replace('`', "'"))
}

fn unknown(name: &str) -> String {
    format!(
        "Unknown command `/{}`. Send /start for help.",
        name.replace('`', "'")
    )
}

fn render_status(status: &ServiceStatus) -> String {
    let mut out = String::from("⚙️ *Status*\n");
    let _ = writeln!(
        out,
        "Timezone: `{}`",
        status.timezone_name.as_deref().unwrap_or("not set")
    );
    let _ = writeln!(out, "Mode: {}", status.mode);
    for (role, at) in &status.next_fires {
        let _ = writeln!(out, "Next `{role}`: {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
    let _ = write!(out, "Ledger entries: {}", status.ledger_entries);
    out
}
