//! Scheduling vocabulary and persisted schedule state.

use crate::error::{CoreError, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical identity of an armed trigger.
///
/// At most one trigger per role is armed at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerRole {
    /// Sends the daily summary, then clears the ledger.
    DailySummary,
    /// Clears the ledger nightly when no daily report time is configured.
    FallbackCleanup,
}

impl TriggerRole {
    pub const ALL: [TriggerRole; 2] = [TriggerRole::DailySummary, TriggerRole::FallbackCleanup];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DailySummary => "daily_summary",
            Self::FallbackCleanup => "fallback_cleanup",
        }
    }
}

impl fmt::Display for TriggerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the ledger is being cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetReason {
    /// User asked for an immediate reset.
    UserRequested,
    /// A non-empty daily summary was delivered.
    PostSummary,
    /// The nightly fallback cleanup fired.
    FallbackNightly,
}

impl ResetReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRequested => "user_requested",
            Self::PostSummary => "post_summary",
            Self::FallbackNightly => "fallback_nightly",
        }
    }
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated local wall-clock time of day (minute resolution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DailyTime {
    hour: u32,
    minute: u32,
}

impl DailyTime {
    /// 23:59, the fallback cleanup time.
    pub const END_OF_DAY: Self = Self {
        hour: 23,
        minute: 59,
    };

    /// Create a time, rejecting `hour > 23` or `minute > 59`.
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 {
            return Err(CoreError::InvalidTime(format!(
                "hour must be within 0-23, got {hour}"
            )));
        }
        if minute > 59 {
            return Err(CoreError::InvalidTime(format!(
                "minute must be within 0-59, got {minute}"
            )));
        }
        Ok(Self { hour, minute })
    }

    #[inline]
    pub fn hour(&self) -> u32 {
        self.hour
    }

    #[inline]
    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// The time as `hh:mm:00`.
    pub fn as_naive_time(&self) -> NaiveTime {
        // Components are range-checked on construction
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or_default()
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for DailyTime {
    type Err = CoreError;

    /// Parse `H:MM` or `HH:MM`.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || CoreError::InvalidTime(format!("expected HH:MM, got {s:?}"));

        let (h, m) = s.trim().split_once(':').ok_or_else(malformed)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(malformed());
        }
        if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let hour = h.parse().map_err(|_| malformed())?;
        let minute = m.parse().map_err(|_| malformed())?;
        Self::new(hour, minute)
    }
}

/// Which trigger the schedule currently relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleMode {
    /// Nothing configured yet; no trigger armed.
    #[default]
    Unconfigured,
    /// Only the nightly fallback cleanup is armed.
    FallbackCleanupOnly,
    /// A daily summary is armed at the given local time.
    DailySummaryActive { time: DailyTime },
}

impl ScheduleMode {
    /// Role of the trigger this mode keeps armed, if any.
    pub fn armed_role(&self) -> Option<TriggerRole> {
        match self {
            Self::Unconfigured => None,
            Self::FallbackCleanupOnly => Some(TriggerRole::FallbackCleanup),
            Self::DailySummaryActive { .. } => Some(TriggerRole::DailySummary),
        }
    }
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "unconfigured"),
            Self::FallbackCleanupOnly => write!(f, "fallback cleanup only"),
            Self::DailySummaryActive { time } => write!(f, "daily summary at {time}"),
        }
    }
}

/// Schedule state owned by the settings store.
///
/// Serializes to the flat [`ScheduleDocument`] layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ScheduleDocument", into = "ScheduleDocument")]
pub struct ScheduleConfig {
    /// Canonical IANA zone identifier.
    pub timezone_name: Option<String>,
    pub mode: ScheduleMode,
}

impl ScheduleConfig {
    pub fn fallback_cleanup_active(&self) -> bool {
        self.mode == ScheduleMode::FallbackCleanupOnly
    }

    pub fn daily_time(&self) -> Option<DailyTime> {
        match self.mode {
            ScheduleMode::DailySummaryActive { time } => Some(time),
            _ => None,
        }
    }
}

/// Persisted settings layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleDocument {
    #[serde(default)]
    pub timezone_name: Option<String>,
    #[serde(default)]
    pub local_fire_hour: Option<u32>,
    #[serde(default)]
    pub local_fire_minute: Option<u32>,
    #[serde(default)]
    pub fallback_cleanup_active: bool,
}

impl TryFrom<ScheduleDocument> for ScheduleConfig {
    type Error = CoreError;

    fn try_from(doc: ScheduleDocument) -> Result<Self> {
        let mode = match (doc.local_fire_hour, doc.local_fire_minute) {
            (Some(hour), Some(minute)) => {
                if doc.timezone_name.is_none() {
                    return Err(CoreError::InvalidSettings(
                        "fire time is set but timezone_name is missing".to_string(),
                    ));
                }
                ScheduleMode::DailySummaryActive {
                    time: DailyTime::new(hour, minute)?,
                }
            }
            (None, None) if doc.fallback_cleanup_active => ScheduleMode::FallbackCleanupOnly,
            (None, None) => ScheduleMode::Unconfigured,
            _ => {
                return Err(CoreError::InvalidSettings(
                    "local_fire_hour and local_fire_minute must be set together".to_string(),
                ))
            }
        };

        Ok(Self {
            timezone_name: doc.timezone_name,
            mode,
        })
    }
}

impl From<ScheduleConfig> for ScheduleDocument {
    fn from(config: ScheduleConfig) -> Self {
        let time = config.daily_time();
        Self {
            fallback_cleanup_active: config.fallback_cleanup_active(),
            timezone_name: config.timezone_name,
            local_fire_hour: time.map(|t| t.hour()),
            local_fire_minute: time.map(|t| t.minute()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_time_bounds() {
        assert!(DailyTime::new(0, 0).is_ok());
        assert!(DailyTime::new(23, 59).is_ok());
        assert!(DailyTime::new(24, 0).is_err());
        assert!(DailyTime::new(12, 60).is_err());
    }

    #[test]
    fn test_daily_time_parse() {
        assert_eq!("09:00".parse::<DailyTime>().unwrap(), DailyTime::new(9, 0).unwrap());
        assert_eq!("7:05".parse::<DailyTime>().unwrap(), DailyTime::new(7, 5).unwrap());
        assert_eq!(" 23:59 ".parse::<DailyTime>().unwrap(), DailyTime::END_OF_DAY);

        for bad in ["", "9", "9:5", "09-00", "ab:cd", "24:00", "12:60", "+1:00", "123:00"] {
            assert!(bad.parse::<DailyTime>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_daily_time_display() {
        assert_eq!(DailyTime::new(9, 5).unwrap().to_string(), "09:05");
        assert_eq!(
            DailyTime::END_OF_DAY.as_naive_time(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_trigger_role_names() {
        assert_eq!(TriggerRole::DailySummary.to_string(), "daily_summary");
        assert_eq!(TriggerRole::FallbackCleanup.to_string(), "fallback_cleanup");
    }

    #[test]
    fn test_mode_armed_role() {
        assert_eq!(ScheduleMode::Unconfigured.armed_role(), None);
        assert_eq!(
            ScheduleMode::FallbackCleanupOnly.armed_role(),
            Some(TriggerRole::FallbackCleanup)
        );
        let active = ScheduleMode::DailySummaryActive {
            time: DailyTime::new(9, 0).unwrap(),
        };
        assert_eq!(active.armed_role(), Some(TriggerRole::DailySummary));
    }

    #[test]
    fn test_config_persisted_layout() {
        let config = ScheduleConfig {
            timezone_name: Some("Europe/Kyiv".to_string()),
            mode: ScheduleMode::DailySummaryActive {
                time: DailyTime::new(9, 30).unwrap(),
            },
        };
        let json: serde_json::Value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "timezone_name": "Europe/Kyiv",
                "local_fire_hour": 9,
                "local_fire_minute": 30,
                "fallback_cleanup_active": false,
            })
        );

        let back: ScheduleConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_config_fallback_flag_maps_to_mode() {
        let json = r#"{"timezone_name":null,"local_fire_hour":null,"local_fire_minute":null,"fallback_cleanup_active":true}"#;
        let config: ScheduleConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mode, ScheduleMode::FallbackCleanupOnly);
        assert!(config.fallback_cleanup_active());
    }

    #[test]
    fn test_config_rejects_inconsistent_document() {
        // Hour without minute
        let half = r#"{"timezone_name":"UTC","local_fire_hour":9}"#;
        assert!(serde_json::from_str::<ScheduleConfig>(half).is_err());

        // Out of range
        let range = r#"{"timezone_name":"UTC","local_fire_hour":25,"local_fire_minute":0}"#;
        assert!(serde_json::from_str::<ScheduleConfig>(range).is_err());

        // Fire time without zone
        let zoneless = r#"{"local_fire_hour":9,"local_fire_minute":0}"#;
        assert!(serde_json::from_str::<ScheduleConfig>(zoneless).is_err());
    }

    #[test]
    fn test_empty_document_is_unconfigured() {
        let config: ScheduleConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ScheduleConfig::default());
        assert_eq!(config.mode, ScheduleMode::Unconfigured);
    }
}
