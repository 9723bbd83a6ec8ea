//! Ledger reset and fallback cleanup coordination.

use crate::error::AppResult;
use chrono::{DateTime, Utc};
use pnl_core::{ResetReason, ScheduleConfig, ScheduleMode, TriggerRole};
use pnl_persistence::{LedgerStore, SettingsStore};
use pnl_scheduler::{resolve_timezone, LocalSchedule, TriggerRegistry, Tz};
use pnl_telemetry::Metrics;
use std::sync::Arc;
use tracing::{info, warn};

/// Clears the ledger and, for user resets, puts the schedule back on the
/// nightly fallback cleanup.
pub struct ResetCoordinator {
    ledger: Arc<dyn LedgerStore>,
    settings: Arc<dyn SettingsStore>,
    registry: Arc<TriggerRegistry>,
    default_timezone: Tz,
}

impl ResetCoordinator {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        settings: Arc<dyn SettingsStore>,
        registry: Arc<TriggerRegistry>,
        default_timezone: Tz,
    ) -> Self {
        Self {
            ledger,
            settings,
            registry,
            default_timezone,
        }
    }

    /// Zone the fallback cleanup runs in: the user's zone, else the default.
    pub fn fallback_timezone(&self, config: &ScheduleConfig) -> Tz {
        let Some(name) = config.timezone_name.as_deref() else {
            return self.default_timezone;
        };
        match resolve_timezone(name) {
            Ok(tz) => tz,
            Err(e) => {
                warn!(timezone = name, error = %e, "Stored timezone unusable, using default");
                self.default_timezone
            }
        }
    }

    /// Reset the ledger.
    ///
    /// `UserRequested` additionally forgets the daily time, removes every
    /// armed trigger and arms the fallback cleanup; it returns that
    /// trigger's first fire instant. Other reasons only clear the ledger.
    pub fn reset(&self, reason: ResetReason) -> AppResult<Option<DateTime<Utc>>> {
        let fallback_fire = match reason {
            ResetReason::UserRequested => Some(self.reset_schedule()?),
            ResetReason::PostSummary | ResetReason::FallbackNightly => {
                self.ledger.clear()?;
                None
            }
        };

        Metrics::ledger_reset(reason.as_str());
        info!(reason = %reason, "Ledger reset");
        Ok(fallback_fire)
    }

    fn reset_schedule(&self) -> AppResult<DateTime<Utc>> {
        let current = self.settings.get()?;
        let next = ScheduleConfig {
            timezone_name: current.timezone_name.clone(),
            mode: ScheduleMode::FallbackCleanupOnly,
        };
        let tz = self.fallback_timezone(&next);

        // Settings first: a failed write leaves triggers and ledger untouched
        self.settings.put(&next)?;

        let removed = self.registry.remove_all();
        let cleared = self.ledger.clear();
        let fire_at = self
            .registry
            .install(TriggerRole::FallbackCleanup, LocalSchedule::fallback_cleanup(tz))?;
        cleared?;

        info!(
            removed,
            timezone = tz.name(),
            first_fire = %fire_at,
            "Schedule reset to fallback cleanup"
        );
        Ok(fire_at)
    }
}
