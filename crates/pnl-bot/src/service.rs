//! Summary service: the operations exposed to commands and the event loop.
//!
//! The service is owned by the application loop, so fire handling and
//! reconfiguration never interleave. Configuration changes validate first,
//! persist second and only then touch the trigger registry; a rejected
//! change leaves settings and armed triggers as they were.

use crate::error::{AppError, AppResult};
use crate::reset::ResetCoordinator;
use chrono::{DateTime, Utc};
use pnl_core::{
    format_summary, summarize, DailySummary, DailyTime, LedgerEntry, ResetReason, ScheduleConfig,
    ScheduleMode, TriggerRole, DAILY_SUMMARY_TITLE,
};
use pnl_notify::NotificationDispatcher;
use pnl_persistence::{LedgerStore, SettingsStore};
use pnl_scheduler::{resolve_timezone, Clock, LocalSchedule, TriggerPlan, TriggerRegistry, Tz};
use pnl_telemetry::Metrics;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of handling one trigger fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Daily trigger with an empty ledger: nothing sent, nothing cleared.
    NothingToReport,
    /// Summary delivered and ledger cleared.
    Delivered,
    /// Delivery failed; the ledger is kept for the next cycle.
    DispatchFailed,
    /// Fallback cleanup cleared the ledger.
    LedgerCleared,
}

/// A configured daily summary and its first fire instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledFire {
    pub time: DailyTime,
    pub timezone: Tz,
    pub fire_at: DateTime<Utc>,
}

/// Snapshot for `/status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub timezone_name: Option<String>,
    pub mode: ScheduleMode,
    /// Next fire instant per armed role.
    pub next_fires: Vec<(TriggerRole, DateTime<Utc>)>,
    pub ledger_entries: usize,
}

/// Deployment-specific settings of the service.
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Where summaries are delivered (Telegram chat id).
    pub destination: String,
    /// Zone for the fallback cleanup before the user picks one.
    pub default_timezone: Tz,
}

pub struct SummaryService {
    ledger: Arc<dyn LedgerStore>,
    settings: Arc<dyn SettingsStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    registry: Arc<TriggerRegistry>,
    clock: Arc<dyn Clock>,
    reset: ResetCoordinator,
    destination: String,
}

impl SummaryService {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        settings: Arc<dyn SettingsStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        registry: Arc<TriggerRegistry>,
        clock: Arc<dyn Clock>,
        options: SummaryOptions,
    ) -> Self {
        let reset = ResetCoordinator::new(
            Arc::clone(&ledger),
            Arc::clone(&settings),
            Arc::clone(&registry),
            options.default_timezone,
        );

        Self {
            ledger,
            settings,
            dispatcher,
            registry,
            clock,
            reset,
            destination: options.destination,
        }
    }

    pub fn registry(&self) -> &TriggerRegistry {
        &self.registry
    }

    /// Re-arm the trigger implied by the persisted settings.
    pub fn restore(&self) -> AppResult<Option<(TriggerRole, DateTime<Utc>)>> {
        let config = self.settings.get()?;

        let (role, schedule) = match config.mode {
            ScheduleMode::Unconfigured => {
                info!("No schedule configured yet");
                return Ok(None);
            }
            ScheduleMode::FallbackCleanupOnly => (
                TriggerRole::FallbackCleanup,
                LocalSchedule::fallback_cleanup(self.reset.fallback_timezone(&config)),
            ),
            ScheduleMode::DailySummaryActive { time } => {
                let tz = Self::configured_timezone(&config)?;
                (TriggerRole::DailySummary, LocalSchedule::new(time, tz))
            }
        };

        let fire_at = self.registry.install(role, schedule)?;
        info!(role = %role, mode = %config.mode, first_fire = %fire_at, "Schedule restored");
        Ok(Some((role, fire_at)))
    }

    /// Set the user's zone and re-arm the current mode's trigger in it.
    ///
    /// In `Unconfigured` mode only the zone is stored.
    pub fn configure_timezone(&self, name: &str) -> AppResult<Tz> {
        let tz = resolve_timezone(name).map_err(|e| AppError::Config(e.to_string()))?;
        let current = self.settings.get()?;

        let plan = match current.mode {
            ScheduleMode::Unconfigured => None,
            ScheduleMode::FallbackCleanupOnly => Some(TriggerPlan::new().install(
                TriggerRole::FallbackCleanup,
                LocalSchedule::fallback_cleanup(tz),
            )),
            ScheduleMode::DailySummaryActive { time } => Some(
                TriggerPlan::new().install(TriggerRole::DailySummary, LocalSchedule::new(time, tz)),
            ),
        };

        self.settings.put(&ScheduleConfig {
            timezone_name: Some(tz.name().to_string()),
            mode: current.mode,
        })?;

        if let Some(plan) = plan {
            for (role, fire_at) in self.registry.apply(plan)? {
                info!(role = %role, first_fire = %fire_at, "Trigger re-armed for new timezone");
            }
        }

        info!(timezone = tz.name(), mode = %current.mode, "Timezone configured");
        Ok(tz)
    }

    /// Arm the daily summary at `hour:minute` in the configured zone.
    ///
    /// Replaces any earlier daily trigger and retires the fallback cleanup.
    pub fn configure_schedule(&self, hour: u32, minute: u32) -> AppResult<ScheduledFire> {
        let time = DailyTime::new(hour, minute).map_err(|e| AppError::Config(e.to_string()))?;
        self.arm_daily(time)
    }

    /// Like [`configure_schedule`](Self::configure_schedule), from "HH:MM" text.
    pub fn configure_schedule_str(&self, text: &str) -> AppResult<ScheduledFire> {
        let time: DailyTime = text
            .trim()
            .parse()
            .map_err(|e: pnl_core::CoreError| AppError::Config(e.to_string()))?;
        self.arm_daily(time)
    }

    fn arm_daily(&self, time: DailyTime) -> AppResult<ScheduledFire> {
        let current = self.settings.get()?;
        let tz = Self::configured_timezone(&current)?;

        self.settings.put(&ScheduleConfig {
            timezone_name: current.timezone_name.clone(),
            mode: ScheduleMode::DailySummaryActive { time },
        })?;

        let plan = TriggerPlan::new()
            .remove(TriggerRole::FallbackCleanup)
            .install(TriggerRole::DailySummary, LocalSchedule::new(time, tz));
        let fire_at = self
            .registry
            .apply(plan)?
            .into_iter()
            .find(|(role, _)| *role == TriggerRole::DailySummary)
            .map(|(_, at)| at)
            .ok_or_else(|| {
                AppError::SchedulingUnavailable("daily summary trigger was not armed".to_string())
            })?;

        info!(
            local_time = %time,
            timezone = tz.name(),
            first_fire = %fire_at,
            "Daily summary configured"
        );
        Ok(ScheduledFire {
            time,
            timezone: tz,
            fire_at,
        })
    }

    fn configured_timezone(config: &ScheduleConfig) -> AppResult<Tz> {
        let name = config.timezone_name.as_deref().ok_or_else(|| {
            AppError::Config("set a timezone before setting the summary time".to_string())
        })?;
        resolve_timezone(name).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Aggregate the whole ledger without clearing it.
    ///
    /// Totals outside the `Decimal` range surface as `AppError::Core`.
    pub fn get_summary_now(&self) -> AppResult<DailySummary> {
        let entries = self.ledger.scan()?;
        Ok(summarize(&entries)?)
    }

    /// Handle a fire of the trigger armed under `role`.
    pub async fn on_trigger_fired(&self, role: TriggerRole) -> AppResult<FireOutcome> {
        Metrics::trigger_fired(role.as_str());

        match role {
            TriggerRole::DailySummary => self.deliver_daily_summary().await,
            TriggerRole::FallbackCleanup => {
                self.reset.reset(ResetReason::FallbackNightly)?;
                Ok(FireOutcome::LedgerCleared)
            }
        }
    }

    async fn deliver_daily_summary(&self) -> AppResult<FireOutcome> {
        let summary = self.get_summary_now()?;
        if summary.is_empty() {
            info!("Daily summary skipped, ledger is empty");
            return Ok(FireOutcome::NothingToReport);
        }

        let text = format_summary(DAILY_SUMMARY_TITLE, &summary);
        if let Err(e) = self.dispatcher.send(&self.destination, &text).await {
            Metrics::dispatch_failed();
            warn!(error = %e, currencies = summary.len(), "Daily summary delivery failed, ledger kept");
            return Ok(FireOutcome::DispatchFailed);
        }

        Metrics::summary_dispatched();
        info!(currencies = summary.len(), "Daily summary delivered");

        self.reset.reset(ResetReason::PostSummary)?;
        Ok(FireOutcome::Delivered)
    }

    /// Clear the ledger and fall back to the nightly cleanup schedule.
    pub fn force_reset(&self) -> AppResult<Option<DateTime<Utc>>> {
        self.reset.reset(ResetReason::UserRequested)
    }

    /// Append a trade close to the ledger.
    pub fn record_trade(
        &self,
        instrument_pair: &str,
        amount: Decimal,
        currency: &str,
    ) -> AppResult<LedgerEntry> {
        let entry = LedgerEntry::recorded_at(instrument_pair, amount, currency, self.clock.now());
        self.ledger.append(&entry)?;
        Metrics::trade_recorded();

        debug!(pair = instrument_pair, amount = %amount, currency, "Trade recorded");
        Ok(entry)
    }

    pub fn status(&self) -> AppResult<ServiceStatus> {
        let config = self.settings.get()?;
        let next_fires = self
            .registry
            .armed_roles()
            .into_iter()
            .filter_map(|role| self.registry.next_fire(role).map(|at| (role, at)))
            .collect();

        Ok(ServiceStatus {
            timezone_name: config.timezone_name,
            mode: config.mode,
            next_fires,
            ledger_entries: self.ledger.scan()?.len(),
        })
    }
}
