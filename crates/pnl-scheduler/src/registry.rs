//! Role-keyed trigger registry.
//!
//! Each armed trigger is a tokio task that sleeps until its next fire
//! instant and posts a [`TriggerFired`] event to the application loop.
//! After every fire the task plans the following instant again from the
//! civil local time, so recurrence is defined in zone-aware terms.
//!
//! Every installation gets a fresh generation number. The loop checks
//! [`TriggerRegistry::is_current`] before acting on an event, so a fire
//! that raced a reconfiguration is dropped instead of running against the
//! new trigger set.

use crate::clock::Clock;
use crate::error::{SchedulerError, SchedulerResult};
use crate::planner::next_fire;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use pnl_core::{DailyTime, TriggerRole};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Daily recurrence at a local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSchedule {
    pub time: DailyTime,
    pub timezone: Tz,
}

impl LocalSchedule {
    pub fn new(time: DailyTime, timezone: Tz) -> Self {
        Self { time, timezone }
    }

    /// Nightly fallback cleanup at 23:59 local.
    pub fn fallback_cleanup(timezone: Tz) -> Self {
        Self::new(DailyTime::END_OF_DAY, timezone)
    }

    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        next_fire(self.time, self.timezone, now)
    }
}

/// Event posted when an armed trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerFired {
    pub role: TriggerRole,
    pub generation: u64,
    pub scheduled_for: DateTime<Utc>,
}

/// Batch of registry changes applied under one lock.
///
/// Removals run before installations; installing a role always replaces
/// the trigger already armed under it.
#[derive(Debug, Clone, Default)]
pub struct TriggerPlan {
    remove_all: bool,
    remove: Vec<TriggerRole>,
    install: Vec<(TriggerRole, LocalSchedule)>,
}

impl TriggerPlan {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn remove(mut self, role: TriggerRole) -> Self {
        self.remove.push(role);
        self
    }

    #[must_use]
    pub fn remove_all(mut self) -> Self {
        self.remove_all = true;
        self
    }

    #[must_use]
    pub fn install(mut self, role: TriggerRole, schedule: LocalSchedule) -> Self {
        self.install.push((role, schedule));
        self
    }
}

struct ArmedTrigger {
    schedule: LocalSchedule,
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct RegistryState {
    armed: BTreeMap<TriggerRole, ArmedTrigger>,
    next_generation: u64,
}

/// Registry of armed triggers, at most one per role.
pub struct TriggerRegistry {
    state: Mutex<RegistryState>,
    clock: Arc<dyn Clock>,
    fire_tx: mpsc::Sender<TriggerFired>,
    runtime: Handle,
}

impl TriggerRegistry {
    /// Create a registry bound to the current tokio runtime.
    ///
    /// Fails with [`SchedulerError::Unavailable`] when called outside a
    /// runtime or when the receiving side of `fire_tx` is already gone.
    pub fn new(clock: Arc<dyn Clock>, fire_tx: mpsc::Sender<TriggerFired>) -> SchedulerResult<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            SchedulerError::Unavailable(format!("no timer runtime is running: {e}"))
        })?;
        if fire_tx.is_closed() {
            return Err(SchedulerError::Unavailable(
                "trigger event channel is closed".to_string(),
            ));
        }

        Ok(Self {
            state: Mutex::new(RegistryState::default()),
            clock,
            fire_tx,
            runtime,
        })
    }

    /// Apply removals and installations atomically.
    ///
    /// Returns the first fire instant of each installed trigger.
    pub fn apply(&self, plan: TriggerPlan) -> SchedulerResult<Vec<(TriggerRole, DateTime<Utc>)>> {
        if !plan.install.is_empty() && self.fire_tx.is_closed() {
            return Err(SchedulerError::Unavailable(
                "trigger event channel is closed".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut state = self.state.lock();

        if plan.remove_all {
            for (role, trigger) in std::mem::take(&mut state.armed) {
                trigger.handle.abort();
                info!(role = %role, generation = trigger.generation, "Trigger removed");
            }
        }
        for role in plan.remove {
            if let Some(trigger) = state.armed.remove(&role) {
                trigger.handle.abort();
                info!(role = %role, generation = trigger.generation, "Trigger removed");
            }
        }

        let mut first_fires = Vec::with_capacity(plan.install.len());
        for (role, schedule) in plan.install {
            if let Some(old) = state.armed.remove(&role) {
                old.handle.abort();
                debug!(role = %role, generation = old.generation, "Replacing trigger");
            }

            state.next_generation += 1;
            let generation = state.next_generation;
            let first_fire = schedule.next_fire_after(now);

            let handle = self.runtime.spawn(run_timer(
                role,
                generation,
                schedule,
                Arc::clone(&self.clock),
                self.fire_tx.clone(),
            ));

            info!(
                role = %role,
                generation,
                local_time = %schedule.time,
                timezone = %schedule.timezone.name(),
                first_fire = %first_fire,
                "Trigger armed"
            );

            state.armed.insert(
                role,
                ArmedTrigger {
                    schedule,
                    generation,
                    handle,
                },
            );
            first_fires.push((role, first_fire));
        }

        Ok(first_fires)
    }

    /// Install (or replace) the trigger for `role`.
    pub fn install(&self, role: TriggerRole, schedule: LocalSchedule) -> SchedulerResult<DateTime<Utc>> {
        let fires = self.apply(TriggerPlan::new().install(role, schedule))?;
        fires
            .into_iter()
            .next()
            .map(|(_, at)| at)
            .ok_or_else(|| SchedulerError::Unavailable(format!("{role} trigger was not armed")))
    }

    /// Remove the trigger for `role` if armed. Returns whether one was removed.
    pub fn remove(&self, role: TriggerRole) -> bool {
        let mut state = self.state.lock();
        match state.armed.remove(&role) {
            Some(trigger) => {
                trigger.handle.abort();
                info!(role = %role, generation = trigger.generation, "Trigger removed");
                true
            }
            None => false,
        }
    }

    /// Remove every armed trigger. Returns how many were removed.
    pub fn remove_all(&self) -> usize {
        let mut state = self.state.lock();
        let removed = std::mem::take(&mut state.armed);
        for (role, trigger) in &removed {
            trigger.handle.abort();
            info!(role = %role, generation = trigger.generation, "Trigger removed");
        }
        removed.len()
    }

    pub fn is_armed(&self, role: TriggerRole) -> bool {
        self.state.lock().armed.contains_key(&role)
    }

    pub fn armed_roles(&self) -> Vec<TriggerRole> {
        self.state.lock().armed.keys().copied().collect()
    }

    pub fn armed_count(&self) -> usize {
        self.state.lock().armed.len()
    }

    /// Schedule currently armed for `role`.
    pub fn schedule(&self, role: TriggerRole) -> Option<LocalSchedule> {
        self.state.lock().armed.get(&role).map(|t| t.schedule)
    }

    /// Next fire instant of `role`, if armed.
    pub fn next_fire(&self, role: TriggerRole) -> Option<DateTime<Utc>> {
        let schedule = self.schedule(role)?;
        Some(schedule.next_fire_after(self.clock.now()))
    }

    /// Whether `event` was produced by the trigger currently armed for its role.
    pub fn is_current(&self, event: &TriggerFired) -> bool {
        self.state
            .lock()
            .armed
            .get(&event.role)
            .is_some_and(|t| t.generation == event.generation)
    }

    /// Abort every timer task.
    pub fn shutdown(&self) {
        let removed = self.remove_all();
        info!(removed, "Trigger registry shut down");
    }
}

impl Drop for TriggerRegistry {
    fn drop(&mut self) {
        for trigger in self.state.get_mut().armed.values() {
            trigger.handle.abort();
        }
    }
}

/// Timer loop for one armed trigger.
async fn run_timer(
    role: TriggerRole,
    generation: u64,
    schedule: LocalSchedule,
    clock: Arc<dyn Clock>,
    fire_tx: mpsc::Sender<TriggerFired>,
) {
    let mut after = clock.now();

    loop {
        let fire_at = schedule.next_fire_after(after);
        let wait = (fire_at - clock.now()).to_std().unwrap_or_default();
        debug!(role = %role, generation, fire_at = %fire_at, wait_secs = wait.as_secs(), "Timer sleeping");

        tokio::time::sleep(wait).await;

        let event = TriggerFired {
            role,
            generation,
            scheduled_for: fire_at,
        };
        if fire_tx.send(event).await.is_err() {
            warn!(role = %role, generation, "Trigger event channel closed, stopping timer");
            break;
        }

        // Plan from the fire instant itself so the same slot never repeats
        after = fire_at.max(clock.now());
    }
}
