//! Daily trigger planning and the trigger registry.
//!
//! - `planner`: converts a local wall-clock time in a named zone into the
//!   next absolute fire instant, absorbing daylight-saving shifts
//! - `registry`: at most one armed timer per `TriggerRole`, replaced
//!   atomically, posting `TriggerFired` events to the application loop
//! - `clock`: injectable time source

pub mod clock;
pub mod error;
pub mod planner;
pub mod registry;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{SchedulerError, SchedulerResult};
pub use planner::{
    next_fire, plan_daily_fire, plan_fallback_cleanup, resolve_local, resolve_timezone,
};
pub use registry::{LocalSchedule, TriggerFired, TriggerPlan, TriggerRegistry};

pub use chrono_tz::Tz;
