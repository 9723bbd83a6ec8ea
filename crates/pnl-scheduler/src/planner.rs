//! Next-fire planning in civil local time.
//!
//! The next fire instant is always built from the local calendar date and
//! the local wall-clock time, and only then converted to UTC. Adding a day
//! happens on the local date, never as 24 hours of absolute time, so the
//! trigger keeps firing at the same wall-clock time across DST changes.
//!
//! Local times that DST makes irregular are resolved as follows:
//! - ambiguous (autumn fall-back, the time occurs twice): the earlier instant
//! - non-existent (spring gap): the instant the gap ends, e.g. 02:30 on a
//!   02:00 -> 03:00 day fires at 03:00 local

use crate::error::{SchedulerError, SchedulerResult};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{Tz, TZ_VARIANTS};
use pnl_core::DailyTime;

/// Longest DST gap searched across (real zones use at most one hour).
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Resolve a zone name to its canonical `Tz`.
///
/// Accepts the exact IANA identifier and falls back to a case-insensitive
/// match, so `europe/kyiv` resolves to `Europe/Kyiv`.
pub fn resolve_timezone(name: &str) -> SchedulerResult<Tz> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SchedulerError::UnknownTimezone(name.to_string()));
    }

    if let Ok(tz) = trimmed.parse::<Tz>() {
        return Ok(tz);
    }

    TZ_VARIANTS
        .iter()
        .find(|tz| tz.name().eq_ignore_ascii_case(trimmed))
        .copied()
        .ok_or_else(|| SchedulerError::UnknownTimezone(trimmed.to_string()))
}

/// Map a local wall-clock datetime to an instant in `tz`.
pub fn resolve_local(tz: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    if let Some(dt) = tz.from_local_datetime(&local).earliest() {
        return dt;
    }

    // Inside a DST gap: walk forward to the first representable minute
    for minutes in 1..=MAX_GAP_MINUTES {
        let candidate = local + Duration::minutes(minutes);
        if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
            return dt;
        }
    }

    tz.from_utc_datetime(&local)
}

/// Next instant strictly after `now` at which `time` occurs in `tz`.
///
/// A candidate equal to `now` rolls over to the next day rather than
/// firing immediately.
pub fn next_fire(time: DailyTime, tz: Tz, now: DateTime<Utc>) -> DateTime<Utc> {
    let now_local = now.with_timezone(&tz);
    let today = now_local.date_naive();

    let candidate = resolve_local(tz, today.and_time(time.as_naive_time()));
    if candidate > now_local {
        return candidate.with_timezone(&Utc);
    }

    let tomorrow = today.succ_opt().unwrap_or(today);
    resolve_local(tz, tomorrow.and_time(time.as_naive_time())).with_timezone(&Utc)
}

/// Plan the next daily summary fire.
///
/// Validates the zone name and the hour/minute range before planning.
pub fn plan_daily_fire(
    local_hour: u32,
    local_minute: u32,
    timezone_name: &str,
    now: DateTime<Utc>,
) -> SchedulerResult<DateTime<Utc>> {
    let tz = resolve_timezone(timezone_name)?;
    let time = DailyTime::new(local_hour, local_minute)?;
    Ok(next_fire(time, tz, now))
}

/// Plan the next fallback cleanup fire (23:59 local).
pub fn plan_fallback_cleanup(
    timezone_name: &str,
    now: DateTime<Utc>,
) -> SchedulerResult<DateTime<Utc>> {
    let tz = resolve_timezone(timezone_name)?;
    Ok(next_fire(DailyTime::END_OF_DAY, tz, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, 0).unwrap()
    }

    fn local(tz: Tz, year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        tz.with_ymd_and_hms(year, month, day, hour, min, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_resolve_timezone_canonical() {
        assert_eq!(resolve_timezone("Europe/Kyiv").unwrap(), Tz::Europe__Kyiv);
        assert_eq!(resolve_timezone(" UTC ").unwrap(), Tz::UTC);
        assert_eq!(
            resolve_timezone("america/new_york").unwrap().name(),
            "America/New_York"
        );
    }

    #[test]
    fn test_resolve_timezone_unknown() {
        for bad in ["", "   ", "Mars/Olympus", "GMT+25", "Europe/"] {
            let err = resolve_timezone(bad).unwrap_err();
            assert!(err.is_config_error(), "{bad:?}");
        }
    }

    #[test]
    fn test_already_passed_today_rolls_to_tomorrow() {
        // 14:00 in Kyiv, configuring 09:00 -> next day 09:00 local
        let kyiv = Tz::Europe__Kyiv;
        let now = local(kyiv, 2026, 10, 16, 14, 0);

        let fire = plan_daily_fire(9, 0, "Europe/Kyiv", now).unwrap();
        assert_eq!(fire, utc(2026, 10, 17, 6, 0));

        let fire_local = fire.with_timezone(&kyiv);
        assert_eq!(fire_local.date_naive(), NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        assert_eq!((fire_local.hour(), fire_local.minute()), (9, 0));
    }

    #[test]
    fn test_later_today_fires_today() {
        let kyiv = Tz::Europe__Kyiv;
        let now = local(kyiv, 2026, 10, 16, 8, 59);
        let fire = plan_daily_fire(9, 0, "Europe/Kyiv", now).unwrap();
        assert_eq!(fire, local(kyiv, 2026, 10, 16, 9, 0));
    }

    #[test]
    fn test_exact_now_rolls_to_tomorrow() {
        let kyiv = Tz::Europe__Kyiv;
        let now = local(kyiv, 2026, 10, 16, 9, 0);
        let fire = plan_daily_fire(9, 0, "Europe/Kyiv", now).unwrap();
        assert_eq!(fire, local(kyiv, 2026, 10, 17, 9, 0));
    }

    #[test]
    fn test_spring_forward_gap_resolves_to_gap_end() {
        // 2026-03-08: New York jumps 02:00 EST -> 03:00 EDT
        let ny = Tz::America__New_York;
        let now = local(ny, 2026, 3, 7, 12, 0);

        let fire = plan_daily_fire(2, 30, "America/New_York", now).unwrap();
        assert_eq!(fire, utc(2026, 3, 8, 7, 0));

        let fire_local = fire.with_timezone(&ny);
        assert_eq!(fire_local.date_naive(), NaiveDate::from_ymd_opt(2026, 3, 8).unwrap());
        assert_eq!((fire_local.hour(), fire_local.minute()), (3, 0));
    }

    #[test]
    fn test_wall_clock_stable_across_spring_forward() {
        let ny = Tz::America__New_York;
        let time = DailyTime::new(2, 30).unwrap();
        let mut now = local(ny, 2026, 3, 4, 12, 0);
        let mut fires = Vec::new();

        for _ in 0..8 {
            let fire = next_fire(time, ny, now);
            fires.push(fire.with_timezone(&ny));
            now = fire;
        }

        // One fire per consecutive local day, none skipped
        for pair in fires.windows(2) {
            assert_eq!(
                pair[0].date_naive().succ_opt().unwrap(),
                pair[1].date_naive(),
                "{} -> {}",
                pair[0],
                pair[1]
            );
        }

        for fire in &fires {
            let expected = if fire.date_naive() == NaiveDate::from_ymd_opt(2026, 3, 8).unwrap() {
                (3, 0)
            } else {
                (2, 30)
            };
            assert_eq!((fire.hour(), fire.minute()), expected, "{fire}");
        }

        // Offsets differ before and after: 07:30Z vs 06:30Z
        assert_eq!(fires[0].with_timezone(&Utc), utc(2026, 3, 5, 7, 30));
        assert_eq!(fires[7].with_timezone(&Utc), utc(2026, 3, 12, 6, 30));
    }

    #[test]
    fn test_fall_back_ambiguity_uses_first_occurrence() {
        // 2026-11-01: New York repeats 01:00-02:00
        let ny = Tz::America__New_York;
        let now = local(ny, 2026, 10, 31, 12, 0);
        let fire = plan_daily_fire(1, 30, "America/New_York", now).unwrap();
        assert_eq!(fire, utc(2026, 11, 1, 5, 30));

        // After the first occurrence has fired, the repeat does not fire again
        let next = next_fire(DailyTime::new(1, 30).unwrap(), ny, fire);
        assert_eq!(next, utc(2026, 11, 2, 6, 30));
    }

    #[test]
    fn test_fallback_cleanup_end_of_day() {
        let kyiv = Tz::Europe__Kyiv;
        let now = local(kyiv, 2026, 10, 16, 14, 0);
        let fire = plan_fallback_cleanup("Europe/Kyiv", now).unwrap();
        assert_eq!(fire, utc(2026, 10, 16, 20, 59));

        // Past 23:59 local -> tomorrow
        let late = local(kyiv, 2026, 10, 16, 23, 59);
        let fire = plan_fallback_cleanup("Europe/Kyiv", late).unwrap();
        assert_eq!(fire, local(kyiv, 2026, 10, 17, 23, 59));
    }

    #[test]
    fn test_fallback_across_fall_back_day() {
        let ny = Tz::America__New_York;
        let now = local(ny, 2026, 11, 1, 0, 30);
        let fire = plan_fallback_cleanup("America/New_York", now).unwrap();
        assert_eq!(fire, utc(2026, 11, 2, 4, 59));
    }

    #[test]
    fn test_rejects_invalid_input() {
        let now = utc(2026, 10, 16, 12, 0);
        assert!(matches!(
            plan_daily_fire(24, 0, "UTC", now),
            Err(SchedulerError::InvalidTime(_))
        ));
        assert!(matches!(
            plan_daily_fire(9, 60, "UTC", now),
            Err(SchedulerError::InvalidTime(_))
        ));
        assert!(matches!(
            plan_daily_fire(9, 0, "Nowhere/Special", now),
            Err(SchedulerError::UnknownTimezone(_))
        ));
        assert!(plan_fallback_cleanup("nope", now).is_err());
    }
}
