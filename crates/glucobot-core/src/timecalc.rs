//! Reminder-instant computation.

use chrono::{DateTime, Duration, TimeZone, Timelike};

use crate::conversation::MealTime;

/// Compute the instant at which notification delivery should begin.
///
/// Anchors `meal` on `now`'s calendar date with seconds and sub-seconds
/// zeroed, then adds `delay_minutes`. The date is always taken from `now`,
/// so a meal time earlier than the current wall clock plus a short delay
/// yields an instant in the past. Such jobs are scheduled as-is and fire on
/// the scheduler's next tick; callers do not special-case them.
///
/// Returns `None` when the wall-clock combination cannot be represented in
/// `now`'s timezone (a DST gap) or the addition overflows.
pub fn reminder_instant<Tz: TimeZone>(
    now: DateTime<Tz>,
    meal: MealTime,
    delay_minutes: i64,
) -> Option<DateTime<Tz>> {
    let anchored = now
        .with_hour(u32::from(meal.hour))?
        .with_minute(u32::from(meal.minute))?
        .with_second(0)?
        .with_nanosecond(0)?;
    anchored.checked_add_signed(Duration::try_minutes(delay_minutes)?)
}
