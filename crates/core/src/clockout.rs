//! Attendance reducers shared by the enforcement and human paths.

use chrono::Datelike;
use chrono_tz::Tz;
use uuid::Uuid;

use crate::attendance::{
    AttendanceDoc, WorkedHoursEntry, ENTRY_CLOCK_OUT, STATUS_SUBMITTED, VALUE_ABSENT,
    VALUE_HALF_PRESENT, VALUE_PRESENT,
};
use crate::error::{CoreError, CoreResult};
use crate::timefmt;
use crate::types::Timestamp;

/// Summary of an applied automatic clock-out.
#[derive(Debug, Clone)]
pub struct AutoClockOut {
    /// 0-based index of the mutated day (clock-in day minus one, UTC).
    pub day_index: usize,
    /// Fractional hours between clock-in and clock-out.
    pub hours_worked: f64,
    pub clock_out_at: Timestamp,
}

/// Apply an automatic clock-out to an attendance document in memory.
///
/// The caller persists the mutated document as a single store update.
/// The day is classified `A` unconditionally: an auto clock-out records a
/// policy breach, so the threshold classification of the human path does
/// not apply.
pub fn auto_clock_out(doc: &mut AttendanceDoc, now: Timestamp, tz: Tz) -> CoreResult<AutoClockOut> {
    let clock_in = doc
        .last_clock_in_timestamp
        .ok_or(CoreError::NoPriorClockIn)?;

    // Day index follows the clock-in date in UTC, matching the human
    // clock-in path even near local midnight.
    let day_index = (clock_in.day() - 1) as usize;
    let hours_worked = (now - clock_in).num_milliseconds() as f64 / 3_600_000.0;

    let day = doc.values.get_or_create(day_index);
    day.worked_hours.push(WorkedHoursEntry {
        id: Uuid::new_v4().to_string(),
        timestamp: now,
        entry_type: ENTRY_CLOCK_OUT.to_string(),
        hour: timefmt::format_hour(now, tz),
    });
    day.daily_worked_hours += hours_worked;
    day.value = Some(VALUE_ABSENT.to_string());
    day.status = STATUS_SUBMITTED.to_string();
    day.timestamp = Some(now);

    doc.monthly_worked_hours += hours_worked;
    doc.last_clock_in_timestamp = None;
    doc.last_changed = Some(now);

    Ok(AutoClockOut {
        day_index,
        hours_worked,
        clock_out_at: now,
    })
}

/// Timestamp of the most recent Clock-Out entry on the given day, if any.
/// The monitor uses this to suppress repeated clock-outs within one
/// check interval.
pub fn last_clock_out(doc: &AttendanceDoc, day_index: usize) -> Option<Timestamp> {
    doc.values
        .get(day_index)?
        .worked_hours
        .iter()
        .rev()
        .find(|entry| entry.entry_type == ENTRY_CLOCK_OUT)
        .map(|entry| entry.timestamp)
}

/// Classify a day's attendance from worked hours, as the human clock-out
/// path does. Thresholds are percentages of the expected daily hours.
pub fn classify_day(
    daily_worked_hours: f64,
    expected_daily_hours: f64,
    present_threshold_pct: f64,
    half_present_threshold_pct: f64,
) -> &'static str {
    if expected_daily_hours <= 0.0 {
        return VALUE_ABSENT;
    }
    let worked_pct = daily_worked_hours / expected_daily_hours * 100.0;
    if worked_pct >= present_threshold_pct {
        VALUE_PRESENT
    } else if worked_pct >= half_present_threshold_pct {
        VALUE_HALF_PRESENT
    } else {
        VALUE_ABSENT
    }
}
