//! Active-event selection.
//!
//! "Today" is the calendar day of `now` in the project's time zone. An event is
//! active when `startDate <= today <= endDate`. Declaration order is preserved.

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::Timestamp;

use crate::config::EventConfig;
use crate::model::{ConfigLock, EventLock};

/// Resolve an IANA zone name, falling back to UTC when absent or unknown.
pub fn resolve_time_zone(name: Option<&str>) -> TimeZone {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => TimeZone::get(name).unwrap_or_else(|e| {
            tracing::warn!(time_zone = name, error = %e, "unknown time zone, using UTC");
            TimeZone::UTC
        }),
        None => TimeZone::UTC,
    }
}

pub fn today_in(tz: &TimeZone, now: Timestamp) -> Date {
    now.to_zoned(tz.clone()).date()
}

/// Inclusive range check. An inverted range is never active.
pub fn is_active_on(event: &EventConfig, today: Date) -> bool {
    event.start_date <= today && today <= event.end_date
}

/// Every event whose range contains today, in declaration order.
pub fn active_events(lock: &ConfigLock, now: Timestamp) -> Vec<&EventLock> {
    let tz = resolve_time_zone(lock.project.time_zone.as_deref());
    let today = today_in(&tz, now);
    lock.events
        .iter()
        .filter(|e| is_active_on(&e.event, today))
        .collect()
}

/// Active events not yet processed.
pub fn unprocessed_active_events(lock: &ConfigLock, now: Timestamp) -> Vec<&EventLock> {
    active_events(lock, now)
        .into_iter()
        .filter(|e| !e.progress.processed)
        .collect()
}
