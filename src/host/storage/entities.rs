use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Accumulated active time in milliseconds per domain for one day. This is exactly what a record
/// file contains.
pub type DomainDurations = BTreeMap<String, u64>;

/// Records keyed by their day.
pub type DailyRecords = BTreeMap<NaiveDate, DomainDurations>;

/// Adds `duration_ms` of usage to `domain`, creating the entry if it's absent.
pub fn add_usage(durations: &mut DomainDurations, domain: &str, duration_ms: u64) {
    match durations.get_mut(domain) {
        Some(total) => *total = total.saturating_add(duration_ms),
        None => {
            durations.insert(domain.to_string(), duration_ms);
        }
    }
}
