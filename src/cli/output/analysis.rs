use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;

use crate::host::storage::entities::DailyRecords;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainUsage {
    pub domain: Arc<str>,
    pub total_ms: u64,
}

/// Merged usage over a range of days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageStats {
    /// Sorted by `total_ms` descending.
    pub items: Vec<DomainUsage>,
    pub total_ms: u64,
}

impl UsageStats {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_ms(&self) -> u64 {
        self.items.first().map_or(0, |item| item.total_ms)
    }
}

/// Placeholder keys that found their way into records from pages without a hostname.
fn is_meaningful_domain(domain: &str) -> bool {
    !matches!(domain.trim(), "" | "null" | "undefined")
}

/// Sums usage per domain over `dates` and sorts domains by usage. Domains with equal usage keep
/// the order they were first seen in.
pub fn merge_records(dates: &[NaiveDate], records: &DailyRecords) -> UsageStats {
    let mut positions = HashMap::<&str, usize>::new();
    let mut items = Vec::<DomainUsage>::new();
    let mut total_ms = 0u64;

    for day in dates.iter().filter_map(|date| records.get(date)) {
        for (domain, ms) in day {
            if !is_meaningful_domain(domain) {
                continue;
            }
            let position = *positions.entry(domain.as_str()).or_insert_with(|| {
                items.push(DomainUsage {
                    domain: domain.as_str().into(),
                    total_ms: 0,
                });
                items.len() - 1
            });
            items[position].total_ms = items[position].total_ms.saturating_add(*ms);
            total_ms = total_ms.saturating_add(*ms);
        }
    }

    // sort_by is stable, which keeps ties in first seen order.
    items.sort_by(|a, b| b.total_ms.cmp(&a.total_ms));
    UsageStats { items, total_ms }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        host::storage::entities::{DailyRecords, DomainDurations},
        utils::time::trailing_days,
    };

    use super::{merge_records, DomainUsage, UsageStats};

    const TEST_DAY: NaiveDate = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    fn day(values: &[(&str, u64)]) -> DomainDurations {
        values.iter().map(|(d, ms)| (d.to_string(), *ms)).collect()
    }

    fn usage(values: &[(&str, u64)]) -> Vec<DomainUsage> {
        values
            .iter()
            .map(|(d, ms)| DomainUsage {
                domain: (*d).into(),
                total_ms: *ms,
            })
            .collect()
    }

    #[test]
    fn test_single_day_sorted_descending() {
        let records = DailyRecords::from([(TEST_DAY, day(&[("a.com", 5000), ("b.com", 9000)]))]);

        let stats = merge_records(&[TEST_DAY], &records);

        assert_eq!(
            stats,
            UsageStats {
                items: usage(&[("b.com", 9000), ("a.com", 5000)]),
                total_ms: 14000
            }
        );
    }

    #[test]
    fn test_week_sums_every_day() {
        let dates = trailing_days(TEST_DAY, 7);
        let records = dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let i = i as u64;
                (
                    *date,
                    day(&[("a.com", 1000 * (i + 1)), ("b.com", 500), ("c.com", 3000 * i)]),
                )
            })
            .collect::<DailyRecords>();

        let stats = merge_records(&dates, &records);

        assert_eq!(
            stats.items,
            usage(&[("c.com", 63000), ("a.com", 28000), ("b.com", 3500)])
        );
        assert_eq!(stats.total_ms, 94500);
    }

    #[test]
    fn test_days_outside_range_are_ignored() {
        let outside = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let records = DailyRecords::from([
            (TEST_DAY, day(&[("a.com", 10)])),
            (outside, day(&[("a.com", 1000), ("z.com", 1000)])),
        ]);

        let stats = merge_records(&[TEST_DAY], &records);

        assert_eq!(stats.items, usage(&[("a.com", 10)]));
        assert_eq!(stats.total_ms, 10);
    }

    #[test]
    fn test_placeholder_domains_are_skipped() {
        let records = DailyRecords::from([(
            TEST_DAY,
            day(&[("", 1), ("null", 2), ("undefined", 3), ("a.com", 4)]),
        )]);

        let stats = merge_records(&[TEST_DAY], &records);

        assert_eq!(stats.items, usage(&[("a.com", 4)]));
        assert_eq!(stats.total_ms, 4);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let yesterday = TEST_DAY.pred_opt().unwrap();
        let records = DailyRecords::from([
            (TEST_DAY, day(&[("z.com", 100)])),
            (yesterday, day(&[("a.com", 100), ("m.com", 300)])),
        ]);

        let stats = merge_records(&[TEST_DAY, yesterday], &records);

        assert_eq!(
            stats.items,
            usage(&[("m.com", 300), ("z.com", 100), ("a.com", 100)])
        );
    }

    #[test]
    fn test_no_records() {
        let stats = merge_records(&[TEST_DAY], &DailyRecords::new());

        assert!(stats.is_empty());
        assert_eq!(stats.total_ms, 0);
        assert_eq!(stats.max_ms(), 0);
    }
}
