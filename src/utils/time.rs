use chrono::{Days, NaiveDate};

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// This is the standard way of converting a date to a storage key in tabtally.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// Returns `count` calendar days ending with `today`, starting from `today` and going backwards.
pub fn trailing_days(today: NaiveDate, count: u64) -> Vec<NaiveDate> {
    (0..count)
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .collect()
}
