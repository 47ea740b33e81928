//! Daily trigger and collection window
//!
//! Collection runs from the last day of a month up to (not including)
//! `stop_day` of the next month. Outside that window a scheduled run is
//! skipped and manual follow-up is expected.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Whether a scheduled run on `today` should reconcile
pub fn within_collection_window(today: NaiveDate, stop_day: u32) -> bool {
    if today.day() < stop_day {
        return true;
    }
    today
        .succ_opt()
        .map(|tomorrow| tomorrow.day() == 1)
        .unwrap_or(false)
}

/// Next run time strictly after `now` at `hour`:00 local time
pub fn next_run_after(now: NaiveDateTime, hour: u32) -> Option<NaiveDateTime> {
    let today_run = now.date().and_hms_opt(hour, 0, 0)?;
    if today_run > now {
        Some(today_run)
    } else {
        Some(today_run + Duration::days(1))
    }
}

/// "1st", "2nd", "3rd", "4th", ... for log messages
pub fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}
