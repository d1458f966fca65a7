use chrono::{DateTime, Utc};
use exam_core::model::ClockTime;

/// Placeholder shown while no section clock is active.
pub const CLOCK_PLACEHOLDER: &str = "--:--:--";

#[must_use]
pub fn format_clock(remaining_seconds: Option<u32>) -> String {
    remaining_seconds.map_or_else(
        || CLOCK_PLACEHOLDER.to_owned(),
        |secs| ClockTime::from_secs(secs).to_string(),
    )
}

#[must_use]
pub fn format_date(value: DateTime<Utc>) -> String {
    value.format("%d %b %Y").to_string()
}
