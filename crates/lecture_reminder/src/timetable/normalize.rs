//! Day and time normalization for uploaded timetable cells.

use regex::Regex;
use std::sync::LazyLock;

static TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]{1,2}):?([0-9]{2})?\s*(am|pm)?").unwrap());

const DAYS: [(&str, &str); 7] = [
    ("mon", "Monday"),
    ("tue", "Tuesday"),
    ("wed", "Wednesday"),
    ("thu", "Thursday"),
    ("fri", "Friday"),
    ("sat", "Saturday"),
    ("sun", "Sunday"),
];

/// Maps a day token to its full weekday name by its first three letters.
///
/// Tokens that match no weekday are returned unchanged.
pub fn normalize_day(day: &str) -> String {
    let prefix: String = day.to_lowercase().chars().take(3).collect();
    DAYS.iter()
        .find(|(abbr, _)| *abbr == prefix)
        .map(|(_, full)| full.to_string())
        .unwrap_or_else(|| day.to_string())
}

/// Converts times such as `9am`, `9:00 AM` or `14:30` to 24-hour `HH:MM`.
///
/// Strings without a recognizable hour are returned unchanged.
pub fn normalize_time(time: &str) -> String {
    let Some(caps) = TIME_REGEX.captures(time) else {
        return time.to_string();
    };

    let Ok(mut hours) = caps[1].parse::<u32>() else {
        return time.to_string();
    };
    let minutes = caps.get(2).map_or("00", |m| m.as_str());
    let period = caps.get(3).map(|m| m.as_str().to_lowercase());

    match period.as_deref() {
        Some("pm") if hours != 12 => hours += 12,
        Some("am") if hours == 12 => hours = 0,
        _ => {}
    }

    format!("{hours:02}:{minutes}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morning_formats_agree() {
        for input in ["9am", "09:00", "9:00 AM", "9:00am", "0900"] {
            assert_eq!(normalize_time(input), "09:00", "input {input:?}");
        }
    }

    #[test]
    fn test_afternoon_and_midnight() {
        assert_eq!(normalize_time("2pm"), "14:00");
        assert_eq!(normalize_time("2:45 PM"), "14:45");
        assert_eq!(normalize_time("12pm"), "12:00");
        assert_eq!(normalize_time("12am"), "00:00");
        assert_eq!(normalize_time("14:30"), "14:30");
    }

    #[test]
    fn test_unparseable_time_kept() {
        assert_eq!(normalize_time("TBA"), "TBA");
        assert_eq!(normalize_time(""), "");
    }

    #[test]
    fn test_only_ascii_digits_count() {
        // Arabic-Indic nine
        assert_eq!(normalize_time("\u{0669}am"), "\u{0669}am");
        assert_eq!(normalize_time("9:\u{0663}\u{0660}"), "09:00");
    }

    #[test]
    fn test_day_tokens() {
        for input in ["mon", "Monday", "MON", "Mon."] {
            assert_eq!(normalize_day(input), "Monday");
        }
        assert_eq!(normalize_day("thurs"), "Thursday");
        assert_eq!(normalize_day("Funday"), "Funday");
        assert_eq!(normalize_day(""), "");
    }
}
