//! Planning of lecture reminders from a user's preferences.
//!
//! Times are naive local wall-clock times, the same clock the lecture
//! `date`/`time` fields are written in.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::Serialize;

use crate::db::{Lecture, QuietHours, ReminderPreferences};

/// A reminder that should fire at `fire_at` for `lecture_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedReminder {
    pub lecture_id: String,
    pub lecture_name: String,
    pub starts_at: NaiveDateTime,
    pub fire_at: NaiveDateTime,
    pub email: bool,
    pub push: bool,
    pub title: String,
    pub body: String,
}

fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// Start of a lecture, if its date and time parse.
pub fn lecture_start(lecture: &Lecture) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(lecture.date.trim(), "%Y-%m-%d").ok()?;
    Some(date.and_time(parse_hhmm(&lecture.time)?))
}

fn in_quiet_hours(quiet: &QuietHours, at: NaiveTime) -> bool {
    if !quiet.enabled {
        return false;
    }
    let (Some(start), Some(end)) = (parse_hhmm(&quiet.start), parse_hhmm(&quiet.end)) else {
        return false;
    };

    if start <= end {
        start <= at && at < end
    } else {
        // Window wraps midnight
        at >= start || at < end
    }
}

/// Decides when (and whether) a reminder for `lecture` fires.
pub fn plan_reminder(
    lecture: &Lecture,
    prefs: &ReminderPreferences,
    now: NaiveDateTime,
) -> Option<PlannedReminder> {
    if !prefs.email_enabled && !prefs.push_enabled {
        return None;
    }

    let starts_at = lecture_start(lecture)?;
    let fire_at = starts_at - Duration::minutes(prefs.reminder_timing as i64);
    if fire_at <= now {
        return None;
    }

    if !prefs.weekend_reminders && matches!(starts_at.weekday(), Weekday::Sat | Weekday::Sun) {
        return None;
    }

    if in_quiet_hours(&prefs.quiet_hours, fire_at.time()) {
        return None;
    }

    let mut body = format!(
        "Your lecture starts in {} minutes",
        prefs.reminder_timing
    );
    if let Some(location) = lecture.location.as_deref().filter(|l| !l.is_empty()) {
        body.push_str(&format!(" in {location}"));
    }

    Some(PlannedReminder {
        lecture_id: lecture.id.clone(),
        lecture_name: lecture.course_name.clone(),
        starts_at,
        fire_at,
        email: prefs.email_enabled,
        push: prefs.push_enabled,
        title: format!("Lecture Reminder: {}", lecture.course_name),
        body,
    })
}

/// Plans reminders for all `lectures`, ordered by fire time.
pub fn upcoming_reminders(
    lectures: &[Lecture],
    prefs: &ReminderPreferences,
    now: NaiveDateTime,
) -> Vec<PlannedReminder> {
    let mut planned: Vec<_> = lectures
        .iter()
        .filter_map(|l| plan_reminder(l, prefs, now))
        .collect();
    planned.sort_by(|a, b| a.fire_at.cmp(&b.fire_at));
    planned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lecture(date: &str, time: &str) -> Lecture {
        Lecture {
            id: format!("{date}-{time}"),
            course_name: "CS101 - Intro".to_string(),
            date: date.to_string(),
            time: time.to_string(),
            location: Some("A101".to_string()),
            instructor: None,
            created_by: "u1".to_string(),
            is_from_departmental: None,
        }
    }

    fn now() -> NaiveDateTime {
        // Wednesday
        NaiveDate::from_ymd_opt(2024, 9, 4)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_fires_before_start() {
        let prefs = ReminderPreferences::defaults_for("u1");
        let planned = plan_reminder(&lecture("2024-09-04", "09:00"), &prefs, now()).unwrap();

        assert_eq!(planned.fire_at.to_string(), "2024-09-04 08:45:00");
        assert_eq!(planned.body, "Your lecture starts in 15 minutes in A101");
        assert!(planned.push);
        assert!(!planned.email);
    }

    #[test]
    fn test_past_and_unparseable_skipped() {
        let prefs = ReminderPreferences::defaults_for("u1");
        assert!(plan_reminder(&lecture("2024-09-04", "08:10"), &prefs, now()).is_none());
        assert!(plan_reminder(&lecture("2024-09-03", "12:00"), &prefs, now()).is_none());
        assert!(plan_reminder(&lecture("soon", "09:00"), &prefs, now()).is_none());
    }

    #[test]
    fn test_channels_disabled() {
        let mut prefs = ReminderPreferences::defaults_for("u1");
        prefs.push_enabled = false;
        assert!(plan_reminder(&lecture("2024-09-05", "09:00"), &prefs, now()).is_none());
    }

    #[test]
    fn test_weekend_filter() {
        let mut prefs = ReminderPreferences::defaults_for("u1");
        // 2024-09-07 is a Saturday
        assert!(plan_reminder(&lecture("2024-09-07", "10:00"), &prefs, now()).is_some());
        prefs.weekend_reminders = false;
        assert!(plan_reminder(&lecture("2024-09-07", "10:00"), &prefs, now()).is_none());
    }

    #[test]
    fn test_quiet_hours_wrap_midnight() {
        let mut prefs = ReminderPreferences::defaults_for("u1");
        prefs.quiet_hours = QuietHours {
            enabled: true,
            start: "22:00".to_string(),
            end: "07:00".to_string(),
        };

        // Fires 06:45, inside the window
        assert!(plan_reminder(&lecture("2024-09-05", "07:00"), &prefs, now()).is_none());
        // Fires 07:45, outside
        assert!(plan_reminder(&lecture("2024-09-05", "08:00"), &prefs, now()).is_some());
        // Fires 22:15, inside
        assert!(plan_reminder(&lecture("2024-09-05", "22:30"), &prefs, now()).is_none());
    }

    #[test]
    fn test_upcoming_sorted() {
        let prefs = ReminderPreferences::defaults_for("u1");
        let lectures = vec![
            lecture("2024-09-06", "09:00"),
            lecture("2024-09-04", "07:00"),
            lecture("2024-09-05", "09:00"),
        ];

        let planned = upcoming_reminders(&lectures, &prefs, now());

        let ids: Vec<_> = planned.iter().map(|p| p.lecture_id.as_str()).collect();
        assert_eq!(ids, vec!["2024-09-05-09:00", "2024-09-06-09:00"]);
    }
}
