/// Projection of the departmental timetable onto a user's personal lectures.
///
/// `now` is naive local wall-clock time, the clock reminder planning uses.
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use std::collections::HashSet;

use crate::db::{Lecture, TimetableEntry};

/// Result of merging projected lectures into a user's list.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub lectures: Vec<Lecture>,
    pub added: usize,
}

fn parse_weekday(day: &str) -> Option<Weekday> {
    match day {
        "Monday" => Some(Weekday::Mon),
        "Tuesday" => Some(Weekday::Tue),
        "Wednesday" => Some(Weekday::Wed),
        "Thursday" => Some(Weekday::Thu),
        "Friday" => Some(Weekday::Fri),
        "Saturday" => Some(Weekday::Sat),
        "Sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Returns the first date strictly after `today` falling on `weekday`.
///
/// Unknown weekday names resolve to today's weekday, i.e. one week ahead.
pub fn next_date_for_day(weekday: &str, today: NaiveDate) -> NaiveDate {
    let current = today.weekday().num_days_from_sunday() as i64;
    let target = parse_weekday(weekday)
        .map(|w| w.num_days_from_sunday() as i64)
        .unwrap_or(current);

    let diff = match (target - current + 7) % 7 {
        0 => 7,
        d => d,
    };
    today + Duration::days(diff)
}

/// Label used for projected lectures, e.g. `CS101 - Computer Science 101`.
pub fn lecture_label(entry: &TimetableEntry) -> String {
    format!("{} - {}", entry.course_code, entry.course_name)
}

fn dedup_key(lecture: &Lecture) -> (String, String, String) {
    (
        lecture.course_name.clone(),
        lecture.date.clone(),
        lecture.time.clone(),
    )
}

/// Turns every timetable entry into its next concrete lecture occurrence.
pub fn project_timetable(timetable: &[TimetableEntry], now: NaiveDateTime) -> Vec<Lecture> {
    let today = now.date();
    let stamp = now.and_utc().timestamp_millis();

    timetable
        .iter()
        .enumerate()
        .map(|(i, entry)| Lecture {
            id: format!("dept-{stamp}-{i}"),
            course_name: lecture_label(entry),
            date: next_date_for_day(&entry.day, today)
                .format("%Y-%m-%d")
                .to_string(),
            time: entry.start_time.clone(),
            location: Some(entry.room.clone()),
            instructor: Some(entry.instructor.clone()),
            created_by: "system".to_string(),
            is_from_departmental: Some(true),
        })
        .collect()
}

/// Appends the projections of `timetable` that `existing` does not already
/// contain, matching on (course name, date, time).
pub fn sync_lectures(
    existing: Vec<Lecture>,
    timetable: &[TimetableEntry],
    now: NaiveDateTime,
) -> SyncOutcome {
    let mut seen: HashSet<_> = existing.iter().map(dedup_key).collect();
    let mut lectures = existing;
    let before = lectures.len();

    for lecture in project_timetable(timetable, now) {
        if seen.insert(dedup_key(&lecture)) {
            lectures.push(lecture);
        }
    }

    let added = lectures.len() - before;
    SyncOutcome { lectures, added }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ReminderPreferences;
    use crate::reminder::plan_reminder;

    fn entry(code: &str, day: &str, start: &str) -> TimetableEntry {
        TimetableEntry {
            id: code.to_string(),
            course_code: code.to_string(),
            course_name: "Course".to_string(),
            instructor: "Dr. X".to_string(),
            day: day.to_string(),
            start_time: start.to_string(),
            end_time: "23:00".to_string(),
            room: "R1".to_string(),
            department: "D".to_string(),
            semester: "S".to_string(),
        }
    }

    // 2024-09-04 is a Wednesday
    fn wednesday() -> NaiveDateTime {
        at("2024-09-04 12:00")
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_next_date_is_strictly_future() {
        let today = wednesday().date();
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();

        assert_eq!(next_date_for_day("Thursday", today), d("2024-09-05"));
        assert_eq!(next_date_for_day("Monday", today), d("2024-09-09"));
        assert_eq!(next_date_for_day("Sunday", today), d("2024-09-08"));
        assert_eq!(next_date_for_day("Wednesday", today), d("2024-09-11"));
        assert_eq!(next_date_for_day("Someday", today), d("2024-09-11"));
    }

    #[test]
    fn test_projection_fields() {
        let lectures = project_timetable(&[entry("CS101", "Friday", "09:00")], wednesday());

        assert_eq!(lectures.len(), 1);
        let l = &lectures[0];
        assert_eq!(l.course_name, "CS101 - Course");
        assert_eq!(l.date, "2024-09-06");
        assert_eq!(l.time, "09:00");
        assert_eq!(l.location.as_deref(), Some("R1"));
        assert_eq!(l.created_by, "system");
        assert_eq!(l.is_from_departmental, Some(true));
        assert!(l.id.starts_with("dept-"));
    }

    #[test]
    fn test_sync_twice_adds_nothing_new() {
        let timetable = vec![entry("CS101", "Monday", "09:00"), entry("CS102", "Tuesday", "10:00")];

        let first = sync_lectures(Vec::new(), &timetable, wednesday());
        assert_eq!(first.added, 2);

        let second = sync_lectures(first.lectures.clone(), &timetable, wednesday());
        assert_eq!(second.added, 0);
        assert_eq!(second.lectures, first.lectures);
    }

    #[test]
    fn test_sync_never_duplicates_triples() {
        // Two identical rows from different uploads project to the same triple
        let timetable = vec![
            entry("CS101", "Monday", "09:00"),
            entry("CS101", "Monday", "09:00"),
            entry("CS101", "Monday", "11:00"),
        ];
        let manual = Lecture {
            id: "m1".to_string(),
            course_name: "CS101 - Course".to_string(),
            date: "2024-09-09".to_string(),
            time: "11:00".to_string(),
            location: None,
            instructor: None,
            created_by: "alice".to_string(),
            is_from_departmental: None,
        };

        let outcome = sync_lectures(vec![manual], &timetable, wednesday());

        assert_eq!(outcome.added, 1);
        let keys: HashSet<_> = outcome.lectures.iter().map(dedup_key).collect();
        assert_eq!(keys.len(), outcome.lectures.len());
    }

    #[test]
    fn test_late_evening_projects_onto_local_tomorrow() {
        // Tuesday 21:00 local, which is already Wednesday in UTC for UTC-5
        let now = at("2024-09-03 21:00");
        let lectures = project_timetable(&[entry("CS101", "Wednesday", "09:00")], now);
        assert_eq!(lectures[0].date, "2024-09-04");

        let prefs = ReminderPreferences::defaults_for("u1");
        let planned = plan_reminder(&lectures[0], &prefs, now).unwrap();
        assert_eq!(planned.fire_at, at("2024-09-04 08:45"));
    }
}
