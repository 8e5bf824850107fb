/// Persisted types for courses, timetables, lectures and reminders
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single weekly meeting of a catalogue course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    /// Unique across the catalogue.
    pub code: String,
    pub instructor: String,
    pub department: String,
    pub credits: u32,
    pub schedule: Vec<ScheduleSlot>,
}

/// One row of the departmental timetable, scoped by department and semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: String,
    pub course_code: String,
    pub course_name: String,
    pub instructor: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
    pub department: String,
    pub semester: String,
}

impl TimetableEntry {
    /// Returns true if this entry belongs to the given (department, semester) scope.
    pub fn in_scope(&self, department: &str, semester: &str) -> bool {
        self.department == department && self.semester == semester
    }
}

/// A user-owned, dated lecture occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: String,
    pub course_name: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_from_departmental: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuietHours {
    pub enabled: bool,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPreferences {
    pub id: String,
    pub user_id: String,
    pub email_enabled: bool,
    pub push_enabled: bool,
    /// Minutes before the lecture starts.
    pub reminder_timing: u32,
    pub quiet_hours: QuietHours,
    pub weekend_reminders: bool,
}

impl ReminderPreferences {
    /// Preferences used for a user who never saved any.
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            id: format!("default-{user_id}"),
            user_id: user_id.to_string(),
            email_enabled: false,
            push_enabled: true,
            reminder_timing: 15,
            quiet_hours: QuietHours {
                enabled: false,
                start: "22:00".to_string(),
                end: "07:00".to_string(),
            },
            weekend_reminders: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderType {
    Email,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Sent,
    Delivered,
    Failed,
}

/// A logged notification event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub lecture_id: String,
    pub lecture_name: String,
    pub sent_at: String,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub status: ReminderStatus,
}

/// The whole persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub departmental_timetable: Vec<TimetableEntry>,
    #[serde(default)]
    pub user_lectures: HashMap<String, Vec<Lecture>>,
    #[serde(default)]
    pub reminder_preferences: HashMap<String, ReminderPreferences>,
    #[serde(default)]
    pub reminders: HashMap<String, Vec<Reminder>>,
}

impl StoreDocument {
    /// Empty document with no seed data.
    pub fn empty() -> Self {
        Self {
            courses: Vec::new(),
            departmental_timetable: Vec::new(),
            user_lectures: HashMap::new(),
            reminder_preferences: HashMap::new(),
            reminders: HashMap::new(),
        }
    }

    /// Document written when no database file exists yet.
    pub fn seeded() -> Self {
        let slot = |day: &str, start: &str, end: &str, room: &str| ScheduleSlot {
            day: day.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            room: room.to_string(),
        };
        let cs101_entry = |id: &str, day: &str| TimetableEntry {
            id: id.to_string(),
            course_code: "CS101".to_string(),
            course_name: "Computer Science 101".to_string(),
            instructor: "Dr. Smith".to_string(),
            day: day.to_string(),
            start_time: "09:00".to_string(),
            end_time: "10:30".to_string(),
            room: "Room A101".to_string(),
            department: "Computer Science".to_string(),
            semester: "Fall 2024".to_string(),
        };

        Self {
            courses: vec![
                Course {
                    id: "1".to_string(),
                    name: "Computer Science 101".to_string(),
                    code: "CS101".to_string(),
                    instructor: "Dr. Smith".to_string(),
                    department: "Computer Science".to_string(),
                    credits: 3,
                    schedule: vec![
                        slot("Monday", "09:00", "10:30", "Room A101"),
                        slot("Wednesday", "09:00", "10:30", "Room A101"),
                    ],
                },
                Course {
                    id: "2".to_string(),
                    name: "Data Structures".to_string(),
                    code: "CS201".to_string(),
                    instructor: "Prof. Johnson".to_string(),
                    department: "Computer Science".to_string(),
                    credits: 4,
                    schedule: vec![
                        slot("Tuesday", "14:00", "15:30", "Room B205"),
                        slot("Thursday", "14:00", "15:30", "Room B205"),
                    ],
                },
            ],
            departmental_timetable: vec![cs101_entry("1", "Monday"), cs101_entry("2", "Wednesday")],
            ..Self::empty()
        }
    }

    /// Finds a course by id.
    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// Returns true if a course other than `except_id` already uses `code`.
    pub fn code_taken(&self, code: &str, except_id: Option<&str>) -> bool {
        self.courses
            .iter()
            .any(|c| c.code == code && Some(c.id.as_str()) != except_id)
    }

    /// Removes every timetable entry in the (department, semester) scope and
    /// appends `entries`. Returns how many entries were removed.
    pub fn replace_timetable_scope(
        &mut self,
        department: &str,
        semester: &str,
        entries: Vec<TimetableEntry>,
    ) -> usize {
        let before = self.departmental_timetable.len();
        self.departmental_timetable
            .retain(|e| !e.in_scope(department, semester));
        let removed = before - self.departmental_timetable.len();
        self.departmental_timetable.extend(entries);
        removed
    }

    /// Appends `reminder` to the log of every user that has a lecture list.
    pub fn broadcast_reminder(&mut self, reminder: &Reminder) -> usize {
        let users: Vec<String> = self.user_lectures.keys().cloned().collect();
        for user in &users {
            self.reminders
                .entry(user.clone())
                .or_default()
                .push(reminder.clone());
        }
        users.len()
    }
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self::seeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, department: &str, semester: &str) -> TimetableEntry {
        TimetableEntry {
            id: id.to_string(),
            course_code: "X1".to_string(),
            course_name: "X".to_string(),
            instructor: "I".to_string(),
            day: "Monday".to_string(),
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            room: "R".to_string(),
            department: department.to_string(),
            semester: semester.to_string(),
        }
    }

    #[test]
    fn test_replace_scope_leaves_other_scopes() {
        let mut doc = StoreDocument::empty();
        doc.departmental_timetable = vec![
            entry("a", "Math", "Fall"),
            entry("b", "Math", "Spring"),
            entry("c", "Physics", "Fall"),
        ];

        let removed = doc.replace_timetable_scope("Math", "Fall", vec![entry("d", "Math", "Fall")]);

        assert_eq!(removed, 1);
        let ids: Vec<_> = doc.departmental_timetable.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_code_taken_ignores_self() {
        let doc = StoreDocument::seeded();
        assert!(doc.code_taken("CS101", None));
        assert!(!doc.code_taken("CS101", Some("1")));
        assert!(doc.code_taken("CS201", Some("1")));
    }

    #[test]
    fn test_broadcast_only_reaches_users_with_lectures() {
        let mut doc = StoreDocument::empty();
        doc.user_lectures.insert("alice".to_string(), Vec::new());
        doc.reminder_preferences
            .insert("bob".to_string(), ReminderPreferences::defaults_for("bob"));

        let reminder = Reminder {
            id: "r1".to_string(),
            lecture_id: "c1".to_string(),
            lecture_name: "CS1 - Intro".to_string(),
            sent_at: "2024-01-01T00:00:00Z".to_string(),
            reminder_type: ReminderType::Push,
            status: ReminderStatus::Sent,
        };

        assert_eq!(doc.broadcast_reminder(&reminder), 1);
        assert_eq!(doc.reminders["alice"].len(), 1);
        assert!(!doc.reminders.contains_key("bob"));
    }

    #[test]
    fn test_reminder_wire_format() {
        let json = serde_json::json!({
            "id": "r1",
            "lectureId": "l1",
            "lectureName": "CS101",
            "sentAt": "2024-01-01T09:00:00Z",
            "type": "email",
            "status": "delivered"
        });
        let reminder: Reminder = serde_json::from_value(json).unwrap();
        assert_eq!(reminder.reminder_type, ReminderType::Email);
        assert_eq!(reminder.status, ReminderStatus::Delivered);
    }
}
