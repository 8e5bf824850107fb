//! Ingestion of departmental timetables uploaded as CSV text.
//!
//! The parser is deliberately lenient: the header row is matched against a
//! list of synonyms per column, cells are split on bare commas, and rows that
//! cannot produce a complete entry are skipped with a warning instead of
//! failing the upload.

mod error;
mod normalize;

pub use error::IngestError;
pub use normalize::{normalize_day, normalize_time};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::db::TimetableEntry;

/// Number of parsed entries echoed back to the uploader.
pub const PREVIEW_LEN: usize = 5;

/// A required column together with the header names accepted for it.
struct ColumnSpec {
    field: &'static str,
    synonyms: &'static [&'static str],
}

const COLUMNS: [ColumnSpec; 7] = [
    ColumnSpec {
        field: "courseCode",
        synonyms: &["course_code", "coursecode", "code"],
    },
    ColumnSpec {
        field: "courseName",
        synonyms: &["course_name", "coursename", "name", "title"],
    },
    ColumnSpec {
        field: "instructor",
        synonyms: &["instructor", "teacher", "faculty", "professor"],
    },
    ColumnSpec {
        field: "day",
        synonyms: &["day", "weekday", "day_of_week"],
    },
    ColumnSpec {
        field: "startTime",
        synonyms: &["start_time", "starttime", "start", "time_start"],
    },
    ColumnSpec {
        field: "endTime",
        synonyms: &["end_time", "endtime", "end", "time_end"],
    },
    ColumnSpec {
        field: "room",
        synonyms: &["room", "classroom", "location", "venue"],
    },
];

/// Positions of the required columns within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub course_code: usize,
    pub course_name: usize,
    pub instructor: usize,
    pub day: usize,
    pub start_time: usize,
    pub end_time: usize,
    pub room: usize,
}

impl ColumnMap {
    /// Resolves every required column from lower-cased header tokens.
    pub fn from_headers(headers: &[String]) -> Result<Self, IngestError> {
        let mut indices = [0usize; 7];
        for (slot, spec) in indices.iter_mut().zip(COLUMNS.iter()) {
            *slot = find_column_index(headers, spec.synonyms).ok_or_else(|| {
                IngestError::MissingColumn {
                    column: spec.field,
                    available: headers.to_vec(),
                }
            })?;
        }

        let [course_code, course_name, instructor, day, start_time, end_time, room] = indices;
        Ok(Self {
            course_code,
            course_name,
            instructor,
            day,
            start_time,
            end_time,
            room,
        })
    }

    /// Minimum number of cells a row needs for every mapped column to exist.
    pub fn min_row_len(&self) -> usize {
        [
            self.course_code,
            self.course_name,
            self.instructor,
            self.day,
            self.start_time,
            self.end_time,
            self.room,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

/// Returns the index of the first header containing a synonym, trying
/// synonyms in order.
fn find_column_index(headers: &[String], synonyms: &[&str]) -> Option<usize> {
    synonyms
        .iter()
        .find_map(|name| headers.iter().position(|h| h.contains(name)))
}

/// Parses CSV text into timetable entries for one department and semester.
///
/// # Arguments
/// * `content` - Raw CSV text, first non-empty line is the header
/// * `department`, `semester` - Scope every entry is tagged with
/// * `uploaded_at` - Upload time, used to derive entry ids
///
/// # Returns
/// * `Ok(entries)` - At least one valid entry
/// * `Err(IngestError)` - The batch as a whole is unusable
pub fn process_timetable(
    content: &str,
    department: &str,
    semester: &str,
    uploaded_at: DateTime<Utc>,
) -> Result<Vec<TimetableEntry>, IngestError> {
    let lines: Vec<&str> = content.split('\n').filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Err(IngestError::TooShort);
    }

    let headers: Vec<String> = lines[0]
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .collect();
    let columns = ColumnMap::from_headers(&headers)?;
    let min_len = columns.min_row_len();
    let stamp = uploaded_at.timestamp_millis();

    let mut entries = Vec::new();
    for (i, line) in lines.iter().enumerate().skip(1) {
        let row: Vec<&str> = line.split(',').map(str::trim).collect();
        if row.len() < min_len {
            warn!("Skipping row {}: insufficient columns", i + 1);
            continue;
        }

        let entry = TimetableEntry {
            id: format!("{stamp}-{i}"),
            course_code: row[columns.course_code].to_string(),
            course_name: row[columns.course_name].to_string(),
            instructor: row[columns.instructor].to_string(),
            day: normalize_day(row[columns.day]),
            start_time: normalize_time(row[columns.start_time]),
            end_time: normalize_time(row[columns.end_time]),
            room: row[columns.room].to_string(),
            department: department.to_string(),
            semester: semester.to_string(),
        };

        if is_complete(&entry) {
            entries.push(entry);
        } else {
            warn!("Skipping row {}: missing required data", i + 1);
        }
    }

    if entries.is_empty() {
        return Err(IngestError::NoValidRows);
    }

    info!(
        "Parsed {} timetable entries for {} / {}",
        entries.len(),
        department,
        semester
    );
    Ok(entries)
}

fn is_complete(entry: &TimetableEntry) -> bool {
    [
        &entry.course_code,
        &entry.course_name,
        &entry.instructor,
        &entry.day,
        &entry.start_time,
        &entry.end_time,
        &entry.room,
    ]
    .iter()
    .all(|field| !field.is_empty())
}
