//! Departmental timetable endpoints, including CSV upload.

use axum::{
    extract::{rejection::JsonRejection, Multipart, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{fresh_id, TimetableEntry};
use crate::server::types::{ApiError, ApiResponse};
use crate::server::util::{json_body, matches_filter, non_empty};
use crate::timetable::{process_timetable, PREVIEW_LEN};
use crate::types::AppState;

/// MIME types accepted for timetable uploads.
pub const ALLOWED_UPLOAD_TYPES: [&str; 4] = [
    "text/csv",
    "application/vnd.ms-excel",
    "application/csv",
    "text/plain",
];

#[derive(Debug, Deserialize)]
pub struct TimetableQuery {
    pub department: Option<String>,
    pub semester: Option<String>,
    pub instructor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableInput {
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub instructor: Option<String>,
    pub day: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub room: Option<String>,
    pub department: Option<String>,
    pub semester: Option<String>,
}

impl TimetableInput {
    fn into_entry(self, id: String) -> Result<TimetableEntry, ApiError> {
        let required = |value: Option<String>, field: &str| {
            non_empty(value)
                .ok_or_else(|| ApiError::bad_request(format!("Missing required field: {field}")))
        };

        Ok(TimetableEntry {
            id,
            course_code: required(self.course_code, "courseCode")?,
            course_name: required(self.course_name, "courseName")?,
            instructor: required(self.instructor, "instructor")?,
            day: required(self.day, "day")?,
            start_time: required(self.start_time, "startTime")?,
            end_time: required(self.end_time, "endTime")?,
            room: required(self.room, "room")?,
            department: required(self.department, "department")?,
            semester: required(self.semester, "semester")?,
        })
    }
}

/// Data returned after a successful upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub entries_added: usize,
    pub department: String,
    pub semester: String,
    pub preview: Vec<TimetableEntry>,
}

/// GET /timetable
///
/// Query parameters `department`, `semester` and `instructor` filter by
/// case-insensitive substring.
pub async fn get_timetable(
    State(s): State<Arc<AppState>>,
    Query(query): Query<TimetableQuery>,
) -> Result<Response, ApiError> {
    info!("GET /timetable");

    let doc = s
        .store
        .read()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch timetable"))?;

    let entries: Vec<TimetableEntry> = doc
        .departmental_timetable
        .into_iter()
        .filter(|e| matches_filter(&e.department, query.department.as_deref()))
        .filter(|e| matches_filter(&e.semester, query.semester.as_deref()))
        .filter(|e| matches_filter(&e.instructor, query.instructor.as_deref()))
        .collect();
    let total = entries.len();

    Ok(ApiResponse::ok(entries).with_total(total).into_response())
}

/// POST /timetable
///
/// Appends a single entry; all nine fields are required.
pub async fn post_timetable_entry(
    State(s): State<Arc<AppState>>,
    payload: Result<Json<TimetableInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = json_body(payload)?;
    info!("POST /timetable");

    let entry = s
        .store
        .update(|doc| {
            let id = fresh_id(|id| doc.departmental_timetable.iter().any(|e| e.id == id));
            let entry = input.into_entry(id)?;
            doc.departmental_timetable.push(entry.clone());
            Ok(entry)
        })
        .await
        .map_err(|e: ApiError| e.context("Failed to add timetable entry"))?;

    Ok(ApiResponse::created(entry)
        .with_message("Timetable entry added successfully")
        .into_response())
}

/// DELETE /timetable
///
/// Clears every entry regardless of scope.
pub async fn delete_timetable(State(s): State<Arc<AppState>>) -> Result<Response, ApiError> {
    info!("DELETE /timetable");

    let deleted = s
        .store
        .update(|doc| {
            let count = doc.departmental_timetable.len();
            doc.departmental_timetable.clear();
            Ok(count)
        })
        .await
        .map_err(|e: ApiError| e.context("Failed to clear timetable"))?;

    Ok(ApiResponse::message(format!("Cleared {deleted} timetable entries"))
        .with_deleted_count(deleted)
        .into_response())
}

/// An uploaded file part.
struct UploadedFile {
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// POST /timetable/upload
///
/// Multipart form with `file`, `department` and `semester`. Replaces all
/// entries of that (department, semester) with the parsed rows.
pub async fn post_upload(
    State(s): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    info!("POST /timetable/upload");

    let mut file = None;
    let mut department = None;
    let mut semester = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid form data: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("Invalid form data: {}", e.body_text()))
                })?;
                file = Some(UploadedFile {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "department" | "semester" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Invalid form data: {}", e.body_text()))
                })?;
                if name == "department" {
                    department = non_empty(Some(value));
                } else {
                    semester = non_empty(Some(value));
                }
            }
            other => warn!("Ignoring unexpected form field {:?}", other),
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let (Some(department), Some(semester)) = (department, semester) else {
        return Err(ApiError::bad_request("Department and semester are required"));
    };

    let mime = file
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_lowercase());
    if !mime.is_some_and(|m| ALLOWED_UPLOAD_TYPES.contains(&m.as_str())) {
        return Err(ApiError::bad_request(
            "Invalid file type. Please upload CSV files only.",
        ));
    }

    if file.bytes.len() > s.config.max_upload_bytes {
        return Err(ApiError::bad_request(format!(
            "File size too large. Maximum size is {}MB.",
            s.config.max_upload_bytes / (1024 * 1024)
        )));
    }

    let content = String::from_utf8_lossy(&file.bytes);
    let entries = process_timetable(&content, &department, &semester, Utc::now())?;
    let added = entries.len();
    let preview: Vec<TimetableEntry> = entries.iter().take(PREVIEW_LEN).cloned().collect();

    let removed = s
        .store
        .update(|doc| Ok(doc.replace_timetable_scope(&department, &semester, entries)))
        .await
        .map_err(|e: ApiError| e.context("Failed to process timetable file"))?;
    info!(
        "Replaced {} entries with {} for {} / {}",
        removed, added, department, semester
    );

    Ok(ApiResponse::ok(UploadSummary {
        entries_added: added,
        department,
        semester,
        preview,
    })
    .with_message(format!("Successfully uploaded {added} timetable entries"))
    .into_response())
}
