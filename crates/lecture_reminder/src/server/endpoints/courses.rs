//! Course catalogue endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::{fresh_id, Course, Reminder, ReminderStatus, ReminderType, ScheduleSlot};
use crate::server::types::{ApiError, ApiResponse};
use crate::server::util::{json_body, matches_filter, non_empty};
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct CourseQuery {
    pub instructor: Option<String>,
    pub department: Option<String>,
}

/// Credits arrive either as a number or as a numeric string. Fractions are
/// truncated toward zero.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Credits {
    Number(f64),
    Text(String),
}

impl Credits {
    /// Parsed value; `None` for zero or blank, which count as missing.
    fn value(&self) -> Result<Option<u32>, ApiError> {
        let invalid = || ApiError::bad_request(format!("Invalid credits: {}", self.raw()));
        let number = match self {
            Credits::Number(n) => *n,
            Credits::Text(s) if s.trim().is_empty() => return Ok(None),
            Credits::Text(s) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        };
        let whole = number.trunc();
        if !whole.is_finite() || whole < 0.0 || whole > u32::MAX as f64 {
            return Err(invalid());
        }
        Ok(Some(whole as u32).filter(|c| *c > 0))
    }

    fn raw(&self) -> String {
        match self {
            Credits::Number(n) => n.to_string(),
            Credits::Text(s) => s.clone(),
        }
    }
}

/// Body of create and update requests. Every field is optional so that
/// missing fields produce a named error, and so updates can be partial.
#[derive(Debug, Default, Deserialize)]
pub struct CourseInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub instructor: Option<String>,
    pub department: Option<String>,
    pub credits: Option<Credits>,
    pub schedule: Option<Vec<ScheduleSlot>>,
}

fn missing(field: &str) -> ApiError {
    ApiError::bad_request(format!("Missing required field: {field}"))
}

impl CourseInput {
    fn into_course(self, id: String) -> Result<Course, ApiError> {
        let name = non_empty(self.name).ok_or_else(|| missing("name"))?;
        let code = non_empty(self.code).ok_or_else(|| missing("code"))?;
        let instructor = non_empty(self.instructor).ok_or_else(|| missing("instructor"))?;
        let department = non_empty(self.department).ok_or_else(|| missing("department"))?;
        let credits = match self.credits {
            Some(c) => c.value()?.ok_or_else(|| missing("credits"))?,
            None => return Err(missing("credits")),
        };
        let schedule = self.schedule.ok_or_else(|| missing("schedule"))?;

        Ok(Course {
            id,
            name,
            code,
            instructor,
            department,
            credits,
            schedule,
        })
    }

    /// Overlays the provided fields onto `course`. The id never changes.
    fn apply_to(self, course: &mut Course) -> Result<(), ApiError> {
        if let Some(name) = non_empty(self.name) {
            course.name = name;
        }
        if let Some(code) = non_empty(self.code) {
            course.code = code;
        }
        if let Some(instructor) = non_empty(self.instructor) {
            course.instructor = instructor;
        }
        if let Some(department) = non_empty(self.department) {
            course.department = department;
        }
        if let Some(credits) = self.credits {
            if let Some(value) = credits.value()? {
                course.credits = value;
            }
        }
        if let Some(schedule) = self.schedule {
            course.schedule = schedule;
        }
        Ok(())
    }
}

fn conflict() -> ApiError {
    ApiError::Conflict("Course code already exists".to_string())
}

fn not_found() -> ApiError {
    ApiError::NotFound("Course not found".to_string())
}

/// GET /courses
///
/// Query parameters `instructor` and `department` filter by case-insensitive substring.
pub async fn get_courses(
    State(s): State<Arc<AppState>>,
    Query(query): Query<CourseQuery>,
) -> Result<Response, ApiError> {
    info!("GET /courses");

    let doc = s
        .store
        .read()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch courses"))?;

    let courses: Vec<Course> = doc
        .courses
        .into_iter()
        .filter(|c| matches_filter(&c.instructor, query.instructor.as_deref()))
        .filter(|c| matches_filter(&c.department, query.department.as_deref()))
        .collect();
    let total = courses.len();

    Ok(ApiResponse::ok(courses).with_total(total).into_response())
}

/// POST /courses
///
/// Creates a course and announces it to every user that has a lecture list.
pub async fn post_course(
    State(s): State<Arc<AppState>>,
    payload: Result<Json<CourseInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = json_body(payload)?;
    info!("POST /courses");

    let course = s
        .store
        .update(|doc| {
            let id = fresh_id(|id| doc.course(id).is_some());
            let course = input.into_course(id)?;
            if doc.code_taken(&course.code, None) {
                return Err(conflict());
            }

            let reminder = Reminder {
                id: fresh_id(|_| false),
                lecture_id: course.id.clone(),
                lecture_name: format!("{} - {}", course.code, course.name),
                sent_at: Utc::now().to_rfc3339(),
                reminder_type: ReminderType::Push,
                status: ReminderStatus::Sent,
            };
            doc.courses.push(course.clone());
            let notified = doc.broadcast_reminder(&reminder);
            info!("Created course {} and notified {} users", course.code, notified);

            Ok(course)
        })
        .await
        .map_err(|e: ApiError| e.context("Failed to create course"))?;

    Ok(ApiResponse::created(course)
        .with_message("Course created successfully")
        .into_response())
}

/// GET /courses/:id
pub async fn get_course(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    info!("GET /courses/{}", id);

    let doc = s
        .store
        .read()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch course"))?;
    let course = doc.course(&id).cloned().ok_or_else(not_found)?;

    Ok(ApiResponse::ok(course).into_response())
}

/// PUT /courses/:id
///
/// Changing the code to one used by a different course is a conflict.
pub async fn put_course(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    payload: Result<Json<CourseInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = json_body(payload)?;
    info!("PUT /courses/{}", id);

    let course = s
        .store
        .update(|doc| {
            let current = doc.course(&id).ok_or_else(not_found)?;
            if let Some(code) = input.code.as_deref().filter(|c| !c.trim().is_empty()) {
                if code != current.code && doc.code_taken(code, Some(id.as_str())) {
                    return Err(conflict());
                }
            }

            let course = doc
                .courses
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(not_found)?;
            input.apply_to(course)?;
            Ok(course.clone())
        })
        .await
        .map_err(|e: ApiError| e.context("Failed to update course"))?;

    Ok(ApiResponse::ok(course)
        .with_message("Course updated successfully")
        .into_response())
}

/// DELETE /courses/:id
pub async fn delete_course(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    info!("DELETE /courses/{}", id);

    let course = s
        .store
        .update(|doc| {
            let index = doc
                .courses
                .iter()
                .position(|c| c.id == id)
                .ok_or_else(not_found)?;
            Ok(doc.courses.remove(index))
        })
        .await
        .map_err(|e: ApiError| e.context("Failed to delete course"))?;

    Ok(ApiResponse::ok(course)
        .with_message("Course deleted successfully")
        .into_response())
}
