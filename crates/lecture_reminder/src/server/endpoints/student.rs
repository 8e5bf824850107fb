//! Per-student lectures, reminder preferences and reminder log.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::{Lecture, Reminder, ReminderPreferences};
use crate::reminder::upcoming_reminders;
use crate::server::extract::UserId;
use crate::server::types::{ApiError, ApiResponse};
use crate::server::util::json_body;
use crate::sync::sync_lectures;
use crate::types::AppState;

/// Lecture dates and times are local wall-clock values, so sync and
/// reminder planning both read this clock.
fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Debug, Default, Deserialize)]
pub struct LecturesBody {
    #[serde(default)]
    pub lectures: Vec<Lecture>,
}

/// GET /student/lectures?userId=
pub async fn get_lectures(
    UserId(user): UserId,
    State(s): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    info!("GET /student/lectures for {}", user);

    let mut doc = s
        .store
        .read()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch lectures"))?;
    let lectures = doc.user_lectures.remove(&user).unwrap_or_default();

    Ok(ApiResponse::ok(lectures).into_response())
}

/// PUT /student/lectures?userId=
///
/// Replaces the user's whole lecture list with `{lectures: [...]}`.
pub async fn put_lectures(
    UserId(user): UserId,
    State(s): State<Arc<AppState>>,
    payload: Result<Json<LecturesBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = json_body(payload)?;
    info!("PUT /student/lectures for {} ({} lectures)", user, body.lectures.len());

    let lectures = s
        .store
        .update(|doc| {
            doc.user_lectures.insert(user.clone(), body.lectures.clone());
            Ok(body.lectures)
        })
        .await
        .map_err(|e: ApiError| e.context("Failed to save lectures"))?;

    Ok(ApiResponse::ok(lectures).into_response())
}

/// POST /student/lectures?userId=
///
/// Adds the next occurrence of every departmental timetable entry the user
/// does not already have.
pub async fn post_sync_lectures(
    UserId(user): UserId,
    State(s): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    info!("POST /student/lectures (sync) for {}", user);

    let outcome = s
        .store
        .update(|doc| {
            let existing = doc.user_lectures.remove(&user).unwrap_or_default();
            let outcome = sync_lectures(existing, &doc.departmental_timetable, local_now());
            doc.user_lectures.insert(user.clone(), outcome.lectures.clone());
            Ok(outcome)
        })
        .await
        .map_err(|e: ApiError| e.context("Failed to sync lectures"))?;
    info!("Synced {} new lectures for {}", outcome.added, user);

    Ok(ApiResponse::ok(outcome.lectures)
        .with_added(outcome.added)
        .into_response())
}

/// GET /student/preferences?userId=
///
/// `data` is `null` when the user never saved preferences.
pub async fn get_preferences(
    UserId(user): UserId,
    State(s): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    info!("GET /student/preferences for {}", user);

    let mut doc = s
        .store
        .read()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch preferences"))?;
    let prefs: Option<ReminderPreferences> = doc.reminder_preferences.remove(&user);

    Ok(ApiResponse::ok(prefs).into_response())
}

/// PUT /student/preferences?userId=
pub async fn put_preferences(
    UserId(user): UserId,
    State(s): State<Arc<AppState>>,
    payload: Result<Json<ReminderPreferences>, JsonRejection>,
) -> Result<Response, ApiError> {
    let prefs = json_body(payload)?;
    info!("PUT /student/preferences for {}", user);

    let prefs = s
        .store
        .update(|doc| {
            doc.reminder_preferences.insert(user.clone(), prefs.clone());
            Ok(prefs)
        })
        .await
        .map_err(|e: ApiError| e.context("Failed to save preferences"))?;

    Ok(ApiResponse::ok(prefs).into_response())
}

/// GET /student/reminders?userId=
pub async fn get_reminders(
    UserId(user): UserId,
    State(s): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    info!("GET /student/reminders for {}", user);

    let mut doc = s
        .store
        .read()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch reminders"))?;
    let reminders = doc.reminders.remove(&user).unwrap_or_default();

    Ok(ApiResponse::ok(reminders).into_response())
}

/// POST /student/reminders?userId=
///
/// Appends one reminder to the log and returns the whole log.
pub async fn post_reminder(
    UserId(user): UserId,
    State(s): State<Arc<AppState>>,
    payload: Result<Json<Reminder>, JsonRejection>,
) -> Result<Response, ApiError> {
    let reminder = json_body(payload)?;
    info!("POST /student/reminders for {}", user);

    let reminders = s
        .store
        .update(|doc| {
            let list = doc.reminders.entry(user.clone()).or_default();
            list.push(reminder);
            Ok(list.clone())
        })
        .await
        .map_err(|e: ApiError| e.context("Failed to log reminder"))?;

    Ok(ApiResponse::ok(reminders).into_response())
}

/// GET /student/reminders/upcoming?userId=
///
/// Reminders that will fire for the user's lectures under their current
/// preferences (or the defaults), soonest first.
pub async fn get_upcoming_reminders(
    UserId(user): UserId,
    State(s): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    info!("GET /student/reminders/upcoming for {}", user);

    let mut doc = s
        .store
        .read()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to plan reminders"))?;
    let lectures = doc.user_lectures.remove(&user).unwrap_or_default();
    let prefs = doc
        .reminder_preferences
        .remove(&user)
        .unwrap_or_else(|| ReminderPreferences::defaults_for(&user));

    let planned = upcoming_reminders(&lectures, &prefs, local_now());
    let total = planned.len();

    Ok(ApiResponse::ok(planned).with_total(total).into_response())
}
