use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::server::endpoints::{courses, status, student, timetable};
use crate::types::AppState;

mod endpoints;
mod extract;
pub mod types;
mod util;

/// Room for multipart framing and the text fields around the file itself.
const UPLOAD_BODY_SLACK: usize = 1024 * 1024;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let course_router = Router::new()
        .route("/courses", get(courses::get_courses).post(courses::post_course))
        .route(
            "/courses/:id",
            get(courses::get_course)
                .put(courses::put_course)
                .delete(courses::delete_course),
        );

    // Upload body limit sits above the file limit so oversize files reach
    // the handler and get a proper 400
    let timetable_router = Router::new()
        .route(
            "/timetable",
            get(timetable::get_timetable)
                .post(timetable::post_timetable_entry)
                .delete(timetable::delete_timetable),
        )
        .route(
            "/timetable/upload",
            post(timetable::post_upload).layer(DefaultBodyLimit::max(
                app_state.config.max_upload_bytes + UPLOAD_BODY_SLACK,
            )),
        );

    let student_router = Router::new()
        .route(
            "/student/lectures",
            get(student::get_lectures)
                .put(student::put_lectures)
                .post(student::post_sync_lectures),
        )
        .route(
            "/student/preferences",
            get(student::get_preferences).put(student::put_preferences),
        )
        .route(
            "/student/reminders",
            get(student::get_reminders).post(student::post_reminder),
        )
        .route(
            "/student/reminders/upcoming",
            get(student::get_upcoming_reminders),
        );

    Router::new()
        .route("/health", get(status::get_health))
        .merge(course_router)
        .merge(timetable_router)
        .merge(student_router)
        .with_state(app_state)
}
