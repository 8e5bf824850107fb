//! Lecture reminder service: course catalogue, departmental timetable
//! ingestion and per-student lecture reminders over a JSON document store.

pub mod config;
pub mod db;
pub mod reminder;
pub mod server;
pub mod sync;
pub mod timetable;
pub mod types;
