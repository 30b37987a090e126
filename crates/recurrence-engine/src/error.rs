//! Error types for recurrence-engine operations.

use thiserror::Error;

use crate::task::TaskId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid interval: {0} (must be at least 1)")]
    InvalidInterval(u32),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// A picker mutation was sent while a different picker (or none) is open.
    #[error("No {expected} picker is open")]
    NoActivePicker { expected: &'static str },
}

pub type Result<T> = std::result::Result<T, RecurrenceError>;
