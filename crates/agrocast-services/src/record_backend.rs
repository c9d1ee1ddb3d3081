//! Record storage backend trait and error types.
//!
//! `RecordBackend` abstracts the blocking (SQLite) implementation; the hosted
//! PostgREST client exposes the same operations asynchronously and both are
//! unified by `RecordClient`.

use agrocast_core::{DatabaseError, NetworkError};
use thiserror::Error;

use crate::records::{
    AgriculturePlan, ChatMessage, DailyTask, NewChatMessage, NewTask, PlanFields, TaskUpdate,
};

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Row was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Rejected before reaching storage.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Worker thread failed (panic or cancellation).
    #[error("Background task failed: {0}")]
    Join(String),
}

impl RecordError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "The record no longer exists. Reload and try again.",
            Self::Validation(_) => "Some of the entered values are invalid.",
            Self::Database(e) => e.user_message(),
            Self::Network(e) => e.user_message(),
            Self::Join(_) => "Something went wrong. Please try again.",
        }
    }
}

impl From<tokio::task::JoinError> for RecordError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Join(e.to_string())
    }
}

/// Result type for record operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Blocking record storage.
///
/// Implementations don't need to be Sync; `RecordClient` serializes access
/// through a mutex and runs calls on the blocking pool.
pub trait RecordBackend: Send {
    /// The most recently created plan, if any (ties broken by insertion order).
    fn current_plan(&self) -> RecordResult<Option<AgriculturePlan>>;

    fn insert_plan(&self, fields: &PlanFields) -> RecordResult<AgriculturePlan>;

    /// # Errors
    /// Returns `RecordError::NotFound` if the plan doesn't exist.
    fn update_plan(&self, id: &str, fields: &PlanFields) -> RecordResult<AgriculturePlan>;

    /// Tasks for a plan ordered by day, then creation.
    fn list_tasks(&self, plan_id: &str) -> RecordResult<Vec<DailyTask>>;

    fn insert_task(&self, task: &NewTask) -> RecordResult<DailyTask>;

    /// # Errors
    /// Returns `RecordError::NotFound` if the task doesn't exist.
    fn update_task(&self, id: &str, update: &TaskUpdate) -> RecordResult<DailyTask>;

    /// Delete the given tasks; unknown ids are ignored.
    fn delete_tasks(&self, ids: &[String]) -> RecordResult<()>;

    /// All chat messages, oldest first.
    fn list_messages(&self) -> RecordResult<Vec<ChatMessage>>;

    fn insert_message(&self, message: &NewChatMessage) -> RecordResult<ChatMessage>;

    fn clear_messages(&self) -> RecordResult<()>;
}

/// Reject task writes outside the 7-day schedule.
pub fn validate_day_offset(day_offset: u8) -> RecordResult<()> {
    if day_offset > crate::records::MAX_DAY_OFFSET {
        return Err(RecordError::validation(format!(
            "day offset {} is outside 0..={}",
            day_offset,
            crate::records::MAX_DAY_OFFSET
        )));
    }
    Ok(())
}

/// Reject plans missing a required field.
pub fn validate_plan_fields(fields: &PlanFields) -> RecordResult<()> {
    let required = [
        ("crop_name", &fields.crop_name),
        ("farm_location", &fields.farm_location),
        ("season_goal", &fields.season_goal),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(RecordError::validation(format!("{} cannot be empty", name)));
        }
    }
    Ok(())
}
