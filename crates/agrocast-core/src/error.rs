//! Shared error types for AgroCast.
//!
//! Lower crates keep their own typed errors and fold into these where a
//! failure reaches the user. Every type offers `user_message()` for display;
//! `Display` keeps the technical detail for logs.

use thiserror::Error;

/// Top-level error surfaced to the user.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Record store error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Assistant error: {0}")]
    Assistant(#[from] AssistantError),

    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failures with no finer classification.
    #[error("Service error: {0}")]
    Service(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Database(e) => e.user_message(),
            AppError::Assistant(e) => e.user_message(),
            AppError::Plan(e) => e.user_message(),
            AppError::Io(_) => "Could not read or write a local file.",
            AppError::Service(_) => "Something went wrong. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// HTTP transport failures against the backend, PostgREST or Nominatim.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unreadable response body: {0}")]
    Decode(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Cannot reach the server. Check your connection."
            }
            NetworkError::Timeout => "The server took too long to answer. Please try again.",
            NetworkError::Status { status, .. } if *status == 401 || *status == 403 => {
                "The server rejected our credentials. Check the API key."
            }
            NetworkError::Status { status, .. } if *status >= 500 => {
                "The server is having trouble right now. Please try again later."
            }
            NetworkError::Status { .. } => "The server refused the request.",
            NetworkError::Decode(_) => "The server sent data we could not read.",
        }
    }
}

/// Failures of the plan, task and chat record store.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Cannot open record store: {0}")]
    Open(String),

    #[error("Record query failed: {0}")]
    Query(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::Open(_) => "Saved plans are unavailable. Check the records settings.",
            DatabaseError::Query(_) => "Saving or loading your data failed. Please try again.",
        }
    }
}

/// Assistant failures that reach the user. Chat failures never do: they are
/// answered with the configured fallback message instead.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Assistant unavailable: {0}")]
    Unavailable(String),

    #[error("Schedule generation failed: {0}")]
    GenerationFailed(String),
}

impl AssistantError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AssistantError::Unavailable(_) => "The assistant is offline. Please try again later.",
            AssistantError::GenerationFailed(_) => {
                "Could not generate a schedule. Please try again."
            }
        }
    }
}

/// Plan workflow preconditions.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("No saved plan")]
    NoSavedPlan,

    #[error("Day offset {0} is outside 0..=6")]
    InvalidDay(u8),
}

impl PlanError {
    pub fn user_message(&self) -> &'static str {
        match self {
            PlanError::NoSavedPlan => "Please save a plan first!",
            PlanError::InvalidDay(_) => "Pick a day within the 7-day schedule.",
        }
    }
}

/// Classify a reqwest failure.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        match self.status() {
            Some(status) => NetworkError::Status {
                status: status.as_u16(),
                message: self.to_string(),
            },
            None if self.is_decode() => NetworkError::Decode(self.to_string()),
            None => NetworkError::ConnectionFailed(self.to_string()),
        }
    }
}

/// Classify a SQLite failure.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(err, _)
                if matches!(
                    err.code,
                    rusqlite::ErrorCode::CannotOpen | rusqlite::ErrorCode::NotADatabase
                ) =>
            {
                DatabaseError::Open(self.to_string())
            }
            _ => DatabaseError::Query(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_messages_reach_app_error() {
        let app_err: AppError = PlanError::NoSavedPlan.into();
        assert!(matches!(app_err, AppError::Plan(PlanError::NoSavedPlan)));
        assert_eq!(app_err.user_message(), "Please save a plan first!");
    }

    #[test]
    fn test_status_messages_by_class() {
        let status = |code| NetworkError::Status {
            status: code,
            message: String::new(),
        };
        assert_ne!(status(503).user_message(), status(400).user_message());
        assert_ne!(status(401).user_message(), status(400).user_message());
        assert_eq!(status(401).user_message(), status(403).user_message());
    }

    #[test]
    fn test_sqlite_errors_are_queries_by_default() {
        let err = rusqlite::Error::QueryReturnedNoRows.into_database_error();
        assert!(matches!(err, DatabaseError::Query(_)));
    }

    #[test]
    fn test_every_app_error_has_a_message() {
        let errors = [
            AppError::from(NetworkError::Timeout),
            AppError::from(DatabaseError::Open("x".into())),
            AppError::from(AssistantError::Unavailable("x".into())),
            AppError::Service("x".into()),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty());
        }
    }
}
