//! Error handling for Gatherly
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for Gatherly application
#[derive(Error, Debug)]
pub enum GatherlyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Mail delivery error: {0}")]
    Mail(#[from] MailError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Participant not found for user {user_id} in event {event_id}")]
    ParticipantNotFound { user_id: i64, event_id: i64 },

    #[error("{0}")]
    Rejected(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Mail delivery API specific errors
#[derive(Error, Debug)]
pub enum MailError {
    #[error("Mail API request failed: {0}")]
    RequestFailed(String),

    #[error("Mail API timeout")]
    Timeout,

    #[error("Invalid mail API response: {0}")]
    InvalidResponse(String),

    #[error("Mail service unavailable")]
    ServiceUnavailable,
}

/// Result type alias for Gatherly operations
pub type Result<T> = std::result::Result<T, GatherlyError>;

/// Result type alias for mail delivery operations
pub type MailResult<T> = std::result::Result<T, MailError>;

/// Error classification used when surfacing failures to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Forbidden,
    Internal,
}

impl GatherlyError {
    /// Classify the error into the categories callers branch on
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatherlyError::UserNotFound { .. }
            | GatherlyError::EventNotFound { .. }
            | GatherlyError::ParticipantNotFound { .. } => ErrorKind::NotFound,
            GatherlyError::Rejected(_) | GatherlyError::InvalidInput(_) => ErrorKind::Conflict,
            GatherlyError::PermissionDenied(_) => ErrorKind::Forbidden,
            _ => ErrorKind::Internal,
        }
    }

    /// Message safe to show to the requesting user.
    ///
    /// Business-rule rejections carry their own actionable text; internal
    /// failures collapse to a generic message so persistence and transport
    /// details never leak out.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Something went wrong, please try again later".to_string(),
            _ => self.to_string(),
        }
    }

    /// Check if the error is recoverable by retrying later
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GatherlyError::Mail(_)
                | GatherlyError::Http(_)
                | GatherlyError::Io(_)
                | GatherlyError::ServiceUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            GatherlyError::EventNotFound { event_id: 1 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            GatherlyError::Rejected("Event is full".to_string()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            GatherlyError::PermissionDenied("admin only".to_string()).kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            GatherlyError::Config("bad".to_string()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = GatherlyError::Config("database password missing".to_string());
        assert!(!err.user_message().contains("password"));

        let rejection = GatherlyError::Rejected("You have already joined this event".to_string());
        assert_eq!(rejection.user_message(), "You have already joined this event");
    }
}
