//! Error types for calgrid.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors that can occur in calgrid operations.
///
/// `InvalidRule` and `OutOfRange` are the engine's own failures. Both are
/// recoverable: a caller rendering many events reports them per event and
/// keeps going.
#[derive(Error, Debug)]
pub enum CalGridError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("{date} is not an occurrence of event '{event_id}'")]
    OutOfRange {
        event_id: String,
        date: NaiveDateTime,
    },

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for calgrid operations.
pub type CalGridResult<T> = Result<T, CalGridError>;
