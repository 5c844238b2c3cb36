//! Error types for studydash-core

use thiserror::Error;

/// Main error type for the studydash-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Syllabus catalog could not be parsed
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Session rejected at the store boundary
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// Focus timer misuse (e.g. pausing an idle timer)
    #[error("timer error: {0}")]
    Timer(String),

    /// Store connection lock was poisoned by a panicking thread
    #[error("database lock poisoned")]
    LockPoisoned,

    /// Subject not found
    #[error("subject not found: {0}")]
    SubjectNotFound(String),

    /// Module not found
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// Subtopic not found
    #[error("subtopic not found: {0}")]
    SubtopicNotFound(String),

    /// Attachment not found
    #[error("attachment not found: {0}")]
    AttachmentNotFound(String),

    /// Planner task not found
    #[error("task not found: {0}")]
    TaskNotFound(String),
}

/// Result type alias for studydash-core
pub type Result<T> = std::result::Result<T, Error>;
