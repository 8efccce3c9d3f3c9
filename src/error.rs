use thiserror::Error;

use crate::types::LessonId;

/// Key-value persistence errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to acquire lock: {0}")]
    LockError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Rejections of a slot completion. The session is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("slot {ordinal} is still waiting for a judge verdict")]
    VerdictPending { ordinal: usize },

    #[error("session already complete")]
    AlreadyComplete,
}

#[derive(Error, Debug)]
pub enum CourseError {
    #[error("course file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("course file is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("lesson {0} not found")]
    LessonNotFound(LessonId),

    #[error("unit {0} has no checkpoint")]
    NoCheckpoint(u32),
}

#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("a session is already in progress")]
    SessionActive,

    #[error("no session in progress")]
    NoSession,

    #[error("unit {0} has no words to test")]
    EmptyUnit(u32),

    #[error(transparent)]
    Course(#[from] CourseError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
