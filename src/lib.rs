//! # Qbank - Question Bank Storage
//!
//! Keeps assessment questions in two places at once:
//! - question metadata as rows of a SQLite `questions` table
//! - question bodies as markdown files under `<root>/<subject>/<topic>/[<subtopic>/]<id>.md`
//!
//! [`QuestionRepository`] is the entry point. It pairs every row mutation with
//! the matching content-file mutation and reports partial failures instead of
//! hiding them.

pub mod question;
pub mod paths;
pub mod content;
pub mod storage;
pub mod repository;
pub mod envelope;
pub mod config;
pub mod server;
pub mod ui;

// Re-exports for convenient access
pub use question::{
    BloomLevel, DifficultyLevel, QuestionField, QuestionFilter, QuestionInput, QuestionPatch,
    QuestionRecord, QuestionType, NewQuestion,
};
pub use paths::{Location, PathResolver};
pub use content::ContentStore;
pub use storage::RecordStore;
pub use repository::{Added, Deleted, Question, QuestionRepository, Updated};
pub use envelope::{Envelope, Status};

use serde::{Deserialize, Serialize};

/// Result type alias for question bank operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for question bank operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Question {0} not found")]
    NotFound(i64),

    #[error("{0}")]
    NoMatch(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The row half of an operation went through but the content half did not.
    #[error("Question {id} record and content file are out of sync: {source}")]
    Inconsistent {
        id: i64,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Wrap a content-side failure that happened after the row was committed.
    pub fn inconsistent(id: i64, source: Error) -> Self {
        Error::Inconsistent {
            id,
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) | Error::NoMatch(_) => ErrorKind::NotFound,
            Error::Storage(_) | Error::Io(_) => ErrorKind::Storage,
            Error::Inconsistent { .. } => ErrorKind::Inconsistent,
        }
    }
}

/// Coarse failure category, stable across the HTTP and CLI surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input; nothing was changed.
    Validation,
    /// Unknown identifier or empty selection; nothing was changed.
    NotFound,
    /// The database or filesystem refused an operation.
    Storage,
    /// The row was changed but the content file could not be brought in line.
    Inconsistent,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Storage => "storage",
            ErrorKind::Inconsistent => "inconsistent",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::validation("bad").kind(), ErrorKind::Validation);
        assert_eq!(Error::NotFound(3).kind(), ErrorKind::NotFound);
        assert_eq!(Error::NoMatch("none".into()).kind(), ErrorKind::NotFound);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(Error::Io(io).kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_inconsistent_message_names_question() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::inconsistent(7, Error::Io(io));
        assert_eq!(err.kind(), ErrorKind::Inconsistent);
        let msg = err.to_string();
        assert!(msg.contains("Question 7"));
        assert!(msg.contains("disk full"));
    }
}
