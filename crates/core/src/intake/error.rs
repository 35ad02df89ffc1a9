use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::classifier::ClassifierError;
use crate::ticket::{TicketError, ValidationError};

/// Closed set of reasons a submission can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    ClassificationUnavailable,
    ClassificationTimeout,
    ClassificationMalformed,
    UnknownCategory,
    PersistenceError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::ClassificationUnavailable => "classification_unavailable",
            ErrorKind::ClassificationTimeout => "classification_timeout",
            ErrorKind::ClassificationMalformed => "classification_malformed",
            ErrorKind::UnknownCategory => "unknown_category",
            ErrorKind::PersistenceError => "persistence_error",
        }
    }

    /// Whether resubmitting the same input can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::ClassificationUnavailable
                | ErrorKind::ClassificationTimeout
                | ErrorKind::ClassificationMalformed
                | ErrorKind::PersistenceError
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validation_error" => Ok(ErrorKind::ValidationError),
            "classification_unavailable" => Ok(ErrorKind::ClassificationUnavailable),
            "classification_timeout" => Ok(ErrorKind::ClassificationTimeout),
            "classification_malformed" => Ok(ErrorKind::ClassificationMalformed),
            "unknown_category" => Ok(ErrorKind::UnknownCategory),
            "persistence_error" => Ok(ErrorKind::PersistenceError),
            other => Err(format!("unknown error kind: {}", other)),
        }
    }
}

/// Why a submission did not produce a ticket.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Invalid submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("Classifier unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("Classifier timed out after {0:?}")]
    ClassificationTimeout(Duration),

    #[error("Malformed classifier response: {0}")]
    ClassificationMalformed(String),

    #[error("No queue configured for category '{0}'")]
    UnknownCategory(String),

    #[error("Ticket was classified but could not be saved: {0}")]
    Persistence(#[from] TicketError),
}

impl IntakeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IntakeError::Validation(_) => ErrorKind::ValidationError,
            IntakeError::ClassificationUnavailable(_) => ErrorKind::ClassificationUnavailable,
            IntakeError::ClassificationTimeout(_) => ErrorKind::ClassificationTimeout,
            IntakeError::ClassificationMalformed(_) => ErrorKind::ClassificationMalformed,
            IntakeError::UnknownCategory(_) => ErrorKind::UnknownCategory,
            IntakeError::Persistence(_) => ErrorKind::PersistenceError,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// How the submitter can fix the input, for validation failures that carry one.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            IntakeError::Validation(v) => v.suggestion.as_deref(),
            _ => None,
        }
    }
}

impl From<ClassifierError> for IntakeError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::InvalidInput(msg) => {
                IntakeError::Validation(ValidationError::new("text", msg))
            }
            ClassifierError::Unavailable(msg) => IntakeError::ClassificationUnavailable(msg),
            ClassifierError::Timeout(after) => IntakeError::ClassificationTimeout(after),
            ClassifierError::MalformedResponse(msg) => IntakeError::ClassificationMalformed(msg),
        }
    }
}
