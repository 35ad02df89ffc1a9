use chrono::{DateTime, Utc};
use thiserror::Error;

use super::AuditRecord;
use crate::intake::ErrorKind;
use crate::ticket::SessionKind;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Which part of the audit trail to read. Unset fields match everything.
#[derive(Debug, Clone)]
pub struct AuditQuery {
    pub ticket_id: Option<String>,
    pub event_type: Option<String>,
    pub session_kind: Option<SessionKind>,
    /// Only failed submissions of this kind.
    pub failure_kind: Option<ErrorKind>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            ticket_id: None,
            event_type: None,
            session_kind: None,
            failure_kind: None,
            since: None,
            until: None,
            limit: 100,
            offset: 0,
        }
    }
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded about one ticket.
    pub fn for_ticket(ticket_id: impl Into<String>) -> Self {
        Self {
            ticket_id: Some(ticket_id.into()),
            ..Self::default()
        }
    }

    /// Failed submissions, optionally narrowed to one kind.
    pub fn failures(kind: Option<ErrorKind>) -> Self {
        Self {
            event_type: Some("submission_failed".to_string()),
            failure_kind: kind,
            ..Self::default()
        }
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_session_kind(mut self, session_kind: SessionKind) -> Self {
        self.session_kind = Some(session_kind);
        self
    }

    pub fn between(mut self, since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// Append-only storage for the audit trail.
pub trait AuditStore: Send + Sync {
    /// Write records in order, all or nothing.
    fn append(&self, records: &[AuditRecord]) -> Result<(), AuditError>;

    /// Matching records, newest first.
    fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError>;

    /// Matching records, ignoring `limit` and `offset`.
    fn count(&self, query: &AuditQuery) -> Result<i64, AuditError>;
}
