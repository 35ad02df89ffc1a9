use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intake::ErrorKind;
use crate::ticket::{EscalationReason, Priority, SessionKind};

/// Something worth keeping a durable trace of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },
    TicketCreated {
        ticket_id: String,
        session_kind: SessionKind,
        category: String,
        confidence: f64,
        queue: String,
        priority: Priority,
    },
    /// Follows `TicketCreated` when the ticket went to the escalation queue.
    TicketEscalated {
        ticket_id: String,
        session_kind: SessionKind,
        category: String,
        confidence: f64,
        reason: EscalationReason,
        queue: String,
    },
    /// A submission ended without a ticket.
    SubmissionFailed {
        session_kind: SessionKind,
        kind: ErrorKind,
        message: String,
        retryable: bool,
    },
}

impl AuditEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::TicketCreated { .. } => "ticket_created",
            Self::TicketEscalated { .. } => "ticket_escalated",
            Self::SubmissionFailed { .. } => "submission_failed",
        }
    }

    pub fn ticket_id(&self) -> Option<&str> {
        match self {
            Self::TicketCreated { ticket_id, .. } | Self::TicketEscalated { ticket_id, .. } => {
                Some(ticket_id)
            }
            _ => None,
        }
    }

    /// Who submitted, for events caused by a submission.
    pub fn session_kind(&self) -> Option<SessionKind> {
        match self {
            Self::TicketCreated { session_kind, .. }
            | Self::TicketEscalated { session_kind, .. }
            | Self::SubmissionFailed { session_kind, .. } => Some(*session_kind),
            _ => None,
        }
    }

    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::SubmissionFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// One row of the audit trail.
///
/// The indexed columns (`event_type`, `ticket_id`, `session_kind`,
/// `failure_kind`) are always derived from `event`; build records with
/// [`AuditRecord::from_event`] so they cannot disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Zero until the store assigns one.
    pub id: i64,
    pub recorded_at: DateTime<Utc>,
    pub event_type: String,
    pub ticket_id: Option<String>,
    pub session_kind: Option<SessionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<ErrorKind>,
    pub event: AuditEvent,
}

impl AuditRecord {
    pub fn from_event(event: AuditEvent, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            recorded_at,
            event_type: event.event_type().to_string(),
            ticket_id: event.ticket_id().map(String::from),
            session_kind: event.session_kind(),
            failure_kind: event.failure_kind(),
            event,
        }
    }
}
