//! Ticket storage trait and types.

use std::fmt;

use crate::ticket::{ClassificationResult, Priority, RoutingDecision, SessionKind, Ticket, TicketSubmission};

/// Error type for ticket operations.
#[derive(Debug)]
pub enum TicketError {
    /// Ticket not found.
    NotFound(String),
    /// Database error.
    Database(String),
}

impl fmt::Display for TicketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketError::NotFound(id) => write!(f, "Ticket not found: {}", id),
            TicketError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for TicketError {}

/// A fully classified and routed ticket waiting for an id.
///
/// Every field is required, so there is no way to hand the store a ticket
/// that skipped classification or routing.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub submission: TicketSubmission,
    pub classification: ClassificationResult,
    pub routing: RoutingDecision,
    pub priority: Priority,
}

/// Filter for querying tickets.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Filter by destination queue.
    pub queue: Option<String>,
    /// Filter by classified category.
    pub category: Option<String>,
    /// Filter by escalation flag.
    pub escalated: Option<bool>,
    /// Filter by session kind.
    pub session_kind: Option<SessionKind>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl TicketFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            limit: 100,
            offset: 0,
            ..Default::default()
        }
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_escalated(mut self, escalated: bool) -> Self {
        self.escalated = Some(escalated);
        self
    }

    pub fn with_session_kind(mut self, session_kind: SessionKind) -> Self {
        self.session_kind = Some(session_kind);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for ticket storage backends.
///
/// Tickets are write-once: there is no update operation.
pub trait TicketStore: Send + Sync {
    /// Persist a new ticket, assigning its id and creation time.
    fn insert(&self, ticket: NewTicket) -> Result<Ticket, TicketError>;

    /// Get a ticket by ID.
    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError>;

    /// List tickets matching the filter, newest first.
    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    /// Count tickets matching the filter (ignores limit/offset).
    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError>;
}
