//! In-memory ticket store for testing.

use chrono::{SubsecRound, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::ticket::{NewTicket, Ticket, TicketError, TicketFilter, TicketStore};

/// Mock implementation of the TicketStore trait.
///
/// Keeps tickets in memory and can be switched into a mode where every
/// insert fails, to exercise the persistence error path.
#[derive(Debug, Default)]
pub struct MockTicketStore {
    tickets: Mutex<Vec<Ticket>>,
    fail_inserts: AtomicBool,
    insert_attempts: AtomicUsize,
}

impl MockTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose inserts always fail.
    pub fn failing() -> Self {
        let store = Self::new();
        store.set_fail_inserts(true);
        store
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Inserts attempted, including failed ones.
    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    /// Snapshot of stored tickets in insertion order.
    pub fn tickets(&self) -> Vec<Ticket> {
        self.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Ticket>>, TicketError> {
        self.tickets
            .lock()
            .map_err(|_| TicketError::Database("mock store lock poisoned".to_string()))
    }

    fn matches(ticket: &Ticket, filter: &TicketFilter) -> bool {
        filter
            .queue
            .as_ref()
            .is_none_or(|q| ticket.routing.destination_queue == *q)
            && filter
                .category
                .as_ref()
                .is_none_or(|c| ticket.classification.category == *c)
            && filter
                .escalated
                .is_none_or(|e| ticket.routing.escalated == e)
            && filter
                .session_kind
                .is_none_or(|k| ticket.submission.session_kind() == k)
    }
}

impl TicketStore for MockTicketStore {
    fn insert(&self, ticket: NewTicket) -> Result<Ticket, TicketError> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(TicketError::Database("mock insert failure".to_string()));
        }

        let ticket = Ticket {
            id: uuid::Uuid::new_v4().to_string(),
            submission: ticket.submission,
            classification: ticket.classification,
            routing: ticket.routing,
            priority: ticket.priority,
            created_at: Utc::now().trunc_subsecs(6),
        };
        self.lock()?.push(ticket.clone());
        Ok(ticket)
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        Ok(self.lock()?.iter().find(|t| t.id == id).cloned())
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let tickets = self.lock()?;
        Ok(tickets
            .iter()
            .rev()
            .filter(|t| Self::matches(t, filter))
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let tickets = self.lock()?;
        Ok(tickets.iter().filter(|t| Self::matches(t, filter)).count() as i64)
    }
}
