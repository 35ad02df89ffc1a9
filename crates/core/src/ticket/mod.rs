//! Tickets: validated submissions, classification/routing outcomes and storage.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTicketStore;
pub use store::{NewTicket, TicketError, TicketFilter, TicketStore};
pub use types::{
    ClassificationResult, EscalationReason, Priority, RoutingDecision, SessionKind, Ticket,
    TicketSubmission, ValidationError,
};
