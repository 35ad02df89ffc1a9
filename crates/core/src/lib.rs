pub mod audit;
pub mod classifier;
pub mod config;
pub mod intake;
pub mod metrics;
pub mod routing;
pub mod testing;
pub mod ticket;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditHandle, AuditQuery, AuditRecord,
    AuditStore, AuditWriter, SqliteAuditStore, WriterStats,
};
pub use classifier::{combine_text, Classifier, ClassifierError, ClassifierHealth, HttpClassifier};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    UnknownCategoryPolicy,
};
pub use intake::{ErrorKind, IntakeError, IntakeOrchestrator};
pub use routing::Router;
pub use ticket::{
    ClassificationResult, EscalationReason, NewTicket, Priority, RoutingDecision, SessionKind,
    SqliteTicketStore, Ticket, TicketError, TicketFilter, TicketStore, TicketSubmission,
    ValidationError,
};
