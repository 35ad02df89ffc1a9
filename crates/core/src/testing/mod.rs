//! Testing utilities and mock implementations.
//!
//! Mocks for the two seams of the intake pipeline: the classifier and the
//! ticket store. Used by unit tests here and by the server's integration
//! tests.

mod mock_classifier;
mod mock_ticket_store;

pub use mock_classifier::MockClassifier;
pub use mock_ticket_store::MockTicketStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::{ClassifierConfig, Config, DatabaseConfig, IntakeConfig, RoutingConfig, ServerConfig};
    use crate::ticket::{
        ClassificationResult, NewTicket, Priority, RoutingDecision, SessionKind, TicketSubmission,
    };

    /// A valid submission.
    pub fn submission(title: &str, description: &str) -> TicketSubmission {
        TicketSubmission::new(title, description, SessionKind::Employee)
            .expect("fixture submission must be valid")
    }

    /// The canonical Outlook login problem.
    pub fn outlook_submission() -> TicketSubmission {
        submission("Cannot access Outlook", "Error on login")
    }

    /// A classified, routed ticket ready for insertion.
    pub fn new_ticket(category: &str, confidence: f64, queue: &str) -> NewTicket {
        NewTicket {
            submission: outlook_submission(),
            classification: ClassificationResult::new(category, confidence),
            routing: RoutingDecision::to_queue(queue),
            priority: Priority::Medium,
        }
    }

    /// Config with defaults everywhere and the given classifier URL.
    pub fn config(classifier_url: &str) -> Config {
        Config {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            classifier: ClassifierConfig::new(classifier_url),
            routing: RoutingConfig::default(),
            intake: IntakeConfig::default(),
        }
    }
}
