//! Intake: the path from a raw submission to a stored, routed ticket.

mod detail;
mod error;
mod orchestrator;

pub use detail::DetailRule;
pub use error::{ErrorKind, IntakeError};
pub use orchestrator::IntakeOrchestrator;
