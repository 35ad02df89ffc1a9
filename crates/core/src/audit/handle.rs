use chrono::Utc;
use tokio::sync::mpsc;

use super::{AuditEvent, AuditRecord};

/// Sending side of the audit trail, shared by the intake pipeline and the
/// service lifecycle.
///
/// A failed send is logged and swallowed: auditing never fails a submission.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<AuditRecord>,
}

impl AuditHandle {
    pub fn new(tx: mpsc::Sender<AuditRecord>) -> Self {
        Self { tx }
    }

    /// Stamp the event and queue it, waiting for channel capacity.
    pub async fn emit(&self, event: AuditEvent) {
        let record = AuditRecord::from_event(event, Utc::now());
        if let Err(e) = self.tx.send(record).await {
            tracing::error!(event_type = %e.0.event_type, "Audit writer is gone, event dropped");
        }
    }
}
