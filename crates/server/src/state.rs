use std::sync::Arc;
use ticketdesk_core::{
    AuditStore, Classifier, Config, IntakeOrchestrator, SanitizedConfig, TicketStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    intake: Arc<IntakeOrchestrator>,
    ticket_store: Arc<dyn TicketStore>,
    audit_store: Arc<dyn AuditStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        intake: Arc<IntakeOrchestrator>,
        ticket_store: Arc<dyn TicketStore>,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            config,
            intake,
            ticket_store,
            audit_store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn intake(&self) -> &Arc<IntakeOrchestrator> {
        &self.intake
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.intake.classifier().as_ref()
    }

    pub fn ticket_store(&self) -> &dyn TicketStore {
        self.ticket_store.as_ref()
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }
}
