//! Submission pipeline: classify once, route, persist, audit.

use regex_lite::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{DetailRule, IntakeError};
use crate::audit::{AuditEvent, AuditHandle};
use crate::classifier::{combine_text, Classifier, ClassifierError};
use crate::config::{ConfigError, IntakeConfig, RoutingConfig, UnknownCategoryPolicy};
use crate::metrics;
use crate::routing::Router;
use crate::ticket::{
    ClassificationResult, EscalationReason, NewTicket, Priority, SessionKind, Ticket,
    TicketStore, TicketSubmission, ValidationError,
};

/// Runs one submission at a time through classification, routing and storage.
///
/// Holds no per-request state, so a single instance is shared by all
/// concurrent submissions.
pub struct IntakeOrchestrator {
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn TicketStore>,
    router: Router,
    unknown_category: UnknownCategoryPolicy,
    max_title_chars: usize,
    max_description_chars: usize,
    critical_keywords: Regex,
    detail: DetailRule,
    deadline: Option<Duration>,
    audit: Option<AuditHandle>,
}

impl IntakeOrchestrator {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn TicketStore>,
        routing: &RoutingConfig,
        intake: &IntakeConfig,
    ) -> Result<Self, ConfigError> {
        let critical_keywords = Regex::new(&format!("(?i){}", intake.critical_keywords))
            .map_err(|e| {
                ConfigError::ValidationError(format!(
                    "intake.critical_keywords is not a valid pattern: {}",
                    e
                ))
            })?;

        Ok(Self {
            classifier,
            store,
            router: Router::from_config(routing),
            unknown_category: routing.unknown_category,
            max_title_chars: intake.max_title_chars,
            max_description_chars: intake.max_description_chars,
            critical_keywords,
            detail: DetailRule::from_config(intake)?,
            deadline: None,
            audit: None,
        })
    }

    /// Attach an audit handle.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Bound every classification call, whatever the classifier does internally.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    /// Validate raw fields, then submit.
    pub async fn submit_raw(
        &self,
        title: &str,
        description: &str,
        session_kind: SessionKind,
    ) -> Result<Ticket, IntakeError> {
        match TicketSubmission::new(title, description, session_kind) {
            Ok(submission) => self.submit(submission).await,
            Err(e) => {
                let err = IntakeError::from(e);
                self.record_failure(session_kind, &err).await;
                Err(err)
            }
        }
    }

    /// Run a validated submission through the pipeline.
    ///
    /// The classifier is called at most once. Every outcome is logged,
    /// counted and audited before it is returned.
    pub async fn submit(&self, submission: TicketSubmission) -> Result<Ticket, IntakeError> {
        let session_kind = submission.session_kind();
        match self.process(submission).await {
            Ok(ticket) => {
                self.record_success(&ticket).await;
                Ok(ticket)
            }
            Err(err) => {
                self.record_failure(session_kind, &err).await;
                Err(err)
            }
        }
    }

    /// Submit on a separate task.
    ///
    /// The submission runs to completion even if the returned handle is
    /// dropped, so a caller going away never leaves a ticket classified but
    /// unsaved.
    pub fn submit_detached(
        self: &Arc<Self>,
        title: String,
        description: String,
        session_kind: SessionKind,
    ) -> JoinHandle<Result<Ticket, IntakeError>> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.submit_raw(&title, &description, session_kind).await })
    }

    async fn process(&self, submission: TicketSubmission) -> Result<Ticket, IntakeError> {
        self.check_lengths(&submission)?;
        self.detail.check(&submission)?;

        let text = combine_text(submission.title(), submission.description());
        let classification = self.classify(&text).await?;
        let routing = self.router.route(&classification);

        if routing.escalation_reason == Some(EscalationReason::UnknownCategory) {
            warn!(
                category = %classification.category,
                confidence = classification.confidence,
                "Classifier returned a category with no queue"
            );
            if self.unknown_category == UnknownCategoryPolicy::Reject {
                return Err(IntakeError::UnknownCategory(classification.category));
            }
        }

        let priority = self.priority_for(&text, &classification);

        let ticket = self
            .store
            .insert(NewTicket {
                submission,
                classification,
                routing,
                priority,
            })
            .map_err(|e| {
                error!(error = %e, "Failed to persist classified ticket");
                e
            })?;

        Ok(ticket)
    }

    fn check_lengths(&self, submission: &TicketSubmission) -> Result<(), ValidationError> {
        if submission.title().chars().count() > self.max_title_chars {
            return Err(ValidationError::new(
                "title",
                format!("must be at most {} characters", self.max_title_chars),
            ));
        }
        if submission.description().chars().count() > self.max_description_chars {
            return Err(ValidationError::new(
                "description",
                format!("must be at most {} characters", self.max_description_chars),
            ));
        }
        Ok(())
    }

    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        let start = Instant::now();

        let result = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.classifier.classify(text))
                .await
                .unwrap_or(Err(ClassifierError::Timeout(deadline))),
            None => self.classifier.classify(text).await,
        };

        let elapsed = start.elapsed();
        match &result {
            Ok(classification) => {
                metrics::CLASSIFIER_DURATION
                    .with_label_values(&["success"])
                    .observe(elapsed.as_secs_f64());
                metrics::CLASSIFICATION_CONFIDENCE.observe(classification.confidence);
                debug!(
                    classifier = self.classifier.name(),
                    category = %classification.category,
                    confidence = classification.confidence,
                    duration_ms = elapsed.as_millis() as u64,
                    "Classified submission"
                );
            }
            Err(e) => {
                metrics::CLASSIFIER_DURATION
                    .with_label_values(&["error"])
                    .observe(elapsed.as_secs_f64());
                let kind = match e {
                    ClassifierError::InvalidInput(_) => "invalid_input",
                    ClassifierError::Unavailable(_) => "unavailable",
                    ClassifierError::Timeout(_) => "timeout",
                    ClassifierError::MalformedResponse(_) => "malformed",
                };
                metrics::CLASSIFIER_ERRORS.with_label_values(&[kind]).inc();
            }
        }

        result
    }

    fn priority_for(&self, text: &str, classification: &ClassificationResult) -> Priority {
        if self.critical_keywords.is_match(text) {
            Priority::Critical
        } else {
            classification.priority.unwrap_or_default()
        }
    }

    async fn record_success(&self, ticket: &Ticket) {
        metrics::SUBMISSIONS_TOTAL
            .with_label_values(&["created"])
            .inc();

        info!(
            ticket_id = %ticket.id,
            category = %ticket.classification.category,
            queue = %ticket.routing.destination_queue,
            escalated = ticket.routing.escalated,
            priority = %ticket.priority,
            "Ticket created"
        );

        if let Some(reason) = ticket.routing.escalation_reason {
            metrics::ESCALATIONS_TOTAL
                .with_label_values(&[reason.as_str()])
                .inc();
        }

        let Some(ref audit) = self.audit else {
            return;
        };

        let session_kind = ticket.submission.session_kind();
        audit
            .emit(AuditEvent::TicketCreated {
                ticket_id: ticket.id.clone(),
                session_kind,
                category: ticket.classification.category.clone(),
                confidence: ticket.classification.confidence,
                queue: ticket.routing.destination_queue.clone(),
                priority: ticket.priority,
            })
            .await;

        if let Some(reason) = ticket.routing.escalation_reason {
            audit
                .emit(AuditEvent::TicketEscalated {
                    ticket_id: ticket.id.clone(),
                    session_kind,
                    category: ticket.classification.category.clone(),
                    confidence: ticket.classification.confidence,
                    reason,
                    queue: ticket.routing.destination_queue.clone(),
                })
                .await;
        }
    }

    async fn record_failure(&self, session_kind: SessionKind, err: &IntakeError) {
        let kind = err.kind();
        metrics::SUBMISSIONS_TOTAL
            .with_label_values(&[kind.as_str()])
            .inc();

        warn!(kind = %kind, session_kind = %session_kind, error = %err, "Submission failed");

        if let Some(ref audit) = self.audit {
            audit
                .emit(AuditEvent::SubmissionFailed {
                    session_kind,
                    kind,
                    message: err.to_string(),
                    retryable: err.is_retryable(),
                })
                .await;
        }
    }
}
