//! Core ticket types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Who submitted the ticket. Carried for audit only; never affects routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Employee,
    #[default]
    Guest,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Employee => "employee",
            SessionKind::Guest => "guest",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(SessionKind::Employee),
            "guest" => Ok(SessionKind::Guest),
            other => Err(format!("unknown session kind: {}", other)),
        }
    }
}

/// A submission field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
    /// Hint shown to the submitter on how to fix the input.
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// A validated ticket submission.
///
/// Both text fields are trimmed and guaranteed non-empty. Fields are private so
/// a submission can only be obtained through [`TicketSubmission::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketSubmission {
    title: String,
    description: String,
    session_kind: SessionKind,
}

impl TicketSubmission {
    pub fn new(
        title: impl AsRef<str>,
        description: impl AsRef<str>,
        session_kind: SessionKind,
    ) -> Result<Self, ValidationError> {
        let title = title.as_ref().trim();
        let description = description.as_ref().trim();

        if title.is_empty() {
            return Err(ValidationError::new("title", "must not be empty"));
        }
        if description.is_empty() {
            return Err(ValidationError::new("description", "must not be empty"));
        }

        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
            session_kind,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn session_kind(&self) -> SessionKind {
        self.session_kind
    }
}

/// Ticket urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Output of the inference service for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Lowercase label from the classifier's label set.
    pub category: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Priority predicted by the model, if it provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl ClassificationResult {
    pub fn new(category: impl Into<String>, confidence: f64) -> Self {
        Self {
            category: category.into(),
            confidence,
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Why a ticket was sent to the escalation queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    LowConfidence,
    UnknownCategory,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::LowConfidence => "low_confidence",
            EscalationReason::UnknownCategory => "unknown_category",
        }
    }
}

impl FromStr for EscalationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low_confidence" => Ok(EscalationReason::LowConfidence),
            "unknown_category" => Ok(EscalationReason::UnknownCategory),
            other => Err(format!("unknown escalation reason: {}", other)),
        }
    }
}

/// Where a classified ticket goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub destination_queue: String,
    pub escalated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<EscalationReason>,
}

impl RoutingDecision {
    pub fn to_queue(queue: impl Into<String>) -> Self {
        Self {
            destination_queue: queue.into(),
            escalated: false,
            escalation_reason: None,
        }
    }

    pub fn escalate(queue: impl Into<String>, reason: EscalationReason) -> Self {
        Self {
            destination_queue: queue.into(),
            escalated: true,
            escalation_reason: Some(reason),
        }
    }
}

/// A classified, routed and persisted ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    /// Assigned by the store.
    pub id: String,
    pub submission: TicketSubmission,
    pub classification: ClassificationResult,
    pub routing: RoutingDecision,
    /// Final priority after keyword overrides.
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}
