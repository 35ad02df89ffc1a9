//! Ticket API handlers: the submission gateway and ticket reads.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticketdesk_core::{
    ErrorKind, EscalationReason, IntakeError, Priority, SessionKind, Ticket, TicketFilter,
};

use crate::metrics::TICKETS_CREATED_TOTAL;
use crate::state::AppState;

/// Maximum allowed limit for ticket queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for ticket queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a ticket.
///
/// Every field is optional at the parsing stage so that missing fields are
/// reported as validation errors rather than deserialization failures.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitTicketBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub session_kind: Option<SessionKind>,
}

/// Returned with 201 when a ticket was created.
#[derive(Debug, Serialize)]
pub struct SubmitTicketResponse {
    pub ticket_id: String,
    pub category: String,
    pub queue: String,
    pub escalated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<EscalationReason>,
    pub priority: Priority,
    pub created_at: String,
}

impl From<&Ticket> for SubmitTicketResponse {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket_id: ticket.id.clone(),
            category: ticket.classification.category.clone(),
            queue: ticket.routing.destination_queue.clone(),
            escalated: ticket.routing.escalated,
            escalation_reason: ticket.routing.escalation_reason,
            priority: ticket.priority,
            created_at: ticket.created_at.to_rfc3339(),
        }
    }
}

/// Returned when a submission did not end with a reported ticket.
#[derive(Debug, Serialize)]
pub struct SubmissionErrorResponse {
    #[serde(skip)]
    status: StatusCode,
    /// One of the intake failure kinds, or `internal_error`.
    pub kind: &'static str,
    pub message: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub retryable: bool,
    /// `false` when no ticket exists, `null` when that cannot be known.
    pub ticket_created: Option<bool>,
}

impl SubmissionErrorResponse {
    fn from_intake(err: &IntakeError) -> Self {
        let kind = err.kind();
        Self {
            status: status_for(kind),
            kind: kind.as_str(),
            message: user_message(kind).to_string(),
            detail: err.to_string(),
            suggestion: err.suggestion().map(String::from),
            retryable: kind.is_retryable(),
            ticket_created: Some(false),
        }
    }

    /// The request never made it to intake.
    fn bad_request(detail: String) -> Self {
        let kind = ErrorKind::ValidationError;
        Self {
            status: status_for(kind),
            kind: kind.as_str(),
            message: user_message(kind).to_string(),
            detail,
            suggestion: None,
            retryable: false,
            ticket_created: Some(false),
        }
    }

    /// The submission task died, so the ticket may or may not be stored.
    fn outcome_unknown(detail: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal_error",
            message: "We could not confirm whether your ticket was created. Check your tickets before submitting again.".to_string(),
            detail,
            suggestion: None,
            retryable: false,
            ticket_created: None,
        }
    }
}

/// Full view of a stored ticket.
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: String,
    pub created_at: String,
    pub title: String,
    pub description: String,
    pub session_kind: SessionKind,
    pub category: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_priority: Option<Priority>,
    pub queue: String,
    pub escalated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<EscalationReason>,
    pub priority: Priority,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            created_at: ticket.created_at.to_rfc3339(),
            title: ticket.submission.title().to_string(),
            description: ticket.submission.description().to_string(),
            session_kind: ticket.submission.session_kind(),
            category: ticket.classification.category,
            confidence: ticket.classification.confidence,
            model_priority: ticket.classification.priority,
            queue: ticket.routing.destination_queue,
            escalated: ticket.routing.escalated,
            escalation_reason: ticket.routing.escalation_reason,
            priority: ticket.priority,
        }
    }
}

/// Query parameters for listing tickets
#[derive(Debug, Deserialize)]
pub struct ListTicketsParams {
    pub queue: Option<String>,
    pub category: Option<String>,
    pub escalated: Option<bool>,
    pub session_kind: Option<SessionKind>,
    /// Maximum number of tickets to return (default 100, max 1000)
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for listing tickets
#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<TicketResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response for reads
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
}

// ============================================================================
// Error mapping
// ============================================================================

/// HTTP status for each failure kind. No two kinds share one.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::ClassificationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ClassificationTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::ClassificationMalformed => StatusCode::BAD_GATEWAY,
        // No queue exists for what the classifier answered.
        ErrorKind::UnknownCategory => StatusCode::NOT_IMPLEMENTED,
        ErrorKind::PersistenceError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// What the submitter is told for each failure kind.
fn user_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ValidationError => {
            "The submission is invalid. Fix the highlighted input and submit again."
        }
        ErrorKind::ClassificationUnavailable
        | ErrorKind::ClassificationTimeout
        | ErrorKind::ClassificationMalformed => {
            "Your ticket was not created because the classification service could not process it. Please try again later."
        }
        ErrorKind::UnknownCategory => {
            "Your ticket was not created because it could not be routed. Please contact support."
        }
        ErrorKind::PersistenceError => {
            "Your ticket was classified but could not be saved, so it was not created. Please submit it again."
        }
    }
}

impl IntoResponse for SubmissionErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a ticket for classification and routing.
///
/// The submission runs on its own task: if the client disconnects, the
/// ticket is still classified and saved.
pub async fn submit_ticket(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let body: SubmitTicketBody = if body.is_empty() {
        SubmitTicketBody::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(body) => body,
            Err(e) => {
                return SubmissionErrorResponse::bad_request(format!(
                    "Request body is not valid: {}",
                    e
                ))
                .into_response();
            }
        }
    };

    let handle = state.intake().submit_detached(
        body.title.unwrap_or_default(),
        body.description.unwrap_or_default(),
        body.session_kind.unwrap_or_default(),
    );

    match handle.await {
        Ok(Ok(ticket)) => {
            TICKETS_CREATED_TOTAL.inc();
            (StatusCode::CREATED, Json(SubmitTicketResponse::from(&ticket))).into_response()
        }
        Ok(Err(err)) => SubmissionErrorResponse::from_intake(&err).into_response(),
        Err(e) => {
            tracing::error!(panicked = e.is_panic(), "Submission task failed: {}", e);
            SubmissionErrorResponse::outcome_unknown(format!("Submission task failed: {}", e))
                .into_response()
        }
    }
}

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, impl IntoResponse> {
    match state.ticket_store().get(&id) {
        Ok(Some(ticket)) => Ok(Json(TicketResponse::from(ticket))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(TicketErrorResponse {
                error: format!("Ticket not found: {}", id),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// List tickets with optional filters, newest first
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTicketsParams>,
) -> Result<Json<ListTicketsResponse>, impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut base_filter = TicketFilter::new();

    if let Some(ref queue) = params.queue {
        base_filter = base_filter.with_queue(queue);
    }
    if let Some(ref category) = params.category {
        base_filter = base_filter.with_category(category);
    }
    if let Some(escalated) = params.escalated {
        base_filter = base_filter.with_escalated(escalated);
    }
    if let Some(session_kind) = params.session_kind {
        base_filter = base_filter.with_session_kind(session_kind);
    }

    let query_filter = base_filter.clone().with_limit(limit).with_offset(offset);

    let store = state.ticket_store();
    let result = store
        .list(&query_filter)
        .and_then(|tickets| Ok((tickets, store.count(&base_filter)?)));

    match result {
        Ok((tickets, total)) => Ok(Json(ListTicketsResponse {
            tickets: tickets.into_iter().map(TicketResponse::from).collect(),
            total,
            limit,
            offset,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketdesk_core::ValidationError;

    #[test]
    fn test_every_kind_has_a_distinct_status() {
        let kinds = [
            ErrorKind::ValidationError,
            ErrorKind::ClassificationUnavailable,
            ErrorKind::ClassificationTimeout,
            ErrorKind::ClassificationMalformed,
            ErrorKind::UnknownCategory,
            ErrorKind::PersistenceError,
        ];
        let mut statuses: Vec<u16> = kinds.iter().map(|k| status_for(*k).as_u16()).collect();
        statuses.sort();
        statuses.dedup();
        assert_eq!(statuses.len(), kinds.len());
    }

    #[test]
    fn test_persistence_message_says_not_created() {
        let message = user_message(ErrorKind::PersistenceError);
        assert!(message.contains("not created"));
        assert_eq!(
            status_for(ErrorKind::PersistenceError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_suggestion_is_passed_through() {
        let err = IntakeError::Validation(
            ValidationError::new("description", "is too vague").with_suggestion("Say what broke"),
        );
        let body = serde_json::to_value(SubmissionErrorResponse::from_intake(&err)).unwrap();
        assert_eq!(body["suggestion"], "Say what broke");
        assert_eq!(body["ticket_created"], false);
        assert!(body.get("status").is_none());

        let err = IntakeError::UnknownCategory("general".to_string());
        let body = serde_json::to_value(SubmissionErrorResponse::from_intake(&err)).unwrap();
        assert!(body.get("suggestion").is_none());
    }

    #[test]
    fn test_unknown_outcome_leaves_ticket_created_open() {
        let response = SubmissionErrorResponse::outcome_unknown("task panicked".to_string());
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["kind"], "internal_error");
        assert!(body["ticket_created"].is_null());
        assert_eq!(body["retryable"], false);
    }

    #[test]
    fn test_body_fields_are_optional() {
        let body: SubmitTicketBody = serde_json::from_str("{}").unwrap();
        assert!(body.title.is_none());
        assert!(body.session_kind.is_none());

        let body: SubmitTicketBody =
            serde_json::from_str(r#"{"title": "VPN", "session_kind": "employee"}"#).unwrap();
        assert_eq!(body.session_kind, Some(SessionKind::Employee));
    }
}
