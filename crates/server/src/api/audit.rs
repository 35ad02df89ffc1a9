//! Audit trail reads: the filtered feed and the per-ticket history.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticketdesk_core::{AuditError, AuditQuery, AuditRecord, ErrorKind, SessionKind};

use crate::state::AppState;

const MAX_LIMIT: i64 = 1000;
const DEFAULT_LIMIT: i64 = 100;

/// Upper bound on a single ticket's history.
const MAX_TRAIL: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct AuditParams {
    pub ticket_id: Option<String>,
    pub event_type: Option<String>,
    pub session_kind: Option<SessionKind>,
    /// Failed submissions of this kind only. Implies `event_type=submission_failed`.
    pub kind: Option<ErrorKind>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditParams {
    fn to_query(&self) -> AuditQuery {
        let mut query = match self.kind {
            Some(kind) => AuditQuery::failures(Some(kind)),
            None => AuditQuery::new(),
        };
        if let Some(ticket_id) = &self.ticket_id {
            query.ticket_id = Some(ticket_id.clone());
        }
        if let Some(event_type) = &self.event_type {
            query = query.with_event_type(event_type);
        }
        if let Some(session_kind) = self.session_kind {
            query = query.with_session_kind(session_kind);
        }
        query.between(self.since, self.until).page(
            self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            self.offset.unwrap_or(0).max(0),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct AuditFeedResponse {
    pub events: Vec<AuditRecord>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct TicketTrailResponse {
    pub ticket_id: String,
    /// Oldest first.
    pub events: Vec<AuditRecord>,
}

#[derive(Debug, Serialize)]
pub struct AuditErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<AuditErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(AuditErrorResponse {
            error: error.into(),
        }),
    )
}

fn store_error(e: AuditError) -> ApiError {
    tracing::error!("Audit read failed: {}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Audit events matching the filters, newest first. `total` ignores paging.
pub async fn query_audit(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditParams>,
) -> Result<Json<AuditFeedResponse>, ApiError> {
    let query = params.to_query();
    let store = state.audit_store();

    let events = store.query(&query).map_err(store_error)?;
    let total = store.count(&query).map_err(store_error)?;

    Ok(Json(AuditFeedResponse {
        events,
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// What happened to one ticket, from creation on.
pub async fn ticket_trail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketTrailResponse>, ApiError> {
    match state.ticket_store().get(&id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err(api_error(
                StatusCode::NOT_FOUND,
                format!("Ticket not found: {}", id),
            ))
        }
        Err(e) => return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }

    let mut events = state
        .audit_store()
        .query(&AuditQuery::for_ticket(&id).page(MAX_TRAIL, 0))
        .map_err(store_error)?;
    events.reverse();

    Ok(Json(TicketTrailResponse {
        ticket_id: id,
        events,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> Result<AuditParams, String> {
        let uri: axum::http::Uri = format!("/api/v1/audit?{}", query).parse().unwrap();
        Query::<AuditParams>::try_from_uri(&uri)
            .map(|Query(params)| params)
            .map_err(|e| e.to_string())
    }

    fn params(query: &str) -> AuditParams {
        parse(query).unwrap()
    }

    #[test]
    fn test_kind_narrows_to_failed_submissions() {
        let query = params("kind=classification_timeout").to_query();
        assert_eq!(query.event_type.as_deref(), Some("submission_failed"));
        assert_eq!(query.failure_kind, Some(ErrorKind::ClassificationTimeout));
    }

    #[test]
    fn test_paging_is_clamped() {
        let query = params("limit=5000&offset=-3").to_query();
        assert_eq!(query.limit, MAX_LIMIT);
        assert_eq!(query.offset, 0);

        let query = params("").to_query();
        assert_eq!(query.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(parse("kind=bogus").is_err());
    }
}
