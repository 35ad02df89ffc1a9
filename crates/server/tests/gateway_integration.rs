//! Submission gateway tests: every intake outcome driven through HTTP.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{TestConfig, TestFixture};
use ticketdesk_core::{
    ClassificationResult, ClassifierError, Priority, TicketFilter, UnknownCategoryPolicy,
};

fn assert_not_created(body: &Value, kind: &str, retryable: bool) {
    assert_json_path!(body, "kind", json!(kind));
    assert_json_path!(body, "ticket_created", json!(false));
    assert_json_path!(body, "retryable", json!(retryable));
    assert!(
        body["message"].as_str().is_some_and(|m| !m.is_empty()),
        "missing user message: {}",
        body
    );
}

// =============================================================================
// Successful submissions
// =============================================================================

#[tokio::test]
async fn test_submit_routes_confident_ticket() {
    let fixture = TestFixture::new().await;
    fixture
        .classifier
        .set_result(ClassificationResult::new("email", 0.92))
        .await;

    let response = fixture
        .submit("Cannot access Outlook", "Error on login", "employee")
        .await;

    assert_status!(response, StatusCode::CREATED);
    assert_json_path!(response.body, "category", json!("email"));
    assert_json_path!(response.body, "queue", json!("email"));
    assert_json_path!(response.body, "escalated", json!(false));
    assert_json_path!(response.body, "priority", json!("medium"));
    assert!(response.body.get("escalation_reason").is_none());

    let ticket_id = response.body["ticket_id"].as_str().unwrap();
    let stored = fixture.ticket_store.get(ticket_id).unwrap().unwrap();
    assert_eq!(stored.classification.confidence, 0.92);
    assert_eq!(fixture.classifier.call_count(), 1);
    assert_eq!(
        fixture.classifier.recorded_texts().await,
        vec!["Cannot access Outlook\n\nError on login".to_string()]
    );
}

#[tokio::test]
async fn test_submit_low_confidence_escalates() {
    let fixture = TestFixture::new().await;
    fixture
        .classifier
        .set_result(ClassificationResult::new("email", 0.31))
        .await;

    let response = fixture
        .submit("Something is weird", "Not sure what", "guest")
        .await;

    assert_status!(response, StatusCode::CREATED);
    assert_json_path!(response.body, "category", json!("email"));
    assert_json_path!(response.body, "queue", json!("triage"));
    assert_json_path!(response.body, "escalated", json!(true));
    assert_json_path!(response.body, "escalation_reason", json!("low_confidence"));
}

#[tokio::test]
async fn test_submit_unknown_category_escalates_by_default() {
    let fixture = TestFixture::new().await;
    fixture
        .classifier
        .set_result(ClassificationResult::new("general", 0.95))
        .await;

    let response = fixture.submit("Question", "Where is the cafeteria", "guest").await;

    assert_status!(response, StatusCode::CREATED);
    assert_json_path!(response.body, "queue", json!("triage"));
    assert_json_path!(response.body, "escalation_reason", json!("unknown_category"));
}

#[tokio::test]
async fn test_submit_critical_keyword_overrides_priority() {
    let fixture = TestFixture::new().await;
    fixture
        .classifier
        .set_result(ClassificationResult::new("network", 0.8).with_priority(Priority::Low))
        .await;

    let response = fixture
        .submit("Production down", "Nobody can reach the VPN", "employee")
        .await;

    assert_status!(response, StatusCode::CREATED);
    assert_json_path!(response.body, "priority", json!("critical"));
}

#[tokio::test]
async fn test_session_kind_defaults_to_guest() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/tickets",
            json!({"title": "Printer jam", "description": "Third floor"}),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);

    let id = response.body["ticket_id"].as_str().unwrap();
    let ticket = fixture.get(&format!("/api/v1/tickets/{}", id)).await;
    assert_json_path!(ticket.body, "session_kind", json!("guest"));
}

// =============================================================================
// Failed submissions
// =============================================================================

#[tokio::test]
async fn test_missing_fields_are_validation_errors() {
    let fixture = TestFixture::new().await;

    for body in [
        json!({"description": "no title"}),
        json!({"title": "no description"}),
        json!({"title": "   ", "description": "blank title"}),
        json!({}),
    ] {
        let response = fixture.post("/api/v1/tickets", body).await;
        assert_status!(response, StatusCode::BAD_REQUEST);
        assert_not_created(&response.body, "validation_error", false);
    }

    assert_eq!(fixture.classifier.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_raw("/api/v1/tickets", "{not json").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_not_created(&response.body, "validation_error", false);

    let response = fixture
        .post(
            "/api/v1/tickets",
            json!({"title": "a", "description": "b", "session_kind": "admin"}),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_title_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture.submit(&"x".repeat(201), "desc", "employee").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["detail"].as_str().unwrap().contains("title"));
    assert_eq!(fixture.classifier.call_count(), 0);
}

#[tokio::test]
async fn test_vague_description_is_rejected_with_suggestion() {
    let fixture = TestFixture::new().await;

    let response = fixture.submit("hi", "hello", "guest").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_not_created(&response.body, "validation_error", false);
    assert!(response.body["suggestion"]
        .as_str()
        .is_some_and(|s| s.contains("Outlook")));
    assert_eq!(fixture.classifier.call_count(), 0);
    assert_eq!(fixture.ticket_store.count(&TicketFilter::new()).unwrap(), 0);
}

#[tokio::test]
async fn test_panicking_submission_reports_unknown_outcome() {
    let fixture = TestFixture::new().await;
    fixture.classifier.set_panics(true);

    let response = fixture
        .submit("Cannot access Outlook", "Error on login", "employee")
        .await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_json_path!(response.body, "kind", json!("internal_error"));
    assert_json_path!(response.body, "retryable", json!(false));
    assert!(response.body["ticket_created"].is_null());
    assert!(response.body["message"].as_str().unwrap().contains("could not confirm"));
}

#[tokio::test]
async fn test_classifier_failures_map_to_distinct_statuses() {
    let cases = [
        (
            ClassifierError::Unavailable("connection refused".into()),
            StatusCode::SERVICE_UNAVAILABLE,
            "classification_unavailable",
        ),
        (
            ClassifierError::Timeout(Duration::from_secs(5)),
            StatusCode::GATEWAY_TIMEOUT,
            "classification_timeout",
        ),
        (
            ClassifierError::MalformedResponse("missing confidence".into()),
            StatusCode::BAD_GATEWAY,
            "classification_malformed",
        ),
    ];

    for (error, status, kind) in cases {
        let fixture = TestFixture::new().await;
        fixture.classifier.push_error(error).await;

        let response = fixture
            .submit("Cannot access Outlook", "Error on login", "employee")
            .await;

        assert_status!(response, status);
        assert_not_created(&response.body, kind, true);
        assert_eq!(fixture.ticket_store.count(&TicketFilter::new()).unwrap(), 0);
    }
}

#[tokio::test]
async fn test_deadline_is_a_timeout() {
    let fixture = TestFixture::with_config(TestConfig {
        deadline: Some(Duration::from_millis(50)),
        ..Default::default()
    })
    .await;
    fixture.classifier.set_delay(Duration::from_millis(500)).await;

    let response = fixture
        .submit("Triage is slow", "Model takes ages to answer", "employee")
        .await;

    assert_status!(response, StatusCode::GATEWAY_TIMEOUT);
    assert_not_created(&response.body, "classification_timeout", true);
}

#[tokio::test]
async fn test_unknown_category_rejected_when_configured() {
    let fixture = TestFixture::with_config(TestConfig {
        unknown_category: UnknownCategoryPolicy::Reject,
        ..Default::default()
    })
    .await;
    fixture
        .classifier
        .set_result(ClassificationResult::new("general", 0.97))
        .await;

    let response = fixture.submit("Question", "Lunch menu", "guest").await;

    assert_status!(response, StatusCode::NOT_IMPLEMENTED);
    assert_not_created(&response.body, "unknown_category", false);
}

#[tokio::test]
async fn test_persistence_failure_is_not_reported_as_created() {
    let fixture = TestFixture::with_config(TestConfig {
        failing_store: true,
        ..Default::default()
    })
    .await;

    let response = fixture
        .submit("Cannot access Outlook", "Error on login", "employee")
        .await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_not_created(&response.body, "persistence_error", true);
    assert_eq!(fixture.classifier.call_count(), 1);
}

#[tokio::test]
async fn test_client_disconnect_does_not_cancel_submission() {
    let fixture = TestFixture::new().await;
    fixture.classifier.set_delay(Duration::from_millis(100)).await;

    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        fixture.submit("Cannot access Outlook", "Error on login", "employee"),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(fixture.ticket_store.count(&TicketFilter::new()).unwrap(), 1);
    assert_eq!(fixture.classifier.call_count(), 1);
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_get_ticket_returns_full_view() {
    let fixture = TestFixture::new().await;
    let created = fixture
        .submit("Cannot access Outlook", "Error on login", "employee")
        .await;
    let id = created.body["ticket_id"].as_str().unwrap();

    let response = fixture.get(&format!("/api/v1/tickets/{}", id)).await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "id", json!(id));
    assert_json_path!(response.body, "title", json!("Cannot access Outlook"));
    assert_json_path!(response.body, "description", json!("Error on login"));
    assert_json_path!(response.body, "session_kind", json!("employee"));
    assert_json_path!(response.body, "queue", json!("email"));
}

#[tokio::test]
async fn test_get_missing_ticket_is_404() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/tickets/does-not-exist").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(response.body["error"].as_str().unwrap().contains("does-not-exist"));
}

#[tokio::test]
async fn test_list_tickets_filters_and_paginates() {
    let fixture = TestFixture::new().await;

    fixture
        .classifier
        .push_result(ClassificationResult::new("email", 0.9))
        .await;
    fixture
        .classifier
        .push_result(ClassificationResult::new("network", 0.2))
        .await;
    fixture
        .classifier
        .push_result(ClassificationResult::new("network", 0.9))
        .await;

    for title in ["one", "two", "three"] {
        let response = fixture
            .submit(title, "details about the problem", "employee")
            .await;
        assert_status!(response, StatusCode::CREATED);
    }

    let all = fixture.get("/api/v1/tickets").await;
    assert_status!(all, StatusCode::OK);
    assert_json_path!(all.body, "total", json!(3));
    // Newest first
    assert_json_path!(all.body["tickets"][0], "title", json!("three"));

    let escalated = fixture.get("/api/v1/tickets?escalated=true").await;
    assert_json_path!(escalated.body, "total", json!(1));
    assert_json_path!(escalated.body["tickets"][0], "queue", json!("triage"));

    let network = fixture.get("/api/v1/tickets?category=network").await;
    assert_json_path!(network.body, "total", json!(2));

    let page = fixture.get("/api/v1/tickets?limit=1&offset=1").await;
    assert_eq!(page.body["tickets"].as_array().unwrap().len(), 1);
    assert_json_path!(page.body, "total", json!(3));
    assert_json_path!(page.body, "limit", json!(1));
    assert_json_path!(page.body, "offset", json!(1));
}

#[tokio::test]
async fn test_audit_trail_records_outcomes() {
    let fixture = TestFixture::new().await;
    fixture
        .classifier
        .set_result(ClassificationResult::new("email", 0.2))
        .await;

    let created = fixture
        .submit("Outlook", "Slow to open the inbox", "employee")
        .await;
    assert_status!(created, StatusCode::CREATED);
    let failed = fixture.submit("", "No title", "guest").await;
    assert_status!(failed, StatusCode::BAD_REQUEST);

    // created + escalated + failed
    fixture.wait_for_audit_events(3).await;

    let id = created.body["ticket_id"].as_str().unwrap();
    let response = fixture
        .get(&format!("/api/v1/audit?ticket_id={}", id))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "total", json!(2));

    let response = fixture
        .get("/api/v1/audit?event_type=submission_failed")
        .await;
    assert_json_path!(response.body, "total", json!(1));
    let event = &response.body["events"][0];
    assert_json_path!(event, "session_kind", json!("guest"));
    assert_json_path!(event, "failure_kind", json!("validation_error"));
    assert_json_path!(event["event"], "kind", json!("validation_error"));

    let response = fixture.get("/api/v1/audit?session_kind=employee").await;
    assert_json_path!(response.body, "total", json!(2));
}

#[tokio::test]
async fn test_audit_filters_failures_by_kind() {
    let fixture = TestFixture::new().await;
    fixture
        .classifier
        .push_error(ClassifierError::Timeout(Duration::from_secs(5)))
        .await;
    fixture
        .classifier
        .push_error(ClassifierError::Unavailable("connection refused".into()))
        .await;

    fixture
        .submit("Cannot access Outlook", "Error on login", "employee")
        .await;
    fixture
        .submit("Cannot access Outlook", "Error on login", "guest")
        .await;
    fixture.submit("hi", "hello", "guest").await;
    fixture.wait_for_audit_events(3).await;

    let response = fixture.get("/api/v1/audit?kind=classification_timeout").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "total", json!(1));
    assert_json_path!(response.body["events"][0], "session_kind", json!("employee"));

    let response = fixture.get("/api/v1/audit?kind=validation_error").await;
    assert_json_path!(response.body, "total", json!(1));

    let response = fixture.get("/api/v1/audit?kind=not_a_kind").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ticket_trail_is_chronological() {
    let fixture = TestFixture::new().await;
    fixture
        .classifier
        .set_result(ClassificationResult::new("network", 0.3))
        .await;

    let created = fixture
        .submit("VPN drops", "Every few minutes since Monday", "guest")
        .await;
    assert_status!(created, StatusCode::CREATED);
    fixture.wait_for_audit_events(2).await;

    let id = created.body["ticket_id"].as_str().unwrap();
    let response = fixture.get(&format!("/api/v1/tickets/{}/audit", id)).await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "ticket_id", json!(id));
    let events = response.body["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_json_path!(events[0], "event_type", json!("ticket_created"));
    assert_json_path!(events[1], "event_type", json!("ticket_escalated"));
    assert_json_path!(events[1]["event"], "reason", json!("low_confidence"));

    let missing = fixture.get("/api/v1/tickets/nope/audit").await;
    assert_status!(missing, StatusCode::NOT_FOUND);
}

// =============================================================================
// Service endpoints
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));
}

#[tokio::test]
async fn test_config_hides_api_key() {
    let fixture = TestFixture::with_config(TestConfig {
        api_key: Some("super-secret-token".to_string()),
        ..Default::default()
    })
    .await;

    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body["classifier"], "api_key_configured", json!(true));
    assert!(!response.text.contains("super-secret-token"));
    assert_json_path!(response.body["routing"], "escalation_queue", json!("triage"));
}

#[tokio::test]
async fn test_classifier_status_reports_reachability() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/classifier/status").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "classifier", json!("mock"));
    assert_json_path!(response.body, "reachable", json!(true));

    fixture.classifier.set_healthy(false);
    let response = fixture.get("/api/v1/classifier/status").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "reachable", json!(false));
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.submit("Outlook", "Login error", "employee").await;

    let response = fixture.get("/metrics").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("ticketdesk_tickets_by_queue"));
    assert!(response.text.contains("ticketdesk_submissions_total"));
    assert!(response.text.contains("ticketdesk_http_requests_total"));
}
