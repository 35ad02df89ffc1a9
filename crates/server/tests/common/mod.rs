//! Common test utilities for gateway tests.
//!
//! Builds an in-process router around a mock classifier, so every outcome
//! of the intake pipeline can be driven through HTTP without a running
//! inference service.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use ticketdesk_core::testing::{fixtures, MockClassifier, MockTicketStore};
use ticketdesk_core::{
    create_audit_system, AuditStore, Config, IntakeOrchestrator, SqliteAuditStore,
    SqliteTicketStore, TicketStore, UnknownCategoryPolicy,
};

/// In-process gateway with a controllable classifier.
pub struct TestFixture {
    pub router: Router,
    pub classifier: Arc<MockClassifier>,
    pub ticket_store: Arc<dyn TicketStore>,
    pub audit_store: Arc<dyn AuditStore>,
    /// Keeps the database alive for the fixture's lifetime
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

/// Knobs for building a fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Replace the SQLite ticket store with one whose inserts fail
    pub failing_store: bool,
    pub unknown_category: UnknownCategoryPolicy,
    pub api_key: Option<String>,
    pub deadline: Option<Duration>,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config: Config = fixtures::config("http://127.0.0.1:9");
        config.database.path = db_path.clone();
        config.routing.unknown_category = test_config.unknown_category;
        config.classifier.api_key = test_config.api_key;

        let audit_store: Arc<dyn AuditStore> =
            Arc::new(SqliteAuditStore::new(&db_path).expect("Failed to create audit store"));
        let ticket_store: Arc<dyn TicketStore> = if test_config.failing_store {
            Arc::new(MockTicketStore::failing())
        } else {
            Arc::new(SqliteTicketStore::new(&db_path).expect("Failed to create ticket store"))
        };

        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let classifier = Arc::new(MockClassifier::new());

        let mut intake = IntakeOrchestrator::new(
            Arc::clone(&classifier) as _,
            Arc::clone(&ticket_store),
            &config.routing,
            &config.intake,
        )
        .expect("Failed to create orchestrator")
        .with_audit(audit_handle);
        if let Some(deadline) = test_config.deadline {
            intake = intake.with_deadline(deadline);
        }

        let state = Arc::new(ticketdesk_server::state::AppState::new(
            config,
            Arc::new(intake),
            Arc::clone(&ticket_store),
            Arc::clone(&audit_store),
        ));

        let router = ticketdesk_server::api::create_router(state);

        Self {
            router,
            classifier,
            ticket_store,
            audit_store,
            temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let bytes = serde_json::to_vec(&body).unwrap();
        self.request("POST", path, Some(bytes)).await
    }

    /// POST a raw body (for malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request("POST", path, Some(body.as_bytes().to_vec()))
            .await
    }

    /// Submit a ticket.
    pub async fn submit(&self, title: &str, description: &str, session_kind: &str) -> TestResponse {
        self.post(
            "/api/v1/tickets",
            serde_json::json!({
                "title": title,
                "description": description,
                "session_kind": session_kind,
            }),
        )
        .await
    }

    /// Wait until the audit writer has caught up to `count` events.
    pub async fn wait_for_audit_events(&self, count: i64) {
        let query = ticketdesk_core::AuditQuery::new();
        for _ in 0..50 {
            if self.audit_store.count(&query).unwrap_or(0) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn request(&self, method: &str, path: &str, body: Option<Vec<u8>>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        let body = match body {
            Some(bytes) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
