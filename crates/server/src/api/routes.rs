use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{audit, classifier, handlers, middleware::metrics_middleware, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Tickets
        .route(
            "/tickets",
            get(tickets::list_tickets).post(tickets::submit_ticket),
        )
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/tickets/{id}/audit", get(audit::ticket_trail))
        // Inference service
        .route("/classifier/status", get(classifier::get_status));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        // Applied innermost-first: CORS is outermost, then trace, then metrics.
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
