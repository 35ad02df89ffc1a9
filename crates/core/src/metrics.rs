//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Intake (submissions by result, escalations)
//! - Classifier (request latency, errors, confidence distribution)
//!
//! The server registers everything returned by [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Intake Metrics
// =============================================================================

/// Submissions total by result.
pub static SUBMISSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ticketdesk_submissions_total", "Total ticket submissions"),
        &["result"], // "created" or an error kind
    )
    .unwrap()
});

/// Escalations total by reason.
pub static ESCALATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_escalations_total",
            "Tickets routed to the escalation queue",
        ),
        &["reason"], // "low_confidence", "unknown_category"
    )
    .unwrap()
});

// =============================================================================
// Classifier Metrics
// =============================================================================

/// Classifier request duration in seconds.
pub static CLASSIFIER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ticketdesk_classifier_request_duration_seconds",
            "Duration of classifier requests",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["outcome"], // "success", "error"
    )
    .unwrap()
});

/// Classifier errors total by kind.
pub static CLASSIFIER_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ticketdesk_classifier_errors_total", "Classifier errors"),
        &["kind"],
    )
    .unwrap()
});

/// Confidence of successful classifications.
pub static CLASSIFICATION_CONFIDENCE: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "ticketdesk_classification_confidence",
            "Distribution of classifier confidence scores",
        )
        .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 0.95, 1.0]),
    )
    .unwrap()
});

/// All core metrics, for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SUBMISSIONS_TOTAL.clone()),
        Box::new(ESCALATIONS_TOTAL.clone()),
        Box::new(CLASSIFIER_DURATION.clone()),
        Box::new(CLASSIFIER_ERRORS.clone()),
        Box::new(CLASSIFICATION_CONFIDENCE.clone()),
    ]
}
