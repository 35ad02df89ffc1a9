//! HTTP surface for ticket intake: the submission gateway, read endpoints
//! and Prometheus metrics.

pub mod api;
pub mod metrics;
pub mod state;
