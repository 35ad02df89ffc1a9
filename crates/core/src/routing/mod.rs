//! Queue routing.
//!
//! Routing is a pure function of a classification result and the table built
//! from configuration. No I/O, no clock, no randomness.

use std::collections::HashMap;

use crate::config::RoutingConfig;
use crate::ticket::{ClassificationResult, EscalationReason, RoutingDecision};

/// Maps classification results to destination queues.
#[derive(Debug, Clone)]
pub struct Router {
    threshold: f64,
    escalation_queue: String,
    queues: HashMap<String, String>,
}

impl Router {
    pub fn new(
        threshold: f64,
        escalation_queue: impl Into<String>,
        queues: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            threshold,
            escalation_queue: escalation_queue.into(),
            queues: queues
                .into_iter()
                .map(|(category, queue)| (category.to_ascii_lowercase(), queue))
                .collect(),
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(
            config.confidence_threshold,
            config.escalation_queue.clone(),
            config.queues.clone(),
        )
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn escalation_queue(&self) -> &str {
        &self.escalation_queue
    }

    /// Queue for a category, if the table has one.
    pub fn queue_for(&self, category: &str) -> Option<&str> {
        self.queues.get(category).map(String::as_str)
    }

    /// Decide where a classified ticket goes.
    ///
    /// Low confidence wins over an unknown category. A confidence that is not
    /// a number never clears the threshold.
    pub fn route(&self, result: &ClassificationResult) -> RoutingDecision {
        // Written as a negation so NaN escalates.
        if !(result.confidence >= self.threshold) {
            return RoutingDecision::escalate(
                self.escalation_queue.clone(),
                EscalationReason::LowConfidence,
            );
        }

        match self.queue_for(&result.category) {
            Some(queue) => RoutingDecision::to_queue(queue),
            None => RoutingDecision::escalate(
                self.escalation_queue.clone(),
                EscalationReason::UnknownCategory,
            ),
        }
    }
}
