//! Mock classifier for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::classifier::{Classifier, ClassifierError, ClassifierHealth};
use crate::ticket::ClassificationResult;

/// Mock implementation of the Classifier trait.
///
/// Queued outcomes are returned first, in order; once the queue is empty
/// every call returns the default result. A configured delay is applied
/// before each call resolves, which makes deadlines and cancellation
/// testable.
///
/// # Example
///
/// ```rust,ignore
/// use ticketdesk_core::testing::MockClassifier;
/// use ticketdesk_core::ClassificationResult;
///
/// let classifier = MockClassifier::returning(ClassificationResult::new("email", 0.92));
/// classifier.push_error(ClassifierError::Unavailable("down".into())).await;
///
/// assert!(classifier.classify("first").await.is_err());
/// assert_eq!(classifier.classify("second").await?.category, "email");
/// assert_eq!(classifier.call_count(), 2);
/// ```
#[derive(Debug)]
pub struct MockClassifier {
    default_result: RwLock<ClassificationResult>,
    queued: RwLock<VecDeque<Result<ClassificationResult, ClassifierError>>>,
    delay: RwLock<Option<Duration>>,
    texts: RwLock<Vec<String>>,
    calls: AtomicUsize,
    healthy: AtomicBool,
    panics: AtomicBool,
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClassifier {
    /// Create a mock that classifies everything as `email` with confidence 0.9.
    pub fn new() -> Self {
        Self::returning(ClassificationResult::new("email", 0.9))
    }

    /// Create a mock with a specific default result.
    pub fn returning(result: ClassificationResult) -> Self {
        Self {
            default_result: RwLock::new(result),
            queued: RwLock::new(VecDeque::new()),
            delay: RwLock::new(None),
            texts: RwLock::new(Vec::new()),
            calls: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
            panics: AtomicBool::new(false),
        }
    }

    /// Replace the default result.
    pub async fn set_result(&self, result: ClassificationResult) {
        *self.default_result.write().await = result;
    }

    /// Queue a result for a single upcoming call.
    pub async fn push_result(&self, result: ClassificationResult) {
        self.queued.write().await.push_back(Ok(result));
    }

    /// Queue an error for a single upcoming call.
    pub async fn push_error(&self, error: ClassifierError) {
        self.queued.write().await.push_back(Err(error));
    }

    /// Delay every call by this much.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Make every classify call panic, as a buggy classifier would.
    pub fn set_panics(&self, panics: bool) {
        self.panics.store(panics, Ordering::SeqCst);
    }

    /// Number of classify calls made, including ones still in flight.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts passed to classify, in call order.
    pub async fn recorded_texts(&self) -> Vec<String> {
        self.texts.read().await.clone()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.write().await.push(text.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.panics.load(Ordering::SeqCst) {
            panic!("mock classifier panicked on {:?}", text);
        }

        if let Some(outcome) = self.queued.write().await.pop_front() {
            return outcome;
        }

        Ok(self.default_result.read().await.clone())
    }

    async fn health(&self) -> Result<ClassifierHealth, ClassifierError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(ClassifierHealth {
                status: "ok".to_string(),
                latency_ms: 0,
            })
        } else {
            Err(ClassifierError::Unavailable("mock classifier is down".to_string()))
        }
    }
}
