use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::ticket::ClassificationResult;

/// Separator placed between title and description before classification.
pub const TEXT_SEPARATOR: &str = "\n\n";

/// Build the text sent to the classifier from a submission's fields.
pub fn combine_text(title: &str, description: &str) -> String {
    format!("{}{}{}", title, TEXT_SEPARATOR, description)
}

/// Error type for classifier operations.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Classifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed classifier response: {0}")]
    MalformedResponse(String),
}

/// Result of probing the inference service.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierHealth {
    /// Status reported by the service ("ok" when it doesn't say).
    pub status: String,
    /// Round-trip time of the health check.
    pub latency_ms: u64,
}

/// Trait for ticket classifiers.
///
/// Implementations must not return a result outside their label set or with a
/// confidence outside [0, 1]; such responses are reported as
/// [`ClassifierError::MalformedResponse`].
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifier name for logs and status output.
    fn name(&self) -> &str;

    /// Classify the combined ticket text.
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifierError>;

    /// Check that the backing service is reachable.
    async fn health(&self) -> Result<ClassifierHealth, ClassifierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_text_joins_with_separator() {
        assert_eq!(
            combine_text("Cannot access Outlook", "Error on login"),
            "Cannot access Outlook\n\nError on login"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ClassifierError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Classifier timed out after 5s");

        let err = ClassifierError::MalformedResponse("missing field `category`".to_string());
        assert!(err.to_string().contains("missing field"));
    }
}
