//! HTTP client for the inference service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::traits::{Classifier, ClassifierError, ClassifierHealth};
use crate::config::ClassifierConfig;
use crate::ticket::{ClassificationResult, Priority};

/// Classifier backed by a remote inference service.
pub struct HttpClassifier {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    labels: Vec<String>,
    timeout: Duration,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            labels: config
                .labels
                .iter()
                .map(|l| l.trim().to_ascii_lowercase())
                .collect(),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> ClassifierError {
        if e.is_timeout() {
            ClassifierError::Timeout(self.timeout)
        } else if e.is_connect() {
            ClassifierError::Unavailable(format!("connection failed: {}", e))
        } else {
            ClassifierError::Unavailable(e.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    category: String,
    #[serde(alias = "category_confidence")]
    confidence: f64,
    #[serde(default)]
    priority: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: Option<String>,
}

/// Check a decoded response against the label set and confidence range.
fn validate_response(
    labels: &[String],
    response: ClassifyResponse,
) -> Result<ClassificationResult, ClassifierError> {
    let category = response.category.trim().to_ascii_lowercase();
    if !labels.iter().any(|l| *l == category) {
        return Err(ClassifierError::MalformedResponse(format!(
            "unknown label '{}'",
            response.category
        )));
    }

    if !(0.0..=1.0).contains(&response.confidence) {
        return Err(ClassifierError::MalformedResponse(format!(
            "confidence {} outside [0, 1]",
            response.confidence
        )));
    }

    let priority = response
        .priority
        .map(|p| p.parse::<Priority>())
        .transpose()
        .map_err(ClassifierError::MalformedResponse)?;

    Ok(ClassificationResult {
        category,
        confidence: response.confidence,
        priority,
    })
}

#[async_trait]
impl Classifier for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::InvalidInput("text is empty".to_string()));
        }

        let url = format!("{}/classify", self.base_url);
        debug!(url = %url, chars = text.chars().count(), "Sending classification request");

        let response = self
            .request(self.client.post(&url))
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Classifier returned an error status");
            let message = format!("HTTP {}: {}", status, body);
            return Err(if status.is_server_error() {
                ClassifierError::Unavailable(message)
            } else {
                ClassifierError::MalformedResponse(message)
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        let parsed: ClassifyResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;

        validate_response(&self.labels, parsed)
    }

    async fn health(&self) -> Result<ClassifierHealth, ClassifierError> {
        let url = format!("{}/health", self.base_url);
        let start = Instant::now();

        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Unavailable(format!("HTTP {}", status)));
        }

        let body: HealthResponse = response.json().await.unwrap_or(HealthResponse { status: None });

        Ok(ClassifierHealth {
            status: body.status.unwrap_or_else(|| "ok".to_string()),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["email".to_string(), "network".to_string()]
    }

    fn response(category: &str, confidence: f64) -> ClassifyResponse {
        ClassifyResponse {
            category: category.to_string(),
            confidence,
            priority: None,
        }
    }

    #[test]
    fn test_new_trims_trailing_slash_and_empty_key() {
        let mut config = ClassifierConfig::new("http://127.0.0.1:8000/");
        config.api_key = Some(String::new());
        let classifier = HttpClassifier::new(&config).unwrap();
        assert_eq!(classifier.base_url, "http://127.0.0.1:8000");
        assert!(classifier.api_key.is_none());
        assert_eq!(classifier.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_validate_lowercases_label() {
        let result = validate_response(&labels(), response("Email", 0.92)).unwrap();
        assert_eq!(result.category, "email");
        assert_eq!(result.confidence, 0.92);
        assert!(result.priority.is_none());
    }

    #[test]
    fn test_validate_rejects_unknown_label() {
        let err = validate_response(&labels(), response("billing", 0.9)).unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedResponse(_)));
    }

    #[test]
    fn test_validate_rejects_out_of_range_confidence() {
        for confidence in [-0.1, 1.01, f64::NAN] {
            let err = validate_response(&labels(), response("email", confidence)).unwrap_err();
            assert!(matches!(err, ClassifierError::MalformedResponse(_)));
        }
    }

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(validate_response(&labels(), response("email", 0.0)).is_ok());
        assert!(validate_response(&labels(), response("email", 1.0)).is_ok());
    }

    #[test]
    fn test_validate_parses_priority() {
        let mut raw = response("network", 0.8);
        raw.priority = Some("High".to_string());
        let result = validate_response(&labels(), raw).unwrap();
        assert_eq!(result.priority, Some(Priority::High));

        let mut raw = response("network", 0.8);
        raw.priority = Some("whenever".to_string());
        assert!(validate_response(&labels(), raw).is_err());
    }

    #[test]
    fn test_response_accepts_category_confidence_alias() {
        let raw: ClassifyResponse =
            serde_json::from_str(r#"{"category": "email", "category_confidence": 0.7}"#).unwrap();
        assert_eq!(raw.confidence, 0.7);
    }

    #[test]
    fn test_response_missing_confidence_is_error() {
        let raw: Result<ClassifyResponse, _> = serde_json::from_str(r#"{"category": "email"}"#);
        assert!(raw.is_err());
    }

    #[tokio::test]
    async fn test_classify_rejects_blank_text() {
        let classifier = HttpClassifier::new(&ClassifierConfig::new("http://127.0.0.1:9")).unwrap();
        let err = classifier.classify("  \n\n ").await.unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidInput(_)));
    }
}
