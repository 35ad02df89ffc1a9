use super::{types::Config, ConfigError};

/// Upper bound for the classifier timeout, in seconds.
const MAX_CLASSIFIER_TIMEOUT_SECS: u64 = 120;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Classifier URL is http(s), timeout is bounded, label set is non-empty
/// - Routing threshold is within [0, 1] and every queue name is non-empty
/// - Every routed category is a label the classifier can return
/// - The critical keyword and vague description patterns compile
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let classifier = &config.classifier;
    if !(classifier.url.starts_with("http://") || classifier.url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "classifier.url must be an http(s) URL, got '{}'",
            classifier.url
        )));
    }

    if classifier.timeout_secs == 0 || classifier.timeout_secs > MAX_CLASSIFIER_TIMEOUT_SECS {
        return Err(ConfigError::ValidationError(format!(
            "classifier.timeout_secs must be between 1 and {}",
            MAX_CLASSIFIER_TIMEOUT_SECS
        )));
    }

    if classifier.labels.is_empty() {
        return Err(ConfigError::ValidationError(
            "classifier.labels cannot be empty".to_string(),
        ));
    }

    let routing = &config.routing;
    if !(0.0..=1.0).contains(&routing.confidence_threshold) {
        return Err(ConfigError::ValidationError(
            "routing.confidence_threshold must be between 0.0 and 1.0".to_string(),
        ));
    }

    if routing.escalation_queue.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "routing.escalation_queue cannot be empty".to_string(),
        ));
    }

    for (category, queue) in &routing.queues {
        if queue.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "routing.queues.{} has an empty queue name",
                category
            )));
        }
        if !classifier
            .labels
            .iter()
            .any(|label| label.eq_ignore_ascii_case(category))
        {
            return Err(ConfigError::ValidationError(format!(
                "routing.queues.{} is not one of classifier.labels",
                category
            )));
        }
    }

    regex_lite::Regex::new(&format!("(?i){}", config.intake.critical_keywords)).map_err(|e| {
        ConfigError::ValidationError(format!("intake.critical_keywords is not a valid pattern: {}", e))
    })?;

    crate::intake::DetailRule::from_config(&config.intake)?;

    Ok(())
}
