use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("ticketdesk.db")
}

/// Inference service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// Base URL of the inference service (e.g., "http://127.0.0.1:8000")
    pub url: String,
    /// Request timeout in seconds (default: 5)
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
    /// Optional bearer token sent with each request
    #[serde(default)]
    pub api_key: Option<String>,
    /// Labels the model is allowed to return. Anything else is a malformed response.
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
}

impl ClassifierConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_classifier_timeout(),
            api_key: None,
            labels: default_labels(),
        }
    }
}

fn default_classifier_timeout() -> u64 {
    5
}

fn default_labels() -> Vec<String> {
    ["email", "network", "access", "hardware", "software", "general"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// What to do when the classifier returns a label the routing table doesn't know.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Route to the escalation queue and keep the submission successful.
    #[default]
    Escalate,
    /// Fail the submission with `UnknownCategory`.
    Reject,
}

/// Routing policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    /// Results below this confidence are escalated (0.0-1.0).
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,
    /// Human-triage queue receiving escalated tickets.
    #[serde(default = "default_escalation_queue")]
    pub escalation_queue: String,
    #[serde(default)]
    pub unknown_category: UnknownCategoryPolicy,
    /// Category -> queue table.
    #[serde(default = "default_queues")]
    pub queues: BTreeMap<String, String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_threshold(),
            escalation_queue: default_escalation_queue(),
            unknown_category: UnknownCategoryPolicy::default(),
            queues: default_queues(),
        }
    }
}

fn default_threshold() -> f64 {
    0.5
}

fn default_escalation_queue() -> String {
    "triage".to_string()
}

fn default_queues() -> BTreeMap<String, String> {
    // "general" is left unmapped on purpose: it lands in triage.
    ["email", "network", "access", "hardware", "software"]
        .iter()
        .map(|c| (c.to_string(), c.to_string()))
        .collect()
}

/// Intake validation and rule configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntakeConfig {
    #[serde(default = "default_max_title")]
    pub max_title_chars: usize,
    #[serde(default = "default_max_description")]
    pub max_description_chars: usize,
    /// Case-insensitive pattern forcing priority to critical.
    #[serde(default = "default_critical_keywords")]
    pub critical_keywords: String,
    /// Descriptions matching this pattern in full (greetings, form
    /// placeholders) are rejected as too vague.
    #[serde(default = "default_vague_descriptions")]
    pub vague_descriptions: String,
    /// Minimum characters across title and description.
    #[serde(default = "default_min_detail_chars")]
    pub min_detail_chars: usize,
    /// Minimum words of three or more characters across title and description.
    #[serde(default = "default_min_meaningful_words")]
    pub min_meaningful_words: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_title_chars: default_max_title(),
            max_description_chars: default_max_description(),
            critical_keywords: default_critical_keywords(),
            vague_descriptions: default_vague_descriptions(),
            min_detail_chars: default_min_detail_chars(),
            min_meaningful_words: default_min_meaningful_words(),
        }
    }
}

fn default_max_title() -> usize {
    200
}

fn default_max_description() -> usize {
    10_000
}

fn default_critical_keywords() -> String {
    "server down|production down|security breach|ransomware|data loss|critical error".to_string()
}

fn default_vague_descriptions() -> String {
    concat!(
        r"hi|hello|hey|good\s*(morning|afternoon|evening)|how\s*are\s*you|what'?s?\s*up|greetings|yo",
        "|description|enter description|type here|describe your issue",
    )
    .to_string()
}

fn default_min_detail_chars() -> usize {
    15
}

fn default_min_meaningful_words() -> usize {
    3
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub classifier: SanitizedClassifierConfig,
    pub routing: RoutingConfig,
    pub intake: IntakeConfig,
}

/// Sanitized classifier config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedClassifierConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub api_key_configured: bool,
    pub labels: Vec<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            classifier: SanitizedClassifierConfig {
                url: config.classifier.url.clone(),
                timeout_secs: config.classifier.timeout_secs,
                api_key_configured: config
                    .classifier
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                labels: config.classifier.labels.clone(),
            },
            routing: config.routing.clone(),
            intake: config.intake.clone(),
        }
    }
}
