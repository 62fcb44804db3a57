//! Worker configuration
//!
//! Everything is read from the environment exactly once at startup and
//! carried around as an explicit value, so components stay testable
//! without ambient state.

use serde::{Deserialize, Serialize};

/// Process-wide configuration for one worker instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Kafka bootstrap servers, `host:port[,host:port]`.
    pub kafka_bootstrap_servers: String,
    /// Topic the worker consumes analysis requests from.
    pub inbound_topic: String,
    /// Topic the worker publishes verdicts to.
    pub outbound_topic: String,
    /// Consumer group id; instances sharing it split the partition space.
    pub consumer_group: String,
    /// Segmentation service URL. Absence is fatal for any request that
    /// reaches the segmentation stage.
    pub segmentation_endpoint: Option<String>,
    /// Cloud project for the vision-language service. Absence degrades
    /// validation to always-not-found instead of halting the worker.
    pub gcp_project: Option<String>,
    /// Cloud region for the vision-language service.
    pub gcp_location: String,
    /// API key for the vision-language service.
    pub gemini_api_key: Option<String>,
    /// Model identifier asked to judge prompt/image matches.
    pub gemini_model: String,
    /// Base URL override for the vision-language service.
    pub gemini_endpoint: Option<String>,
}

impl WorkerConfig {
    /// Build the configuration from environment variables, falling back to
    /// the defaults below for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            kafka_bootstrap_servers: env_or("KAFKA_BOOTSTRAP_SERVERS", defaults.kafka_bootstrap_servers),
            inbound_topic: env_or("SNAPSHOT_REQUESTS_TOPIC", defaults.inbound_topic),
            outbound_topic: env_or("PROCESSING_RESULTS_TOPIC", defaults.outbound_topic),
            consumer_group: env_or("KAFKA_CONSUMER_GROUP", defaults.consumer_group),
            segmentation_endpoint: env_opt("SEGMENT_ANYTHING_ENDPOINT"),
            gcp_project: env_opt("GOOGLE_CLOUD_PROJECT"),
            gcp_location: env_or("GOOGLE_CLOUD_LOCATION", defaults.gcp_location),
            gemini_api_key: env_opt("GEMINI_API_KEY"),
            gemini_model: env_or("VERTEX_AI_GEMINI_ENDPOINT_ID", defaults.gemini_model),
            gemini_endpoint: env_opt("GEMINI_ENDPOINT"),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            kafka_bootstrap_servers: "localhost:9092".to_string(),
            inbound_topic: "snapshot-requests".to_string(),
            outbound_topic: "processing-results".to_string(),
            consumer_group: "processing-group".to_string(),
            segmentation_endpoint: None,
            gcp_project: None,
            gcp_location: "us-central1".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-pro-vision".to_string(),
            gemini_endpoint: None,
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default,
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
