//! HTTP client for the segmentation service
//!
//! The service takes a base64 image and proposes candidate region masks.
//! Zero masks is a valid answer ("nothing detected"); only transport
//! failures, non-2xx statuses, and unparseable bodies are errors.

use argus_core::{CandidateMask, PipelineError, Result, Stage};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Hard cap on one segmentation call so a hung service delays only the
/// current message, never the whole dispatch loop.
const SEGMENTATION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct SegmentResponse {
    #[serde(default)]
    masks: Vec<CandidateMask>,
}

/// Client for the segmentation endpoint.
pub struct SegmentationClient {
    client: Client,
    endpoint: String,
}

impl SegmentationClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(SEGMENTATION_TIMEOUT)
            .build()
            .map_err(|e| {
                PipelineError::Configuration(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Ask the service for candidate masks. Does not retry; redelivery of
    /// the whole request is the queue's job.
    pub async fn segment(&self, image_b64: &str) -> Result<Vec<CandidateMask>> {
        debug!(endpoint = %self.endpoint, "calling segmentation service");
        let payload = json!({ "image_base64": image_b64 });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PipelineError::dependency(Stage::Segmentation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::dependency(
                Stage::Segmentation,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let parsed: SegmentResponse = response.json().await.map_err(|e| {
            PipelineError::dependency(Stage::Segmentation, format!("malformed response: {}", e))
        })?;

        debug!(masks = parsed.masks.len(), "segmentation service answered");
        Ok(parsed.masks)
    }
}
