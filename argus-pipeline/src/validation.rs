//! Validation stage: vision-language match and mask selection
//!
//! The model is shown the frame and asked whether the prompted object is
//! in it. Validation is best-effort enrichment: an unconfigured service
//! degrades to "not found" with a warning instead of failing the
//! pipeline. Only transport/protocol failures of a real remote call are
//! dependency errors.

use argus_core::{CandidateMask, Finding, PipelineError, Result, Stage, WorkerConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const VALIDATION_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";

/// Decides whether the prompted object is present and which candidate
/// mask answers the request.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Judge `prompt` against the image and pick exactly one candidate on
    /// a positive finding. Must be deterministic for a fixed model answer.
    async fn select(
        &self,
        prompt: &str,
        image_b64: &str,
        candidates: &[CandidateMask],
    ) -> Result<Finding>;
}

/// Validator backed by a Gemini-style multimodal endpoint.
pub struct GeminiValidator {
    client: Client,
    project: Option<String>,
    location: String,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiValidator {
    pub fn from_config(config: &WorkerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(VALIDATION_TIMEOUT)
            .build()
            .map_err(|e| {
                PipelineError::Configuration(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            project: config.gcp_project.clone(),
            location: config.gcp_location.clone(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config
                .gemini_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    fn is_configured(&self) -> bool {
        self.project.is_some() && self.api_key.is_some()
    }

    async fn ask_model(&self, prompt: &str, image_b64: &str) -> Result<bool> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PipelineError::Configuration("GEMINI_API_KEY is not set".to_string()))?;

        let question = format!(
            "Does this image contain a {}? Answer with a single word: yes or no.",
            prompt
        );
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": question },
                    { "inline_data": { "mime_type": "image/jpeg", "data": image_b64 } }
                ]
            }]
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::dependency(Stage::Validation, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::dependency(
                Stage::Validation,
                format!("HTTP {}: {}", status, text),
            ));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            PipelineError::dependency(Stage::Validation, format!("malformed response: {}", e))
        })?;

        let answer = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        debug!(%answer, "vision-language model answered");
        Ok(answer.starts_with("yes"))
    }
}

#[async_trait]
impl Validator for GeminiValidator {
    async fn select(
        &self,
        prompt: &str,
        image_b64: &str,
        candidates: &[CandidateMask],
    ) -> Result<Finding> {
        // No point asking which of zero masks matches.
        if candidates.is_empty() {
            return Ok(Finding::not_found());
        }

        if !self.is_configured() {
            warn!(
                project = self.project.as_deref().unwrap_or("<unset>"),
                location = %self.location,
                "vision-language service not configured, skipping mask validation"
            );
            return Ok(Finding::not_found());
        }

        if self.ask_model(prompt, image_b64).await? {
            // Deterministic single selection: the first candidate. Ranking
            // among candidates is the validator's seam for a smarter policy.
            Ok(Finding::found(candidates[0].clone()))
        } else {
            Ok(Finding::not_found())
        }
    }
}
