//! Wire-level data model for the snapshot-processing pipeline
//!
//! Requests and results travel as JSON with camelCase field names, matching
//! what the upstream snapshot producers and the downstream tracker expect.
//! All of these values are request-scoped; nothing here outlives one
//! pipeline invocation.

use crate::error::PipelineError;
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One 2D coordinate of a mask outline, `[x, y]`.
pub type MaskPoint = [f64; 2];

/// Inbound analysis request from the `snapshot-requests` topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRequest {
    /// Identity of the request; echoed on the result.
    pub image_id: String,
    /// Base64-encoded image payload.
    pub image_data: String,
    /// Producer timestamp, passed through untouched for latency accounting.
    pub request_timestamp: String,
    /// Natural-language description of the object to find.
    pub prompt: String,
}

impl SnapshotRequest {
    /// Decode-check the image payload without keeping the decoded bytes.
    pub fn validate_image_payload(&self) -> Result<(), PipelineError> {
        if self.image_data.is_empty() {
            return Err(PipelineError::Unexpected(
                "request carries an empty image payload".to_string(),
            ));
        }
        general_purpose::STANDARD
            .decode(&self.image_data)
            .map_err(|e| {
                PipelineError::Unexpected(format!("image payload is not valid base64: {}", e))
            })?;
        Ok(())
    }
}

/// A candidate region proposed by the segmentation service, as an ordered
/// outline of coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateMask {
    pub points: Vec<MaskPoint>,
}

impl CandidateMask {
    pub fn new(points: Vec<MaskPoint>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Outcome of the validation stage.
///
/// Invariant: `is_found` implies `mask` is present and non-empty, and the
/// mask is one of the segmentation candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub is_found: bool,
    pub mask: Option<CandidateMask>,
}

impl Finding {
    pub fn not_found() -> Self {
        Self {
            is_found: false,
            mask: None,
        }
    }

    pub fn found(mask: CandidateMask) -> Self {
        Self {
            is_found: true,
            mask: Some(mask),
        }
    }
}

/// Outbound verdict published to the `processing-results` topic.
///
/// Exactly one of these is produced per request. `error != None` always
/// means `is_found == false` with empty coordinates, so a failed pipeline
/// can never report a false positive; the constructors below are the only
/// way results are assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub image_id: String,
    pub prompt: String,
    pub request_timestamp: String,
    pub is_found: bool,
    pub mask_coordinates: Vec<MaskPoint>,
    pub processing_timestamp: String,
    pub image_data: Option<String>,
    pub error: Option<String>,
}

impl ProcessingResult {
    /// Assemble a result from a completed pipeline run.
    ///
    /// The original image payload is echoed only on a positive finding; the
    /// downstream tracker needs the frame to initialize, and unfound results
    /// should stay small.
    pub fn from_finding(request: &SnapshotRequest, finding: &Finding) -> Self {
        let mask_coordinates = finding
            .mask
            .as_ref()
            .map(|m| m.points.clone())
            .unwrap_or_default();
        Self {
            image_id: request.image_id.clone(),
            prompt: request.prompt.clone(),
            request_timestamp: request.request_timestamp.clone(),
            is_found: finding.is_found,
            mask_coordinates,
            processing_timestamp: Utc::now().to_rfc3339(),
            image_data: finding.is_found.then(|| request.image_data.clone()),
            error: None,
        }
    }

    /// Assemble a result for a failed pipeline run.
    pub fn from_error(request: &SnapshotRequest, error: &PipelineError) -> Self {
        Self {
            image_id: request.image_id.clone(),
            prompt: request.prompt.clone(),
            request_timestamp: request.request_timestamp.clone(),
            is_found: false,
            mask_coordinates: Vec::new(),
            processing_timestamp: Utc::now().to_rfc3339(),
            image_data: None,
            error: Some(error.to_string()),
        }
    }
}
