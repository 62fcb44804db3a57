//! Per-request pipeline orchestration
//!
//! State machine: `Started -> Segmented -> Validated -> Done`, with a
//! terminal `Failed` reachable from `Started` or `Segmented`. The
//! orchestrator is a total function from request to result: success,
//! partial data, and dependency failure all yield exactly one
//! `ProcessingResult`, and nothing propagates past its boundary.

use crate::segmentation::SegmentationClient;
use crate::validation::Validator;
use argus_core::{Finding, PipelineError, ProcessingResult, Result, SnapshotRequest};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Where a request currently is in its pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Started,
    Segmented,
    Validated,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Started => "started",
            PipelineState::Segmented => "segmented",
            PipelineState::Validated => "validated",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Runs the two-stage pipeline for one request at a time.
pub struct Orchestrator {
    segmentation: Option<SegmentationClient>,
    validator: Arc<dyn Validator>,
}

impl Orchestrator {
    /// `segmentation` is `None` when the endpoint is unconfigured; every
    /// request then fails the segmentation stage with a configuration
    /// error rather than crashing the worker.
    pub fn new(segmentation: Option<SegmentationClient>, validator: Arc<dyn Validator>) -> Self {
        Self {
            segmentation,
            validator,
        }
    }

    /// Process one request to a terminal state. Never fails outward.
    pub async fn process(&self, request: &SnapshotRequest) -> ProcessingResult {
        info!(image_id = %request.image_id, prompt = %request.prompt, "processing request");
        match self.run(request).await {
            Ok(finding) => {
                debug!(image_id = %request.image_id, state = %PipelineState::Done, "pipeline finished");
                info!(
                    image_id = %request.image_id,
                    is_found = finding.is_found,
                    "request processed"
                );
                ProcessingResult::from_finding(request, &finding)
            }
            Err(err) => {
                error!(image_id = %request.image_id, state = %PipelineState::Failed, "pipeline failed: {}", err);
                ProcessingResult::from_error(request, &err)
            }
        }
    }

    async fn run(&self, request: &SnapshotRequest) -> Result<Finding> {
        let mut state = PipelineState::Started;
        debug!(image_id = %request.image_id, %state, "pipeline run");
        request.validate_image_payload()?;

        let segmentation = self.segmentation.as_ref().ok_or_else(|| {
            PipelineError::Configuration("SEGMENT_ANYTHING_ENDPOINT is not configured".to_string())
        })?;

        let mut candidates = segmentation.segment(&request.image_data).await?;
        // A degenerate service answer may include masks with no coordinates;
        // those can never be reported as a find, so they are not candidates.
        candidates.retain(|mask| !mask.is_empty());
        state = PipelineState::Segmented;
        debug!(image_id = %request.image_id, %state, masks = candidates.len(), "segmentation complete");

        // Nothing detected is a valid terminal outcome; the validation
        // stage is never invoked for an empty candidate set.
        if candidates.is_empty() {
            info!(image_id = %request.image_id, "no masks returned by segmentation");
            return Ok(Finding::not_found());
        }

        let finding = self
            .validator
            .select(&request.prompt, &request.image_data, &candidates)
            .await?;
        state = PipelineState::Validated;
        debug!(image_id = %request.image_id, %state, is_found = finding.is_found, "validation complete");

        Ok(finding)
    }
}
