//! argus-pipeline: the per-request orchestration core
//!
//! One inbound request is turned into exactly one verdict by two stages
//! run in order: a segmentation service proposes candidate masks, then a
//! vision-language model judges whether the prompted object is present
//! and one mask is selected. Dependency failures are classified and
//! contained here; nothing escapes the orchestrator boundary.

pub mod orchestrator;
pub mod segmentation;
pub mod validation;

pub use orchestrator::{Orchestrator, PipelineState};
pub use segmentation::SegmentationClient;
pub use validation::{GeminiValidator, Validator};
