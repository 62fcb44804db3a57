//! argus-core: shared types for the Argus snapshot-processing worker
//!
//! Holds the wire-level data model (requests, masks, findings, results),
//! the pipeline error taxonomy, and the worker configuration. No I/O
//! happens in this crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::WorkerConfig;
pub use error::{PipelineError, Result, Stage};
pub use types::{CandidateMask, Finding, MaskPoint, ProcessingResult, SnapshotRequest};
