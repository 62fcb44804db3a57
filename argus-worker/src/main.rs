//! Argus processing worker
//!
//! Consumes snapshot analysis requests, runs the segmentation/validation
//! pipeline, and publishes one verdict per request.

mod dispatcher;

use argus_core::WorkerConfig;
use argus_pipeline::{GeminiValidator, Orchestrator, SegmentationClient};
use dispatcher::Dispatcher;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = WorkerConfig::from_env();
    info!("🚀 Starting Argus processing worker...");

    let segmentation = match &config.segmentation_endpoint {
        Some(endpoint) => {
            info!("Segmentation endpoint: {}", endpoint);
            Some(SegmentationClient::new(endpoint.clone())?)
        }
        None => {
            warn!("SEGMENT_ANYTHING_ENDPOINT not set; every request will fail the segmentation stage");
            None
        }
    };

    if config.gcp_project.is_none() {
        warn!("GOOGLE_CLOUD_PROJECT not set; mask validation will degrade to not-found");
    }
    let validator = Arc::new(GeminiValidator::from_config(&config)?);

    let orchestrator = Orchestrator::new(segmentation, validator);
    let dispatcher = Dispatcher::new(&config, orchestrator)?;

    info!(
        "Waiting for messages on '{}' (group '{}', brokers '{}')",
        config.inbound_topic, config.consumer_group, config.kafka_bootstrap_servers
    );
    dispatcher.run().await
}
