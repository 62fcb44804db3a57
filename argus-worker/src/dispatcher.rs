//! Kafka dispatch loop
//!
//! One message at a time: consume, run the pipeline, publish the result,
//! then commit the inbound offset. Publish-then-commit gives at-least-once
//! delivery; downstream consumers key duplicates by `imageId`. Because
//! there is no intra-process concurrency, outbound results leave in the
//! same order their requests arrived.

use anyhow::{anyhow, Context};
use argus_core::{SnapshotRequest, WorkerConfig};
use argus_pipeline::Orchestrator;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tracing::{error, info, warn};

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Dispatcher {
    consumer: StreamConsumer,
    producer: FutureProducer,
    orchestrator: Orchestrator,
    outbound_topic: String,
}

impl Dispatcher {
    pub fn new(config: &WorkerConfig, orchestrator: Orchestrator) -> anyhow::Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_bootstrap_servers)
            .set("group.id", &config.consumer_group)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .create()
            .context("failed to create Kafka consumer")?;
        consumer
            .subscribe(&[&config.inbound_topic])
            .with_context(|| format!("failed to subscribe to '{}'", config.inbound_topic))?;

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_bootstrap_servers)
            .set("message.timeout.ms", "30000")
            .create()
            .context("failed to create Kafka producer")?;

        Ok(Self {
            consumer,
            producer,
            orchestrator,
            outbound_topic: config.outbound_topic.clone(),
        })
    }

    /// Run until a shutdown signal arrives. The in-flight message always
    /// reaches a terminal state before the loop stops reading.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Registered once so a signal arriving mid-message is not lost
        // between loop iterations.
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown signal received, stopping message intake");
                    return Ok(());
                }
                received = self.consumer.recv() => {
                    match received {
                        Ok(message) => {
                            if let Err(e) = self.handle(&message).await {
                                // Offset stays uncommitted; the queue redelivers.
                                error!("failed to handle message: {}", e);
                            }
                        }
                        Err(e) => {
                            error!("Kafka receive error: {}", e);
                        }
                    }
                }
            }
        }
    }

    async fn handle(&self, message: &BorrowedMessage<'_>) -> anyhow::Result<()> {
        let payload = message.payload().unwrap_or_default();

        match serde_json::from_slice::<SnapshotRequest>(payload) {
            Ok(request) => {
                let result = self.orchestrator.process(&request).await;
                let body = serde_json::to_vec(&result)
                    .context("failed to serialize processing result")?;

                self.producer
                    .send(
                        FutureRecord::to(&self.outbound_topic)
                            .key(result.image_id.as_str())
                            .payload(&body),
                        PUBLISH_TIMEOUT,
                    )
                    .await
                    .map_err(|(e, _)| anyhow!("failed to publish result: {}", e))?;

                info!(
                    image_id = %result.image_id,
                    is_found = result.is_found,
                    topic = %self.outbound_topic,
                    "published result"
                );
            }
            Err(e) => {
                // No imageId to answer to, and an unparseable message would
                // wedge the partition if redelivered forever. Skip it.
                warn!("skipping malformed request message: {}", e);
            }
        }

        self.consumer
            .commit_message(message, CommitMode::Async)
            .context("failed to commit inbound offset")?;
        Ok(())
    }
}
