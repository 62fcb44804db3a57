//! End-to-end pipeline scenarios against mocked inference services.

use argus_core::{Finding, SnapshotRequest, WorkerConfig};
use argus_pipeline::{GeminiValidator, Orchestrator, SegmentationClient, Validator};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;

fn request(image_id: &str, prompt: &str) -> SnapshotRequest {
    SnapshotRequest {
        image_id: image_id.to_string(),
        image_data: general_purpose::STANDARD.encode(b"jpeg-frame-bytes"),
        request_timestamp: "T0".to_string(),
        prompt: prompt.to_string(),
    }
}

async fn segmentation_server(body: serde_json::Value) -> (mockito::ServerGuard, SegmentationClient) {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/segment")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;
    let client = SegmentationClient::new(format!("{}/segment", server.url())).unwrap();
    (server, client)
}

async fn gemini_server(answer: &str) -> mockito::ServerGuard {
    let mut server = mockito::Server::new_async().await;
    server
        .mock(
            "POST",
            mockito::Matcher::Regex(r"^/models/.*:generateContent".to_string()),
        )
        .with_status(200)
        .with_body(
            json!({
                "candidates": [{ "content": { "parts": [{ "text": answer }] } }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
}

fn gemini_validator(base_url: String) -> Arc<dyn Validator> {
    let config = WorkerConfig {
        gcp_project: Some("test-project".to_string()),
        gemini_api_key: Some("test-key".to_string()),
        gemini_endpoint: Some(base_url),
        ..WorkerConfig::default()
    };
    Arc::new(GeminiValidator::from_config(&config).unwrap())
}

#[tokio::test]
async fn found_scenario_selects_first_mask_and_echoes_frame() {
    let (_seg_server, seg_client) = segmentation_server(json!({
        "masks": [[[10.0, 20.0], [30.0, 40.0], [50.0, 60.0]], [[1.0, 1.0], [2.0, 2.0]]]
    }))
    .await;
    let gemini = gemini_server("Yes, there is a person near the left edge.").await;
    let orchestrator = Orchestrator::new(Some(seg_client), gemini_validator(gemini.url()));

    let req = request("img-1", "person");
    let result = orchestrator.process(&req).await;

    assert_eq!(result.image_id, "img-1");
    assert!(result.is_found);
    assert_eq!(
        result.mask_coordinates,
        vec![[10.0, 20.0], [30.0, 40.0], [50.0, 60.0]]
    );
    assert_eq!(result.image_data.as_deref(), Some(req.image_data.as_str()));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn zero_masks_scenario_is_clean_not_found() {
    let (_seg_server, seg_client) = segmentation_server(json!({ "masks": [] })).await;
    // Validation endpoint deliberately unreachable; it must not be called.
    let orchestrator = Orchestrator::new(
        Some(seg_client),
        gemini_validator("http://127.0.0.1:1".to_string()),
    );

    let result = orchestrator.process(&request("img-1", "person")).await;

    assert!(!result.is_found);
    assert!(result.mask_coordinates.is_empty());
    assert!(result.image_data.is_none());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn coordinate_less_mask_never_yields_a_positive_verdict() {
    // Degenerate but well-formed service answer: one mask, zero points.
    // Even an affirming model must not produce isFound=true with empty
    // maskCoordinates.
    let (_seg_server, seg_client) = segmentation_server(json!({ "masks": [[]] })).await;
    let gemini = gemini_server("Yes, clearly visible.").await;
    let orchestrator = Orchestrator::new(Some(seg_client), gemini_validator(gemini.url()));

    let result = orchestrator.process(&request("img-7", "person")).await;

    assert!(!result.is_found);
    assert!(result.mask_coordinates.is_empty());
    assert!(result.image_data.is_none());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn negative_model_answer_is_not_found_without_error() {
    let (_seg_server, seg_client) =
        segmentation_server(json!({ "masks": [[[1.0, 1.0], [2.0, 2.0]]] })).await;
    let gemini = gemini_server("No").await;
    let orchestrator = Orchestrator::new(Some(seg_client), gemini_validator(gemini.url()));

    let result = orchestrator.process(&request("img-2", "red car")).await;

    assert!(!result.is_found);
    assert!(result.error.is_none());
    assert!(result.image_data.is_none());
}

#[tokio::test]
async fn segmentation_outage_yields_stage_tagged_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/segment")
        .with_status(500)
        .with_body("model crashed")
        .create_async()
        .await;
    let seg_client = SegmentationClient::new(format!("{}/segment", server.url())).unwrap();
    let orchestrator = Orchestrator::new(
        Some(seg_client),
        gemini_validator("http://127.0.0.1:1".to_string()),
    );

    let result = orchestrator.process(&request("img-3", "person")).await;

    assert!(!result.is_found);
    assert!(result.mask_coordinates.is_empty());
    assert!(result.image_data.is_none());
    let message = result.error.expect("error must be reported");
    assert!(message.contains("segmentation"));
}

#[tokio::test]
async fn unconfigured_validation_degrades_softly() {
    let (_seg_server, seg_client) =
        segmentation_server(json!({ "masks": [[[1.0, 1.0], [2.0, 2.0]]] })).await;
    // Default config: no cloud project, validation disabled.
    let validator = Arc::new(GeminiValidator::from_config(&WorkerConfig::default()).unwrap());
    let orchestrator = Orchestrator::new(Some(seg_client), validator);

    let result = orchestrator.process(&request("img-4", "person")).await;

    assert!(!result.is_found);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn every_request_gets_exactly_one_result_with_matching_identity() {
    let (_seg_server, seg_client) = segmentation_server(json!({ "masks": [] })).await;
    let orchestrator = Orchestrator::new(
        Some(seg_client),
        Arc::new(GeminiValidator::from_config(&WorkerConfig::default()).unwrap()),
    );

    for (id, prompt) in [("a", "person"), ("b", "red car"), ("c", "bicycle")] {
        let result = orchestrator.process(&request(id, prompt)).await;
        assert_eq!(result.image_id, id);
        assert_eq!(result.prompt, prompt);
        assert!(!result.processing_timestamp.is_empty());
    }
}

#[tokio::test]
async fn result_finding_invariant_holds() {
    // isFound implies a non-empty mask drawn from the candidates.
    let candidates = json!({ "masks": [[[7.0, 8.0], [9.0, 10.0]]] });
    let (_seg_server, seg_client) = segmentation_server(candidates).await;
    let gemini = gemini_server("yes").await;
    let orchestrator = Orchestrator::new(Some(seg_client), gemini_validator(gemini.url()));

    let result = orchestrator.process(&request("img-5", "dog")).await;

    assert!(result.is_found);
    assert!(!result.mask_coordinates.is_empty());
    assert!(result.image_data.is_some());
    assert!(result.error.is_none());
}

#[derive(Clone)]
struct AlwaysFound;

#[async_trait::async_trait]
impl Validator for AlwaysFound {
    async fn select(
        &self,
        _prompt: &str,
        _image_b64: &str,
        candidates: &[argus_core::CandidateMask],
    ) -> argus_core::Result<Finding> {
        Ok(Finding::found(candidates[0].clone()))
    }
}

#[tokio::test]
async fn outbound_wire_format_matches_downstream_contract() {
    let (_seg_server, seg_client) =
        segmentation_server(json!({ "masks": [[[1.5, 2.5], [3.5, 4.5]]] })).await;
    let orchestrator = Orchestrator::new(Some(seg_client), Arc::new(AlwaysFound));

    let result = orchestrator.process(&request("img-6", "person")).await;
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["imageId"], "img-6");
    assert_eq!(value["prompt"], "person");
    assert_eq!(value["requestTimestamp"], "T0");
    assert_eq!(value["isFound"], true);
    assert_eq!(value["maskCoordinates"], json!([[1.5, 2.5], [3.5, 4.5]]));
    assert!(value["processingTimestamp"].is_string());
    assert!(value["imageData"].is_string());
    assert!(value["error"].is_null());
}
