//! End-to-end pipeline tests against local mock services.

use std::collections::VecDeque;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use vestia_core::ImageDescriptor;
use vestia_pipeline::{
    Acquisition, AcquisitionError, AcquisitionSource, GarmentPipeline, PipelineError,
    PipelineOutcome, PipelinePhase,
};
use vestia_remote::{ProcessingClient, RetryPolicy, StaticTokenProvider};
use vestia_storage::{LocalStore, ObjectStore, RelayConfig, StorageRelay};

// Acquisition source scripted per test.

enum Scripted {
    Image(ImageDescriptor),
    Cancelled,
    Error(String),
}

struct ScriptedSource {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicU32,
}

impl ScriptedSource {
    fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl AcquisitionSource for ScriptedSource {
    async fn acquire(&self) -> Result<Acquisition, AcquisitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Image(descriptor)) => Ok(Acquisition::Image(descriptor)),
            Some(Scripted::Cancelled) | None => Ok(Acquisition::Cancelled),
            Some(Scripted::Error(message)) => Err(AcquisitionError::Picker(message)),
        }
    }
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, 90))
        .unwrap();
    buffer.into_inner()
}

fn staged_descriptor(dir: &Path, width: u32, height: u32) -> ImageDescriptor {
    let bytes = jpeg_bytes(width, height);
    let path = dir.join(format!("staged-{}.jpg", Uuid::new_v4().simple()));
    std::fs::write(&path, &bytes).unwrap();
    ImageDescriptor {
        locator: path.clone(),
        file_name: "photo.jpg".to_string(),
        byte_size: bytes.len() as u64,
        width,
        height,
        mime_type: "image/jpeg".to_string(),
    }
}

/// Descriptor whose reported size exceeds the ceiling. The staged file is
/// tiny; validation only consults the descriptor.
fn oversized_descriptor(dir: &Path) -> ImageDescriptor {
    let mut descriptor = staged_descriptor(dir, 64, 64);
    descriptor.byte_size = 15 * 1024 * 1024;
    descriptor
}

// Mock processing service and asset host.

struct ProcessState {
    hits: AtomicU32,
    original_url: String,
    processed_url: Option<String>,
}

async fn process_handler(State(state): State<Arc<ProcessState>>) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let processed = state
        .processed_url
        .clone()
        .map(Value::String)
        .unwrap_or(Value::Null);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "originalAssetUrl": state.original_url,
                "processedAssetUrl": processed,
                "assetId": "asset-77",
                "suggestedCategory": "dress",
                "categoryConfidence": 0.91
            }
        })),
    )
}

async fn asset_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        vec![0x89u8, 0x50, 0x4E, 0x47],
    )
}

async fn spawn_asset_server() -> String {
    let app = Router::new().route("/cut.png", get(asset_handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/cut.png")
}

async fn spawn_process_server(
    original_url: String,
    processed_url: Option<String>,
) -> (String, Arc<ProcessState>) {
    let state = Arc::new(ProcessState {
        hits: AtomicU32::new(0),
        original_url,
        processed_url,
    });
    let app = Router::new()
        .route("/process", post(process_handler))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/process"), state)
}

struct Harness {
    pipeline: GarmentPipeline,
    store: Arc<LocalStore>,
    process: Arc<ProcessState>,
    _store_dir: tempfile::TempDir,
}

async fn harness(source: Arc<ScriptedSource>, fallback: bool) -> Harness {
    let asset_url = spawn_asset_server().await;
    let (endpoint, process) = if fallback {
        spawn_process_server(asset_url, None).await
    } else {
        spawn_process_server("https://cdn.vestia.app/orig.jpg".to_string(), Some(asset_url)).await
    };

    let client = ProcessingClient::new(
        reqwest::Client::new(),
        endpoint,
        Arc::new(StaticTokenProvider::new("test-token")),
        RetryPolicy::default(),
        Duration::from_secs(10),
    );

    let store_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        LocalStore::new(
            store_dir.path(),
            "http://localhost:9000/garments",
            b"test-secret".to_vec(),
        )
        .unwrap(),
    );
    let relay = StorageRelay::new(
        reqwest::Client::new(),
        store.clone(),
        RelayConfig {
            allowed_hosts: vec!["127.0.0.1".to_string()],
            allowed_content_types: vec!["image/png".to_string(), "image/jpeg".to_string()],
            signed_url_ttl: Duration::from_secs(900),
            allow_loopback_sources: true,
        },
    );

    Harness {
        pipeline: GarmentPipeline::new(source, Arc::new(client), Arc::new(relay)),
        store,
        process,
        _store_dir: store_dir,
    }
}

#[tokio::test]
async fn test_end_to_end_success() {
    let staging = tempfile::tempdir().unwrap();
    let descriptor = staged_descriptor(staging.path(), 3000, 2000);
    let scratch_path = descriptor.locator.clone();
    let source = ScriptedSource::new(vec![Scripted::Image(descriptor)]);
    let h = harness(source.clone(), false).await;

    let owner = Uuid::new_v4();
    let outcome = h.pipeline.run(owner, &CancellationToken::new()).await.unwrap();

    let PipelineOutcome::Completed { result, record } = outcome else {
        panic!("expected completion");
    };
    assert!(!result.used_fallback);
    assert_eq!(result.asset_id, "asset-77");
    assert!(record.storage_path.starts_with(&format!("{owner}/")));
    assert!(h.store.exists(&record.storage_path).await.unwrap());
    assert!(h.store.verify_signed_url(&record.signed_url));
    assert_eq!(h.process.hits.load(Ordering::SeqCst), 1);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(!scratch_path.exists(), "scratch file must be deleted");
    assert_eq!(*h.pipeline.phase_receiver().borrow(), PipelinePhase::Succeeded);
}

#[tokio::test]
async fn test_fallback_relays_original_asset() {
    let staging = tempfile::tempdir().unwrap();
    let descriptor = staged_descriptor(staging.path(), 800, 600);
    let source = ScriptedSource::new(vec![Scripted::Image(descriptor)]);
    let h = harness(source, true).await;

    let outcome = h
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap();

    let PipelineOutcome::Completed { result, record } = outcome else {
        panic!("expected completion");
    };
    assert!(result.used_fallback);
    assert!(result.processed_asset_url.is_none());
    assert!(h.store.exists(&record.storage_path).await.unwrap());
}

#[tokio::test]
async fn test_oversized_then_acceptable_reacquires() {
    let staging = tempfile::tempdir().unwrap();
    let rejected = oversized_descriptor(staging.path());
    let rejected_path = rejected.locator.clone();
    let accepted = staged_descriptor(staging.path(), 1000, 1000);
    let source = ScriptedSource::new(vec![Scripted::Image(rejected), Scripted::Image(accepted)]);
    let h = harness(source.clone(), false).await;

    let outcome = h
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(outcome, PipelineOutcome::Completed { .. }));
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert!(!rejected_path.exists(), "rejected scratch file must be deleted");
}

#[tokio::test]
async fn test_attempt_budget_exhausted_is_validation_error() {
    let staging = tempfile::tempdir().unwrap();
    let source = ScriptedSource::new(vec![
        Scripted::Image(oversized_descriptor(staging.path())),
        Scripted::Image(oversized_descriptor(staging.path())),
        Scripted::Image(oversized_descriptor(staging.path())),
    ]);
    let h = harness(source.clone(), false).await;

    let err = h
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Validation(_)));
    assert!(err.to_string().contains("MB"));
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    // Nothing was submitted for an image that never passed validation.
    assert_eq!(h.process.hits.load(Ordering::SeqCst), 0);
    assert_eq!(*h.pipeline.phase_receiver().borrow(), PipelinePhase::Failed);
}

#[tokio::test]
async fn test_single_attempt_budget_fails_with_rejection_message() {
    let staging = tempfile::tempdir().unwrap();
    let source = ScriptedSource::new(vec![
        Scripted::Image(oversized_descriptor(staging.path())),
        Scripted::Image(staged_descriptor(staging.path(), 1000, 1000)),
    ]);
    let h = harness(source.clone(), false).await;
    let pipeline = h.pipeline.with_max_acquisition_attempts(1);

    let err = pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap_err();

    // The budget of one means the acceptable second image is never requested.
    assert!(matches!(err, PipelineError::Validation(_)));
    assert!(err.to_string().contains("MB"));
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.process.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sequential_runs_each_reach_their_terminal_phase() {
    let staging = tempfile::tempdir().unwrap();
    let source = ScriptedSource::new(vec![
        Scripted::Error("camera unavailable".to_string()),
        Scripted::Image(staged_descriptor(staging.path(), 800, 600)),
    ]);
    let h = harness(source, false).await;

    h.pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(*h.pipeline.phase_receiver().borrow(), PipelinePhase::Failed);

    h.pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(*h.pipeline.phase_receiver().borrow(), PipelinePhase::Succeeded);
}

#[tokio::test]
async fn test_picker_dismissal_is_silent_cancellation() {
    let source = ScriptedSource::new(vec![Scripted::Cancelled]);
    let h = harness(source, false).await;

    let outcome = h
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(outcome, PipelineOutcome::Cancelled));
    assert_eq!(h.process.hits.load(Ordering::SeqCst), 0);
    assert_eq!(*h.pipeline.phase_receiver().borrow(), PipelinePhase::Cancelled);
}

#[tokio::test]
async fn test_picker_failure_is_acquisition_error() {
    let source = ScriptedSource::new(vec![Scripted::Error("camera unavailable".to_string())]);
    let h = harness(source, false).await;

    let err = h
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Acquisition(_)));
    assert!(err.to_string().contains("camera unavailable"));
}

#[tokio::test]
async fn test_pre_cancelled_token_short_circuits() {
    let staging = tempfile::tempdir().unwrap();
    let descriptor = staged_descriptor(staging.path(), 800, 600);
    let source = ScriptedSource::new(vec![Scripted::Image(descriptor)]);
    let h = harness(source.clone(), false).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = h.pipeline.run(Uuid::new_v4(), &cancel).await.unwrap();

    assert!(matches!(outcome, PipelineOutcome::Cancelled));
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.process.hits.load(Ordering::SeqCst), 0);
}
