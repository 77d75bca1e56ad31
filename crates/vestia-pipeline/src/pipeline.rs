//! Capture-to-storage orchestration.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use vestia_core::constants::MAX_ACQUISITION_ATTEMPTS;
use vestia_core::{ErrorCode, PipelineConfig, ProcessingError, ProcessingResult, StorageRecord};
use vestia_processing::{compress, encode_payload, AcquisitionValidator, CompressionSettings};
use vestia_remote::{GarmentSubmission, ProcessingClient, TokenProvider};
use vestia_storage::{LocalStore, RelayConfig, RelayError, StorageRelay};

use crate::acquisition::{Acquisition, AcquisitionSource};

/// Observable stage of a pipeline run. Exactly one phase is current at any
/// time; `phase_receiver` lets a frontend mirror it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    Acquiring,
    Validating,
    Compressing,
    Encoding,
    Requesting,
    Relaying,
    Succeeded,
    Failed,
    Cancelled,
}

impl PipelinePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelinePhase::Idle => "idle",
            PipelinePhase::Acquiring => "acquiring",
            PipelinePhase::Validating => "validating",
            PipelinePhase::Compressing => "compressing",
            PipelinePhase::Encoding => "encoding",
            PipelinePhase::Requesting => "requesting",
            PipelinePhase::Relaying => "relaying",
            PipelinePhase::Succeeded => "succeeded",
            PipelinePhase::Failed => "failed",
            PipelinePhase::Cancelled => "cancelled",
        }
    }
}

/// Terminal outcome of one run. Cancellation is a first-class outcome, not
/// an error: nothing went wrong, the user changed their mind.
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed {
        result: ProcessingResult,
        record: StorageRecord,
    },
    Cancelled,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Acquisition failed: {0}")]
    Acquisition(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Deletes the acquired scratch file when the run ends, on every exit path.
struct ScratchFile {
    path: PathBuf,
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %self.path.display(), error = %e, "Scratch cleanup failed");
            }
        }
    }
}

/// One capture-to-storage pipeline.
///
/// All collaborators are injected. A single instance serves many runs, one
/// at a time; each [`run`](Self::run) is independent and carries its own
/// cancellation token. The phase channel mirrors the most recently started
/// run, so concurrent runs need their own pipeline instances for their
/// phases to stay distinguishable.
pub struct GarmentPipeline {
    source: Arc<dyn AcquisitionSource>,
    validator: AcquisitionValidator,
    client: Arc<ProcessingClient>,
    relay: Arc<StorageRelay>,
    compression: CompressionSettings,
    max_acquisition_attempts: u32,
    phase: watch::Sender<PipelinePhase>,
}

impl GarmentPipeline {
    pub fn new(
        source: Arc<dyn AcquisitionSource>,
        client: Arc<ProcessingClient>,
        relay: Arc<StorageRelay>,
    ) -> Self {
        let (phase, _) = watch::channel(PipelinePhase::Idle);
        Self {
            source,
            validator: AcquisitionValidator::default(),
            client,
            relay,
            compression: CompressionSettings::SUBMISSION,
            max_acquisition_attempts: MAX_ACQUISITION_ATTEMPTS,
            phase,
        }
    }

    /// Wire the full production stack from configuration: local object
    /// store, relay, and processing client.
    pub fn from_config(
        config: &PipelineConfig,
        source: Arc<dyn AcquisitionSource>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, PipelineError> {
        let client = ProcessingClient::from_config(config, tokens)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let store = LocalStore::new(
            &config.storage_path,
            &config.storage_base_url,
            config.url_signing_secret.as_bytes().to_vec(),
        )
        .map_err(|e| PipelineError::Config(e.to_string()))?;
        let relay = StorageRelay::new(
            reqwest::Client::new(),
            Arc::new(store),
            RelayConfig::from_pipeline_config(config),
        );

        let mut pipeline = Self::new(source, Arc::new(client), Arc::new(relay));
        pipeline.validator = AcquisitionValidator::new(config.max_image_bytes);
        Ok(pipeline)
    }

    pub fn with_compression(mut self, settings: CompressionSettings) -> Self {
        self.compression = settings;
        self
    }

    pub fn with_max_acquisition_attempts(mut self, attempts: u32) -> Self {
        self.max_acquisition_attempts = attempts.max(1);
        self
    }

    /// Watch the current phase of this instance's active run. Receivers see
    /// every terminal phase and may miss intermediate ones under load, which
    /// is fine for a progress UI.
    pub fn phase_receiver(&self) -> watch::Receiver<PipelinePhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, phase: PipelinePhase) {
        tracing::debug!(phase = phase.as_str(), "Pipeline phase");
        self.phase.send_replace(phase);
    }

    /// Execute one capture-to-storage run for `owner_id`.
    ///
    /// After the token fires no stage starts new I/O; the run lands on
    /// [`PipelineOutcome::Cancelled`] at the next stage boundary, or earlier
    /// if the remote client observes the token mid-flight.
    pub async fn run(
        &self,
        owner_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, PipelineError> {
        match self.run_inner(owner_id, cancel).await {
            Ok(PipelineOutcome::Completed { result, record }) => {
                self.set_phase(PipelinePhase::Succeeded);
                Ok(PipelineOutcome::Completed { result, record })
            }
            Ok(PipelineOutcome::Cancelled) => {
                self.set_phase(PipelinePhase::Cancelled);
                tracing::info!(%owner_id, "Pipeline run cancelled");
                Ok(PipelineOutcome::Cancelled)
            }
            Err(e) => {
                self.set_phase(PipelinePhase::Failed);
                tracing::warn!(%owner_id, error = %e, "Pipeline run failed");
                Err(e)
            }
        }
    }

    async fn run_inner(
        &self,
        owner_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, PipelineError> {
        let Some(descriptor) = self.acquire_validated(cancel).await? else {
            return Ok(PipelineOutcome::Cancelled);
        };
        let _scratch = ScratchFile {
            path: descriptor.locator.clone(),
        };

        if cancel.is_cancelled() {
            return Ok(PipelineOutcome::Cancelled);
        }

        self.set_phase(PipelinePhase::Compressing);
        let raw = tokio::fs::read(&descriptor.locator)
            .await
            .map_err(|e| PipelineError::Acquisition(format!("Could not read staged image: {e}")))?;
        let compressed = compress(&raw, self.compression);
        if compressed.passed_through && !self.validator.validate_size(compressed.data.len() as u64)
        {
            return Err(PipelineError::Validation(
                "Image could not be re-encoded and exceeds the size limit as-is".to_string(),
            ));
        }

        if cancel.is_cancelled() {
            return Ok(PipelineOutcome::Cancelled);
        }

        self.set_phase(PipelinePhase::Encoding);
        let submission = GarmentSubmission {
            payload: encode_payload(&compressed.data),
            owner_id,
            mime_type: compressed.content_type(&descriptor.mime_type).to_string(),
        };

        self.set_phase(PipelinePhase::Requesting);
        let result = match self.client.submit(&submission, cancel).await {
            Ok(result) => result,
            Err(e) if e.code == ErrorCode::Cancelled => return Ok(PipelineOutcome::Cancelled),
            Err(e) => return Err(e.into()),
        };

        if cancel.is_cancelled() {
            return Ok(PipelineOutcome::Cancelled);
        }

        self.set_phase(PipelinePhase::Relaying);
        let storage_path = self.relay.relay(result.usable_asset_url(), owner_id).await?;
        let record = match self.relay.mint_signed_url(&storage_path).await {
            Ok(record) => record,
            Err(e) => {
                // The object is already durable; do not leave it orphaned.
                self.relay.remove_quietly(&storage_path).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            %owner_id,
            asset_id = result.asset_id,
            storage_path = record.storage_path,
            used_fallback = result.used_fallback,
            "Pipeline run completed"
        );
        Ok(PipelineOutcome::Completed { result, record })
    }

    /// Acquire until a descriptor passes validation, the attempt budget is
    /// spent, or the user backs out. Recoverable rejections re-invoke the
    /// source; their scratch files are deleted before the next attempt.
    async fn acquire_validated(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<vestia_core::ImageDescriptor>, PipelineError> {
        let mut last_rejection = "The selected image was rejected".to_string();

        for attempt in 1..=self.max_acquisition_attempts {
            if cancel.is_cancelled() {
                return Ok(None);
            }

            self.set_phase(PipelinePhase::Acquiring);
            let descriptor = match self.source.acquire().await {
                Ok(Acquisition::Image(descriptor)) => descriptor,
                Ok(Acquisition::Cancelled) => return Ok(None),
                Err(e) => return Err(PipelineError::Acquisition(e.to_string())),
            };

            self.set_phase(PipelinePhase::Validating);
            match self.validator.validate(&descriptor) {
                vestia_processing::ValidationOutcome::Accepted => return Ok(Some(descriptor)),
                vestia_processing::ValidationOutcome::Cancelled => {
                    drop(ScratchFile {
                        path: descriptor.locator,
                    });
                    return Ok(None);
                }
                outcome if outcome.is_recoverable() => {
                    if let Some(message) = outcome.message() {
                        last_rejection = message.to_string();
                    }
                    tracing::info!(
                        attempt,
                        reason = last_rejection.as_str(),
                        "Acquired image rejected"
                    );
                    drop(ScratchFile {
                        path: descriptor.locator,
                    });
                }
                outcome => {
                    drop(ScratchFile {
                        path: descriptor.locator,
                    });
                    return Err(PipelineError::Validation(
                        outcome
                            .message()
                            .unwrap_or("The selected image was rejected")
                            .to_string(),
                    ));
                }
            }
        }

        // Attempt budget spent; surface the most recent rejection.
        Err(PipelineError::Validation(last_rejection))
    }
}
