//! Client for the remote garment processing endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, StatusCode};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::auth::TokenProvider;
use crate::result::interpret_response;
use crate::retry::RetryPolicy;
use crate::wire::{ProcessingRequest, ProcessingResponse};
use vestia_core::{ErrorCode, PipelineConfig, ProcessingError, ProcessingResult};

/// One logical submission: the encoded payload plus its provenance.
#[derive(Debug, Clone)]
pub struct GarmentSubmission {
    /// Base64-encoded image bytes, submitted as a single unit.
    pub payload: String,
    pub owner_id: Uuid,
    pub mime_type: String,
}

/// Client for the remote processing endpoint.
///
/// All collaborators are injected; the client holds no global state. Each
/// call to [`submit`](Self::submit) is one logical action: it mints one
/// idempotency key, races the request against the configured timeout and the
/// caller's cancellation token, and retries transient failures within the
/// [`RetryPolicy`] budget without surfacing intermediate errors.
pub struct ProcessingClient {
    http: reqwest::Client,
    endpoint: String,
    tokens: Arc<dyn TokenProvider>,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl ProcessingClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        retry: RetryPolicy,
        request_timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            tokens,
            retry,
            request_timeout,
        }
    }

    pub fn from_config(
        config: &PipelineConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            reqwest::Client::builder().build()?,
            config.processing_endpoint.clone(),
            tokens,
            RetryPolicy::new(config.max_retries),
            config.request_timeout,
        ))
    }

    /// Submit one logical action.
    ///
    /// Cancellation takes precedence over the timeout and over any response
    /// arriving concurrently with the token firing. The returned error is
    /// always terminal (`retryable = false`): the local budget is spent, and
    /// restarting the action means a new call with a new idempotency key.
    pub async fn submit(
        &self,
        submission: &GarmentSubmission,
        cancel: &CancellationToken,
    ) -> Result<ProcessingResult, ProcessingError> {
        // One key per logical action, stable across every retry below.
        let idempotency_key = Uuid::new_v4();
        let mut failed_attempts = 0u32;

        loop {
            match self.attempt(submission, idempotency_key, cancel).await {
                Ok(result) => {
                    tracing::info!(
                        %idempotency_key,
                        attempts = failed_attempts + 1,
                        used_fallback = result.used_fallback,
                        "processing submission succeeded"
                    );
                    return Ok(result);
                }
                Err(err) => {
                    failed_attempts += 1;
                    if err.code != ErrorCode::Cancelled
                        && self.retry.should_retry(err.code, failed_attempts)
                    {
                        tracing::warn!(
                            %idempotency_key,
                            code = err.code.as_str(),
                            failed_attempts,
                            "transient processing failure, re-issuing identical request"
                        );
                        continue;
                    }
                    return Err(err.into_terminal());
                }
            }
        }
    }

    async fn attempt(
        &self,
        submission: &GarmentSubmission,
        idempotency_key: Uuid,
        cancel: &CancellationToken,
    ) -> Result<ProcessingResult, ProcessingError> {
        // No new I/O once the token has fired.
        if cancel.is_cancelled() {
            return Err(ProcessingError::cancelled());
        }

        let token = self
            .tokens
            .bearer_token()
            .await
            .map_err(|e| ProcessingError::auth_expired(e.to_string()))?;

        let request = ProcessingRequest {
            payload: &submission.payload,
            owner_id: submission.owner_id,
            mime_type: &submission.mime_type,
            idempotency_key,
        };

        // Race: cancellation vs timeout vs the call itself. `biased` gives
        // cancellation priority when both are ready in the same poll.
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ProcessingError::cancelled());
            }
            outcome = tokio::time::timeout(self.request_timeout, self.send(&request, &token)) => {
                match outcome {
                    Err(_) => {
                        return Err(ProcessingError::transient(
                            ErrorCode::Timeout,
                            format!("no response within {:?}", self.request_timeout),
                        ));
                    }
                    Ok(result) => result?,
                }
            }
        };

        // A response that arrives while the token fires is discarded.
        if cancel.is_cancelled() {
            return Err(ProcessingError::cancelled());
        }

        interpret_response(response)
    }

    async fn send(
        &self,
        request: &ProcessingRequest<'_>,
        token: &str,
    ) -> Result<ProcessingResponse, ProcessingError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .json(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProcessingError::auth_expired(format!(
                "processing service rejected credentials ({status})"
            )));
        }
        if !status.is_success() {
            return Err(ProcessingError::transient(
                ErrorCode::ServerError,
                format!("processing service returned {status}"),
            ));
        }

        response.json::<ProcessingResponse>().await.map_err(|e| {
            ProcessingError::transient(
                ErrorCode::ServerError,
                format!("malformed response body: {e}"),
            )
        })
    }
}

fn classify_transport_error(err: reqwest::Error) -> ProcessingError {
    if err.is_timeout() {
        ProcessingError::transient(ErrorCode::Timeout, err.to_string())
    } else {
        ProcessingError::transient(ErrorCode::NetworkUnavailable, err.to_string())
    }
}
