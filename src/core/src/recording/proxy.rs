use super::client::{ApiFuture, RecordingApi};
use super::payload::*;
use super::types::*;
use crate::configuration::StorageConfig;
use crate::error_handling::types::RecordingError;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Backoff schedule for retried calls: `initial_backoff * 2^attempt`,
/// capped at ten seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }
}

/// Translates local recording requests into calls against the remote API.
///
/// # Fields Overview
///
/// - `api`: the remote control API, real or stubbed
/// - `storage`: static storage block attached to every start request
/// - `retry`: applied to acquire and query only; start and stop are sent once
pub struct RecordingProxy {
    api: Arc<dyn RecordingApi>,
    storage: StorageConfig,
    retry: RetryPolicy,
}

impl RecordingProxy {
    pub fn new(api: Arc<dyn RecordingApi>, storage: StorageConfig, retry: RetryPolicy) -> Self {
        Self {
            api,
            storage,
            retry,
        }
    }

    pub async fn acquire(
        &self,
        request: &AcquireRequest,
        kind: RecordingKind,
    ) -> Result<RemoteResponse, RecordingError> {
        let id = Uuid::new_v4();
        info!(
            "[{}] acquire {} resource for channel {}",
            id,
            kind.as_str(),
            request.channel
        );
        let body = serde_json::to_value(acquire_body(request, kind))?;
        let path = acquire_path();
        let result = self
            .with_retry(id, "acquire", || self.api.post(&path, body.clone()))
            .await;
        log_outcome(id, "acquire", &result);
        result
    }

    pub async fn start(
        &self,
        request: &StartRequest,
        kind: RecordingKind,
    ) -> Result<RemoteResponse, RecordingError> {
        let id = Uuid::new_v4();
        info!(
            "[{}] start {} recording for channel {} in mode {}",
            id,
            kind.as_str(),
            request.channel,
            request.mode
        );
        let body = serde_json::to_value(start_body(request, kind, &self.storage))?;
        let result = self
            .api
            .post(&start_path(&request.resource, &request.mode), body)
            .await;
        log_outcome(id, "start", &result);
        result
    }

    pub async fn stop(&self, request: &StopRequest) -> Result<RemoteResponse, RecordingError> {
        let id = Uuid::new_v4();
        info!(
            "[{}] stop recording {} for channel {}",
            id, request.sid, request.channel
        );
        let body = serde_json::to_value(stop_body(request))?;
        let result = self
            .api
            .post(
                &stop_path(&request.resource, &request.sid, &request.mode),
                body,
            )
            .await;
        log_outcome(id, "stop", &result);
        result
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<RemoteResponse, RecordingError> {
        let id = Uuid::new_v4();
        info!("[{}] query recording {}", id, request.sid);
        let path = query_path(&request.resource, &request.sid, &request.mode);
        let result = self
            .with_retry(id, "query", || self.api.get(&path))
            .await;
        log_outcome(id, "query", &result);
        result
    }

    /// Repeats `call` on transport errors and 5xx answers until it succeeds
    /// or the retry budget is spent. The last outcome is returned as is.
    async fn with_retry<F>(
        &self,
        id: Uuid,
        operation: &str,
        call: F,
    ) -> Result<RemoteResponse, RecordingError>
    where
        F: Fn() -> ApiFuture,
    {
        let mut attempt = 0;
        loop {
            let result = call().await;
            let retryable = match &result {
                Ok(response) => response.is_server_error(),
                Err(RecordingError::InvalidPayload(_)) | Err(RecordingError::ClientBuild(_)) => {
                    false
                }
                Err(_) => true,
            };
            if !retryable || attempt >= self.retry.max_retries {
                return result;
            }

            let delay = self.retry.backoff(attempt);
            attempt += 1;
            warn!(
                "[{}] {} failed, retry {}/{} in {:?}",
                id, operation, attempt, self.retry.max_retries, delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn log_outcome(id: Uuid, operation: &str, result: &Result<RemoteResponse, RecordingError>) {
    match result {
        Ok(response) if response.is_success() => {
            info!("[{}] {} answered {}", id, operation, response.status)
        }
        Ok(response) => warn!(
            "[{}] {} rejected by remote with {}: {}",
            id, operation, response.status, response.body
        ),
        Err(e) => error!("[{}] {} failed: {}", id, operation, e),
    }
}
