//! Exponential backoff for generation calls.
//!
//! [`RetryingGateway`] decorates any [`GenerationGateway`]. Transient errors
//! (rate limits, timeouts, network faults, 5xx) are retried with growing
//! delays up to the configured attempt cap; permanent errors are returned
//! immediately.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use claudio_types::config::RetryConfig;
use claudio_types::error::GenerationError;
use claudio_types::generation::{ImageRequest, VideoRequest};

use super::GenerationGateway;

// ---------------------------------------------------------------------------
// RetryAction
// ---------------------------------------------------------------------------

/// What to do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    /// Sleep for `delay`, then try again.
    Retry { delay: Duration },
    /// Surface the error to the caller.
    GiveUp,
}

// ---------------------------------------------------------------------------
// RetryHandler
// ---------------------------------------------------------------------------

/// Stateless retry decisions. All inputs are passed as parameters.
pub struct RetryHandler;

impl RetryHandler {
    /// Decide the action after `attempt` (1-based) failed with `error`.
    ///
    /// A rate-limit `retry_after` hint wins when it is longer than the
    /// computed backoff.
    pub fn next_action(config: &RetryConfig, attempt: u32, error: &GenerationError) -> RetryAction {
        if !error.is_transient() || attempt >= config.max_attempts {
            return RetryAction::GiveUp;
        }

        let backoff = config.delay_for(attempt);
        let delay = match error {
            GenerationError::RateLimited {
                retry_after_ms: Some(ms),
            } => backoff.max(Duration::from_millis(*ms)),
            _ => backoff,
        };
        RetryAction::Retry { delay }
    }
}

/// Run `call` until it succeeds, fails permanently, or exhausts attempts.
pub async fn retry_call<T, F, Fut>(
    config: &RetryConfig,
    operation: &'static str,
    scene_id: &str,
    mut call: F,
) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) => match RetryHandler::next_action(config, attempt, &e) {
                RetryAction::Retry { delay } => {
                    tracing::warn!(
                        operation,
                        scene_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "generation call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryAction::GiveUp => {
                    if e.is_transient() {
                        tracing::error!(operation, scene_id, attempt, error = %e, "retries exhausted");
                    } else {
                        tracing::error!(operation, scene_id, error = %e, "non-retryable generation error");
                    }
                    return Err(e);
                }
            },
        }
    }
}

// ---------------------------------------------------------------------------
// RetryingGateway
// ---------------------------------------------------------------------------

/// A gateway that retries transient failures of the wrapped gateway.
pub struct RetryingGateway<G> {
    inner: G,
    config: RetryConfig,
}

impl<G: GenerationGateway> RetryingGateway<G> {
    pub fn new(inner: G, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: GenerationGateway> GenerationGateway for RetryingGateway<G> {
    async fn generate_end_frame_image(
        &self,
        request: &ImageRequest,
    ) -> Result<PathBuf, GenerationError> {
        retry_call(&self.config, "image", &request.scene_id, || {
            self.inner.generate_end_frame_image(request)
        })
        .await
    }

    async fn generate_video_segment(
        &self,
        request: &VideoRequest,
    ) -> Result<PathBuf, GenerationError> {
        retry_call(&self.config, "video", &request.scene_id, || {
            self.inner.generate_video_segment(request)
        })
        .await
    }
}
