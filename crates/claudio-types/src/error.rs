use std::path::PathBuf;

use thiserror::Error;

use crate::workflow::WorkflowStatus;

/// A scene plan that cannot be accepted for production.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("scene plan has no scenes")]
    EmptyPlan,

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("duplicate scene id '{0}'")]
    DuplicateSceneId(String),

    #[error("scene {scene_id} duration {duration}s must be greater than zero")]
    NonPositiveDuration { scene_id: String, duration: f64 },

    #[error("scene {scene_id} duration {duration}s exceeds maximum {max}s")]
    SceneTooLong {
        scene_id: String,
        duration: f64,
        max: f64,
    },

    #[error("scene {0} missing video prompt")]
    MissingVideoPrompt(String),

    #[error("scene {0} missing end image prompt")]
    MissingEndImagePrompt(String),

    #[error("scene durations ({planned}s) don't match total ({total}s)")]
    DurationMismatch { planned: f64, total: f64 },

    #[error("malformed plan document: {0}")]
    MalformedDocument(String),
}

/// Errors returned by an image or video generation backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("rate limited")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl GenerationError {
    /// Whether retrying the same call may succeed.
    ///
    /// Rate limits, timeouts, network faults and 5xx responses are transient.
    /// Client errors (bad request, auth, not found) are permanent.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimited { .. }
                | GenerationError::Timeout(_)
                | GenerationError::Network(_)
                | GenerationError::Server { .. }
        )
    }

    /// Classify an HTTP status code returned by a generation backend.
    ///
    /// Returns `None` for success codes.
    pub fn from_status(status: u16, message: impl Into<String>) -> Option<Self> {
        let message = message.into();
        match status {
            200..=399 => None,
            401 | 403 => Some(GenerationError::Unauthorized(message)),
            404 => Some(GenerationError::NotFound(message)),
            408 => Some(GenerationError::Timeout(message)),
            429 => Some(GenerationError::RateLimited {
                retry_after_ms: None,
            }),
            400..=499 => Some(GenerationError::BadRequest(message)),
            _ => Some(GenerationError::Server { status, message }),
        }
    }
}

/// Errors from the workflow state store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt state for session {session_id}: {message}")]
    Corrupt { session_id: String, message: String },
}

/// Errors from the video concatenation tool.
#[derive(Debug, Error)]
pub enum ConcatError {
    #[error("no video segments to concatenate")]
    EmptyInput,

    #[error("video segment is not readable: {}", .0.display())]
    UnreadableInput(PathBuf),

    #[error("concatenation tool failed: {0}")]
    ToolFailed(String),

    #[error("io error: {0}")]
    Io(String),
}

/// A rejected workflow status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("workflow is already {0} and accepts no further changes")]
    Terminal(WorkflowStatus),

    #[error("cannot move workflow back from {from} to {to}")]
    Backwards {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },
}
