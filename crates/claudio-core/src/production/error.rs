use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use claudio_types::error::{ConcatError, StoreError, TransitionError, ValidationError};
use claudio_types::workflow::WorkflowStatus;

/// A generation phase of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Images,
    Videos,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Images => write!(f, "image"),
            Stage::Videos => write!(f, "video"),
        }
    }
}

/// Errors from driving a production session.
#[derive(Debug, Error)]
pub enum ProductionError {
    #[error("no scene plan available")]
    MissingPlan,

    #[error("no completed videos available for concatenation")]
    MissingAssets,

    #[error("invalid scene plan: {0}")]
    Validation(#[from] ValidationError),

    #[error("{stage} stage failed: {message}")]
    StageFatal { stage: Stage, message: String },

    #[error("state store error: {0}")]
    Store(#[from] StoreError),

    #[error("concatenation failed: {0}")]
    Concat(#[from] ConcatError),

    #[error("invalid status change: {0}")]
    Transition(#[from] TransitionError),

    /// The pipeline failed and the `failed` status could not be persisted,
    /// so the stored session still shows its previous status.
    #[error("{cause} (failed status not saved: {store})")]
    FailureNotRecorded {
        cause: Box<ProductionError>,
        store: StoreError,
    },

    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("session {session_id} is {status} and cannot be resumed")]
    NotResumable {
        session_id: Uuid,
        status: WorkflowStatus,
    },
}
