//! Workflow state store trait definition.
//!
//! Durable persistence of one session's full [`WorkflowState`], keyed by
//! session id. Saving overwrites; loading returns exactly what was saved.

use claudio_types::error::StoreError;
use claudio_types::workflow::WorkflowState;
use uuid::Uuid;

/// Persistence for workflow state.
///
/// Implementations live in `claudio-infra`. Uses RPITIT (native async fn in
/// traits, Rust 2024 edition).
pub trait StateStore: Send + Sync {
    /// Save (create or overwrite) the state under its `session_id`.
    fn save(
        &self,
        state: &WorkflowState,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Load a session's state. Returns `None` if the session does not exist.
    fn load(
        &self,
        session_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<WorkflowState>, StoreError>> + Send;

    fn exists(
        &self,
        session_id: Uuid,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    /// Delete a session. Returns `true` if it existed.
    fn delete(
        &self,
        session_id: Uuid,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    /// All stored session ids in ascending order.
    fn list_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Uuid>, StoreError>> + Send;
}
