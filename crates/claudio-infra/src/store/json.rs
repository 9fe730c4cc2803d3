//! JSON-file implementation of `StateStore`.
//!
//! Each session's state lives in `sessions/{session_id}/state.json` as
//! pretty-printed JSON. Writes go to a temporary sibling file first and are
//! renamed into place, so a crash mid-write never leaves a truncated state.

use claudio_core::repository::state_store::StateStore;
use claudio_types::error::StoreError;
use claudio_types::workflow::WorkflowState;
use uuid::Uuid;

use crate::filesystem::SessionWorkspace;

/// Filesystem-backed state store.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    workspace: SessionWorkspace,
}

impl JsonStateStore {
    pub fn new(workspace: SessionWorkspace) -> Self {
        Self { workspace }
    }

    pub fn workspace(&self) -> &SessionWorkspace {
        &self.workspace
    }
}

fn io_err(e: std::io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

impl StateStore for JsonStateStore {
    async fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        let path = self.workspace.state_path(state.session_id);
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(io_err)?;

        tracing::debug!(
            session_id = %state.session_id,
            status = %state.status,
            "state saved"
        );
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> Result<Option<WorkflowState>, StoreError> {
        let path = self.workspace.state_path(session_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(e)),
        };

        let state = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            session_id: session_id.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(state))
    }

    async fn exists(&self, session_id: Uuid) -> Result<bool, StoreError> {
        tokio::fs::try_exists(self.workspace.state_path(session_id))
            .await
            .map_err(io_err)
    }

    async fn delete(&self, session_id: Uuid) -> Result<bool, StoreError> {
        let dir = self.workspace.session_dir(session_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!(session_id = %session_id, "session deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_err(e)),
        }
    }

    async fn list_sessions(&self) -> Result<Vec<Uuid>, StoreError> {
        let sessions_dir = self.workspace.sessions_dir();
        let mut entries = match tokio::fs::read_dir(&sessions_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| Uuid::parse_str(n).ok()) else {
                tracing::debug!(entry = ?name, "ignoring non-session entry");
                continue;
            };
            let has_state = tokio::fs::try_exists(entry.path().join("state.json"))
                .await
                .unwrap_or(false);
            if has_state {
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }
}
