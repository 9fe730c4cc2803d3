//! In-memory doubles of the production ports.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use uuid::Uuid;

use claudio_types::error::{ConcatError, GenerationError, StoreError};
use claudio_types::generation::{ImageRequest, VideoRequest};
use claudio_types::workflow::{WorkflowState, WorkflowStatus};

use crate::concat::{Concatenator, ensure_inputs};
use crate::gateway::GenerationGateway;
use crate::repository::state_store::StateStore;

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    states: Mutex<HashMap<Uuid, WorkflowState>>,
    pub saves: AtomicUsize,
    pub fail_saves: AtomicBool,
    /// Reject saves of states in this status only.
    pub fail_on_status: Mutex<Option<WorkflowStatus>>,
}

impl MemoryStore {
    pub fn get(&self, session_id: Uuid) -> Option<WorkflowState> {
        self.states.lock().unwrap().get(&session_id).cloned()
    }
}

impl StateStore for MemoryStore {
    async fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io("disk full".to_string()));
        }
        if *self.fail_on_status.lock().unwrap() == Some(state.status) {
            return Err(StoreError::Io("disk full".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.states
            .lock()
            .unwrap()
            .insert(state.session_id, state.clone());
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> Result<Option<WorkflowState>, StoreError> {
        Ok(self.get(session_id))
    }

    async fn exists(&self, session_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.states.lock().unwrap().contains_key(&session_id))
    }

    async fn delete(&self, session_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.states.lock().unwrap().remove(&session_id).is_some())
    }

    async fn list_sessions(&self) -> Result<Vec<Uuid>, StoreError> {
        let mut ids: Vec<Uuid> = self.states.lock().unwrap().keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

// ---------------------------------------------------------------------------
// MockGateway
// ---------------------------------------------------------------------------

/// Succeeds for every scene except the configured failures.
#[derive(Default)]
pub struct MockGateway {
    pub failing_images: HashSet<String>,
    pub failing_videos: HashSet<String>,
    /// Per-scene artificial latency for video calls.
    pub video_delays: HashMap<String, Duration>,
    pub image_calls: Mutex<Vec<String>>,
    pub video_calls: Mutex<Vec<VideoRequest>>,
}

impl MockGateway {
    pub fn failing_images(ids: &[&str]) -> Self {
        Self {
            failing_images: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_videos(ids: &[&str]) -> Self {
        Self {
            failing_videos: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn image_call_ids(&self) -> Vec<String> {
        let mut ids = self.image_calls.lock().unwrap().clone();
        ids.sort();
        ids
    }

    pub fn video_requests(&self) -> Vec<VideoRequest> {
        let mut requests = self.video_calls.lock().unwrap().clone();
        requests.sort_by(|a, b| a.scene_id.cmp(&b.scene_id));
        requests
    }
}

impl GenerationGateway for MockGateway {
    async fn generate_end_frame_image(
        &self,
        request: &ImageRequest,
    ) -> Result<PathBuf, GenerationError> {
        self.image_calls
            .lock()
            .unwrap()
            .push(request.scene_id.clone());
        if self.failing_images.contains(&request.scene_id) {
            return Err(GenerationError::BadRequest("prompt rejected".to_string()));
        }
        Ok(PathBuf::from(format!("images/{}_end.png", request.scene_id)))
    }

    async fn generate_video_segment(
        &self,
        request: &VideoRequest,
    ) -> Result<PathBuf, GenerationError> {
        if let Some(delay) = self.video_delays.get(&request.scene_id) {
            tokio::time::sleep(*delay).await;
        }
        self.video_calls.lock().unwrap().push(request.clone());
        if self.failing_videos.contains(&request.scene_id) {
            return Err(GenerationError::Server {
                status: 500,
                message: "render farm down".to_string(),
            });
        }
        Ok(PathBuf::from(format!("videos/{}.mp4", request.scene_id)))
    }
}

// ---------------------------------------------------------------------------
// RecordingConcatenator
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingConcatenator {
    pub inputs: Mutex<Vec<PathBuf>>,
    pub fail: bool,
}

impl Concatenator for RecordingConcatenator {
    async fn concatenate(
        &self,
        session_id: Uuid,
        inputs: &[PathBuf],
    ) -> Result<PathBuf, ConcatError> {
        ensure_inputs(inputs)?;
        if self.fail {
            return Err(ConcatError::ToolFailed("muxer crashed".to_string()));
        }
        *self.inputs.lock().unwrap() = inputs.to_vec();
        Ok(PathBuf::from(format!("sessions/{session_id}/final_video.mp4")))
    }
}
