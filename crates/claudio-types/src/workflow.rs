//! Workflow state types for a video production session.
//!
//! [`WorkflowState`] is the aggregate root persisted after every mutating step
//! of production. It owns the scene plan, the per-scene production progress,
//! the produced asset locations, and the canonical [`WorkflowStatus`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ProductionConfig;
use crate::error::TransitionError;
use crate::scene::{ScenePlan, VideoRequirements};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Where a session is in the production pipeline.
///
/// Statuses advance monotonically in declaration order. `Completed` and
/// `Failed` are terminal; `Failed` is reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Planning,
    Approval,
    GeneratingImages,
    GeneratingVideos,
    Concatenating,
    Completed,
    Failed,
}

impl WorkflowStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }

    /// Position along the happy path. `Failed` sits outside it.
    fn rank(self) -> u8 {
        match self {
            WorkflowStatus::Planning => 0,
            WorkflowStatus::Approval => 1,
            WorkflowStatus::GeneratingImages => 2,
            WorkflowStatus::GeneratingVideos => 3,
            WorkflowStatus::Concatenating => 4,
            WorkflowStatus::Completed => 5,
            WorkflowStatus::Failed => u8::MAX,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::Planning => "planning",
            WorkflowStatus::Approval => "approval",
            WorkflowStatus::GeneratingImages => "generating_images",
            WorkflowStatus::GeneratingVideos => "generating_videos",
            WorkflowStatus::Concatenating => "concatenating",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "planning" => Ok(WorkflowStatus::Planning),
            "approval" => Ok(WorkflowStatus::Approval),
            "generating_images" => Ok(WorkflowStatus::GeneratingImages),
            "generating_videos" => Ok(WorkflowStatus::GeneratingVideos),
            "concatenating" => Ok(WorkflowStatus::Concatenating),
            "completed" => Ok(WorkflowStatus::Completed),
            "failed" => Ok(WorkflowStatus::Failed),
            other => Err(format!("invalid workflow status: '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Cost
// ---------------------------------------------------------------------------

/// Estimated spend for producing a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub images_cost: f64,
    pub videos_cost: f64,
    pub total_cost: f64,
}

impl CostEstimate {
    /// One image per scene plus per-second video pricing.
    pub fn compute(scene_count: usize, total_duration: f64, config: &ProductionConfig) -> Self {
        let images_cost = scene_count as f64 * config.image_cost;
        let videos_cost = total_duration * config.video_cost_per_second;
        Self {
            images_cost,
            videos_cost,
            total_cost: images_cost + videos_cost,
        }
    }

    pub fn format_cost(&self) -> String {
        format!(
            "Images: ${:.2}\nVideos: ${:.2}\nTotal: ${:.2}",
            self.images_cost, self.videos_cost, self.total_cost
        )
    }
}

// ---------------------------------------------------------------------------
// Production progress and assets
// ---------------------------------------------------------------------------

/// Scene ids that finished (or failed) each production stage.
///
/// Insertion is idempotent. A scene may be failed and completed at once:
/// failure records a stage attempt, not an exclusive outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionState {
    #[serde(default)]
    pub images_completed: BTreeSet<String>,
    #[serde(default)]
    pub videos_completed: BTreeSet<String>,
    #[serde(default)]
    pub scenes_failed: BTreeSet<String>,
}

impl ProductionState {
    pub fn mark_image_completed(&mut self, scene_id: &str) {
        self.images_completed.insert(scene_id.to_string());
    }

    pub fn mark_video_completed(&mut self, scene_id: &str) {
        self.videos_completed.insert(scene_id.to_string());
    }

    pub fn mark_scene_failed(&mut self, scene_id: &str) {
        self.scenes_failed.insert(scene_id.to_string());
    }
}

/// Where the produced assets live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPaths {
    /// Scene id -> end-frame image. Last write wins.
    #[serde(default)]
    pub images: BTreeMap<String, PathBuf>,
    /// Scene id -> video segment. Last write wins.
    #[serde(default)]
    pub videos: BTreeMap<String, PathBuf>,
    /// The concatenated output, set once on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_video: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// WorkflowState
// ---------------------------------------------------------------------------

/// Full persisted state of one production session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// UUIDv7 assigned when the session is created.
    pub session_id: Uuid,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every status change and recorded result.
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<VideoRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_plan: Option<ScenePlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<CostEstimate>,
    #[serde(default)]
    pub production: ProductionState,
    #[serde(default)]
    pub assets: AssetPaths,
    /// Message of the error that moved the session to `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowState {
    /// A fresh session still gathering requirements.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::now_v7(),
            status: WorkflowStatus::Planning,
            created_at: now,
            updated_at: now,
            requirements: None,
            scene_plan: None,
            estimated_cost: None,
            production: ProductionState::default(),
            assets: AssetPaths::default(),
            error: None,
        }
    }

    /// A session whose plan is ready and awaiting approval to produce.
    pub fn awaiting_approval(requirements: Option<VideoRequirements>, plan: ScenePlan) -> Self {
        Self {
            status: WorkflowStatus::Approval,
            requirements,
            scene_plan: Some(plan),
            ..Self::new()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether production can continue from the current status.
    pub fn can_resume(&self) -> bool {
        !self.is_terminal()
    }

    /// Move to `next`, refreshing `updated_at`.
    ///
    /// Re-entering the current status is allowed so an interrupted stage can
    /// be resumed; moving backwards or leaving a terminal status is not.
    pub fn transition_to(&mut self, next: WorkflowStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal(self.status));
        }
        if next != WorkflowStatus::Failed && next.rank() < self.status.rank() {
            return Err(TransitionError::Backwards {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    /// Move to `Failed`, recording the error message.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition_to(WorkflowStatus::Failed)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Record a produced end-frame image for a scene.
    pub fn record_image(&mut self, scene_id: &str, path: PathBuf) {
        if let Some(scene) = self.scene_plan.as_mut().and_then(|p| p.scene_mut(scene_id)) {
            scene.image_done = true;
            scene.image_path = Some(path.clone());
        }
        self.production.mark_image_completed(scene_id);
        self.assets.images.insert(scene_id.to_string(), path);
        self.touch();
    }

    /// Record a produced video segment for a scene.
    pub fn record_video(&mut self, scene_id: &str, path: PathBuf) {
        if let Some(scene) = self.scene_plan.as_mut().and_then(|p| p.scene_mut(scene_id)) {
            scene.video_done = true;
            scene.video_path = Some(path.clone());
        }
        self.production.mark_video_completed(scene_id);
        self.assets.videos.insert(scene_id.to_string(), path);
        self.touch();
    }

    pub fn record_scene_failure(&mut self, scene_id: &str) {
        self.production.mark_scene_failed(scene_id);
        self.touch();
    }

    /// Set the final asset and move to `Completed`.
    pub fn complete_with(&mut self, final_video: PathBuf) -> Result<(), TransitionError> {
        self.transition_to(WorkflowStatus::Completed)?;
        self.assets.final_video = Some(final_video);
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    fn plan() -> ScenePlan {
        ScenePlan {
            total_duration: 12.0,
            theme: None,
            scenes: vec![
                Scene::new("scene_1", 8.0, "open", "door"),
                Scene::new("scene_2", 4.0, "close", "sign"),
            ],
        }
    }

    #[test]
    fn status_serde_is_snake_case() {
        let json = serde_json::to_string(&WorkflowStatus::GeneratingImages).unwrap();
        assert_eq!(json, "\"generating_images\"");
        let parsed: WorkflowStatus = serde_json::from_str("\"concatenating\"").unwrap();
        assert_eq!(parsed, WorkflowStatus::Concatenating);
    }

    #[test]
    fn status_display_and_from_str_agree() {
        for status in [
            WorkflowStatus::Planning,
            WorkflowStatus::Approval,
            WorkflowStatus::GeneratingImages,
            WorkflowStatus::GeneratingVideos,
            WorkflowStatus::Concatenating,
            WorkflowStatus::Completed,
            WorkflowStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<WorkflowStatus>().unwrap(), status);
        }
        assert!("rendering".parse::<WorkflowStatus>().is_err());
    }

    #[test]
    fn transitions_advance_monotonically() {
        let mut state = WorkflowState::awaiting_approval(None, plan());
        let before = state.updated_at;
        state.transition_to(WorkflowStatus::GeneratingImages).unwrap();
        assert!(state.updated_at >= before);

        // Re-entering the current stage is a resume, not a revisit.
        state.transition_to(WorkflowStatus::GeneratingImages).unwrap();
        state.transition_to(WorkflowStatus::GeneratingVideos).unwrap();

        let err = state
            .transition_to(WorkflowStatus::GeneratingImages)
            .unwrap_err();
        assert!(matches!(err, TransitionError::Backwards { .. }));
        assert_eq!(state.status, WorkflowStatus::GeneratingVideos);
    }

    #[test]
    fn terminal_states_reject_everything() {
        let mut state = WorkflowState::awaiting_approval(None, plan());
        state.complete_with(PathBuf::from("/out/final.mp4")).unwrap();
        assert!(state.is_terminal());
        assert!(!state.can_resume());
        assert_eq!(
            state.mark_failed("late").unwrap_err(),
            TransitionError::Terminal(WorkflowStatus::Completed)
        );
        assert!(state.error.is_none());

        let mut failed = WorkflowState::new();
        failed.mark_failed("boom").unwrap();
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.transition_to(WorkflowStatus::Failed).is_err());
    }

    #[test]
    fn recording_results_updates_plan_sets_and_assets() {
        let mut state = WorkflowState::awaiting_approval(None, plan());
        state.record_image("scene_1", PathBuf::from("images/scene_1_end.png"));
        state.record_image("scene_1", PathBuf::from("images/scene_1_end_v2.png"));
        state.record_video("scene_1", PathBuf::from("videos/scene_1.mp4"));
        state.record_scene_failure("scene_2");
        state.record_scene_failure("scene_2");

        let scene = state.scene_plan.as_ref().unwrap().scene("scene_1").unwrap();
        assert!(scene.image_done && scene.video_done);
        assert_eq!(state.production.images_completed.len(), 1);
        assert_eq!(state.production.scenes_failed.len(), 1);
        assert_eq!(
            state.assets.images["scene_1"],
            PathBuf::from("images/scene_1_end_v2.png")
        );
    }

    #[test]
    fn cost_estimate_and_format() {
        let config = ProductionConfig::default();
        let estimate = CostEstimate::compute(3, 20.0, &config);
        assert!((estimate.images_cost - 0.30).abs() < 1e-9);
        assert!((estimate.videos_cost - 8.0).abs() < 1e-9);
        assert!((estimate.total_cost - 8.30).abs() < 1e-9);
        assert_eq!(
            estimate.format_cost(),
            "Images: $0.30\nVideos: $8.00\nTotal: $8.30"
        );
    }

    #[test]
    fn workflow_state_serde_roundtrip() {
        let mut state = WorkflowState::awaiting_approval(
            Some(VideoRequirements {
                business_name: Some("Joe's Pizza".to_string()),
                video_purpose: "advertisement".to_string(),
                duration: 12.0,
                theme: Some("fun".to_string()),
                additional_context: None,
            }),
            plan(),
        );
        state.transition_to(WorkflowStatus::GeneratingImages).unwrap();
        state.record_image("scene_1", PathBuf::from("images/scene_1_end.png"));

        let json = serde_json::to_string_pretty(&state).unwrap();
        assert!(json.contains("\"generating_images\""));
        let back: WorkflowState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
