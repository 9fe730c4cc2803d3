//! Scene plan domain types.
//!
//! A [`ScenePlan`] is the ordered list of [`Scene`]s that make up one video.
//! Scene order is significant: each scene's end-frame image doubles as the
//! start frame of the scene that follows it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Tolerance (seconds) allowed between the summed scene durations and the
/// plan's total duration.
pub const DURATION_TOLERANCE_SECS: f64 = 0.5;

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// One segment of the target video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Identifier unique within the plan (e.g. "scene_1").
    pub scene_id: String,
    /// Segment duration in seconds, bounded by the configured maximum.
    pub duration: f64,
    /// Prompt describing the motion and content of the segment.
    pub video_prompt: String,
    /// Prompt for the image that must appear as the segment's last frame.
    pub end_image_prompt: String,
    /// Prompt for an explicit opening frame (first scene only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_image_prompt: Option<String>,
    /// Whether the end-frame image has been produced.
    #[serde(default)]
    pub image_done: bool,
    /// Whether the video segment has been produced.
    #[serde(default)]
    pub video_done: bool,
    /// Location of the produced end-frame image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
    /// Location of the produced video segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<PathBuf>,
}

impl Scene {
    /// Create an unproduced scene.
    pub fn new(
        scene_id: impl Into<String>,
        duration: f64,
        video_prompt: impl Into<String>,
        end_image_prompt: impl Into<String>,
    ) -> Self {
        Self {
            scene_id: scene_id.into(),
            duration,
            video_prompt: video_prompt.into(),
            end_image_prompt: end_image_prompt.into(),
            start_image_prompt: None,
            image_done: false,
            video_done: false,
            image_path: None,
            video_path: None,
        }
    }

    /// The end-frame image, if it has been produced and recorded.
    pub fn usable_image(&self) -> Option<&PathBuf> {
        if self.image_done {
            self.image_path.as_ref()
        } else {
            None
        }
    }

    /// The video segment, if it has been produced and recorded.
    pub fn usable_video(&self) -> Option<&PathBuf> {
        if self.video_done {
            self.video_path.as_ref()
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// ScenePlan
// ---------------------------------------------------------------------------

/// The complete, ordered scene breakdown of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePlan {
    /// Requested length of the final video in seconds.
    pub total_duration: f64,
    /// Overall theme or visual style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Scenes in playback order.
    pub scenes: Vec<Scene>,
}

impl ScenePlan {
    pub fn scene(&self, scene_id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.scene_id == scene_id)
    }

    pub fn scene_mut(&mut self, scene_id: &str) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.scene_id == scene_id)
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Sum of all scene durations.
    pub fn planned_duration(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration).sum()
    }

    /// Number of scenes with both image and video produced.
    pub fn completed_scene_count(&self) -> usize {
        self.scenes
            .iter()
            .filter(|s| s.image_done && s.video_done)
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.scenes.iter().all(|s| s.image_done && s.video_done)
    }

    /// Scenes still waiting for their end-frame image, in plan order.
    pub fn pending_images(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter().filter(|s| !s.image_done)
    }

    /// Scenes still waiting for their video segment, in plan order.
    pub fn pending_videos(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter().filter(|s| !s.video_done)
    }
}

// ---------------------------------------------------------------------------
// Requirements
// ---------------------------------------------------------------------------

/// What the user asked for. Read-only input to planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRequirements {
    /// Name of the business or product featured, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    /// Purpose of the video (e.g. "advertisement", "tutorial").
    pub video_purpose: String,
    /// Target duration in seconds.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Free-text context gathered from the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}
