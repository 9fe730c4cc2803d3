//! Continuity wiring for video generation.
//!
//! Scene *i*'s video must start on scene *i-1*'s end-frame image. All images
//! are produced by the preceding stage, so the videos themselves can still
//! be generated concurrently: the chainer only resolves each scene's frames
//! from the recorded image results.

use std::path::PathBuf;

use uuid::Uuid;

use claudio_types::generation::VideoRequest;
use claudio_types::scene::ScenePlan;

/// A video task ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoLink {
    pub scene_id: String,
    pub prompt: String,
    pub duration: f64,
    /// This scene's own end-frame image.
    pub end_frame: PathBuf,
    /// The previous scene's end-frame image. Always `None` for the first scene.
    pub start_frame: Option<PathBuf>,
}

impl VideoLink {
    pub fn into_request(self, session_id: Uuid, resolution: &str) -> VideoRequest {
        VideoRequest {
            session_id,
            scene_id: self.scene_id,
            prompt: self.prompt,
            duration: self.duration,
            end_frame: self.end_frame,
            start_frame: self.start_frame,
            resolution: resolution.to_string(),
        }
    }
}

/// The video work derived from a plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoChain {
    /// Scenes to dispatch, in plan order.
    pub links: Vec<VideoLink>,
    /// Pending scenes held back because their own end frame is missing.
    pub skipped: Vec<String>,
}

/// Resolve start and end frames for every scene still missing its video.
///
/// Scenes whose video is already done are left out. A scene whose own end
/// frame was never produced is skipped. A scene whose predecessor has no
/// end frame is dispatched without a start frame.
pub fn chain_video_tasks(plan: &ScenePlan) -> VideoChain {
    let mut chain = VideoChain::default();

    for (index, scene) in plan.scenes.iter().enumerate() {
        if scene.video_done {
            continue;
        }

        let Some(end_frame) = scene.usable_image() else {
            tracing::warn!(
                scene_id = scene.scene_id.as_str(),
                "end-frame image missing, skipping video"
            );
            chain.skipped.push(scene.scene_id.clone());
            continue;
        };

        let start_frame = match index.checked_sub(1).map(|prev| &plan.scenes[prev]) {
            Some(prev) => {
                let frame = prev.usable_image().cloned();
                if frame.is_none() {
                    tracing::warn!(
                        scene_id = scene.scene_id.as_str(),
                        previous = prev.scene_id.as_str(),
                        "previous end frame missing, continuity broken"
                    );
                }
                frame
            }
            None => None,
        };

        chain.links.push(VideoLink {
            scene_id: scene.scene_id.clone(),
            prompt: scene.video_prompt.clone(),
            duration: scene.duration,
            end_frame: end_frame.clone(),
            start_frame,
        });
    }

    chain
}
