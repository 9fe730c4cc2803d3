//! Scene plan acceptance checks.

use std::collections::HashSet;

use claudio_types::error::ValidationError;
use claudio_types::scene::{DURATION_TOLERANCE_SECS, ScenePlan};

/// Validate structural constraints on a `ScenePlan`.
///
/// Checks:
/// - At least one scene exists and every scene id is unique
/// - Every duration is in `(0, max_scene_duration]`
/// - Video and end-image prompts are non-empty
/// - Scene durations sum to `total_duration` within tolerance
///
/// Applied before any generation work starts, regardless of how the plan
/// was produced.
pub fn validate_plan(plan: &ScenePlan, max_scene_duration: f64) -> Result<(), ValidationError> {
    if !plan.total_duration.is_finite() || plan.total_duration <= 0.0 {
        return Err(ValidationError::InvalidDuration(format!(
            "total duration must be positive, got {}",
            plan.total_duration
        )));
    }

    if plan.scenes.is_empty() {
        return Err(ValidationError::EmptyPlan);
    }

    let mut seen_ids = HashSet::new();
    for scene in &plan.scenes {
        if !seen_ids.insert(scene.scene_id.as_str()) {
            return Err(ValidationError::DuplicateSceneId(scene.scene_id.clone()));
        }

        if scene.duration.is_nan() || scene.duration <= 0.0 {
            return Err(ValidationError::NonPositiveDuration {
                scene_id: scene.scene_id.clone(),
                duration: scene.duration,
            });
        }
        if scene.duration > max_scene_duration {
            return Err(ValidationError::SceneTooLong {
                scene_id: scene.scene_id.clone(),
                duration: scene.duration,
                max: max_scene_duration,
            });
        }

        if scene.video_prompt.trim().is_empty() {
            return Err(ValidationError::MissingVideoPrompt(scene.scene_id.clone()));
        }
        if scene.end_image_prompt.trim().is_empty() {
            return Err(ValidationError::MissingEndImagePrompt(scene.scene_id.clone()));
        }
    }

    let planned = plan.planned_duration();
    if (planned - plan.total_duration).abs() > DURATION_TOLERANCE_SECS {
        return Err(ValidationError::DurationMismatch {
            planned,
            total: plan.total_duration,
        });
    }

    Ok(())
}
