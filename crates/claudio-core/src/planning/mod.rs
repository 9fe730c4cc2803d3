//! Scene planning: splitting a duration into segments, drafting and
//! validating scene plans, and opening a session from an approved plan.

pub mod document;
pub mod segment;
pub mod validate;

pub use document::parse_plan_document;
pub use segment::{draft_plan, scene_count, segment_durations};
pub use validate::validate_plan;

use claudio_types::error::ValidationError;
use claudio_types::scene::{ScenePlan, VideoRequirements};
use claudio_types::workflow::WorkflowState;

/// Validate `plan` and open a new session awaiting approval.
///
/// The session id is a fresh UUIDv7.
pub fn new_session(
    requirements: Option<VideoRequirements>,
    plan: ScenePlan,
    max_scene_duration: f64,
) -> Result<WorkflowState, ValidationError> {
    validate_plan(&plan, max_scene_duration)?;
    let state = WorkflowState::awaiting_approval(requirements, plan);
    tracing::info!(session_id = %state.session_id, "session created");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use claudio_types::workflow::WorkflowStatus;

    #[test]
    fn new_session_awaits_approval() {
        let requirements = VideoRequirements {
            business_name: None,
            video_purpose: "teaser".to_string(),
            duration: 20.0,
            theme: None,
            additional_context: None,
        };
        let plan = draft_plan(&requirements, 8.0).unwrap();
        let a = new_session(Some(requirements.clone()), plan.clone(), 8.0).unwrap();
        let b = new_session(Some(requirements), plan, 8.0).unwrap();

        assert_eq!(a.status, WorkflowStatus::Approval);
        assert!(a.scene_plan.is_some());
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn new_session_rejects_invalid_plan() {
        let mut plan = draft_plan(
            &VideoRequirements {
                business_name: None,
                video_purpose: "teaser".to_string(),
                duration: 16.0,
                theme: None,
                additional_context: None,
            },
            8.0,
        )
        .unwrap();
        plan.scenes[1].video_prompt.clear();

        assert_eq!(
            new_session(None, plan, 8.0).unwrap_err(),
            ValidationError::MissingVideoPrompt("scene_2".to_string())
        );
    }
}
