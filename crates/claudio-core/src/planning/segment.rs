//! Splitting a requested duration into bounded segments.

use claudio_types::error::ValidationError;
use claudio_types::scene::{Scene, ScenePlan, VideoRequirements};

/// Slack applied to `total / max` before rounding up, so binary rounding of
/// decimal durations never adds a near-empty segment.
const RATIO_EPSILON: f64 = 1e-9;

/// Number of segments needed to cover `total` seconds when no segment may
/// exceed `max` seconds.
pub fn scene_count(total: f64, max: f64) -> Result<usize, ValidationError> {
    check_positive("total duration", total)?;
    check_positive("maximum segment duration", max)?;
    Ok(((total / max) - RATIO_EPSILON).ceil().max(1.0) as usize)
}

/// Segment durations covering `total`: full `max`-length segments followed
/// by one remainder segment (20 / 8 gives `[8, 8, 4]`). The remainder never
/// exceeds `max`.
pub fn segment_durations(total: f64, max: f64) -> Result<Vec<f64>, ValidationError> {
    let count = scene_count(total, max)?;
    let mut durations = vec![max; count];
    if let Some(last) = durations.last_mut() {
        *last = (total - max * (count - 1) as f64).min(max);
    }
    Ok(durations)
}

/// Draft a plan from the requirements with one scene per segment.
///
/// Prompts are derived from the requirements and are meant to be refined
/// before approval. The first scene also gets an opening-frame prompt.
pub fn draft_plan(requirements: &VideoRequirements, max: f64) -> Result<ScenePlan, ValidationError> {
    let durations = segment_durations(requirements.duration, max)?;
    let count = durations.len();

    let subject = requirements
        .business_name
        .as_deref()
        .unwrap_or(requirements.video_purpose.as_str());
    let style = requirements
        .theme
        .as_deref()
        .map(|t| format!(", {t} style"))
        .unwrap_or_default();
    let context = requirements
        .additional_context
        .as_deref()
        .map(|c| format!(". {c}"))
        .unwrap_or_default();

    let scenes = durations
        .into_iter()
        .enumerate()
        .map(|(i, duration)| {
            let n = i + 1;
            let mut scene = Scene::new(
                format!("scene_{n}"),
                duration,
                format!(
                    "Scene {n} of {count} of a {} video about {subject}{style}{context}",
                    requirements.video_purpose
                ),
                format!("Closing frame of scene {n} of {count} featuring {subject}{style}"),
            );
            if n == 1 {
                scene.start_image_prompt =
                    Some(format!("Opening frame featuring {subject}{style}"));
            }
            scene
        })
        .collect();

    Ok(ScenePlan {
        total_duration: requirements.duration,
        theme: requirements.theme.clone(),
        scenes,
    })
}

fn check_positive(what: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidDuration(format!(
            "{what} must be a positive number of seconds, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirements(duration: f64) -> VideoRequirements {
        VideoRequirements {
            business_name: Some("Joe's Pizza".to_string()),
            video_purpose: "advertisement".to_string(),
            duration,
            theme: Some("warm".to_string()),
            additional_context: None,
        }
    }

    #[test]
    fn twenty_seconds_at_eight_max() {
        assert_eq!(scene_count(20.0, 8.0).unwrap(), 3);
        assert_eq!(segment_durations(20.0, 8.0).unwrap(), vec![8.0, 8.0, 4.0]);
    }

    #[test]
    fn exact_multiple_has_no_remainder_segment() {
        assert_eq!(segment_durations(16.0, 8.0).unwrap(), vec![8.0, 8.0]);
        assert_eq!(segment_durations(25.0, 8.0).unwrap(), vec![8.0, 8.0, 8.0, 1.0]);
        assert_eq!(segment_durations(5.0, 8.0).unwrap(), vec![5.0]);
    }

    #[test]
    fn decimal_durations_stay_within_max() {
        for (total, max, count) in [(7.2, 2.4, 3), (9.3, 3.1, 3), (1.1, 0.1, 11), (12.3, 4.1, 3)] {
            let durations = segment_durations(total, max).unwrap();
            assert_eq!(durations.len(), count, "{total} / {max}");
            assert!(durations.iter().all(|d| *d > 0.0 && *d <= max), "{durations:?}");
            let sum: f64 = durations.iter().sum();
            assert!((sum - total).abs() < 1e-6, "{total} / {max} sums to {sum}");
        }
    }

    #[test]
    fn decimal_remainder_is_kept() {
        let durations = segment_durations(10.5, 4.0).unwrap();
        assert_eq!(durations, vec![4.0, 4.0, 2.5]);
    }

    #[test]
    fn decimal_drafts_pass_validation() {
        for (total, max) in [(7.2, 2.4), (9.3, 3.1), (1.1, 0.1), (12.3, 4.1)] {
            let plan = draft_plan(&requirements(total), max).unwrap();
            assert!(
                crate::planning::validate_plan(&plan, max).is_ok(),
                "{total} / {max}"
            );
        }
    }

    #[test]
    fn non_positive_durations_rejected() {
        assert!(matches!(
            segment_durations(0.0, 8.0),
            Err(ValidationError::InvalidDuration(_))
        ));
        assert!(segment_durations(10.0, -1.0).is_err());
        assert!(segment_durations(f64::NAN, 8.0).is_err());
    }

    #[test]
    fn draft_plan_numbers_scenes_in_order() {
        let plan = draft_plan(&requirements(20.0), 8.0).unwrap();
        let ids: Vec<_> = plan.scenes.iter().map(|s| s.scene_id.as_str()).collect();
        assert_eq!(ids, vec!["scene_1", "scene_2", "scene_3"]);
        assert_eq!(plan.total_duration, 20.0);
        assert_eq!(plan.theme.as_deref(), Some("warm"));
        assert!(plan.scenes[0].start_image_prompt.is_some());
        assert!(plan.scenes[1].start_image_prompt.is_none());
        assert!(plan.scenes[2].video_prompt.contains("Joe's Pizza"));
        assert!(plan.scenes[2].end_image_prompt.contains("scene 3 of 3"));
    }
}
