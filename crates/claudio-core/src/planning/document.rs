//! Plan documents: the JSON form in which a director hands over a plan.
//!
//! A document carries `requirements` and `scenes`, either as raw JSON or
//! inside a fenced ```json block embedded in a longer reply.

use serde::Deserialize;

use claudio_types::error::ValidationError;
use claudio_types::scene::{Scene, ScenePlan, VideoRequirements};

/// Scene duration assumed when a document omits it.
const DEFAULT_SCENE_DURATION: f64 = 5.0;

#[derive(Debug, Deserialize)]
struct PlanDocument {
    #[serde(default)]
    requirements: DocumentRequirements,
    scenes: Vec<DocumentScene>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentRequirements {
    business_name: Option<String>,
    video_purpose: Option<String>,
    duration: Option<f64>,
    theme: Option<String>,
    additional_context: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentScene {
    scene_id: Option<String>,
    duration: Option<f64>,
    video_prompt: String,
    end_image_prompt: String,
    start_image_prompt: Option<String>,
}

/// Parse a plan document into requirements and an (unvalidated) plan.
///
/// Missing scene ids default to `scene_{n}` by position. When the document
/// gives no positive total duration, the sum of scene durations is used.
pub fn parse_plan_document(
    text: &str,
) -> Result<(VideoRequirements, ScenePlan), ValidationError> {
    let json = extract_json_block(text);
    let doc: PlanDocument = serde_json::from_str(json)
        .map_err(|e| ValidationError::MalformedDocument(e.to_string()))?;

    let scenes: Vec<Scene> = doc
        .scenes
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let mut scene = Scene::new(
                s.scene_id.unwrap_or_else(|| format!("scene_{}", i + 1)),
                s.duration.unwrap_or(DEFAULT_SCENE_DURATION),
                s.video_prompt,
                s.end_image_prompt,
            );
            scene.start_image_prompt = s.start_image_prompt;
            scene
        })
        .collect();

    let planned: f64 = scenes.iter().map(|s| s.duration).sum();
    let total_duration = doc
        .requirements
        .duration
        .filter(|d| *d > 0.0)
        .unwrap_or(planned);

    let requirements = VideoRequirements {
        business_name: doc.requirements.business_name,
        video_purpose: doc
            .requirements
            .video_purpose
            .unwrap_or_else(|| "video".to_string()),
        duration: total_duration,
        theme: doc.requirements.theme,
        additional_context: doc.requirements.additional_context,
    };

    let plan = ScenePlan {
        total_duration,
        theme: requirements.theme.clone(),
        scenes,
    };

    Ok((requirements, plan))
}

/// The contents of the first ```json fence, or the whole text trimmed.
fn extract_json_block(text: &str) -> &str {
    const FENCE: &str = "```json";
    if let Some(start) = text.find(FENCE) {
        let body = &text[start + FENCE.len()..];
        let end = body.find("```").unwrap_or(body.len());
        return body[..end].trim();
    }
    text.trim()
}
