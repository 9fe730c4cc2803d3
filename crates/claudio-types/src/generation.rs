//! Request types sent to image and video generation backends.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for one scene's end-frame image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub session_id: Uuid,
    pub scene_id: String,
    pub prompt: String,
    /// Aspect ratio such as "16:9".
    pub aspect_ratio: String,
    /// Backend quality tier such as "hd".
    pub quality: String,
}

/// Request for one scene's video segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRequest {
    pub session_id: Uuid,
    pub scene_id: String,
    pub prompt: String,
    /// Segment length in seconds.
    pub duration: f64,
    /// Image the segment must end on.
    pub end_frame: PathBuf,
    /// Image the segment must start on: the previous scene's end frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_frame: Option<PathBuf>,
    /// Output resolution such as "1080p".
    pub resolution: String,
}
