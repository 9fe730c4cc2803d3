//! Generation gateway port.
//!
//! The engine treats image and video generation as opaque, slow, fallible
//! calls. Whether a backend polls a long-running job or awaits a push
//! notification is hidden behind these two methods.

pub mod retry;

use std::path::PathBuf;

use claudio_types::error::GenerationError;
use claudio_types::generation::{ImageRequest, VideoRequest};

/// Image and video generation backend.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition) with explicit
/// `Send` bounds so calls can run inside spawned tasks.
pub trait GenerationGateway: Send + Sync {
    /// Produce the end-frame image for a scene and return its location.
    fn generate_end_frame_image(
        &self,
        request: &ImageRequest,
    ) -> impl std::future::Future<Output = Result<PathBuf, GenerationError>> + Send;

    /// Produce a video segment ending on `request.end_frame` (and starting on
    /// `request.start_frame` when given) and return its location.
    fn generate_video_segment(
        &self,
        request: &VideoRequest,
    ) -> impl std::future::Future<Output = Result<PathBuf, GenerationError>> + Send;
}
