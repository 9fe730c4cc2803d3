//! On-disk layout of production sessions.
//!
//! Every session owns one directory under `{data_dir}/sessions/`:
//!
//! ```text
//! sessions/{session_id}/
//!     state.json
//!     images/{scene_id}_end.png
//!     videos/{scene_id}.mp4
//!     final_video.mp4
//! ```

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Path layout rooted at the data directory.
#[derive(Debug, Clone)]
pub struct SessionWorkspace {
    root: PathBuf,
}

impl SessionWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/sessions/`
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    /// `{root}/sessions/{session_id}/`
    pub fn session_dir(&self, session_id: Uuid) -> PathBuf {
        self.sessions_dir().join(session_id.to_string())
    }

    pub fn state_path(&self, session_id: Uuid) -> PathBuf {
        self.session_dir(session_id).join("state.json")
    }

    pub fn images_dir(&self, session_id: Uuid) -> PathBuf {
        self.session_dir(session_id).join("images")
    }

    pub fn videos_dir(&self, session_id: Uuid) -> PathBuf {
        self.session_dir(session_id).join("videos")
    }

    /// Where a gateway should store a scene's end-frame image.
    pub fn image_path(&self, session_id: Uuid, scene_id: &str) -> PathBuf {
        self.images_dir(session_id).join(format!("{scene_id}_end.png"))
    }

    /// Where a gateway should store a scene's video segment.
    pub fn video_path(&self, session_id: Uuid, scene_id: &str) -> PathBuf {
        self.videos_dir(session_id).join(format!("{scene_id}.mp4"))
    }

    pub fn final_video_path(&self, session_id: Uuid) -> PathBuf {
        self.session_dir(session_id).join("final_video.mp4")
    }

    /// Create the session directory with its `images/` and `videos/` folders.
    pub async fn ensure_session_dirs(&self, session_id: Uuid) -> io::Result<()> {
        tokio::fs::create_dir_all(self.images_dir(session_id)).await?;
        tokio::fs::create_dir_all(self.videos_dir(session_id)).await
    }

    /// Remove intermediate images and videos of a session.
    ///
    /// With `keep_final` the concatenated output survives; otherwise it is
    /// removed too. State is always kept.
    pub async fn cleanup_session(&self, session_id: Uuid, keep_final: bool) -> io::Result<()> {
        for dir in [self.images_dir(session_id), self.videos_dir(session_id)] {
            remove_dir_if_exists(&dir).await?;
        }
        if !keep_final {
            match tokio::fs::remove_file(self.final_video_path(session_id)).await {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
                _ => {}
            }
        }
        tracing::info!(session_id = %session_id, keep_final, "session assets cleaned up");
        Ok(())
    }
}

async fn remove_dir_if_exists(dir: &Path) -> io::Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `CLAUDIO_WORKSPACE_DIR` environment variable
/// 2. Home directory fallback: `~/.claudio`
/// 3. `.claudio` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CLAUDIO_WORKSPACE_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".claudio");
    }

    PathBuf::from(".claudio")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_session_paths() {
        let workspace = SessionWorkspace::new("/home/user/.claudio");
        let id = Uuid::parse_str("0190a5c2-7d3e-7c1a-9f00-000000000001").unwrap();
        let base = "/home/user/.claudio/sessions/0190a5c2-7d3e-7c1a-9f00-000000000001";

        assert_eq!(workspace.session_dir(id), PathBuf::from(base));
        assert_eq!(
            workspace.state_path(id),
            PathBuf::from(format!("{base}/state.json"))
        );
        assert_eq!(
            workspace.image_path(id, "scene_2"),
            PathBuf::from(format!("{base}/images/scene_2_end.png"))
        );
        assert_eq!(
            workspace.video_path(id, "scene_2"),
            PathBuf::from(format!("{base}/videos/scene_2.mp4"))
        );
        assert_eq!(
            workspace.final_video_path(id),
            PathBuf::from(format!("{base}/final_video.mp4"))
        );
    }

    #[tokio::test]
    async fn test_cleanup_keeps_final_and_state() {
        let dir = tempdir().unwrap();
        let workspace = SessionWorkspace::new(dir.path());
        let id = Uuid::now_v7();

        workspace.ensure_session_dirs(id).await.unwrap();
        tokio::fs::write(workspace.image_path(id, "scene_1"), b"png").await.unwrap();
        tokio::fs::write(workspace.video_path(id, "scene_1"), b"mp4").await.unwrap();
        tokio::fs::write(workspace.final_video_path(id), b"final").await.unwrap();
        tokio::fs::write(workspace.state_path(id), b"{}").await.unwrap();

        workspace.cleanup_session(id, true).await.unwrap();
        assert!(!workspace.images_dir(id).exists());
        assert!(!workspace.videos_dir(id).exists());
        assert!(workspace.final_video_path(id).exists());
        assert!(workspace.state_path(id).exists());

        workspace.cleanup_session(id, false).await.unwrap();
        assert!(!workspace.final_video_path(id).exists());
        assert!(workspace.state_path(id).exists());
    }

    #[tokio::test]
    async fn test_cleanup_of_empty_session_is_ok() {
        let dir = tempdir().unwrap();
        let workspace = SessionWorkspace::new(dir.path());
        workspace.cleanup_session(Uuid::now_v7(), false).await.unwrap();
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var("CLAUDIO_WORKSPACE_DIR", "/tmp/test-claudio");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-claudio"));
        unsafe {
            std::env::remove_var("CLAUDIO_WORKSPACE_DIR");
        }
    }
}
