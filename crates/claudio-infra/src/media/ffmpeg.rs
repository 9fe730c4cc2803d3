//! ffmpeg-backed implementation of `Concatenator`.
//!
//! Uses the concat demuxer with stream copy: segments are joined without
//! re-encoding, so they must share codec parameters (the video backend
//! produces uniform segments).

use std::path::{Path, PathBuf};

use claudio_core::concat::{Concatenator, ensure_inputs, list_line};
use claudio_types::error::ConcatError;
use tokio::process::Command;
use uuid::Uuid;

use crate::filesystem::SessionWorkspace;

/// Name of the temporary list file written into the session directory.
const CONCAT_LIST_FILE: &str = "concat_list.txt";

/// Concatenates segments into `sessions/{id}/final_video.mp4` with ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegConcatenator {
    workspace: SessionWorkspace,
    ffmpeg_path: String,
}

impl FfmpegConcatenator {
    pub fn new(workspace: SessionWorkspace, ffmpeg_path: impl Into<String>) -> Self {
        Self {
            workspace,
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    fn command(&self, list_path: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
            .arg(list_path)
            .args(["-c", "copy"])
            .arg(output)
            .kill_on_drop(true);
        cmd
    }
}

/// Render the concat-demuxer list for `inputs`, one line per segment.
pub fn render_concat_list(inputs: &[PathBuf]) -> String {
    let mut list = String::new();
    for path in inputs {
        list.push_str(&list_line(path));
        list.push('\n');
    }
    list
}

impl Concatenator for FfmpegConcatenator {
    async fn concatenate(
        &self,
        session_id: Uuid,
        inputs: &[PathBuf],
    ) -> Result<PathBuf, ConcatError> {
        ensure_inputs(inputs)?;
        for input in inputs {
            let readable = tokio::fs::metadata(input)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !readable {
                return Err(ConcatError::UnreadableInput(input.clone()));
            }
        }

        let session_dir = self.workspace.session_dir(session_id);
        tokio::fs::create_dir_all(&session_dir)
            .await
            .map_err(|e| ConcatError::Io(e.to_string()))?;

        let list_path = session_dir.join(CONCAT_LIST_FILE);
        let output = self.workspace.final_video_path(session_id);
        tokio::fs::write(&list_path, render_concat_list(inputs))
            .await
            .map_err(|e| ConcatError::Io(e.to_string()))?;

        tracing::debug!(
            session_id = %session_id,
            inputs = inputs.len(),
            ffmpeg = self.ffmpeg_path.as_str(),
            "running ffmpeg concat"
        );
        let result = self.command(&list_path, &output).output().await;

        if let Err(e) = tokio::fs::remove_file(&list_path).await {
            tracing::debug!(error = %e, "could not remove concat list");
        }

        let out = result.map_err(|e| {
            ConcatError::ToolFailed(format!("failed to run {}: {e}", self.ffmpeg_path))
        })?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(ConcatError::ToolFailed(format!("{}: {stderr}", out.status)));
        }

        tracing::info!(session_id = %session_id, path = %output.display(), "videos concatenated");
        Ok(output)
    }
}
