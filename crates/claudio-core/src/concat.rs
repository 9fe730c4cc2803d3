//! Concatenation port.

use std::path::{Path, PathBuf};

use claudio_types::error::ConcatError;
use uuid::Uuid;

/// Joins a session's video segments into one output file.
pub trait Concatenator: Send + Sync {
    /// Concatenate `inputs` in the given order.
    ///
    /// Fails with [`ConcatError::EmptyInput`] when `inputs` is empty and with
    /// [`ConcatError::UnreadableInput`] when any segment cannot be read.
    fn concatenate(
        &self,
        session_id: Uuid,
        inputs: &[PathBuf],
    ) -> impl std::future::Future<Output = Result<PathBuf, ConcatError>> + Send;
}

/// Fail fast on an empty segment list before invoking any tool.
pub fn ensure_inputs(inputs: &[PathBuf]) -> Result<(), ConcatError> {
    if inputs.is_empty() {
        return Err(ConcatError::EmptyInput);
    }
    Ok(())
}

/// Render one concat-demuxer list line, escaping single quotes.
pub fn list_line(path: &Path) -> String {
    let escaped = path.display().to_string().replace('\'', r"'\''");
    format!("file '{escaped}'")
}
