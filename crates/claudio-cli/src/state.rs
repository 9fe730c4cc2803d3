//! Application state wiring the infra adapters together.

use std::path::PathBuf;

use anyhow::Context;
use claudio_infra::config::load_config;
use claudio_infra::filesystem::{SessionWorkspace, resolve_data_dir};
use claudio_infra::media::FfmpegConcatenator;
use claudio_infra::store::JsonStateStore;
use claudio_types::config::ProductionConfig;

/// Shared state for command handlers.
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: ProductionConfig,
    pub workspace: SessionWorkspace,
    pub store: JsonStateStore,
    pub concatenator: FfmpegConcatenator,
}

impl AppState {
    /// Resolve the data directory, load `config.toml` and build the adapters.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        Self::at(data_dir).await
    }

    pub async fn at(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        let workspace = SessionWorkspace::new(&data_dir);
        let store = JsonStateStore::new(workspace.clone());
        let concatenator = FfmpegConcatenator::new(workspace.clone(), config.ffmpeg_path.clone());

        Ok(Self {
            data_dir,
            config,
            workspace,
            store,
            concatenator,
        })
    }
}
