//! Production configuration loader for Claudio.
//!
//! Reads `config.toml` from the data directory (`~/.claudio/` in production)
//! and deserializes it into [`ProductionConfig`]. Falls back to sensible
//! defaults when the file is missing or malformed.

use std::path::Path;

use claudio_types::config::ProductionConfig;

/// Load production configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ProductionConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> ProductionConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ProductionConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ProductionConfig::default();
        }
    };

    match toml::from_str::<ProductionConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ProductionConfig::default()
        }
    }
}
