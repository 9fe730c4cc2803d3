//! Production configuration types for Claudio.
//!
//! `ProductionConfig` represents the top-level `config.toml` controlling scene
//! limits, concurrency, pricing, output formats and gateway retry behaviour.
//! It is built once at startup and passed explicitly to the collaborators
//! that need it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration for video production.
///
/// Loaded from `~/.claudio/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionConfig {
    /// Longest video segment (seconds) the video backend can produce.
    #[serde(default = "default_max_scene_duration")]
    pub max_scene_duration: f64,

    /// Maximum generation calls in flight at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Price of one end-frame image in USD.
    #[serde(default = "default_image_cost")]
    pub image_cost: f64,

    /// Price of one second of generated video in USD.
    #[serde(default = "default_video_cost_per_second")]
    pub video_cost_per_second: f64,

    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,

    #[serde(default = "default_image_quality")]
    pub image_quality: String,

    #[serde(default = "default_video_resolution")]
    pub video_resolution: String,

    /// Executable used for concatenation.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_max_scene_duration() -> f64 {
    8.0
}

fn default_max_concurrency() -> usize {
    4
}

fn default_image_cost() -> f64 {
    0.10
}

fn default_video_cost_per_second() -> f64 {
    0.40
}

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

fn default_image_quality() -> String {
    "hd".to_string()
}

fn default_video_resolution() -> String {
    "1080p".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            max_scene_duration: default_max_scene_duration(),
            max_concurrency: default_max_concurrency(),
            image_cost: default_image_cost(),
            video_cost_per_second: default_video_cost_per_second(),
            aspect_ratio: default_aspect_ratio(),
            image_quality: default_image_quality(),
            video_resolution: default_video_resolution(),
            ffmpeg_path: default_ffmpeg_path(),
            retry: RetryConfig::default(),
        }
    }
}

/// Exponential backoff settings for generation calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first (1 disables retries).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound for any single delay in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_config_default_values() {
        let config = ProductionConfig::default();
        assert!((config.max_scene_duration - 8.0).abs() < f64::EPSILON);
        assert_eq!(config.max_concurrency, 4);
        assert!((config.image_cost - 0.10).abs() < f64::EPSILON);
        assert!((config.video_cost_per_second - 0.40).abs() < f64::EPSILON);
        assert_eq!(config.aspect_ratio, "16:9");
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_production_config_deserialize_with_defaults() {
        let config: ProductionConfig = toml::from_str("").unwrap();
        assert_eq!(config, ProductionConfig::default());
    }

    #[test]
    fn test_production_config_deserialize_with_values() {
        let toml_str = r#"
max_scene_duration = 6.0
max_concurrency = 2
video_resolution = "720p"

[retry]
max_attempts = 5
initial_delay_ms = 250
"#;
        let config: ProductionConfig = toml::from_str(toml_str).unwrap();
        assert!((config.max_scene_duration - 6.0).abs() < f64::EPSILON);
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.video_resolution, "720p");
        assert_eq!(config.image_quality, "hd");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay_ms, 250);
        assert!((config.retry.backoff_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_retry_delay_grows_and_caps() {
        let retry = RetryConfig {
            max_attempts: 6,
            initial_delay_ms: 1_000,
            backoff_multiplier: 2.0,
            max_delay_ms: 5_000,
        };
        assert_eq!(retry.delay_for(1), Duration::from_secs(1));
        assert_eq!(retry.delay_for(2), Duration::from_secs(2));
        assert_eq!(retry.delay_for(3), Duration::from_secs(4));
        assert_eq!(retry.delay_for(4), Duration::from_secs(5));
    }
}
