//! Infrastructure layer for Claudio.
//!
//! Contains implementations of the ports defined in `claudio-core`:
//! JSON-file state storage, the ffmpeg concatenator, the on-disk session
//! workspace layout, and configuration loading.

pub mod config;
pub mod filesystem;
pub mod media;
pub mod store;
