//! Media tooling adapters.

pub mod ffmpeg;

pub use ffmpeg::FfmpegConcatenator;
