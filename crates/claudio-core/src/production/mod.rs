//! The production engine.
//!
//! [`orchestrator::ProductionOrchestrator`] drives a session through the
//! image, video and concatenation stages. Per-scene generation calls run on
//! the bounded [`scheduler::TaskScheduler`]; the
//! [`chainer`] wires each scene's start frame to its predecessor's end frame.

pub mod chainer;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ProductionError, Stage};
pub use orchestrator::{ProductionOrchestrator, ProgressCallback, StageCounts};
