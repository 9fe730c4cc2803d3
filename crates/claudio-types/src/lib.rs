//! Shared domain types for Claudio.
//!
//! This crate contains the domain model of a video production session:
//! scene plans, workflow state, cost estimates, production configuration,
//! generation requests, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod generation;
pub mod scene;
pub mod workflow;
