//! Production engine and port trait definitions for Claudio.
//!
//! This crate defines the "ports" (state store, generation gateway,
//! concatenator) that the infrastructure layer implements, plus the engine
//! that drives a session from approved plan to final video. It depends only
//! on `claudio-types` -- never on `claudio-infra` or any filesystem/process crate.

pub mod concat;
pub mod gateway;
pub mod planning;
pub mod production;
pub mod repository;
