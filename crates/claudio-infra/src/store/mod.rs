//! State store implementations.

pub mod json;

pub use json::JsonStateStore;
