//! Persistence port definitions.

pub mod state_store;
