//! Application layer - Services that use ports.

pub mod cleanup;
pub mod janitor;
pub mod metadata;
pub mod orchestrator;
pub mod worker;
