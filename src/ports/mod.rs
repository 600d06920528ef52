//! Ports - Trait definitions for the collaborators around the core.

pub mod clipper;
pub mod repository;
pub mod resolver;
