//! Core data model: item identity and tag sets.

pub mod identity;
pub mod tags;
