//! `mailsweep`: incremental, exactly-once export of tagged mail into a
//! dated file archive.
//!
//! This crate provides the export engine (deduplication index, folder
//! traversal, collision-safe naming, export and re-tag), the mail store
//! interface it runs against, and a Maildir++ backend.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod index;
pub mod logging;
pub mod model;
pub mod store;
