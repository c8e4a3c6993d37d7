//! Writing items into the archive: destination naming and content digests.

pub mod digest;
pub mod naming;
