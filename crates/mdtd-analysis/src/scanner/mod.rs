//! Scanner subsystem: language detection, content hashing and file discovery.

pub mod hasher;
pub mod language_detect;
pub mod walker;

pub use language_detect::Language;
pub use walker::{Exclusions, SourceWalker};
