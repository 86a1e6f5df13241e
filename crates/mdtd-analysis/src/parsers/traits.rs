//! LanguageAdapter trait: the contract every language adapter implements.

use crate::model::{ParseFailure, SourceUnit};
use crate::scanner::Language;

/// Turns raw source text into the language-neutral model.
///
/// Adapters are pure: the same text always yields the same result, and a
/// syntax error in one part of a file never discards the units recognized
/// elsewhere (they are carried in [`ParseFailure::partial`]).
pub trait LanguageAdapter: Send + Sync {
    /// The language this adapter handles.
    fn language(&self) -> Language;

    /// File extensions this adapter handles, without the dot.
    fn extensions(&self) -> &[&str];

    /// Parse `source`. `path` is used for reporting and for grammar variants
    /// selected by extension (`.tsx`).
    fn parse(&self, path: &str, source: &str) -> Result<SourceUnit, ParseFailure>;
}
