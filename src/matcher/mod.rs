//! Exact Match Module
//!
//! Substring search primitives used by every shard to decide whether a document
//! matches a query term.
//!
//! ## Overview
//! Matching is exact and byte-oriented: texts and patterns are UTF-8 strings and
//! every reported offset is a byte offset into the text. Because UTF-8 is
//! self-synchronizing, a match of a valid pattern always starts on a character
//! boundary. Case folding is the caller's job.
//!
//! ## Submodules
//! - **`boyer_moore`**: Boyer-Moore search using the bad-character and strong
//!   good-suffix rules. The only [`Matcher`] implementation today.

pub mod boyer_moore;

pub use boyer_moore::{BoyerMoore, BoyerMooreTables};

/// Capability set for exact substring search.
///
/// Implementations must be pure: no state is shared between calls, so a single
/// matcher can serve any number of concurrent searches.
pub trait Matcher: Send + Sync {
    /// Offset of the first occurrence of `pattern` in `text`, if any.
    fn find_first(&self, text: &str, pattern: &str) -> Option<usize>;

    /// Offsets of every occurrence of `pattern` in `text`, strictly increasing.
    /// Overlapping occurrences are reported.
    fn find_all(&self, text: &str, pattern: &str) -> Vec<usize>;

    fn contains(&self, text: &str, pattern: &str) -> bool {
        self.find_first(text, pattern).is_some()
    }
}

/// An empty pattern, an empty text, or a pattern longer than the text can never
/// produce a match.
pub(crate) fn is_searchable(text: &[u8], pattern: &[u8]) -> bool {
    !pattern.is_empty() && !text.is_empty() && pattern.len() <= text.len()
}
