//! Boyer-Moore Matcher
//!
//! Classic right-to-left Boyer-Moore over a 256-symbol byte alphabet.
//!
//! ## Shift rules
//! - **Bad character**: on a mismatch against text byte `c` at pattern index `j`,
//!   align the last occurrence of `c` in the pattern under it (`j - last[c]`).
//! - **Good suffix**: after matching the suffix starting at `j + 1`, shift to the
//!   next place where that suffix reappears preceded by a different byte, or to
//!   the widest border of the pattern that fits inside it.
//!
//! The scan always advances by the larger of the two, which is at least 1.
//! After a full match it advances by `shift[0]`, the smallest period of the
//! pattern, so overlapping occurrences are never skipped.

use super::{Matcher, is_searchable};

const ALPHABET_SIZE: usize = 256;

/// Stateless Boyer-Moore matcher. Tables are rebuilt for every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoyerMoore;

impl BoyerMoore {
    pub fn new() -> Self {
        Self
    }
}

impl Matcher for BoyerMoore {
    fn find_first(&self, text: &str, pattern: &str) -> Option<usize> {
        if !is_searchable(text.as_bytes(), pattern.as_bytes()) {
            return None;
        }
        BoyerMooreTables::new(pattern.as_bytes()).find_first(text.as_bytes())
    }

    fn find_all(&self, text: &str, pattern: &str) -> Vec<usize> {
        if !is_searchable(text.as_bytes(), pattern.as_bytes()) {
            return Vec::new();
        }
        BoyerMooreTables::new(pattern.as_bytes()).find_all(text.as_bytes())
    }
}

/// Preprocessed shift tables for one pattern.
///
/// Build once and reuse when the same pattern is searched in many texts.
#[derive(Debug, Clone)]
pub struct BoyerMooreTables<'p> {
    pattern: &'p [u8],
    bad_char: [isize; ALPHABET_SIZE],
    shift: Vec<usize>,
}

impl<'p> BoyerMooreTables<'p> {
    pub fn new(pattern: &'p [u8]) -> Self {
        Self {
            pattern,
            bad_char: bad_character_table(pattern),
            shift: good_suffix_table(pattern),
        }
    }

    pub fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    pub fn find_first(&self, text: &[u8]) -> Option<usize> {
        let mut first = None;
        self.scan(text, |pos| {
            first = Some(pos);
            false
        });
        first
    }

    pub fn find_all(&self, text: &[u8]) -> Vec<usize> {
        let mut positions = Vec::new();
        self.scan(text, |pos| {
            positions.push(pos);
            true
        });
        positions
    }

    /// Runs the alignment loop, reporting each match to `on_match`.
    /// The scan stops early when `on_match` returns `false`.
    fn scan<F>(&self, text: &[u8], mut on_match: F)
    where
        F: FnMut(usize) -> bool,
    {
        let m = self.pattern.len();
        let n = text.len();
        if !is_searchable(text, self.pattern) {
            return;
        }

        let mut s = 0usize;
        while s <= n - m {
            // `j` counts the bytes still unmatched; the next comparison is at j - 1.
            let mut j = m;
            while j > 0 && self.pattern[j - 1] == text[s + j - 1] {
                j -= 1;
            }

            if j == 0 {
                if !on_match(s) {
                    return;
                }
                s += self.shift[0];
            } else {
                let mismatch = j - 1;
                let bad = mismatch as isize - self.bad_char[text[s + mismatch] as usize];
                let good = self.shift[mismatch + 1] as isize;
                s += good.max(bad) as usize;
            }
        }
    }
}

/// Last index of every byte value in `pattern`, or -1 when absent.
fn bad_character_table(pattern: &[u8]) -> [isize; ALPHABET_SIZE] {
    let mut table = [-1isize; ALPHABET_SIZE];
    for (i, &byte) in pattern.iter().enumerate() {
        table[byte as usize] = i as isize;
    }
    table
}

/// Strong good-suffix shifts, indexed by the start of the matched suffix.
///
/// `border_pos[i]` holds the start of the widest border of `pattern[i..]`.
/// The first pass fills shifts for suffixes that reoccur inside the pattern;
/// the second fills the rest from the widest border of the whole pattern.
fn good_suffix_table(pattern: &[u8]) -> Vec<usize> {
    let m = pattern.len();
    let mut shift = vec![0usize; m + 1];
    let mut border_pos = vec![0usize; m + 1];

    let mut i = m;
    let mut j = m + 1;
    border_pos[i] = j;
    while i > 0 {
        while j <= m && pattern[i - 1] != pattern[j - 1] {
            if shift[j] == 0 {
                shift[j] = j - i;
            }
            j = border_pos[j];
        }
        i -= 1;
        j -= 1;
        border_pos[i] = j;
    }

    let mut j = border_pos[0];
    for i in 0..=m {
        if shift[i] == 0 {
            shift[i] = j;
        }
        if i == j {
            j = border_pos[j];
        }
    }

    shift
}
