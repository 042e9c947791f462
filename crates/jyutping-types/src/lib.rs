//! Shared, zero-copy types for Jyutping character tables.
//!
//! A table line carries three whitespace-separated fields: the code point
//! column, the character or word, and its Jyutping spelling with a trailing
//! tone digit (`你 你 nei5`). [`Entry`] borrows those fields straight from the
//! line; [`strip_tone`] and [`initial`] derive the lookup key and its first
//! letter the same way every loader in this workspace does.
//!
//! ```rust
//! use jyutping_types::{Entry, initial, strip_tone, tone_of};
//!
//! let entry = Entry::parse("你 你 nei5").unwrap();
//! assert_eq!(entry.word, "你");
//! assert_eq!(entry.key(), "nei");
//! assert_eq!(strip_tone("jyut6"), "jyut");
//! assert_eq!(initial("nei"), Some('n'));
//! assert_eq!(tone_of("nei5"), Some(5));
//! ```

use std::fmt;

/// Minimum number of whitespace-separated fields in a table line.
pub const ENTRY_FIELDS: usize = 3;

/// One parsed table line. Fields past the third are ignored.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Entry<'a> {
    pub utf_char: &'a str,
    pub word: &'a str,
    pub jyutping: &'a str,
}

impl<'a> Entry<'a> {
    /// Split a line on runs of whitespace and take the first three fields.
    ///
    /// Returns `None` when the line has fewer than [`ENTRY_FIELDS`] fields,
    /// blank lines included.
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let utf_char = fields.next()?;
        let word = fields.next()?;
        let jyutping = fields.next()?;
        Some(Self {
            utf_char,
            word,
            jyutping,
        })
    }

    /// The spelling with its tone marker removed.
    pub fn key(&self) -> &'a str {
        strip_tone(self.jyutping)
    }
}

impl fmt::Display for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.utf_char, self.word, self.jyutping)
    }
}

/// Drop the final character of a spelling.
///
/// The tone marker is assumed to be the last character, digit or not. Empty
/// and single-character spellings strip to `""`.
pub fn strip_tone(spelling: &str) -> &str {
    match spelling.char_indices().next_back() {
        Some((idx, _)) => &spelling[..idx],
        None => spelling,
    }
}

/// Trailing tone digit of a spelling, if the last character is an ASCII digit.
pub fn tone_of(spelling: &str) -> Option<u8> {
    spelling
        .chars()
        .next_back()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
}

/// First character of a key, used to bucket prefix frequencies.
pub fn initial(key: &str) -> Option<char> {
    key.chars().next()
}
