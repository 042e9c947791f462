//! Load a Jyutping character table into an in-memory candidate dictionary.
//!
//! Each line of the table maps a character or word to a Jyutping spelling
//! with a trailing tone digit. Lines are grouped by their tone-stripped key
//! (`nei5` and `nei6` both land under `nei`), keeping the first-seen order of
//! words and dropping repeats. A second pass counts words per initial letter
//! of the key, which input methods use to rank candidates by initial sound.
//!
//! Everything is built once at load time; the resulting [`JyutpingDict`] is
//! read-only and can be shared freely once constructed.
//!
//! # Features
//! - Fail-fast parsing: the first malformed line aborts the load with its
//!   1-indexed line number, no partial dictionary is returned.
//! - Runtime backing choice: stream the file with [`LoadMode::Buffered`] or
//!   memory-map it with [`LoadMode::Mmap`].
//! - Literal lookups: keys are matched exactly as stored, and a missing key is
//!   an error rather than an empty result.
//!
//! # Example
//! ```no_run
//! use jyutping_dict::JyutpingDict;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dict = JyutpingDict::load("sources/JPTable-iso.txt")?;
//! println!("nei: {:?}", dict.suggested_characters("nei")?);
//! for (initial, count) in dict.prefix_freq() {
//!     println!("{initial}: {count}");
//! }
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p jyutping-dict --example stats -- <table>`.

use std::collections::HashMap;
use std::collections::hash_map::Entry as MapEntry;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use jyutping_types::{Entry, initial};
use memmap2::Mmap;
use thiserror::Error;
use tracing::{debug, info};

/// Table location used by [`JyutpingDict::load_default`].
pub const DEFAULT_TABLE_PATH: &str = "sources/JPTable-iso.txt";

/// Strategy for reading the table file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadMode {
    /// Stream the file line by line through a buffered reader.
    #[default]
    Buffered,
    /// Memory-map the file and split lines from the mapped bytes.
    Mmap,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid entry in {} in line {line}", .path.display())]
    MalformedEntry { path: PathBuf, line: usize },
    #[error(
        "invalid entry in {} in line {line}: spelling {spelling:?} has no syllable before the tone",
        .path.display()
    )]
    EmptyKey {
        path: PathBuf,
        line: usize,
        spelling: String,
    },
    #[error("invalid utf-8 in {} in line {line}", .path.display())]
    Encoding { path: PathBuf, line: usize },
}

impl LoadError {
    /// 1-indexed line that failed to parse, if the error is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoadError::Io { .. } => None,
            LoadError::MalformedEntry { line, .. }
            | LoadError::EmptyKey { line, .. }
            | LoadError::Encoding { line, .. } => Some(*line),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum LookupError {
    #[error("no characters found for {0:?}")]
    KeyNotFound(String),
}

/// Jyutping key to candidate characters, plus per-initial word counts.
#[derive(Clone, Debug)]
pub struct JyutpingDict {
    source: PathBuf,
    jyutdict: HashMap<String, Vec<String>>,
    prefix_freq: HashMap<char, usize>,
}

impl JyutpingDict {
    /// Load the table at [`DEFAULT_TABLE_PATH`].
    pub fn load_default() -> Result<Self, LoadError> {
        Self::load(DEFAULT_TABLE_PATH)
    }

    /// Load a table, streaming it line by line.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::load_with_mode(path, LoadMode::Buffered)
    }

    /// Load a table choosing between buffered reads and mmap at runtime.
    pub fn load_with_mode(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let start = Instant::now();

        let jyutdict = match mode {
            LoadMode::Buffered => read_buffered(path)?,
            LoadMode::Mmap => read_mapped(path)?,
        };
        let prefix_freq = build_prefix_freq(&jyutdict);

        let dict = Self {
            source: path.to_path_buf(),
            jyutdict,
            prefix_freq,
        };
        info!(
            "loaded {} keys ({} words) from {} in {} ms",
            dict.key_count(),
            dict.word_count(),
            path.display(),
            start.elapsed().as_millis()
        );
        Ok(dict)
    }

    /// Candidate words for a tone-stripped key, in first-seen order.
    ///
    /// The key is matched literally; callers strip tones themselves.
    pub fn suggested_characters(&self, key: &str) -> Result<&[String], LookupError> {
        self.jyutdict
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::KeyNotFound(key.to_string()))
    }

    /// Word counts keyed by the first character of each key.
    pub fn prefix_freq(&self) -> &HashMap<char, usize> {
        &self.prefix_freq
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.jyutdict.contains_key(key)
    }

    /// Number of distinct tone-stripped keys.
    pub fn key_count(&self) -> usize {
        self.jyutdict.len()
    }

    /// Number of words across all keys.
    pub fn word_count(&self) -> usize {
        self.jyutdict.values().map(Vec::len).sum()
    }

    /// Iterate over `(key, words)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.jyutdict
            .iter()
            .map(|(key, words)| (key.as_str(), words.as_slice()))
    }

    /// Path the table was loaded from.
    pub fn source_path(&self) -> &Path {
        &self.source
    }
}

struct DictBuilder<'p> {
    path: &'p Path,
    jyutdict: HashMap<String, Vec<String>>,
}

impl<'p> DictBuilder<'p> {
    fn new(path: &'p Path) -> Self {
        Self {
            path,
            jyutdict: HashMap::new(),
        }
    }

    fn push_line(&mut self, lineno: usize, line: &str) -> Result<(), LoadError> {
        let entry = Entry::parse(line).ok_or_else(|| LoadError::MalformedEntry {
            path: self.path.to_path_buf(),
            line: lineno,
        })?;
        let key = entry.key();
        if key.is_empty() {
            return Err(LoadError::EmptyKey {
                path: self.path.to_path_buf(),
                line: lineno,
                spelling: entry.jyutping.to_string(),
            });
        }

        match self.jyutdict.entry(key.to_string()) {
            MapEntry::Vacant(slot) => {
                slot.insert(vec![entry.word.to_string()]);
            }
            MapEntry::Occupied(mut slot) => {
                let words = slot.get_mut();
                if words.iter().any(|w| w == entry.word) {
                    debug!("line {lineno}: {} already listed under {key}", entry.word);
                } else {
                    words.push(entry.word.to_string());
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> HashMap<String, Vec<String>> {
        self.jyutdict
    }
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_buffered(path: &Path) -> Result<HashMap<String, Vec<String>>, LoadError> {
    let reader = BufReader::new(open(path)?);
    let mut builder = DictBuilder::new(path);
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        builder.push_line(idx + 1, &line)?;
    }
    Ok(builder.finish())
}

fn read_mapped(path: &Path) -> Result<HashMap<String, Vec<String>>, LoadError> {
    let file = open(path)?;
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let len = file.metadata().map_err(io_err)?.len();
    let mut builder = DictBuilder::new(path);
    if len == 0 {
        return Ok(builder.finish());
    }

    let map = unsafe { Mmap::map(&file) }.map_err(io_err)?;
    let bytes = map.as_ref();
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    for (idx, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let line = std::str::from_utf8(raw_line).map_err(|_| LoadError::Encoding {
            path: path.to_path_buf(),
            line: idx + 1,
        })?;
        builder.push_line(idx + 1, line)?;
    }
    Ok(builder.finish())
}

fn build_prefix_freq(jyutdict: &HashMap<String, Vec<String>>) -> HashMap<char, usize> {
    let mut prefix_freq = HashMap::new();
    for (key, words) in jyutdict {
        if let Some(first) = initial(key) {
            *prefix_freq.entry(first).or_insert(0) += words.len();
        }
    }
    prefix_freq
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_table(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn load(lines: &[&str]) -> JyutpingDict {
        let file = make_table(lines);
        JyutpingDict::load(file.path()).expect("load table")
    }

    #[test]
    fn groups_tone_variants_under_one_key() {
        let dict = load(&["你 你 nei5", "女 女 nei5"]);
        assert_eq!(dict.suggested_characters("nei").unwrap(), ["你", "女"]);
        assert_eq!(dict.prefix_freq(), &HashMap::from([('n', 2)]));
        assert_eq!(dict.key_count(), 1);
        assert_eq!(dict.word_count(), 2);
    }

    #[test]
    fn deduplicates_words_across_tones() {
        let dict = load(&["你 你 nei5", "你 你 nei6"]);
        assert_eq!(dict.suggested_characters("nei").unwrap(), ["你"]);
        assert_eq!(dict.prefix_freq()[&'n'], 1);
    }

    #[test]
    fn keeps_first_seen_order() {
        let dict = load(&["A A nei5", "B B nei6", "A A nei2"]);
        assert_eq!(dict.suggested_characters("nei").unwrap(), ["A", "B"]);
    }

    #[test]
    fn ignores_extra_fields_and_whitespace_runs() {
        let dict = load(&["你\t你   nei5  trailing junk", "  女 女 neoi5\r"]);
        assert_eq!(dict.suggested_characters("nei").unwrap(), ["你"]);
        assert_eq!(dict.suggested_characters("neoi").unwrap(), ["女"]);
    }

    #[test]
    fn counts_words_not_keys_per_initial() {
        let dict = load(&[
            "你 你 nei5",
            "女 女 neoi5",
            "呢 呢 ne1",
            "尼 尼 nei4",
            "我 我 ngo5",
            "啊 啊 aa3",
        ]);
        assert_eq!(dict.prefix_freq()[&'n'], 5);
        assert_eq!(dict.prefix_freq()[&'a'], 1);
        let total: usize = dict.prefix_freq().values().sum();
        assert_eq!(total, dict.word_count());
    }

    #[test]
    fn missing_key_is_an_error() {
        let dict = load(&["你 你 nei5"]);
        assert_eq!(
            dict.suggested_characters("ngo"),
            Err(LookupError::KeyNotFound("ngo".to_string()))
        );
        // Lookups are literal: the toned spelling is not a key.
        assert!(dict.suggested_characters("nei5").is_err());
        assert!(!dict.contains_key("nei5"));
        assert!(dict.contains_key("nei"));
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let file = make_table(&["你 你 nei5", "女 女 neoi5", "broken", "我 我 ngo5"]);
        let err = JyutpingDict::load(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::MalformedEntry { line: 3, .. }));
        assert_eq!(err.line(), Some(3));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn blank_line_is_malformed() {
        let file = make_table(&["你 你 nei5", ""]);
        let err = JyutpingDict::load(file.path()).unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn rejects_spelling_without_syllable() {
        let file = make_table(&["你 你 nei5", "x x 5"]);
        let err = JyutpingDict::load(file.path()).unwrap_err();
        match err {
            LoadError::EmptyKey { line, spelling, .. } => {
                assert_eq!(line, 2);
                assert_eq!(spelling, "5");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JyutpingDict::load(dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(err.line(), None);
    }

    #[test]
    fn load_default_uses_bundled_location() {
        match JyutpingDict::load_default() {
            Ok(dict) => assert_eq!(dict.source_path(), Path::new(DEFAULT_TABLE_PATH)),
            Err(LoadError::Io { path, .. }) => assert_eq!(path, Path::new(DEFAULT_TABLE_PATH)),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_file_loads_empty_dictionary() {
        let file = NamedTempFile::new().unwrap();
        for mode in [LoadMode::Buffered, LoadMode::Mmap] {
            let dict = JyutpingDict::load_with_mode(file.path(), mode).unwrap();
            assert_eq!(dict.key_count(), 0);
            assert!(dict.prefix_freq().is_empty());
        }
    }

    #[test]
    fn mmap_and_buffered_agree() {
        let file = make_table(&["你 你 nei5", "女 女 neoi5", "尼 尼 nei4", "你 你 nei6"]);
        let buffered = JyutpingDict::load_with_mode(file.path(), LoadMode::Buffered).unwrap();
        let mapped = JyutpingDict::load_with_mode(file.path(), LoadMode::Mmap).unwrap();
        assert_eq!(buffered.jyutdict, mapped.jyutdict);
        assert_eq!(buffered.prefix_freq, mapped.prefix_freq);
    }

    #[test]
    fn mmap_reports_malformed_line() {
        let file = make_table(&["你 你 nei5", "你 你", "女 女 neoi5"]);
        let err = JyutpingDict::load_with_mode(file.path(), LoadMode::Mmap).unwrap_err();
        assert!(matches!(err, LoadError::MalformedEntry { line: 2, .. }));
    }

    #[test]
    fn mmap_rejects_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\xe4\xbd\xa0 \xe4\xbd\xa0 nei5\n\xff\xfe x5\n")
            .unwrap();
        let err = JyutpingDict::load_with_mode(file.path(), LoadMode::Mmap).unwrap_err();
        assert!(matches!(err, LoadError::Encoding { line: 2, .. }));
    }

    #[test]
    fn crlf_line_endings_are_tolerated() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all("你 你 nei5\r\n女 女 nei5\r\n".as_bytes())
            .unwrap();
        for mode in [LoadMode::Buffered, LoadMode::Mmap] {
            let dict = JyutpingDict::load_with_mode(file.path(), mode).unwrap();
            assert_eq!(dict.suggested_characters("nei").unwrap(), ["你", "女"]);
        }
    }
}
