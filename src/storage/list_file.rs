//! Domain list files
//!
//! A domain list is a UTF-8 text file with one entry per line:
//!
//! ```text
//! # comment
//! example.com        allow
//! ads.example.com    deny tracking
//! example.org
//! ```
//!
//! The first whitespace-separated word is the domain; the rest of the line,
//! trimmed, is its value. Blank lines and lines starting with the configured
//! comment prefix are ignored.

use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use rayon::iter::{Either, IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, instrument, warn};

use crate::domain::{Config, DomainKey, MalformedDomainError, Tree};

/// A well-formed line of a domain list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The 1-based line number.
    pub line: usize,
    /// The canonical domain.
    pub key: DomainKey,
    /// The rest of the line, trimmed. May be empty.
    pub value: String,
}

/// A line whose domain could not be canonicalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedEntry {
    /// The 1-based line number.
    pub line: usize,
    /// The line as written.
    pub text: String,
    /// Why the domain was rejected.
    pub error: MalformedDomainError,
}

impl fmt::Display for MalformedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

/// Every entry of a domain list, in file order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Listing {
    /// The well-formed entries.
    pub entries: Vec<Entry>,
    /// The malformed entries.
    pub malformed: Vec<MalformedEntry>,
}

/// Errors that can occur when loading a domain list.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Some lines contain malformed domains and the configuration does not
    /// allow skipping them.
    MalformedEntries(Vec<MalformedEntry>),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, .. } => write!(f, "Failed to read {}", path.display()),
            Self::MalformedEntries(entries) => {
                write!(f, "Malformed entries: ")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{entry}")?;
                }
                Ok(())
            }
        }
    }
}

/// Reads and canonicalizes every entry of a domain list.
///
/// Malformed lines are collected rather than treated as errors, whatever the
/// configuration says.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read(path: &Path, config: &Config) -> Result<Listing, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&content, config))
}

/// Loads a domain list into a tree.
///
/// Entries are inserted in file order, so a later line for the same domain
/// replaces the value of an earlier one.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or if it contains malformed
/// domains and [`Config::skip_malformed`] is not set.
#[instrument(skip(config))]
pub fn load(path: &Path, config: &Config) -> Result<Tree<String>, LoadError> {
    let Listing { entries, malformed } = read(path, config)?;

    if !malformed.is_empty() {
        if !config.skip_malformed {
            return Err(LoadError::MalformedEntries(malformed));
        }
        for entry in &malformed {
            warn!("Skipping {entry}");
        }
    }

    let mut tree = Tree::new();
    for Entry { line, key, value } in entries {
        if !tree.insert_key_in_place(key, value) {
            debug!("line {line} replaces an earlier entry");
        }
    }
    debug!(entries = tree.len(), "Loaded domain list");
    Ok(tree)
}

fn parse(content: &str, config: &Config) -> Listing {
    let lines: Vec<&str> = content.lines().collect();

    let (entries, malformed) = lines
        .par_iter()
        .enumerate()
        .filter(|(_, text)| !config.is_ignored(text))
        .partition_map(|(index, text)| match parse_line(index + 1, text) {
            Ok(entry) => Either::Left(entry),
            Err(entry) => Either::Right(entry),
        });

    Listing { entries, malformed }
}

fn parse_line(line: usize, text: &str) -> Result<Entry, MalformedEntry> {
    let trimmed = text.trim();
    let (domain, value) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));

    match DomainKey::parse(domain) {
        Ok(key) => Ok(Entry {
            line,
            key,
            value: value.trim().to_string(),
        }),
        Err(error) => Err(MalformedEntry {
            line,
            text: text.to_string(),
            error,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn list_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn key(domain: &str) -> DomainKey {
        domain.parse().unwrap()
    }

    #[test]
    fn loads_entries_and_values() {
        let file = list_file(
            "# blocklist\n\nexample.com allow\nads.example.com\tdeny  tracking \nexample.org\n",
        );

        let tree = load(file.path(), &Config::default()).unwrap();

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get("example.com").unwrap().map(String::as_str), Some("allow"));
        assert_eq!(
            tree.get("ads.example.com").unwrap().map(String::as_str),
            Some("deny  tracking")
        );
        assert_eq!(tree.get("example.org").unwrap().map(String::as_str), Some(""));
    }

    #[test]
    fn later_lines_replace_earlier_ones() {
        let file = list_file("example.com first\nEXAMPLE.com. second\n");

        let tree = load(file.path(), &Config::default()).unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("example.com").unwrap().map(String::as_str), Some("second"));
    }

    #[test]
    fn malformed_entries_fail_the_load() {
        let file = list_file("good.com\nbad!domain.com x\nalso..bad\nfine.org\n");

        let error = load(file.path(), &Config::default()).unwrap_err();

        let LoadError::MalformedEntries(entries) = error else {
            panic!("expected malformed entries");
        };
        let lines: Vec<_> = entries.iter().map(|entry| entry.line).collect();
        assert_eq!(lines, [2, 3]);
        assert_eq!(entries[0].text, "bad!domain.com x");
        assert!(matches!(
            entries[1].error,
            MalformedDomainError::EmptyLabel { .. }
        ));
    }

    #[test]
    fn malformed_entries_can_be_skipped() {
        let file = list_file("good.com\n-bad.com\nfine.org\n");
        let mut config = Config::default();
        config.skip_malformed = true;

        let tree = load(file.path(), &config).unwrap();

        let domains: Vec<_> = tree.iter().map(|(key, _)| key.to_string()).collect();
        assert_eq!(domains, ["good.com", "fine.org"]);
    }

    #[test]
    fn read_reports_malformed_entries_regardless_of_config() {
        let file = list_file("good.com\n-bad.com\n");
        let mut config = Config::default();
        config.skip_malformed = true;

        let listing = read(file.path(), &config).unwrap();

        assert_eq!(
            listing.entries,
            [Entry {
                line: 1,
                key: key("good.com"),
                value: String::new(),
            }]
        );
        assert_eq!(listing.malformed.len(), 1);
        assert_eq!(listing.malformed[0].line, 2);
    }

    #[test]
    fn custom_comment_prefix() {
        let file = list_file("; comment\n# not.a.comment\n");
        let mut config = Config::default();
        config.set_comment_prefix(";".to_string());

        let listing = read(file.path(), &config).unwrap();

        assert!(listing.entries.is_empty());
        assert_eq!(listing.malformed.len(), 1);
        assert_eq!(listing.malformed[0].line, 2);
    }

    #[test]
    fn entries_keep_file_order() {
        let content: String = (0..500).map(|i| format!("host{i}.com {i}\n")).collect();
        let file = list_file(&content);

        let listing = read(file.path(), &Config::default()).unwrap();

        let lines: Vec<_> = listing.entries.iter().map(|entry| entry.line).collect();
        assert_eq!(lines, (1..=500).collect::<Vec<_>>());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        let error = load(&path, &Config::default()).unwrap_err();

        assert!(matches!(error, LoadError::Io { .. }));
        assert!(error.to_string().contains("missing.txt"));
    }

    #[test]
    fn error_lists_every_malformed_line() {
        let error = LoadError::MalformedEntries(vec![
            parse_line(4, "a..com").unwrap_err(),
            parse_line(9, "-x.org").unwrap_err(),
        ]);

        assert_eq!(
            error.to_string(),
            "Malformed entries: line 4: Invalid domain 'a..com': empty label; \
             line 9: Invalid label '-x': must not start or end with '-'"
        );
    }
}
