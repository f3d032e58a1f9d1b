use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration for loading domain lists.
///
/// This struct holds settings that control how domain list files are read
/// into a [`Tree`](crate::Tree). Canonicalization rules themselves are fixed
/// and not configurable, so every loaded tree shares one key space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Whether lines with malformed domains are skipped instead of failing
    /// the whole load.
    ///
    /// Skipped lines are reported as warnings.
    pub skip_malformed: bool,

    /// Lines starting with this prefix (after leading whitespace) are
    /// ignored.
    comment_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skip_malformed: false,
            comment_prefix: default_comment_prefix(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the comment prefix.
    #[must_use]
    pub fn comment_prefix(&self) -> &str {
        &self.comment_prefix
    }

    /// Sets the comment prefix.
    ///
    /// An empty prefix is ignored, since it would mark every line as a
    /// comment. Returns `true` if the prefix was changed.
    pub fn set_comment_prefix(&mut self, prefix: String) -> bool {
        if prefix.is_empty() || prefix == self.comment_prefix {
            false
        } else {
            self.comment_prefix = prefix;
            true
        }
    }

    /// Whether `line` is blank or a comment.
    #[must_use]
    pub fn is_ignored(&self, line: &str) -> bool {
        let line = line.trim_start();
        line.is_empty() || line.starts_with(&self.comment_prefix)
    }
}

fn default_comment_prefix() -> String {
    "#".to_string()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        skip_malformed: bool,

        #[serde(default = "default_comment_prefix")]
        comment_prefix: String,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                skip_malformed,
                comment_prefix,
            } => {
                let mut config = Self {
                    skip_malformed,
                    ..Self::default()
                };
                config.set_comment_prefix(comment_prefix);
                config
            }
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            skip_malformed: config.skip_malformed,
            comment_prefix: config.comment_prefix,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nskip_malformed = true\ncomment_prefix = \";\"\n")
            .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert!(config.skip_malformed);
        assert_eq!(config.comment_prefix(), ";");
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nskip_malformed = \"yes\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        // Tests that deserialising an empty file returns the default configuration.
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn empty_comment_prefix_falls_back_to_default() {
        let actual: Config = toml::from_str("_version = \"1\"\ncomment_prefix = \"\"\n").unwrap();
        assert_eq!(actual.comment_prefix(), "#");
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dltree.toml");

        let mut config = Config::default();
        config.skip_malformed = true;
        assert!(config.set_comment_prefix("//".to_string()));
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn ignores_blank_and_comment_lines() {
        let config = Config::default();
        assert!(config.is_ignored(""));
        assert!(config.is_ignored("   "));
        assert!(config.is_ignored("# example.com 1"));
        assert!(config.is_ignored("  # indented"));
        assert!(!config.is_ignored("example.com # trailing"));
    }
}
