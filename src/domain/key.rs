use std::{cmp::Ordering, fmt, str::FromStr, sync::Arc};

/// Maximum length of a single label in bytes.
pub const MAX_LABEL_LEN: usize = 63;

/// Maximum length of an encoded key in bytes (length prefixes included).
pub const MAX_ENCODED_LEN: usize = 255;

/// Error returned when a domain name cannot be canonicalized.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum MalformedDomainError {
    /// The domain contains an empty label (leading dot, or two dots in a row).
    #[error("Invalid domain '{domain}': empty label")]
    EmptyLabel {
        /// The domain as given.
        domain: String,
    },

    /// A label is longer than [`MAX_LABEL_LEN`] bytes.
    #[error("Invalid label '{label}': {length} bytes long, at most 63 are allowed")]
    LabelTooLong {
        /// The offending label.
        label: String,
        /// Its length in bytes.
        length: usize,
    },

    /// A label contains a character outside `[A-Za-z0-9_-]`.
    #[error("Invalid label '{label}': disallowed character {character:?}")]
    InvalidCharacter {
        /// The offending label.
        label: String,
        /// The first disallowed character.
        character: char,
    },

    /// A label starts or ends with a hyphen.
    #[error("Invalid label '{label}': must not start or end with '-'")]
    HyphenPlacement {
        /// The offending label.
        label: String,
    },

    /// The whole name is longer than [`MAX_ENCODED_LEN`] bytes once encoded.
    #[error("Invalid domain '{domain}': encodes to {length} bytes, at most 255 are allowed")]
    NameTooLong {
        /// The domain as given.
        domain: String,
        /// The encoded length in bytes.
        length: usize,
    },
}

/// A canonical, ordered domain name.
///
/// The key stores the labels of a domain most significant first (`com` before
/// `example` before `www`), each prefixed with its length, with ASCII letters
/// folded to lower case:
///
/// ```text
/// www.example.com  =>  03 "com" 07 "example" 03 "www"
/// ```
///
/// This byte layout is what the `*_raw` operations of [`Tree`] accept, see
/// [`DomainKey::from_raw`]. The root domain (`""` or `"."`) is the empty byte
/// string.
///
/// Keys order label by label from the most significant label. Labels compare
/// byte-wise, and a key whose labels are a prefix of another's sorts first, so
/// a domain is immediately followed by all of its subdomains:
///
/// ```
/// use dltree::DomainKey;
///
/// let com: DomainKey = "com".parse().unwrap();
/// let example: DomainKey = "Example.COM".parse().unwrap();
/// let www: DomainKey = "www.example.com".parse().unwrap();
/// let org: DomainKey = "foo.org".parse().unwrap();
///
/// assert!(com < example && example < www && www < org);
/// assert_eq!(example.to_string(), "example.com");
/// ```
///
/// Cloning a key is cheap; the encoded bytes are shared.
///
/// [`Tree`]: crate::Tree
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DomainKey {
    encoded: Arc<[u8]>,
}

impl DomainKey {
    /// Canonicalizes a textual domain name.
    ///
    /// A single trailing dot is accepted. The empty string and `"."` are the
    /// root domain.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedDomainError`] if a label is empty, too long, contains
    /// a character other than ASCII letters, digits, `-` and `_`, or starts or
    /// ends with `-`, or if the whole name is too long.
    pub fn parse(text: &str) -> Result<Self, MalformedDomainError> {
        let name = text.strip_suffix('.').unwrap_or(text);
        if name.is_empty() {
            return Ok(Self::root());
        }

        let mut encoded = Vec::with_capacity(name.len() + 1);
        for label in name.rsplit('.') {
            let length = validate_label(label, text)?;
            encoded.push(length);
            encoded.extend(label.bytes().map(|b| b.to_ascii_lowercase()));
        }

        if encoded.len() > MAX_ENCODED_LEN {
            return Err(MalformedDomainError::NameTooLong {
                domain: text.to_string(),
                length: encoded.len(),
            });
        }

        Ok(Self {
            encoded: encoded.into(),
        })
    }

    /// Wraps an already encoded key without re-parsing it.
    ///
    /// The bytes must follow the layout described on [`DomainKey`] and come
    /// from a previous [`DomainKey::as_bytes`] or an equivalent encoder. This is
    /// only checked in debug builds; a malformed key does not cause a panic in
    /// release builds, but its ordering relative to well-formed keys is
    /// unspecified.
    #[must_use]
    pub fn from_raw(raw: &[u8]) -> Self {
        debug_assert!(is_well_formed(raw), "malformed raw domain key: {raw:?}");
        Self {
            encoded: Arc::from(raw),
        }
    }

    /// The root domain, which sorts before every other key.
    #[must_use]
    pub fn root() -> Self {
        Self {
            encoded: Arc::from(Vec::new()),
        }
    }

    /// Returns the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }

    /// Returns the labels, most significant first.
    #[must_use]
    pub fn labels(&self) -> Labels<'_> {
        Labels::new(&self.encoded)
    }

    /// Returns the number of labels (zero for the root).
    #[must_use]
    pub fn label_count(&self) -> usize {
        self.labels().count()
    }

    /// Whether this is the root domain.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.encoded.is_empty()
    }

    /// Returns the key with the least significant label removed, or `None`
    /// for the root.
    ///
    /// The parent of `www.example.com` is `example.com`.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let last = self.labels().last()?;
        let len = self.encoded.len() - last.len() - 1;
        Some(Self {
            encoded: Arc::from(&self.encoded[..len]),
        })
    }

    /// Whether this key is `ancestor` itself or one of its subdomains.
    ///
    /// Every key is within the root.
    #[must_use]
    pub fn is_within(&self, ancestor: &Self) -> bool {
        is_within(&self.encoded, &ancestor.encoded)
    }
}

/// Checks `label` and returns its length as the length prefix byte.
fn validate_label(label: &str, domain: &str) -> Result<u8, MalformedDomainError> {
    if label.is_empty() {
        return Err(MalformedDomainError::EmptyLabel {
            domain: domain.to_string(),
        });
    }

    let length = u8::try_from(label.len())
        .ok()
        .filter(|&len| usize::from(len) <= MAX_LABEL_LEN)
        .ok_or_else(|| MalformedDomainError::LabelTooLong {
            label: label.to_string(),
            length: label.len(),
        })?;

    if let Some(character) = label
        .chars()
        .find(|&c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
    {
        return Err(MalformedDomainError::InvalidCharacter {
            label: label.to_string(),
            character,
        });
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(MalformedDomainError::HyphenPlacement {
            label: label.to_string(),
        });
    }

    Ok(length)
}

/// Whether `raw` is a sequence of length-prefixed labels that [`DomainKey::parse`]
/// could have produced.
fn is_well_formed(raw: &[u8]) -> bool {
    if raw.len() > MAX_ENCODED_LEN {
        return false;
    }
    let mut rest = raw;
    while let Some((&len, tail)) = rest.split_first() {
        let len = usize::from(len);
        if len == 0 || len > MAX_LABEL_LEN || len > tail.len() {
            return false;
        }
        let (label, tail) = tail.split_at(len);
        if !label
            .iter()
            .all(|&b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        {
            return false;
        }
        rest = tail;
    }
    true
}

/// Compares two encoded keys label by label.
pub(crate) fn compare(a: &[u8], b: &[u8]) -> Ordering {
    Labels::new(a).cmp(Labels::new(b))
}

/// Whether encoded key `key` equals or descends from encoded key `ancestor`.
///
/// Length prefixes keep a byte prefix aligned on label boundaries, so a plain
/// prefix test is exact.
pub(crate) fn is_within(key: &[u8], ancestor: &[u8]) -> bool {
    key.starts_with(ancestor)
}

impl PartialOrd for DomainKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DomainKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(&self.encoded, &other.encoded)
    }
}

impl fmt::Display for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        let labels: Vec<&[u8]> = self.labels().collect();
        for (i, label) in labels.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&String::from_utf8_lossy(label))?;
        }
        Ok(())
    }
}

impl fmt::Debug for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("DomainKey")
            .field(&self.to_string())
            .finish()
    }
}

impl FromStr for DomainKey {
    type Err = MalformedDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for DomainKey {
    type Error = MalformedDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for DomainKey {
    type Error = MalformedDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Iterator over the labels of an encoded key, most significant first.
///
/// Created by [`DomainKey::labels`].
#[derive(Debug, Clone)]
pub struct Labels<'a> {
    rest: &'a [u8],
}

impl<'a> Labels<'a> {
    const fn new(encoded: &'a [u8]) -> Self {
        Self { rest: encoded }
    }
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, tail) = self.rest.split_first()?;
        // A truncated raw key yields a short last label rather than panicking.
        let (label, rest) = tail.split_at(usize::from(len).min(tail.len()));
        self.rest = rest;
        Some(label)
    }
}

impl std::iter::FusedIterator for Labels<'_> {}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn key(s: &str) -> DomainKey {
        DomainKey::parse(s).unwrap()
    }

    #[test_case("example.com", "example.com"; "plain")]
    #[test_case("Example.COM", "example.com"; "mixed case")]
    #[test_case("example.com.", "example.com"; "trailing dot")]
    #[test_case("_sip._tcp.example.com", "_sip._tcp.example.com"; "underscores")]
    #[test_case("a-b.c0", "a-b.c0"; "inner hyphen and digits")]
    #[test_case("", "."; "empty is root")]
    #[test_case(".", "."; "dot is root")]
    fn canonical_form(input: &str, expected: &str) {
        assert_eq!(key(input).to_string(), expected);
    }

    #[test]
    fn case_variants_are_equal_keys() {
        assert_eq!(key("Example.COM"), key("example.com"));
        assert_eq!(key("Example.COM").as_bytes(), key("example.com").as_bytes());
    }

    #[test]
    fn encoding_is_most_significant_label_first() {
        assert_eq!(
            key("www.Example.com").as_bytes(),
            b"\x03com\x07example\x03www".as_slice()
        );
        assert!(DomainKey::root().as_bytes().is_empty());
    }

    #[test]
    fn raw_roundtrip_skips_parsing() {
        let original = key("mail.example.org");
        let raw = DomainKey::from_raw(original.as_bytes());
        assert_eq!(raw, original);
        assert_eq!(raw.to_string(), "mail.example.org");
    }

    #[test_case("a..b"; "double dot")]
    #[test_case(".example.com"; "leading dot")]
    #[test_case("example.com.."; "two trailing dots")]
    fn empty_label_fails(input: &str) {
        assert!(matches!(
            DomainKey::parse(input),
            Err(MalformedDomainError::EmptyLabel { .. })
        ));
    }

    #[test]
    fn label_length_limit() {
        let longest = "a".repeat(63);
        assert!(DomainKey::parse(&format!("{longest}.com")).is_ok());

        let too_long = "a".repeat(64);
        assert_eq!(
            DomainKey::parse(&format!("{too_long}.com")),
            Err(MalformedDomainError::LabelTooLong {
                label: too_long,
                length: 64
            })
        );

        let huge = "b".repeat(300);
        assert!(matches!(
            DomainKey::parse(&huge),
            Err(MalformedDomainError::LabelTooLong { length: 300, .. })
        ));
    }

    #[test]
    fn name_length_limit() {
        // 4 labels of 63 bytes encode to 4 * 64 = 256 bytes.
        let label = "c".repeat(63);
        let name = [label.as_str(); 4].join(".");
        assert!(matches!(
            DomainKey::parse(&name),
            Err(MalformedDomainError::NameTooLong { length: 256, .. })
        ));

        let name = [label.as_str(); 3].join(".");
        assert_eq!(key(&name).as_bytes().len(), 192);
    }

    #[test_case("exa mple.com", ' '; "space")]
    #[test_case("*.example.com", '*'; "wildcard")]
    #[test_case("bücher.de", 'ü'; "non ascii")]
    #[test_case("a\\.b", '\\'; "escape")]
    #[test_case("exa\u{0}mple.com", '\u{0}'; "nul byte")]
    fn disallowed_character_fails(input: &str, expected: char) {
        match DomainKey::parse(input) {
            Err(MalformedDomainError::InvalidCharacter { character, .. }) => {
                assert_eq!(character, expected);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test_case("-example.com"; "leading")]
    #[test_case("example-.com"; "trailing")]
    #[test_case("www.-"; "only hyphen")]
    fn hyphen_placement_fails(input: &str) {
        assert!(matches!(
            DomainKey::parse(input),
            Err(MalformedDomainError::HyphenPlacement { .. })
        ));
    }

    #[test]
    fn ordering_groups_subdomains_after_their_parent() {
        let mut keys: Vec<DomainKey> = [
            "foo.org",
            "www.example.com",
            "example.com",
            "com",
            "a.www.example.com",
            "example.net",
            "zzz.example.com",
            "examplf.com",
        ]
        .into_iter()
        .map(key)
        .collect();
        keys.sort();

        let sorted: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(
            sorted,
            [
                "com",
                "example.com",
                "www.example.com",
                "a.www.example.com",
                "zzz.example.com",
                "examplf.com",
                "example.net",
                "foo.org",
            ]
        );
    }

    #[test]
    fn labels_compare_bytewise_with_prefix_first() {
        assert!(key("a.com") < key("ab.com"));
        assert!(key("ab.com") < key("b.com"));
        assert!(key("b.com") < key("a.b.com"));
        assert!(key("a.b.com") < key("c.com"));
        assert!(key("9.com") < key("_.com"));
        assert!(key("_.com") < key("a.com"));
        assert!(DomainKey::root() < key("com"));
    }

    #[test]
    fn labels_are_most_significant_first() {
        let k = key("www.example.com");
        let labels: Vec<&[u8]> = k.labels().collect();
        assert_eq!(labels, [b"com".as_slice(), b"example", b"www"]);

        assert_eq!(k.label_count(), 3);
        assert_eq!(DomainKey::root().label_count(), 0);
        assert_eq!(DomainKey::root().labels().next(), None);
    }

    #[test]
    fn parent_and_ancestry() {
        let www = key("www.example.com");
        let example = key("example.com");

        assert_eq!(www.parent(), Some(example.clone()));
        assert_eq!(key("com").parent(), Some(DomainKey::root()));
        assert_eq!(DomainKey::root().parent(), None);

        assert!(www.is_within(&example));
        assert!(example.is_within(&example));
        assert!(www.is_within(&DomainKey::root()));
        assert!(!example.is_within(&www));
        // A shared byte prefix that stops mid-label is not ancestry.
        assert!(!key("examples.com").is_within(&example));
        assert!(!key("www.example.com").is_within(&key("ample.com")));
    }

    #[test]
    fn malformed_raw_key_does_not_panic_when_decoded() {
        // Length prefix claims more bytes than are present.
        let labels: Vec<&[u8]> = Labels::new(b"\x09com").collect();
        assert_eq!(labels, [b"com".as_slice()]);
        assert!(!is_well_formed(b"\x09com"));
        assert!(!is_well_formed(b"\x00"));
        assert!(!is_well_formed(b"\x03COM"));
        assert!(is_well_formed(b"\x03com\x01a"));
    }

    #[test]
    fn error_display() {
        let error = DomainKey::parse("bad domain.com").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid label 'bad domain': disallowed character ' '"
        );

        let error = DomainKey::parse("a..b").unwrap_err();
        assert_eq!(error.to_string(), "Invalid domain 'a..b': empty label");
    }
}
