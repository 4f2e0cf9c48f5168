use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// Extension of payload files, without the leading dot.
pub const PAYLOAD_EXTENSION: &str = "manifest";

/// Suffix that marks an archive entry as a payload file.
pub const PAYLOAD_SUFFIX: &str = ".manifest";

static PAYLOAD_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)_(\d+)\.manifest").expect("valid payload name regex"));

/// The `(subIdentifier, version)` pair encoded in a payload file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadName {
    /// Logical resource the payload belongs to.
    pub sub_id: String,
    /// Current revision of that resource.
    pub version: String,
}

impl PayloadName {
    /// Parse a base name of the form `<subId>_<version>.manifest`.
    ///
    /// Returns `None` for names that do not follow the convention.
    pub fn parse(file_name: &str) -> Option<Self> {
        let captures = PAYLOAD_NAME_RE.captures(file_name)?;
        Some(Self {
            sub_id: captures[1].to_string(),
            version: captures[2].to_string(),
        })
    }

    /// Parse the base name of a path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::parse)
    }
}

/// Mapping from subIdentifier to the newest published version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMap {
    entries: BTreeMap<String, String>,
}

impl VersionMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from payload base names. Later names win on duplicate
    /// subIdentifiers; names outside the convention are skipped.
    pub fn from_file_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        for name in names {
            if let Some(payload) = PayloadName::parse(name.as_ref()) {
                map.insert(payload.sub_id, payload.version);
            }
        }
        map
    }

    /// Build a map from extracted payload paths, using their base names.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut map = Self::new();
        for path in paths {
            match PayloadName::from_path(path.as_ref()) {
                Some(payload) => {
                    map.insert(payload.sub_id, payload.version);
                }
                None => log::debug!(
                    "Skipping payload with unrecognized name: {}",
                    path.as_ref().display()
                ),
            }
        }
        map
    }

    /// Insert or replace the version for a subIdentifier.
    pub fn insert(&mut self, sub_id: impl Into<String>, version: impl Into<String>) {
        self.entries.insert(sub_id.into(), version.into());
    }

    /// Look up the version for a subIdentifier.
    pub fn get(&self, sub_id: &str) -> Option<&str> {
        self.entries.get(sub_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(subIdentifier, version)` pairs in subIdentifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(sub_id, version)| (sub_id.as_str(), version.as_str()))
    }
}
