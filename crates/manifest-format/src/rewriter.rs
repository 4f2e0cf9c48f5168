use crate::VersionMap;
use regex::Regex;
use std::sync::LazyLock;

static SET_MANIFEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"setManifestid\s*\(\s*(\d+)\s*,\s*"(\d+)"\s*,\s*0\s*\)"#)
        .expect("valid setManifestid regex")
});

/// Result of rewriting a script's version references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Script text after rewriting.
    pub text: String,
    /// Number of references whose version changed.
    pub replacements: usize,
}

/// Rewrite every `setManifestid(<subId>, "<version>", 0)` whose subId has an
/// entry in `versions`.
///
/// Only the quoted version digits are replaced; spacing and the rest of the
/// call are kept as written. References without a map entry, or already at
/// the mapped version, are left untouched and not counted.
pub fn rewrite_references(script: &str, versions: &VersionMap) -> Rewrite {
    let mut text = String::with_capacity(script.len());
    let mut replacements = 0;
    let mut last = 0;

    for captures in SET_MANIFEST_RE.captures_iter(script) {
        let (Some(sub_id), Some(old)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let sub_id = sub_id.as_str();

        let Some(new_version) = versions.get(sub_id) else {
            log::debug!(
                "No published version for manifest {}; keeping {}",
                sub_id,
                old.as_str()
            );
            continue;
        };
        if new_version == old.as_str() {
            continue;
        }

        text.push_str(&script[last..old.start()]);
        text.push_str(new_version);
        last = old.end();
        replacements += 1;
    }

    text.push_str(&script[last..]);
    Rewrite { text, replacements }
}
