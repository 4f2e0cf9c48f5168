use crate::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static ADDAPPID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"addappid\s*\(\s*(?:(\d+)|"(\d+)")"#).expect("valid addappid regex")
});

/// Numeric identifier declared by a script's `addappid(...)` call.
///
/// Names both the remote branch to fetch and the output artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppId(String);

impl AppId {
    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AppId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract the identifier from the first `addappid(<id>)` declaration.
///
/// `<id>` may be a bare integer (`addappid(42)`) or a quoted one
/// (`addappid("42")`). Any further arguments are ignored.
pub fn extract_app_id(script: &str) -> Result<AppId> {
    let captures = ADDAPPID_RE
        .captures(script)
        .ok_or(Error::IdentifierNotFound)?;
    let digits = captures
        .get(1)
        .or_else(|| captures.get(2))
        .ok_or(Error::IdentifierNotFound)?;
    Ok(AppId(digits.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_identifier() {
        assert_eq!(extract_app_id("addappid(42)").unwrap().as_str(), "42");
    }

    #[test]
    fn test_quoted_identifier() {
        assert_eq!(extract_app_id(r#"addappid("42")"#).unwrap().as_str(), "42");
    }

    #[test]
    fn test_whitespace_and_extra_arguments() {
        let script = "-- header\naddappid ( 1234 , 1, \"deadbeef\")\n";
        assert_eq!(extract_app_id(script).unwrap().as_str(), "1234");
    }

    #[test]
    fn test_first_declaration_wins() {
        let script = "addappid(10)\naddappid(20)\n";
        assert_eq!(extract_app_id(script).unwrap().as_str(), "10");
    }

    #[test]
    fn test_missing_declaration() {
        let err = extract_app_id("setManifestid(1, \"2\", 0)").unwrap_err();
        assert!(matches!(err, Error::IdentifierNotFound));
    }

    #[test]
    fn test_non_numeric_argument_is_not_matched() {
        assert!(extract_app_id("addappid(foo)").is_err());
        assert!(extract_app_id(r#"addappid("abc")"#).is_err());
    }

    #[test]
    fn test_display_matches_digits() {
        let id = extract_app_id("addappid(777)").unwrap();
        assert_eq!(id.to_string(), "777");
        assert_eq!(format!("{}.lua", id), "777.lua");
    }
}
