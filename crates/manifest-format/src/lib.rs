//! # manifest-format
//!
//! Text-level building blocks for synchronizing Lua manifest scripts.
//!
//! This crate provides:
//! - `addappid(...)` identifier extraction
//! - `<subId>_<version>.manifest` payload name parsing
//! - [`VersionMap`] construction from payload file names
//! - `setManifestid(...)` version reference rewriting
//! - [`ScriptDocument`] loading and workspace copies
//!
//! Nothing here touches the network or archives; see `manifest-sync` for the
//! pipeline that drives these pieces.
//!
//! ## Example
//!
//! ```
//! use manifest_format::{extract_app_id, rewrite_references, VersionMap};
//!
//! let script = "addappid(1234)\nsetManifestid(500, \"3\", 0)\n";
//! let app_id = extract_app_id(script).unwrap();
//! assert_eq!(app_id.as_str(), "1234");
//!
//! let map = VersionMap::from_file_names(["500_7.manifest"]);
//! let rewrite = rewrite_references(script, &map);
//! assert_eq!(rewrite.replacements, 1);
//! assert!(rewrite.text.contains("setManifestid(500, \"7\", 0)"));
//! ```

mod error;
mod identifier;
mod payload;
mod rewriter;
mod script;

pub use error::{Error, Result};
pub use identifier::{extract_app_id, AppId};
pub use payload::{PayloadName, VersionMap, PAYLOAD_EXTENSION, PAYLOAD_SUFFIX};
pub use rewriter::{rewrite_references, Rewrite};
pub use script::{ScriptDocument, SCRIPT_EXTENSION};
