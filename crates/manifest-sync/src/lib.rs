//! # manifest-sync
//!
//! Synchronizes a Lua manifest script with the newest payload files
//! published on its branch of a remote repository, and repackages the result.
//!
//! This crate provides:
//! - [`HttpFetcher`]: streaming branch-archive downloads
//! - [`extract_payloads`]: flattening `.manifest` entries out of an archive
//! - [`Repackager`]: building `<identifier>.zip` from the rewritten script
//! - [`Workspace`]: per-run temporary directories
//! - [`Pipeline`]: the orchestrator tying the stages together, reporting
//!   progress through a [`ProgressSink`]
//! - [`RepositoryCatalog`]: `repo.json` name → repository lookup
//!
//! ## Example
//!
//! ```ignore
//! use manifest_sync::{FetchConfig, LogSink, Pipeline, PipelineConfig, RunContext};
//!
//! let pipeline = Pipeline::with_http(PipelineConfig::default(), FetchConfig::default())?;
//! let ctx = RunContext::new("1234.lua", "Updated Files")
//!     .with_repository("Fairyvmos/BlankTMing");
//!
//! match pipeline.run(&ctx, &LogSink).into_result() {
//!     Ok(report) => println!("saved {}", report.output_path.display()),
//!     Err(failure) => eprintln!("{}", failure),
//! }
//! ```

pub mod config;
mod error;
pub mod events;
mod extract;
pub mod fetch;
mod package;
mod pipeline;
mod repos;
mod workspace;

pub use config::{default_temp_root, FetchConfig, PipelineConfig, RunContext};
pub use error::{Error, FetchError, Result, Warning};
pub use events::{
    CollectingSink, LogSink, PipelineState, ProgressEvent, ProgressSink, Severity,
};
pub use extract::extract_payloads;
pub use fetch::{ArchiveSource, HttpFetcher};
pub use package::{compute_content_hash, PackageReport, Repackager};
pub use pipeline::{Pipeline, RunFailure, RunOutcome, RunReport};
pub use repos::RepositoryCatalog;
pub use workspace::Workspace;

// Re-export manifest-format types for convenience
pub use manifest_format::{AppId, ScriptDocument, VersionMap};
