use crate::config::{FetchConfig, PipelineConfig, RunContext};
use crate::error::{FetchError, Warning};
use crate::events::{report, PipelineState, ProgressEvent, ProgressSink, Severity};
use crate::extract::extract_payloads;
use crate::fetch::{ArchiveSource, HttpFetcher};
use crate::package::{compute_content_hash, Repackager};
use crate::workspace::Workspace;
use crate::{Error, Result};
use manifest_format::{AppId, ScriptDocument, VersionMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Identifier declared by the script.
    pub app_id: AppId,
    /// URL the branch archive was downloaded from.
    pub url: String,
    /// Path of the produced `<identifier>.zip`.
    pub output_path: PathBuf,
    /// Number of version references that changed.
    pub replacements: usize,
    /// Number of payload files packaged with the script.
    pub payload_count: usize,
    /// `blake3:<hex>` digest of the output archive, if it could be read back.
    pub archive_hash: Option<String>,
    /// Non-fatal conditions met along the way.
    pub warnings: Vec<Warning>,
}

/// Why a run failed, and at which stage.
#[derive(Debug)]
pub struct RunFailure {
    /// Stage that raised the error.
    pub stage: PipelineState,
    pub error: Error,
    /// Non-fatal conditions met before and during cleanup.
    pub warnings: Vec<Warning>,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum RunOutcome {
    Succeeded(RunReport),
    Failed(RunFailure),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded(_))
    }

    /// The terminal [`PipelineState`] this outcome corresponds to.
    pub fn state(&self) -> PipelineState {
        match self {
            RunOutcome::Succeeded(_) => PipelineState::Succeeded,
            RunOutcome::Failed(_) => PipelineState::Failed,
        }
    }

    pub fn into_result(self) -> std::result::Result<RunReport, RunFailure> {
        match self {
            RunOutcome::Succeeded(report) => Ok(report),
            RunOutcome::Failed(failure) => Err(failure),
        }
    }
}

/// Synchronizes a script with the newest payloads of its branch archive.
///
/// A `Pipeline` holds only immutable settings and can be shared between
/// threads; each [`Pipeline::run`] owns its own workspace.
#[derive(Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    source: Arc<dyn ArchiveSource>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline that downloads through `source`.
    pub fn new(config: PipelineConfig, source: Arc<dyn ArchiveSource>) -> Self {
        Self { config, source }
    }

    /// Create a pipeline that downloads over HTTP(S).
    pub fn with_http(
        config: PipelineConfig,
        fetch: FetchConfig,
    ) -> std::result::Result<Self, FetchError> {
        Ok(Self::new(config, Arc::new(HttpFetcher::new(fetch)?)))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute one run, blocking until it reaches a terminal state.
    pub fn run(&self, ctx: &RunContext, sink: &dyn ProgressSink) -> RunOutcome {
        let mut run = Run {
            pipeline: self,
            ctx,
            sink,
            state: PipelineState::Idle,
            warnings: Vec::new(),
        };

        let mut workspace = None;
        let result = run.execute(&mut workspace);
        run.finish(result, workspace)
    }

    /// Execute one run on a worker thread.
    ///
    /// Events arrive on the returned receiver; it disconnects once the run
    /// has finished.
    pub fn spawn(
        self: Arc<Self>,
        ctx: RunContext,
    ) -> (Receiver<ProgressEvent>, JoinHandle<RunOutcome>) {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let sink = Mutex::new(tx);
            self.run(&ctx, &sink)
        });
        (rx, handle)
    }
}

struct Run<'a> {
    pipeline: &'a Pipeline,
    ctx: &'a RunContext,
    sink: &'a dyn ProgressSink,
    state: PipelineState,
    warnings: Vec<Warning>,
}

impl Run<'_> {
    fn enter(&mut self, state: PipelineState, severity: Severity, message: impl Into<String>) {
        self.state = state;
        self.event(severity, message);
    }

    fn event(&self, severity: Severity, message: impl Into<String>) {
        report(self.sink, ProgressEvent::new(self.state, severity, message));
    }

    fn warn(&mut self, warning: Warning) {
        self.event(Severity::Warning, format!("Warning: {}", warning));
        self.warnings.push(warning);
    }

    fn execute(&mut self, workspace: &mut Option<Workspace>) -> Result<RunReport> {
        let pipeline = self.pipeline;
        let ctx = self.ctx;
        let config = &pipeline.config;
        let script_path = ctx.script_path.as_path();

        self.enter(
            PipelineState::ReadingScript,
            Severity::Working,
            format!("Reading file: {}", display_name(script_path)),
        );
        if !script_path.is_file() {
            return Err(Error::ScriptRead {
                path: script_path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }
        let script =
            ScriptDocument::open(script_path).map_err(|e| Error::script_read(script_path, e))?;

        self.enter(
            PipelineState::ResolvingIdentifier,
            Severity::Working,
            "Looking for addappid declaration",
        );
        let app_id = script.app_id()?;
        self.event(Severity::Info, format!("Found Game ID: {}", app_id));

        self.enter(
            PipelineState::Downloading,
            Severity::Info,
            format!("Using repo: {} for branch {}", ctx.repository, app_id),
        );
        let ws = workspace.insert(Workspace::create(&config.temp_root, &app_id)?);
        let url = config.archive_url(&ctx.repository, app_id.as_str());
        let archive_path = ws.archive_path();
        self.event(
            Severity::Working,
            format!("Downloading: {}", display_name(&archive_path)),
        );
        let bytes = pipeline.source.fetch(&url, &archive_path)?;
        self.event(
            Severity::Success,
            format!(
                "Successfully downloaded {} ({} bytes)",
                display_name(&archive_path),
                bytes
            ),
        );

        self.enter(
            PipelineState::ExtractingPayload,
            Severity::Working,
            "Extracting files...",
        );
        let payloads =
            extract_payloads(&archive_path, &ws.extract_dir(), &config.payload_suffix)?;
        if payloads.is_empty() {
            self.warn(Warning::NoPayloadFound);
        } else {
            self.event(
                Severity::Success,
                format!("Extracted {} manifest file(s)", payloads.len()),
            );
        }

        self.enter(
            PipelineState::RewritingScript,
            Severity::Working,
            "Updating Lua file with new Manifest IDs...",
        );
        let versions = VersionMap::from_paths(&payloads);
        let rewrite = script.rewrite(&versions);
        if rewrite.replacements > 0 {
            self.event(
                Severity::Info,
                format!("Updated {} Manifest ID(s).", rewrite.replacements),
            );
        } else {
            self.event(Severity::Info, "No Manifest IDs needed updating.");
        }
        let script_copy = script.write_copy(ws.path(), &app_id, &rewrite.text)?;

        let output_path = ctx.output_path(app_id.as_str());
        self.enter(
            PipelineState::Packaging,
            Severity::Working,
            format!("Creating final zip: {}", display_name(&output_path)),
        );
        let package = Repackager::new(app_id.clone())
            .with_script(&script_copy)
            .with_payloads(payloads.iter().cloned())
            .write_to(&output_path)?;
        for missing in &package.missing {
            self.warn(Warning::PayloadVanished(missing.clone()));
        }
        self.event(
            Severity::Success,
            format!("Successfully created {}", display_name(&package.path)),
        );

        let archive_hash = match compute_content_hash(&package.path) {
            Ok(hash) => Some(hash),
            Err(e) => {
                log::warn!("Cannot hash {}: {}", package.path.display(), e);
                None
            }
        };

        Ok(RunReport {
            app_id,
            url,
            output_path: package.path,
            replacements: rewrite.replacements,
            payload_count: package.payloads.len(),
            archive_hash,
            warnings: Vec::new(),
        })
    }

    fn finish(mut self, result: Result<RunReport>, workspace: Option<Workspace>) -> RunOutcome {
        let stage = self.state;

        self.enter(
            PipelineState::CleaningUp,
            Severity::Muted,
            "Cleaning up temporary files...",
        );
        if let Some(workspace) = workspace {
            let path = workspace.path().to_path_buf();
            if let Err(e) = workspace.close() {
                self.warn(Warning::CleanupFailed(format!("{}: {}", path.display(), e)));
            }
        }

        match result {
            Ok(mut report) => {
                report.warnings = std::mem::take(&mut self.warnings);
                self.enter(
                    PipelineState::Succeeded,
                    Severity::Success,
                    format!(
                        "Process completed successfully! Saved in: {}",
                        report.output_path.display()
                    ),
                );
                RunOutcome::Succeeded(report)
            }
            Err(error) => {
                let failure = RunFailure {
                    stage,
                    error,
                    warnings: std::mem::take(&mut self.warnings),
                };
                self.enter(PipelineState::Failed, Severity::Error, failure.to_string());
                RunOutcome::Failed(failure)
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingSink;
    use std::fs;
    use tempfile::tempdir;

    struct FailingSource;

    impl ArchiveSource for FailingSource {
        fn fetch(&self, url: &str, dest: &Path) -> std::result::Result<u64, FetchError> {
            fs::write(dest, b"partial")?;
            Err(FetchError::Http {
                status: 404,
                url: url.to_string(),
            })
        }
    }

    #[test]
    fn test_missing_script_fails_before_workspace() {
        let root = tempdir().unwrap();
        let pipeline = Pipeline::new(
            PipelineConfig::default().with_temp_root(root.path().join("tmp")),
            Arc::new(FailingSource),
        );
        let ctx = RunContext::new(root.path().join("none.lua"), root.path().join("out"));
        let sink = CollectingSink::new();

        let failure = pipeline.run(&ctx, &sink).into_result().unwrap_err();

        assert_eq!(failure.stage, PipelineState::ReadingScript);
        assert!(matches!(failure.error, Error::ScriptRead { .. }));
        assert!(!root.path().join("tmp").exists());
        assert_eq!(
            sink.states(),
            vec![
                PipelineState::ReadingScript,
                PipelineState::CleaningUp,
                PipelineState::Failed
            ]
        );
    }

    #[test]
    fn test_download_failure_removes_workspace() {
        let root = tempdir().unwrap();
        let temp_root = root.path().join("tmp");
        let script = root.path().join("game.lua");
        fs::write(&script, "addappid(1234)\n").unwrap();

        let pipeline = Pipeline::new(
            PipelineConfig::default().with_temp_root(&temp_root),
            Arc::new(FailingSource),
        );
        let ctx = RunContext::new(&script, root.path().join("out"));
        let sink = CollectingSink::new();

        let outcome = pipeline.run(&ctx, &sink);
        assert_eq!(outcome.state(), PipelineState::Failed);

        let failure = outcome.into_result().unwrap_err();
        assert_eq!(failure.stage, PipelineState::Downloading);
        assert!(matches!(failure.error, Error::Network(ref e) if e.is_not_found()));
        assert_eq!(fs::read_dir(&temp_root).unwrap().count(), 0);
        assert!(!root.path().join("out").join("1234.zip").exists());

        let last = sink.events().pop().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert_eq!(
            last.message,
            "downloading failed: HTTP 404 for \
             https://github.com/Fairyvmos/BlankTMing/archive/refs/heads/1234.zip"
        );
    }

    #[test]
    fn test_identifier_not_found() {
        let root = tempdir().unwrap();
        let script = root.path().join("game.lua");
        fs::write(&script, "setManifestid(1, \"2\", 0)\n").unwrap();

        let pipeline = Pipeline::new(
            PipelineConfig::default().with_temp_root(root.path().join("tmp")),
            Arc::new(FailingSource),
        );
        let failure = pipeline
            .run(&RunContext::new(&script, root.path()), &CollectingSink::new())
            .into_result()
            .unwrap_err();

        assert_eq!(failure.stage, PipelineState::ResolvingIdentifier);
        assert!(matches!(failure.error, Error::IdentifierNotFound));
    }
}
