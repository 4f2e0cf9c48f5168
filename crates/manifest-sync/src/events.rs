use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// Stages of a pipeline run, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    ReadingScript,
    ResolvingIdentifier,
    Downloading,
    ExtractingPayload,
    RewritingScript,
    Packaging,
    CleaningUp,
    Succeeded,
    Failed,
}

impl PipelineState {
    /// Whether the run has finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::ReadingScript => "reading-script",
            PipelineState::ResolvingIdentifier => "resolving-identifier",
            PipelineState::Downloading => "downloading",
            PipelineState::ExtractingPayload => "extracting-payload",
            PipelineState::RewritingScript => "rewriting-script",
            PipelineState::Packaging => "packaging",
            PipelineState::CleaningUp => "cleaning-up",
            PipelineState::Succeeded => "succeeded",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a presentation layer should render an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Neutral information (chosen repository, identifier found).
    Info,
    /// A stage is in progress.
    Working,
    /// A stage or the whole run completed.
    Success,
    /// Something was skipped but the run continues.
    Warning,
    /// The run failed.
    Error,
    /// Housekeeping such as cleanup.
    Muted,
}

impl Severity {
    fn log_level(self) -> log::Level {
        match self {
            Severity::Error => log::Level::Error,
            Severity::Warning => log::Level::Warn,
            Severity::Muted => log::Level::Debug,
            Severity::Info | Severity::Working | Severity::Success => log::Level::Info,
        }
    }
}

/// A single status message emitted during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Stage the run was in when the event was emitted.
    pub state: PipelineState,
    pub severity: Severity,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(state: PipelineState, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            state,
            severity,
            message: message.into(),
        }
    }
}

/// Receiver of progress events.
///
/// Implementations must not block for long; the pipeline emits events
/// synchronously between stages.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Sink that only forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, _event: ProgressEvent) {}
}

impl ProgressSink for Mutex<Sender<ProgressEvent>> {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(sender) = self.lock() {
            // A dropped receiver means nobody is listening any more.
            let _ = sender.send(event);
        }
    }
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Sink that records every event, for inspection after a run.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// States in order, with consecutive repeats collapsed.
    pub fn states(&self) -> Vec<PipelineState> {
        let mut states = Vec::new();
        for event in self.events() {
            if states.last() != Some(&event.state) {
                states.push(event.state);
            }
        }
        states
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Log `event` at the level matching its severity, then hand it to `sink`.
pub(crate) fn report(sink: &dyn ProgressSink, event: ProgressEvent) {
    log::log!(
        event.severity.log_level(),
        "[{}] {}",
        event.state,
        event.message
    );
    sink.emit(event);
}
