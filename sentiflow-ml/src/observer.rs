//! Stage lifecycle reporting.
//!
//! Every stage receives a [`StageObserver`] explicitly instead of reaching for
//! a process-wide logger. The CLI passes [`TracingObserver`]; tests pass
//! [`RecordingObserver`] and assert on what was reported.

use crate::error::StageError;
use crate::stages::Stage;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Callbacks a stage invokes while it runs.
pub trait StageObserver: Send + Sync {
    /// The stage is about to read its inputs.
    fn on_stage_start(&self, stage: Stage);

    /// A named step inside the stage finished.
    fn on_step(&self, stage: Stage, message: &str);

    /// An output artifact was written.
    /// Default is a no-op.
    fn on_artifact(&self, _stage: Stage, _path: &Path) {}

    /// All outputs of the stage are in place.
    fn on_stage_complete(&self, stage: Stage);

    /// The stage aborted. The error is still returned to the caller.
    fn on_stage_failed(&self, stage: Stage, error: &StageError);
}

/// Forwards stage events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StageObserver for TracingObserver {
    fn on_stage_start(&self, stage: Stage) {
        tracing::info!(stage = %stage, "Stage started");
    }

    fn on_step(&self, stage: Stage, message: &str) {
        tracing::info!(stage = %stage, "{message}");
    }

    fn on_artifact(&self, stage: Stage, path: &Path) {
        tracing::debug!(stage = %stage, path = %path.display(), "Artifact written");
    }

    fn on_stage_complete(&self, stage: Stage) {
        tracing::info!(stage = %stage, "Stage completed");
    }

    fn on_stage_failed(&self, stage: Stage, error: &StageError) {
        tracing::error!(
            stage = %stage,
            function = error.function,
            error = %error.source,
            "Stage failed"
        );
    }
}

/// An event captured by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Started(Stage),
    Step(Stage, String),
    Artifact(Stage, PathBuf),
    Completed(Stage),
    Failed {
        stage: Stage,
        function: &'static str,
        message: String,
    },
}

/// An observer that records all events for test assertions.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<StageEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StageEvent> {
        self.lock().clone()
    }

    pub fn steps(&self, stage: Stage) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                StageEvent::Step(s, msg) if *s == stage => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn artifacts(&self) -> Vec<PathBuf> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                StageEvent::Artifact(_, p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: StageEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StageEvent>> {
        // A panicking test thread must not hide the events from the others.
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StageObserver for RecordingObserver {
    fn on_stage_start(&self, stage: Stage) {
        self.push(StageEvent::Started(stage));
    }

    fn on_step(&self, stage: Stage, message: &str) {
        self.push(StageEvent::Step(stage, message.to_string()));
    }

    fn on_artifact(&self, stage: Stage, path: &Path) {
        self.push(StageEvent::Artifact(stage, path.to_path_buf()));
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.push(StageEvent::Completed(stage));
    }

    fn on_stage_failed(&self, stage: Stage, error: &StageError) {
        self.push(StageEvent::Failed {
            stage,
            function: error.function,
            message: error.source.to_string(),
        });
    }
}
