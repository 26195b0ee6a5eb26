mod console;

pub use console::ConsoleReporter;

use crate::download::{Decision, RunSummary, TransferOutcome, TransferProgress};
use crate::error::MirrorError;
use crate::plan::{DownloadTarget, PlanSummary};

/// Observer for run events. Purely observational: nothing a reporter does
/// feeds back into the engine's control flow.
pub trait Reporter: Send + Sync {
    fn on_plan(&self, _summary: &PlanSummary) {}

    fn on_decision(&self, _target: &DownloadTarget, _decision: &Decision) {}

    fn on_progress(&self, _progress: &TransferProgress) {}

    fn on_outcome(&self, _target: &DownloadTarget, _outcome: &TransferOutcome) {}

    fn on_fatal(&self, _error: &MirrorError) {}

    fn on_finish(&self, _summary: &RunSummary) {}
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}
