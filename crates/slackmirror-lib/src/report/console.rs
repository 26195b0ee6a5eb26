use super::Reporter;
use crate::download::{Decision, DigestCheck, Pause, RunSummary, TransferOutcome, TransferProgress};
use crate::error::MirrorError;
use crate::plan::{DownloadTarget, PlanSummary};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, PoisonError};

const BAR_TEMPLATE: &str =
    "{prefix} [{bar:30}] {percent:>3}% {bytes}/{total_bytes} {msg}";
const SPINNER_TEMPLATE: &str = "{spinner} {prefix} {bytes} {msg}";

/// Terminal reporter: a progress bar for the active transfer and `tracing`
/// lines for everything else.
#[derive(Default)]
pub struct ConsoleReporter {
    active: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_bar(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bar) = active.take() {
            bar.finish_and_clear();
        }
    }

    fn new_bar(progress: &TransferProgress) -> ProgressBar {
        let bar = match progress.declared_total {
            Some(total) => ProgressBar::new(total).with_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            ),
            None => ProgressBar::new_spinner().with_style(
                ProgressStyle::with_template(SPINNER_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            ),
        };
        bar.with_prefix(progress.name.clone())
    }
}

impl Reporter for ConsoleReporter {
    fn on_plan(&self, summary: &PlanSummary) {
        tracing::info!("Found {} unique packages", summary.target_count);
        tracing::info!("Total download size: {} KB", summary.total_size_kb);
        tracing::info!(
            "Estimated download time: {:.2} seconds",
            summary.estimated_duration.as_secs_f64()
        );
    }

    fn on_decision(&self, target: &DownloadTarget, decision: &Decision) {
        match decision {
            Decision::Skip(reason) => tracing::debug!(
                package = %target.name,
                path = %target.destination_path.display(),
                %reason,
                "Skipping download"
            ),
            Decision::Transfer(reason) => tracing::debug!(
                package = %target.name,
                url = %target.url,
                path = %target.destination_path.display(),
                %reason,
                "Downloading"
            ),
        }
    }

    fn on_progress(&self, progress: &TransferProgress) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let bar = active.get_or_insert_with(|| Self::new_bar(progress));
        bar.set_position(progress.bytes_so_far);

        let eta = progress
            .eta()
            .map(|eta| format!(" ETA {:.2}s", eta.as_secs_f64()))
            .unwrap_or_default();
        let throttled = if matches!(progress.pause, Pause::Throttle(_)) {
            " (throttled)"
        } else {
            ""
        };
        bar.set_message(format!("{:.2} KB/s{eta}{throttled}", progress.rate_kbps));
    }

    fn on_outcome(&self, target: &DownloadTarget, outcome: &TransferOutcome) {
        self.clear_bar();

        let path = target.destination_path.display();
        match outcome {
            TransferOutcome::Skipped { reason } => {
                tracing::info!("{path}: {reason}, skipping");
            }
            TransferOutcome::Planned { decision } => match decision {
                Decision::Skip(reason) => tracing::info!("Dry run: {path}: {reason}, would skip"),
                Decision::Transfer(reason) => {
                    tracing::info!("Dry run: would download {} ({reason})", target.url)
                }
            },
            TransferOutcome::Downloaded { bytes, digest } => match digest {
                DigestCheck::Matched => {
                    tracing::info!("Downloaded {path} ({bytes} bytes), checksum verified")
                }
                DigestCheck::Unavailable => {
                    tracing::info!("Downloaded {path} ({bytes} bytes), no checksum available")
                }
                DigestCheck::Mismatched { expected, actual } => tracing::warn!(
                    "Checksum verification failed for {path}. Expected: {}, Got: {}",
                    expected.to_hex(),
                    actual.to_hex()
                ),
            },
            TransferOutcome::Failed { cause } => {
                tracing::error!("Error downloading {}: {cause}", target.name);
            }
        }
    }

    fn on_fatal(&self, error: &MirrorError) {
        self.clear_bar();
        tracing::error!("{error}");
    }

    fn on_finish(&self, summary: &RunSummary) {
        self.clear_bar();

        if summary.cancelled {
            tracing::warn!("Run cancelled before all packages were processed.");
        }
        if summary.dry_run {
            tracing::info!(
                planned = summary.planned,
                skipped = summary.skipped,
                "Dry run completed. No packages were downloaded."
            );
        } else {
            tracing::info!(
                downloaded = summary.downloaded,
                skipped = summary.skipped,
                failed = summary.failed,
                mismatched = summary.mismatched,
                bytes = summary.bytes_transferred,
                "Package download completed."
            );
        }
    }
}
