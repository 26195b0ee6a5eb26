use crate::verification::ContentDigest;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// A unique package scheduled for a download decision.
#[derive(Clone, Debug)]
pub struct DownloadTarget {
    pub name: String,
    /// Normalized manifest location, e.g. `slackware64/a`.
    pub location: String,
    pub url: Url,
    /// Path relative to the local store root.
    pub destination_path: PathBuf,
    /// Informational only; the live response decides the real size.
    pub expected_size_kb: u64,
    pub reference_digest: Option<ContentDigest>,
}

#[derive(Clone, Debug)]
pub struct TargetPlan {
    pub targets: Vec<DownloadTarget>,
    pub total_size_kb: u64,
}

impl TargetPlan {
    pub fn summary(&self, rate_limit_kbps: u64, sleep_between: Duration) -> PlanSummary {
        PlanSummary::new(
            self.targets.len(),
            self.total_size_kb,
            rate_limit_kbps,
            sleep_between,
        )
    }
}

/// Up-front numbers reported before any transfer starts.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanSummary {
    pub target_count: usize,
    pub total_size_kb: u64,
    pub estimated_duration: Duration,
}

impl PlanSummary {
    pub fn new(
        target_count: usize,
        total_size_kb: u64,
        rate_limit_kbps: u64,
        sleep_between: Duration,
    ) -> Self {
        let transfer_secs = if rate_limit_kbps == 0 {
            0.0
        } else {
            total_size_kb as f64 / rate_limit_kbps as f64
        };
        // Sizes come from an unauthenticated manifest; absurd values saturate.
        let estimated_duration = Duration::try_from_secs_f64(transfer_secs)
            .unwrap_or(Duration::MAX)
            .saturating_add(
                sleep_between.saturating_mul(u32::try_from(target_count).unwrap_or(u32::MAX)),
            );

        Self {
            target_count,
            total_size_kb,
            estimated_duration,
        }
    }
}
