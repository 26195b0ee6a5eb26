use super::rate_limiter::{Pause, RateLimiter};
use crate::verification::ContentDigest;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on how much of an error response body is kept for diagnostics.
pub const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub rate_limiter: RateLimiter,
    /// Courtesy delay between consecutive targets that contacted the origin.
    pub sleep_between: Duration,
    /// Write and throttle granularity in bytes.
    pub chunk_size: usize,
    /// Skip present files that have no reference digest.
    pub preserve_existing: bool,
    /// Download regardless of local state.
    pub overwrite: bool,
    /// Decide and report only; never transfer.
    pub dry_run: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            rate_limiter: RateLimiter::new(500, Duration::from_millis(100)),
            sleep_between: Duration::from_secs(3),
            chunk_size: 32 * 1024,
            preserve_existing: false,
            overwrite: false,
            dry_run: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    ChecksumValid,
    AlreadyPresent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ChecksumValid => f.write_str("checksum valid"),
            SkipReason::AlreadyPresent => f.write_str("already present"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferReason {
    Missing,
    Empty,
    ChecksumMismatch,
    /// Present, no reference digest and existing files are not preserved.
    Unverifiable,
    Overwrite,
}

impl fmt::Display for TransferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferReason::Missing => f.write_str("not present locally"),
            TransferReason::Empty => f.write_str("local file is empty"),
            TransferReason::ChecksumMismatch => f.write_str("local checksum does not match"),
            TransferReason::Unverifiable => {
                f.write_str("no reference checksum to validate local copy")
            }
            TransferReason::Overwrite => f.write_str("overwrite requested"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    Transfer(TransferReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DigestCheck {
    Matched,
    Mismatched {
        expected: ContentDigest,
        actual: ContentDigest,
    },
    /// No reference digest for this target.
    Unavailable,
}

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transfer cancelled")]
    Cancelled,
}

#[derive(Debug)]
pub enum TransferOutcome {
    Skipped { reason: SkipReason },
    /// Dry run: the decision that a real run would have acted on.
    Planned { decision: Decision },
    Downloaded { bytes: u64, digest: DigestCheck },
    Failed { cause: TransferError },
}

/// Emitted after every chunk of an active transfer.
#[derive(Clone, Debug)]
pub struct TransferProgress {
    pub name: String,
    pub bytes_so_far: u64,
    /// From content-length; only used for percentages.
    pub declared_total: Option<u64>,
    pub rate_kbps: f64,
    /// Pause owed for this chunk under the rate ceiling.
    pub pause: Pause,
}

impl TransferProgress {
    pub fn percent(&self) -> Option<f64> {
        self.declared_total
            .filter(|total| *total > 0)
            .map(|total| 100.0 * self.bytes_so_far as f64 / total as f64)
    }

    pub fn eta(&self) -> Option<Duration> {
        let total = self.declared_total?;
        if self.rate_kbps <= 0.0 {
            return None;
        }
        let remaining_kb = total.saturating_sub(self.bytes_so_far) as f64 / 1024.0;
        Some(Duration::from_secs_f64(remaining_kb / self.rate_kbps))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub planned: usize,
    pub failed: usize,
    pub mismatched: usize,
    pub bytes_transferred: u64,
    pub dry_run: bool,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &TransferOutcome) {
        match outcome {
            TransferOutcome::Skipped { .. } => self.skipped += 1,
            TransferOutcome::Planned { .. } => self.planned += 1,
            TransferOutcome::Downloaded { bytes, digest } => {
                self.downloaded += 1;
                self.bytes_transferred += bytes;
                if matches!(digest, DigestCheck::Mismatched { .. }) {
                    self.mismatched += 1;
                }
            }
            TransferOutcome::Failed {
                cause: TransferError::Cancelled,
            } => self.cancelled = true,
            TransferOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.mismatched > 0
    }
}
