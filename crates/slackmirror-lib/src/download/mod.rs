mod engine;
mod rate_limiter;
mod types;

pub use engine::MirrorEngine;
pub use rate_limiter::{Pause, RateLimiter, TransferThrottle};
pub use types::{
    Decision, DigestCheck, EngineOptions, MAX_ERROR_BODY_BYTES, RunSummary, SkipReason,
    TransferError, TransferOutcome, TransferProgress, TransferReason,
};
