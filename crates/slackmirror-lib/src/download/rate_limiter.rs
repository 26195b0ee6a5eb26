//! Reactive throttle for a single in-flight transfer.
//!
//! The limiter keeps no token budget. After every chunk it computes the
//! average rate since the transfer started and, when that rate is above the
//! ceiling, sleeps for `speed / ceiling - 1` seconds. The pause grows with the
//! excess, so the average overshoots below the ceiling and settles within a
//! few chunks instead of converging smoothly. The pause is capped at the time
//! that brings the average exactly down to the ceiling, which only matters
//! for sub-second elapsed times where the plain formula would sleep for hours
//! after a single buffered chunk. Under the ceiling a small idle delay is
//! applied so per-chunk progress output stays readable.
//!
//! Limiters are cheap values; each transfer calls [`RateLimiter::start`] and
//! owns the returned [`TransferThrottle`], so nothing is shared across
//! transfers. Sleeping is left to the caller so it can race the pause
//! against cancellation.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pause {
    /// First chunk or limiter disabled.
    None,
    /// Average rate is over the ceiling.
    Throttle(Duration),
    /// Average rate is within the ceiling.
    Idle(Duration),
}

impl Pause {
    pub fn duration(self) -> Duration {
        match self {
            Pause::None => Duration::ZERO,
            Pause::Throttle(duration) | Pause::Idle(duration) => duration,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RateLimiter {
    ceiling_kbps: u64,
    idle_delay: Duration,
}

impl RateLimiter {
    /// `ceiling_kbps == 0` disables throttling entirely.
    pub fn new(ceiling_kbps: u64, idle_delay: Duration) -> Self {
        Self {
            ceiling_kbps,
            idle_delay,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn ceiling_kbps(&self) -> u64 {
        self.ceiling_kbps
    }

    pub fn start(&self) -> TransferThrottle {
        TransferThrottle {
            limiter: *self,
            started: Instant::now(),
            bytes_so_far: 0,
        }
    }

    /// The pause owed after `bytes_so_far` bytes in `elapsed` wall time.
    pub fn pause_for(&self, bytes_so_far: u64, elapsed: Duration) -> Pause {
        if self.ceiling_kbps == 0 {
            return Pause::None;
        }
        let elapsed_secs = elapsed.as_secs_f64();
        if elapsed_secs <= 0.0 {
            return Pause::None;
        }

        let speed_kbps = bytes_so_far as f64 / 1024.0 / elapsed_secs;
        let ceiling = self.ceiling_kbps as f64;
        if speed_kbps > ceiling {
            let feedback_secs = speed_kbps / ceiling - 1.0;
            let catch_up_secs = bytes_so_far as f64 / 1024.0 / ceiling - elapsed_secs;
            Pause::Throttle(Duration::from_secs_f64(
                feedback_secs.min(catch_up_secs).max(0.0),
            ))
        } else {
            Pause::Idle(self.idle_delay)
        }
    }
}

/// Per-transfer state: bytes counted and when the transfer began.
#[derive(Debug)]
pub struct TransferThrottle {
    limiter: RateLimiter,
    started: Instant,
    bytes_so_far: u64,
}

impl TransferThrottle {
    pub fn bytes_so_far(&self) -> u64 {
        self.bytes_so_far
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Average rate since start in KB/s.
    pub fn average_kbps(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            0.0
        } else {
            self.bytes_so_far as f64 / 1024.0 / elapsed
        }
    }

    /// Accounts for a consumed chunk and returns the pause owed for it.
    pub fn record(&mut self, chunk_len: usize) -> Pause {
        self.bytes_so_far += chunk_len as u64;
        self.limiter.pause_for(self.bytes_so_far, self.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: Duration = Duration::from_millis(100);

    #[test]
    fn test_no_pause_when_elapsed_is_zero() {
        let limiter = RateLimiter::new(500, IDLE);
        assert_eq!(limiter.pause_for(10 * 1024 * 1024, Duration::ZERO), Pause::None);
    }

    #[test]
    fn test_throttles_when_over_ceiling() {
        let limiter = RateLimiter::new(500, IDLE);

        // 1500 KB in one second is three times the ceiling.
        let pause = limiter.pause_for(1500 * 1024, Duration::from_secs(1));

        assert_eq!(pause, Pause::Throttle(Duration::from_secs(2)));
    }

    #[test]
    fn test_sub_second_pause_is_capped_at_catch_up_time() {
        let limiter = RateLimiter::new(100, IDLE);

        // 32 KB after 10ms: the feedback formula asks for ~31s, but 0.31s is
        // all it takes to bring the average back to 100 KB/s.
        let pause = limiter.pause_for(32 * 1024, Duration::from_millis(10));

        let Pause::Throttle(duration) = pause else {
            panic!("expected a throttle pause, got {pause:?}");
        };
        assert!((duration.as_secs_f64() - 0.31).abs() < 1e-6);
    }

    #[test]
    fn test_idles_when_under_ceiling() {
        let limiter = RateLimiter::new(500, IDLE);
        assert_eq!(
            limiter.pause_for(100 * 1024, Duration::from_secs(1)),
            Pause::Idle(IDLE)
        );
    }

    #[test]
    fn test_exactly_at_ceiling_is_not_throttled() {
        let limiter = RateLimiter::new(500, IDLE);
        assert_eq!(
            limiter.pause_for(500 * 1024, Duration::from_secs(1)),
            Pause::Idle(IDLE)
        );
    }

    #[test]
    fn test_disabled_never_pauses() {
        let limiter = RateLimiter::disabled();
        assert_eq!(
            limiter.pause_for(u64::MAX / 2, Duration::from_millis(1)),
            Pause::None
        );
    }

    #[test]
    fn test_fast_feed_gets_paused() {
        let limiter = RateLimiter::new(1, Duration::ZERO);
        let mut throttle = limiter.start();

        // Anything after the first instant is far above 1 KB/s for a megabyte.
        std::thread::sleep(Duration::from_millis(5));
        let pause = throttle.record(1024 * 1024);

        assert!(matches!(pause, Pause::Throttle(d) if d > Duration::from_secs(1)));
        assert_eq!(throttle.bytes_so_far(), 1024 * 1024);
    }

    #[test]
    fn test_records_cumulative_bytes() {
        let limiter = RateLimiter::disabled();
        let mut throttle = limiter.start();

        throttle.record(10);
        throttle.record(32);

        assert_eq!(throttle.bytes_so_far(), 42);
    }

    #[tokio::test]
    async fn test_throttle_follows_the_runtime_clock() {
        tokio::time::pause();

        let limiter = RateLimiter::new(100, IDLE);
        let mut throttle = limiter.start();
        tokio::time::advance(Duration::from_secs(1)).await;

        assert_eq!(throttle.record(50 * 1024), Pause::Idle(IDLE));
        assert_eq!(
            throttle.record(250 * 1024),
            Pause::Throttle(Duration::from_secs(2))
        );
        assert_eq!(throttle.bytes_so_far(), 300 * 1024);
    }
}
