use rand::Rng;
use std::time::Duration;
use storyweaver_core::config::PollConfig;

const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(30 * 60);

/// How a long-running job is re-queried: fixed interval plus optional jitter,
/// bounded by attempts and/or wall time. Both bounds `None` means poll forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub max_elapsed: Option<Duration>,
    pub jitter: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(storyweaver_core::config::DEFAULT_POLL_INTERVAL_MS),
            max_attempts: None,
            max_elapsed: Some(DEFAULT_MAX_ELAPSED),
            jitter: Duration::ZERO,
        }
    }
}

impl PollPolicy {
    /// Poll at `interval` until the backend says done.
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            max_elapsed: None,
            jitter: Duration::ZERO,
        }
    }

    pub fn from_config(cfg: &PollConfig) -> Self {
        Self {
            interval: Duration::from_millis(cfg.interval_ms),
            max_attempts: cfg.max_attempts,
            max_elapsed: cfg.max_elapsed_ms.map(Duration::from_millis),
            jitter: Duration::from_millis(cfg.jitter_ms),
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }
        let extra = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        self.interval + Duration::from_millis(extra)
    }

    /// True once `attempts` polls or `elapsed` time have used up the budget.
    pub fn exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        if matches!(self.max_attempts, Some(max) if attempts >= max) {
            return true;
        }
        matches!(self.max_elapsed, Some(max) if elapsed >= max)
    }
}
