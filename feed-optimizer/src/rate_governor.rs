use crate::types::RateLimitConfig;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Approximate fixed-window limiter for outbound classifier calls.
///
/// The window opens on the first call after a reset and closes once `ceiling`
/// calls have been recorded. If that happens before `window` has elapsed, the
/// next call waits out the rest of the window plus `buffer`. Calls straddling two
/// windows can briefly exceed the ceiling over a sliding minute; that slack is
/// accepted, the buffer absorbs it in practice.
///
/// One permit covers one logical completion. Transport retries of 5xx answers
/// inside an HTTP adapter are not counted separately; 429 answers are never retried.
pub struct RateGovernor {
    config: RateLimitConfig,
    count: u32,
    window_start: Option<Instant>,
    recent_calls: VecDeque<Instant>,
    total_calls: u64,
}

impl RateGovernor {
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = config.ceiling.max(1) as usize;
        Self {
            config,
            count: 0,
            window_start: None,
            recent_calls: VecDeque::with_capacity(capacity),
            total_calls: 0,
        }
    }

    /// How long a call issued at `now` would have to wait. Does not record anything.
    pub fn next_wait(&self, now: Instant) -> Option<Duration> {
        if self.count < self.config.ceiling.max(1) {
            return None;
        }
        let start = self.window_start?;
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.config.window {
            return None;
        }
        Some(self.config.window - elapsed + self.config.buffer)
    }

    /// Suspend until a call is allowed, then record it. Returns the time spent waiting.
    pub async fn permit_call(&mut self) -> Duration {
        let mut waited = Duration::ZERO;

        if self.count >= self.config.ceiling.max(1) {
            if let Some(wait) = self.next_wait(Instant::now()) {
                info!("Rate limit protection: sleeping {:.1} seconds", wait.as_secs_f64());
                tokio::time::sleep(wait).await;
                waited = wait;
            }
            self.count = 0;
        }

        self.record(Instant::now());
        waited
    }

    fn record(&mut self, now: Instant) {
        if self.count == 0 {
            self.window_start = Some(now);
        }
        self.count += 1;
        self.total_calls += 1;

        if self.recent_calls.len() == self.config.ceiling.max(1) as usize {
            self.recent_calls.pop_front();
        }
        self.recent_calls.push_back(now);

        debug!(
            "Classifier call {} in current window ({} total)",
            self.count, self.total_calls
        );
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    /// Most recent call instants, oldest first. Never longer than the ceiling.
    pub fn recent_calls(&self) -> impl Iterator<Item = &Instant> {
        self.recent_calls.iter()
    }
}
