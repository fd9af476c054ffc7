use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
// Use the interfaces crate for core types
pub use interfaces::defs::{Action, ItemHandle, ItemMetadata, UNKNOWN_AUTHOR};

/// Score applied whenever classification cannot produce a trustworthy result.
pub const FALLBACK_SCORE: u8 = 5;
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// Rationale used when the backend gave a score but no explanation.
pub const NO_RATIONALE: &str = "No rationale provided";
/// Rationale used when every configured backend failed.
pub const ANALYSIS_FAILED: &str = "Analysis failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub rationale: String,
    /// True when no backend answered and the neutral fallback was applied.
    #[serde(default)]
    pub fallback: bool,
}

impl ScoreResult {
    pub fn new(score: u8, rationale: impl Into<String>) -> Self {
        Self {
            score: score.clamp(MIN_SCORE, MAX_SCORE),
            rationale: rationale.into(),
            fallback: false,
        }
    }

    pub fn backend_failure() -> Self {
        Self {
            score: FALLBACK_SCORE,
            rationale: ANALYSIS_FAILED.to_string(),
            fallback: true,
        }
    }
}

/// Uniform delay window, e.g. the pause between two actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self { min: delay, max: delay }
    }

    pub fn from_secs(min: u64, max: u64) -> Self {
        Self::new(Duration::from_secs(min), Duration::from_secs(max))
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Calls allowed per window before the governor forces a wait.
    pub ceiling: u32,
    pub window: Duration,
    /// Extra slack added on top of the remaining window time.
    pub buffer: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            // Gemini free tier allows 15/min; stay well under it.
            ceiling: 10,
            window: Duration::from_secs(60),
            buffer: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub enabled: bool,
    /// Phrases requested from the model.
    pub phrase_count: usize,
    /// Searches actually issued.
    pub max_searches: usize,
    /// Results inspected per search.
    pub results_per_search: usize,
    pub search_delay: Duration,
    pub static_phrases: Vec<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            phrase_count: 5,
            max_searches: 2,
            results_per_search: 3,
            search_delay: Duration::from_secs(5),
            static_phrases: vec![
                "free full course programming".to_string(),
                "complete masterclass free".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub max_items: usize,
    pub max_scroll_attempts: usize,
    /// Pause after every scored item.
    pub action_delay: DelayRange,
    pub pagination_delay: Duration,
    /// Pause after a classification fell back because the backend failed.
    pub failure_backoff: DelayRange,
    /// How long to wait for the renderer to report a logged-in session.
    pub login_timeout: Duration,
    pub login_poll_interval: Duration,
    pub seed: SeedConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_items: 15,
            max_scroll_attempts: 15,
            action_delay: DelayRange::from_secs(3, 6),
            pagination_delay: Duration::from_secs(3),
            failure_backoff: DelayRange::from_secs(5, 10),
            login_timeout: Duration::ZERO,
            login_poll_interval: Duration::from_secs(5),
            seed: SeedConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend {adapter} failed: {message}")]
    Backend { adapter: String, message: String },

    #[error("Renderer error: {0}")]
    Renderer(String),

    #[error("Renderer session is not authenticated")]
    NotAuthenticated,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OptimizerError {
    pub fn backend(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        OptimizerError::Backend {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    /// Conditions that end the session instead of degrading.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OptimizerError::Renderer(_) | OptimizerError::NotAuthenticated)
    }
}

pub type Result<T> = std::result::Result<T, OptimizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_result_clamps() {
        assert_eq!(ScoreResult::new(0, "x").score, 1);
        assert_eq!(ScoreResult::new(42, "x").score, 10);
        assert_eq!(ScoreResult::new(7, "x").score, 7);
    }

    #[test]
    fn backend_failure_is_neutral() {
        let result = ScoreResult::backend_failure();
        assert_eq!(result.score, FALLBACK_SCORE);
        assert!(result.fallback);
    }

    #[test]
    fn delay_range_samples_within_bounds() {
        let range = DelayRange::from_secs(10, 5);
        assert_eq!(range.min, Duration::from_secs(5));
        for _ in 0..50 {
            let d = range.sample();
            assert!(d >= range.min && d <= range.max);
        }
        assert_eq!(DelayRange::fixed(Duration::ZERO).sample(), Duration::ZERO);
    }

    #[test]
    fn only_session_errors_are_fatal() {
        assert!(OptimizerError::NotAuthenticated.is_fatal());
        assert!(OptimizerError::Renderer("gone".into()).is_fatal());
        assert!(!OptimizerError::backend("mock", "boom").is_fatal());
        assert!(!OptimizerError::Config("bad".into()).is_fatal());
    }
}
