use crate::llm_adapter::{CompletionOptions, LlmAdapter};
use crate::parser::parse_response;
use crate::prompt::build_scoring_prompt;
use crate::rate_governor::RateGovernor;
use crate::types::{ItemMetadata, OptimizerError, RateLimitConfig, Result, ScoreResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Which configured backend(s) a classifier talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderMode {
    /// Primary backend only.
    Primary,
    /// Secondary backend only.
    Secondary,
    /// Primary first, secondary only when the primary errors.
    Dual,
}

/// Scores items through the configured backend(s), throttled by a [`RateGovernor`].
pub struct ContentClassifier {
    mode: ProviderMode,
    primary: Option<Arc<dyn LlmAdapter>>,
    secondary: Option<Arc<dyn LlmAdapter>>,
    governor: RateGovernor,
}

impl ContentClassifier {
    /// Fails when `mode` needs a backend that was not supplied.
    pub fn new(
        mode: ProviderMode,
        primary: Option<Arc<dyn LlmAdapter>>,
        secondary: Option<Arc<dyn LlmAdapter>>,
        rate_limit: RateLimitConfig,
    ) -> Result<Self> {
        let missing = match mode {
            ProviderMode::Primary => primary.is_none().then_some("primary"),
            ProviderMode::Secondary => secondary.is_none().then_some("secondary"),
            ProviderMode::Dual => {
                if primary.is_none() {
                    Some("primary")
                } else if secondary.is_none() {
                    Some("secondary")
                } else {
                    None
                }
            }
        };
        if let Some(which) = missing {
            return Err(OptimizerError::Config(format!(
                "provider mode {:?} needs a {} backend",
                mode, which
            )));
        }
        if rate_limit.ceiling == 0 {
            return Err(OptimizerError::Config("rate limit ceiling must be at least 1".to_string()));
        }

        Ok(Self {
            mode,
            primary,
            secondary,
            governor: RateGovernor::new(rate_limit),
        })
    }

    /// Single-backend convenience constructor.
    pub fn single(adapter: Arc<dyn LlmAdapter>, rate_limit: RateLimitConfig) -> Result<Self> {
        Self::new(ProviderMode::Primary, Some(adapter), None, rate_limit)
    }

    pub fn mode(&self) -> ProviderMode {
        self.mode
    }

    /// Classifier calls issued so far, scoring and phrase generation alike.
    pub fn calls_made(&self) -> u64 {
        self.governor.total_calls()
    }

    /// Score one item. Backend failures never escape: they come back as the
    /// neutral fallback with `fallback` set, and the caller decides how long to back off.
    pub async fn classify(&mut self, item: &ItemMetadata) -> ScoreResult {
        let prompt = build_scoring_prompt(item);
        debug!("Scoring prompt for {}:\n{}", item.id, prompt);

        match self.generate(&prompt, &CompletionOptions::scoring()).await {
            Ok(raw) => parse_response(&raw),
            Err(e) => {
                warn!("Analysis failed for {}: {}", item.id, e);
                ScoreResult::backend_failure()
            }
        }
    }

    /// Send a free-form prompt through the governor and the provider dispatch.
    pub async fn generate(&mut self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        self.governor.permit_call().await;
        self.dispatch(prompt, options).await
    }

    async fn dispatch(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        match self.mode {
            ProviderMode::Primary => call(self.primary.as_deref(), prompt, options).await,
            ProviderMode::Secondary => call(self.secondary.as_deref(), prompt, options).await,
            ProviderMode::Dual => match call(self.primary.as_deref(), prompt, options).await {
                Ok(text) => Ok(text),
                Err(e) => {
                    warn!("Primary backend failed ({}), trying secondary", e);
                    call(self.secondary.as_deref(), prompt, options).await
                }
            },
        }
    }
}

async fn call(
    adapter: Option<&dyn LlmAdapter>,
    prompt: &str,
    options: &CompletionOptions,
) -> Result<String> {
    match adapter {
        Some(adapter) => adapter.complete(prompt, options).await,
        None => Err(OptimizerError::Config("backend not configured".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_adapter::MockLlmAdapter;
    use crate::types::{ANALYSIS_FAILED, FALLBACK_SCORE};

    fn backend(adapter: &Arc<MockLlmAdapter>) -> Option<Arc<dyn LlmAdapter>> {
        let adapter: Arc<dyn LlmAdapter> = adapter.clone();
        Some(adapter)
    }

    fn item() -> ItemMetadata {
        ItemMetadata::new("c1", "Operating systems lecture 4", Some("MIT".into()))
    }

    #[tokio::test]
    async fn primary_answer_is_parsed() {
        let primary = Arc::new(MockLlmAdapter::new("a").with_responses(["8|Great expert content"]));
        let mut classifier = ContentClassifier::single(primary, RateLimitConfig::default()).unwrap();

        let result = classifier.classify(&item()).await;
        assert_eq!(result.score, 8);
        assert_eq!(result.rationale, "Great expert content");
        assert!(!result.fallback);
        assert_eq!(classifier.calls_made(), 1);
    }

    #[tokio::test]
    async fn dual_uses_secondary_only_on_failure() {
        let primary = Arc::new(MockLlmAdapter::failing("a"));
        let secondary = Arc::new(MockLlmAdapter::new("b").with_responses(["9|Elite"]));
        let mut classifier = ContentClassifier::new(
            ProviderMode::Dual,
            backend(&primary),
            backend(&secondary),
            RateLimitConfig::default(),
        )
        .unwrap();

        let result = classifier.classify(&item()).await;
        assert_eq!(result.score, 9);
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 1);
    }

    #[tokio::test]
    async fn dual_never_scores_twice() {
        let primary = Arc::new(MockLlmAdapter::new("a").with_responses(["3|Clickbait"]));
        let secondary = Arc::new(MockLlmAdapter::new("b"));
        let mut classifier = ContentClassifier::new(
            ProviderMode::Dual,
            backend(&primary),
            backend(&secondary),
            RateLimitConfig::default(),
        )
        .unwrap();

        assert_eq!(classifier.classify(&item()).await.score, 3);
        assert_eq!(secondary.call_count(), 0);
    }

    #[tokio::test]
    async fn secondary_mode_ignores_primary() {
        let primary = Arc::new(MockLlmAdapter::new("a"));
        let secondary = Arc::new(MockLlmAdapter::new("b").with_responses(["6|Fine"]));
        let mut classifier = ContentClassifier::new(
            ProviderMode::Secondary,
            backend(&primary),
            backend(&secondary),
            RateLimitConfig::default(),
        )
        .unwrap();

        assert_eq!(classifier.classify(&item()).await.score, 6);
        assert_eq!(primary.call_count(), 0);
    }

    #[tokio::test]
    async fn total_failure_degrades_to_neutral() {
        let primary = Arc::new(MockLlmAdapter::failing("a"));
        let mut classifier = ContentClassifier::single(primary, RateLimitConfig::default()).unwrap();

        let result = classifier.classify(&item()).await;
        assert_eq!(result.score, FALLBACK_SCORE);
        assert_eq!(result.rationale, ANALYSIS_FAILED);
        assert!(result.fallback);
    }

    #[test]
    fn missing_backend_is_a_config_error() {
        let only_primary = backend(&Arc::new(MockLlmAdapter::new("a")));
        let err = ContentClassifier::new(ProviderMode::Dual, only_primary.clone(), None, RateLimitConfig::default());
        assert!(matches!(err, Err(OptimizerError::Config(_))));

        let err = ContentClassifier::new(ProviderMode::Secondary, only_primary, None, RateLimitConfig::default());
        assert!(matches!(err, Err(OptimizerError::Config(_))));

        let zero = RateLimitConfig {
            ceiling: 0,
            ..RateLimitConfig::default()
        };
        let err = ContentClassifier::single(Arc::new(MockLlmAdapter::new("a")), zero);
        assert!(matches!(err, Err(OptimizerError::Config(_))));
    }
}
