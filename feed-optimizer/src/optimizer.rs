use crate::classifier::ContentClassifier;
use crate::policy::{decide, Tier};
use crate::prompt::has_premium_keyword;
use crate::seeder::DiscoverySeeder;
use crate::state::{Phase, RunSummary, SessionState, StopReason};
use crate::traits::FeedRenderer;
use crate::types::{Action, ItemHandle, OptimizerConfig, OptimizerError, Result};
use crate::utils::{text::preview, time::format_duration};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Session driver: seeds, scans, scores, acts and paginates until a bound is hit.
///
/// Every step runs to completion before the next starts. Waits (rate limit,
/// backend call, pacing) race the cancellation token; the renderer is closed once
/// when [`FeedOptimizer::run`] returns, whatever the outcome.
pub struct FeedOptimizer<R: FeedRenderer> {
    renderer: R,
    classifier: ContentClassifier,
    seeder: Option<DiscoverySeeder>,
    config: OptimizerConfig,
    cancel: CancellationToken,
}

impl<R: FeedRenderer> FeedOptimizer<R> {
    pub fn new(renderer: R, classifier: ContentClassifier, config: OptimizerConfig) -> Self {
        let seeder = config
            .seed
            .enabled
            .then(|| DiscoverySeeder::new(config.seed.clone()));
        Self {
            renderer,
            classifier,
            seeder,
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the run at the next step or wait.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(mut self) -> Result<RunSummary> {
        let mut state = SessionState::new();
        info!(
            "Starting feed optimization session {} on {}",
            state.session_id,
            self.renderer.renderer_name()
        );

        let outcome = self.drive(&mut state).await;
        state.phase = Phase::Terminated;

        info!("Closing renderer session");
        if let Err(e) = self.renderer.close().await {
            warn!("Renderer close failed: {}", e);
        }

        match outcome {
            Ok(reason) => {
                let summary = state.summary(self.classifier.calls_made(), reason);
                log_summary(&summary);
                Ok(summary)
            }
            Err(e) => {
                error!(
                    "Session aborted after {} items: {}",
                    state.processed_count, e
                );
                Err(e)
            }
        }
    }

    async fn drive(&mut self, state: &mut SessionState) -> Result<StopReason> {
        if !self.await_login().await? {
            return Ok(StopReason::Cancelled);
        }

        if self.seeder.is_some() {
            state.phase = Phase::Seeding;
            if !self.seed(state).await? {
                return Ok(StopReason::Cancelled);
            }
        }

        state.phase = Phase::Scanning;
        loop {
            if self.cancel.is_cancelled() {
                return Ok(StopReason::Cancelled);
            }
            if let Some(reason) = state.stop_reason(&self.config) {
                return Ok(reason);
            }
            if !self.renderer.is_authenticated().await {
                return Err(OptimizerError::NotAuthenticated);
            }

            let handles = self.renderer.list_visible_items().await?;
            info!("Found {} item elements", handles.len());

            let mut new_items = 0;
            for handle in handles {
                if self.cancel.is_cancelled() {
                    return Ok(StopReason::Cancelled);
                }
                if state.processed_count >= self.config.max_items {
                    break;
                }
                if state.is_seen(&handle.id) {
                    continue;
                }
                new_items += 1;

                if !self.process_item(state, &handle).await? {
                    return Ok(StopReason::Cancelled);
                }
            }

            if new_items == 0 {
                info!("No new items found, paginating");
            }
            if let Some(reason) = state.stop_reason(&self.config) {
                return Ok(reason);
            }

            self.renderer.paginate().await?;
            state.scroll_attempts += 1;
            debug!("Pagination attempt {}", state.scroll_attempts);

            if !pause(&self.cancel, self.config.pagination_delay).await {
                return Ok(StopReason::Cancelled);
            }
        }
    }

    /// Extract, score, decide and act on one unseen item.
    /// Returns false when cancelled mid-item; nothing is recorded in that case.
    async fn process_item(&mut self, state: &mut SessionState, handle: &ItemHandle) -> Result<bool> {
        let item = match self.renderer.extract(handle).await {
            Some(item) if item.has_scorable_title() => item,
            Some(item) => {
                debug!("Skipping {}: title too short ({:?})", handle, item.title);
                state.mark_skipped(&handle.id);
                return Ok(true);
            }
            None => {
                debug!("Skipping {}: no metadata", handle);
                state.mark_skipped(&handle.id);
                return Ok(true);
            }
        };

        info!("Analyzing: {}", preview(&item.title, 60));
        info!("Channel: {}", item.author);

        let Some(result) = until_cancelled(&self.cancel, self.classifier.classify(&item)).await else {
            return Ok(false);
        };

        let action = decide(result.score);
        let tier = Tier::from_score(result.score);
        info!(
            score = result.score,
            tier = %tier,
            action = %action,
            "Score: {}/10 ({}) -> {}: {}",
            result.score,
            tier,
            action,
            result.rationale
        );

        match self.renderer.act(handle, action).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Could not {} {}", action, handle);
                state.action_failures += 1;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Action {} on {} failed: {}", action, handle, e);
                state.action_failures += 1;
            }
        }
        state.mark_processed(&handle.id, action);

        if result.fallback {
            state.degraded += 1;
            let backoff = self.config.failure_backoff.sample();
            warn!("Classifier unavailable, backing off {}", format_duration(backoff));
            if !pause(&self.cancel, backoff).await {
                return Ok(false);
            }
        }

        Ok(pause(&self.cancel, self.config.action_delay.sample()).await)
    }

    /// True once the renderer reports a logged-in session, false if cancelled while waiting.
    async fn await_login(&mut self) -> Result<bool> {
        if self.renderer.is_authenticated().await {
            info!("Already logged in, starting optimization");
            return Ok(true);
        }
        if self.config.login_timeout.is_zero() {
            return Err(OptimizerError::NotAuthenticated);
        }

        info!(
            "Please log in; waiting up to {}",
            format_duration(self.config.login_timeout)
        );
        let deadline = Instant::now() + self.config.login_timeout;
        while Instant::now() < deadline {
            if !pause(&self.cancel, self.config.login_poll_interval).await {
                return Ok(false);
            }
            if self.renderer.is_authenticated().await {
                info!("Login detected, starting optimization");
                return Ok(true);
            }
        }
        Err(OptimizerError::NotAuthenticated)
    }

    /// Run the discovery searches. Returns false if cancelled.
    async fn seed(&mut self, state: &mut SessionState) -> Result<bool> {
        let Some(seeder) = self.seeder.as_ref() else {
            return Ok(true);
        };
        let seed_config = seeder.config().clone();

        let generated = until_cancelled(
            &self.cancel,
            seeder.generate_phrases(&mut self.classifier, state.search_phrases_used()),
        )
        .await;
        let Some(phrases) = generated else {
            return Ok(false);
        };

        let mut searches = 0;
        for phrase in phrases {
            if searches >= seed_config.max_searches {
                break;
            }
            if self.cancel.is_cancelled() {
                return Ok(false);
            }
            if !state.record_search(&phrase) {
                debug!("Search phrase already used: {}", phrase);
                continue;
            }
            searches += 1;

            info!("Searching for premium content: {}", phrase);
            let results = self.renderer.search(&phrase).await?;
            if results.is_empty() {
                warn!("No search results for {:?}", phrase);
            }

            for handle in results.iter().take(seed_config.results_per_search) {
                if state.is_seen(&handle.id) {
                    debug!("Search result {} already handled", handle);
                    continue;
                }
                let Some(item) = self.renderer.extract(handle).await else {
                    continue;
                };
                if !has_premium_keyword(&item.title) {
                    continue;
                }
                info!("Found premium content: {}", preview(&item.title, 50));
                match self.renderer.act(handle, Action::Endorse).await {
                    Ok(true) => {
                        state.mark_seeded(&handle.id);
                    }
                    Ok(false) => warn!("Could not endorse search result {}", handle),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => warn!("Endorsing search result {} failed: {}", handle, e),
                }
                break;
            }

            self.renderer.open_home().await?;
            if !pause(&self.cancel, seed_config.search_delay).await {
                return Ok(false);
            }
        }

        info!("Seeding finished after {} searches", searches);
        Ok(true)
    }
}

/// Sleep unless cancelled first. Returns false on cancellation.
async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if duration.is_zero() {
        return true;
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Drive `fut` to completion unless the token fires first.
async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

fn log_summary(summary: &RunSummary) {
    info!(
        "Processed {} items ({} endorsed, {} suppressed, {} neutral, {} skipped)",
        summary.processed, summary.endorsed, summary.suppressed, summary.neutral, summary.skipped
    );
    info!("Classifier calls made: {}", summary.classifier_calls);
    if summary.action_failures > 0 || summary.degraded_classifications > 0 {
        warn!(
            "{} action failures, {} degraded classifications",
            summary.action_failures, summary.degraded_classifications
        );
    }
    info!(
        "Stopped: {:?} after {} pagination attempts",
        summary.stop_reason, summary.scroll_attempts
    );
}
