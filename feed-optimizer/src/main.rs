use anyhow::{bail, Context};
use clap::Parser;
use feed_optimizer::{
    ContentClassifier, DelayRange, FeedOptimizer, FixtureRenderer, GeminiAdapter, HttpConfig,
    LlmAdapter, MockLlmAdapter, OpenAiAdapter, OptimizerConfig, ProviderMode, RateLimitConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};

/// Bundled sample feed, resolved against the crate directory so any working directory works.
const DEFAULT_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/sample_feed.json");

#[derive(Parser)]
#[command(name = "feed-optimizer")]
#[command(about = "Scores feed items with an LLM and endorses or suppresses them", long_about = None)]
#[command(version)]
struct Cli {
    /// Recorded feed to replay (JSON fixture)
    #[arg(long, default_value = DEFAULT_FIXTURE)]
    fixture: PathBuf,

    /// Which scoring backend(s) to use
    #[arg(long, value_enum, default_value = "primary")]
    provider: ProviderMode,

    #[arg(long, default_value = "gemini-1.5-flash")]
    gemini_model: String,

    #[arg(long, default_value = "gpt-4o-mini")]
    openai_model: String,

    /// Score with the offline keyword heuristic instead of a live backend
    #[arg(long)]
    mock: bool,

    #[arg(long, default_value = "15")]
    max_items: usize,

    #[arg(long, default_value = "15")]
    max_scroll_attempts: usize,

    /// Calls per minute allowed to the primary backend
    #[arg(long, default_value = "10")]
    primary_ceiling: u32,

    /// Calls per minute allowed to the secondary backend
    #[arg(long, default_value = "10")]
    secondary_ceiling: u32,

    /// Seconds to wait for a logged-in session (0 fails immediately)
    #[arg(long, default_value = "0")]
    login_timeout: u64,

    /// Skip the discovery search phase
    #[arg(long)]
    no_seed: bool,

    /// Drop all pacing delays (useful with fixtures)
    #[arg(long)]
    fast: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn optimizer_config(&self) -> OptimizerConfig {
        let mut config = OptimizerConfig {
            max_items: self.max_items,
            max_scroll_attempts: self.max_scroll_attempts,
            login_timeout: Duration::from_secs(self.login_timeout),
            ..OptimizerConfig::default()
        };
        config.seed.enabled = !self.no_seed;
        if self.fast {
            config.action_delay = DelayRange::fixed(Duration::ZERO);
            config.failure_backoff = DelayRange::fixed(Duration::ZERO);
            config.pagination_delay = Duration::ZERO;
            config.seed.search_delay = Duration::ZERO;
        }
        config
    }

    /// One governor guards every call, so it runs at the tightest active ceiling.
    fn rate_limit(&self) -> RateLimitConfig {
        let ceiling = match self.provider {
            ProviderMode::Primary => self.primary_ceiling,
            ProviderMode::Secondary => self.secondary_ceiling,
            ProviderMode::Dual => self.primary_ceiling.min(self.secondary_ceiling),
        };
        RateLimitConfig {
            ceiling,
            ..RateLimitConfig::default()
        }
    }

    fn backends(&self) -> anyhow::Result<(Option<Arc<dyn LlmAdapter>>, Option<Arc<dyn LlmAdapter>>)> {
        if self.mock {
            let primary: Arc<dyn LlmAdapter> = Arc::new(MockLlmAdapter::new("primary"));
            let secondary: Arc<dyn LlmAdapter> = Arc::new(MockLlmAdapter::new("secondary"));
            return Ok((Some(primary), Some(secondary)));
        }

        let wants_primary = matches!(self.provider, ProviderMode::Primary | ProviderMode::Dual);
        let wants_secondary = matches!(self.provider, ProviderMode::Secondary | ProviderMode::Dual);

        let primary: Option<Arc<dyn LlmAdapter>> = if wants_primary {
            let adapter = GeminiAdapter::from_env(&self.gemini_model, HttpConfig::default())
                .context("Failed to configure Gemini backend")?;
            Some(Arc::new(adapter))
        } else {
            None
        };
        let secondary: Option<Arc<dyn LlmAdapter>> = if wants_secondary {
            let adapter = OpenAiAdapter::from_env(&self.openai_model, HttpConfig::default())
                .context("Failed to configure OpenAI backend")?;
            Some(Arc::new(adapter))
        } else {
            None
        };
        Ok((primary, secondary))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.max_items == 0 {
        bail!("--max-items must be at least 1");
    }

    info!("Starting feed optimizer ({:?} provider mode)", cli.provider);

    let (primary, secondary) = cli.backends()?;
    let classifier = ContentClassifier::new(cli.provider, primary, secondary, cli.rate_limit())
        .context("Failed to build classifier")?;

    let renderer = FixtureRenderer::from_path(&cli.fixture)
        .await
        .with_context(|| format!("Failed to load fixture {}", cli.fixture.display()))?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal, finishing current step...");
            signal_token.cancel();
        }
    });

    let optimizer = FeedOptimizer::new(renderer, classifier, cli.optimizer_config())
        .with_cancellation(cancel);

    let summary = match optimizer.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Feed optimization failed: {}", e);
            return Err(e.into());
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    info!("Feed optimizer finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fixture_resolves_from_any_directory() {
        let cli = Cli::parse_from(["feed-optimizer"]);
        assert!(cli.fixture.is_absolute());
        assert!(cli.fixture.exists(), "missing {}", cli.fixture.display());
    }

    #[test]
    fn dual_mode_uses_tightest_ceiling() {
        let cli = Cli::parse_from([
            "feed-optimizer",
            "--provider",
            "dual",
            "--primary-ceiling",
            "12",
            "--secondary-ceiling",
            "4",
        ]);
        assert_eq!(cli.rate_limit().ceiling, 4);
    }
}
