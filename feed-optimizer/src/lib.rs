pub mod types;
pub mod utils;
pub mod rate_governor;
pub mod parser;
pub mod prompt;
pub mod policy;
pub mod llm_adapter;
pub mod adapters;
pub mod classifier;
pub mod traits;
pub mod seeder;
pub mod state;
pub mod optimizer;
pub mod sources;

pub use types::*;
pub use adapters::{GeminiAdapter, HttpConfig, OpenAiAdapter};
pub use classifier::{ContentClassifier, ProviderMode};
pub use llm_adapter::{CompletionOptions, LlmAdapter, MockLlmAdapter};
pub use optimizer::FeedOptimizer;
pub use policy::{decide, Tier};
pub use rate_governor::RateGovernor;
pub use seeder::DiscoverySeeder;
pub use state::{Phase, RunSummary, SessionState, StopReason};
pub use traits::FeedRenderer;
pub use sources::FixtureRenderer;
