use crate::classifier::ContentClassifier;
use crate::llm_adapter::CompletionOptions;
use crate::parser::parse_phrases;
use crate::prompt::build_discovery_prompt;
use crate::types::SeedConfig;
use std::collections::HashSet;
use tracing::{info, warn};

/// Asks the model for search phrases that surface high-value content before the scan.
pub struct DiscoverySeeder {
    config: SeedConfig,
}

impl DiscoverySeeder {
    pub fn new(config: SeedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    /// Fresh phrases, none of which appear in `used`. Falls back to the static list
    /// when the model fails or only repeats itself.
    pub async fn generate_phrases(
        &self,
        classifier: &mut ContentClassifier,
        used: &HashSet<String>,
    ) -> Vec<String> {
        let prompt = build_discovery_prompt(self.config.phrase_count);
        let generated = match classifier
            .generate(&prompt, &CompletionOptions::discovery())
            .await
        {
            Ok(raw) => parse_phrases(&raw, self.config.phrase_count),
            Err(e) => {
                warn!("Search phrase generation failed: {}", e);
                Vec::new()
            }
        };

        let fresh = dedupe(generated, used);
        if !fresh.is_empty() {
            info!("Generated {} search phrases", fresh.len());
            return fresh;
        }

        info!("No usable generated phrases, falling back to static list");
        dedupe(self.config.static_phrases.clone(), used)
    }
}

/// Comparison key for a phrase: lowercase, single-spaced.
pub fn phrase_key(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn dedupe(phrases: Vec<String>, used: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    phrases
        .into_iter()
        .filter(|p| {
            let key = phrase_key(p);
            !key.is_empty() && !used.contains(&key) && seen.insert(key)
        })
        .collect()
}
