use crate::seeder::phrase_key;
use crate::types::{Action, OptimizerConfig};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Seeding,
    Scanning,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxItems,
    MaxScrollAttempts,
    Cancelled,
}

/// Everything one optimization run knows about what it has already done.
///
/// Only completed actions land in `processed_ids`, so abandoning a batch halfway
/// leaves the state consistent.
#[derive(Debug)]
pub struct SessionState {
    pub session_id: Uuid,
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    processed_ids: HashSet<String>,
    skipped_ids: HashSet<String>,
    search_phrases_used: HashSet<String>,
    pub processed_count: usize,
    pub scroll_attempts: usize,
    pub endorsed: usize,
    pub suppressed: usize,
    pub neutral: usize,
    pub action_failures: usize,
    pub degraded: usize,
    pub seeded_endorsements: usize,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            phase: Phase::Scanning,
            started_at: Utc::now(),
            processed_ids: HashSet::new(),
            skipped_ids: HashSet::new(),
            search_phrases_used: HashSet::new(),
            processed_count: 0,
            scroll_attempts: 0,
            endorsed: 0,
            suppressed: 0,
            neutral: 0,
            action_failures: 0,
            degraded: 0,
            seeded_endorsements: 0,
        }
    }

    pub fn is_processed(&self, id: &str) -> bool {
        self.processed_ids.contains(id)
    }

    /// Processed or skipped: either way the item needs no more work this session.
    pub fn is_seen(&self, id: &str) -> bool {
        self.processed_ids.contains(id) || self.skipped_ids.contains(id)
    }

    /// Record a completed action. Returns false, and counts nothing, if the id was
    /// already processed.
    pub fn mark_processed(&mut self, id: &str, action: Action) -> bool {
        if !self.processed_ids.insert(id.to_string()) {
            return false;
        }
        self.processed_count += 1;
        match action {
            Action::Endorse => self.endorsed += 1,
            Action::Suppress => self.suppressed += 1,
            Action::Neutral => self.neutral += 1,
        }
        true
    }

    /// Record an endorsement made while seeding. The id is claimed so the scan never
    /// acts on it again, but it does not count toward `processed_count`.
    pub fn mark_seeded(&mut self, id: &str) -> bool {
        if !self.processed_ids.insert(id.to_string()) {
            return false;
        }
        self.seeded_endorsements += 1;
        true
    }

    pub fn mark_skipped(&mut self, id: &str) {
        self.skipped_ids.insert(id.to_string());
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_ids.len()
    }

    /// Claim a search phrase. Returns false if an equivalent phrase was already used.
    pub fn record_search(&mut self, phrase: &str) -> bool {
        let key = phrase_key(phrase);
        !key.is_empty() && self.search_phrases_used.insert(key)
    }

    pub fn search_phrases_used(&self) -> &HashSet<String> {
        &self.search_phrases_used
    }

    pub fn stop_reason(&self, config: &OptimizerConfig) -> Option<StopReason> {
        if self.processed_count >= config.max_items {
            Some(StopReason::MaxItems)
        } else if self.scroll_attempts >= config.max_scroll_attempts {
            Some(StopReason::MaxScrollAttempts)
        } else {
            None
        }
    }

    pub fn summary(&self, classifier_calls: u64, stop_reason: StopReason) -> RunSummary {
        RunSummary {
            session_id: self.session_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            stop_reason,
            processed: self.processed_count,
            endorsed: self.endorsed,
            suppressed: self.suppressed,
            neutral: self.neutral,
            skipped: self.skipped_ids.len(),
            action_failures: self.action_failures,
            degraded_classifications: self.degraded,
            seeded_endorsements: self.seeded_endorsements,
            scroll_attempts: self.scroll_attempts,
            classifier_calls,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// What a finished run reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stop_reason: StopReason,
    pub processed: usize,
    pub endorsed: usize,
    pub suppressed: usize,
    pub neutral: usize,
    pub skipped: usize,
    pub action_failures: usize,
    pub degraded_classifications: usize,
    pub seeded_endorsements: usize,
    pub scroll_attempts: usize,
    pub classifier_calls: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_ids_reject_duplicates() {
        let mut state = SessionState::new();
        assert!(state.mark_processed("v1", Action::Endorse));
        assert!(!state.mark_processed("v1", Action::Suppress));
        assert_eq!(state.processed_count, 1);
        assert_eq!(state.endorsed, 1);
        assert_eq!(state.suppressed, 0);
        assert!(state.is_processed("v1"));
    }

    #[test]
    fn seeded_ids_are_claimed_without_counting() {
        let mut state = SessionState::new();
        assert!(state.mark_seeded("sr-1"));
        assert!(!state.mark_seeded("sr-1"));
        assert!(state.is_processed("sr-1"));
        assert!(!state.mark_processed("sr-1", Action::Suppress));
        assert_eq!(state.seeded_endorsements, 1);
        assert_eq!(state.processed_count, 0);
        assert_eq!(state.suppressed, 0);
    }

    #[test]
    fn skipped_items_are_seen_but_not_processed() {
        let mut state = SessionState::new();
        state.mark_skipped("short");
        assert!(state.is_seen("short"));
        assert!(!state.is_processed("short"));
        assert_eq!(state.processed_count, 0);
        assert_eq!(state.skipped_count(), 1);
    }

    #[test]
    fn search_phrases_are_claimed_once() {
        let mut state = SessionState::new();
        assert!(state.record_search("Free Full Course"));
        assert!(!state.record_search("free  full course"));
        assert!(!state.record_search("   "));
        assert_eq!(state.search_phrases_used().len(), 1);
    }

    #[test]
    fn stop_reasons() {
        let config = OptimizerConfig {
            max_items: 2,
            max_scroll_attempts: 3,
            ..OptimizerConfig::default()
        };
        let mut state = SessionState::new();
        assert_eq!(state.stop_reason(&config), None);

        state.scroll_attempts = 3;
        assert_eq!(state.stop_reason(&config), Some(StopReason::MaxScrollAttempts));

        state.mark_processed("a", Action::Neutral);
        state.mark_processed("b", Action::Neutral);
        assert_eq!(state.stop_reason(&config), Some(StopReason::MaxItems));
    }

    #[test]
    fn summary_serializes() {
        let mut state = SessionState::new();
        state.mark_processed("a", Action::Suppress);
        let summary = state.summary(4, StopReason::Cancelled);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["stop_reason"], "cancelled");
        assert_eq!(json["suppressed"], 1);
        assert_eq!(json["classifier_calls"], 4);
    }
}
