use crate::traits::FeedRenderer;
use crate::types::{Action, ItemHandle, ItemMetadata, OptimizerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// One item as written in a fixture file. Every field but `id` may be missing,
/// which is how extraction gaps are simulated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureItem {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub view_count: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl FixtureItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn by(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    fn to_metadata(&self) -> Option<ItemMetadata> {
        let title = self.title.as_deref()?.trim();
        if title.is_empty() {
            return None;
        }
        Some(
            ItemMetadata::new(self.id.clone(), title, self.author.clone())
                .with_duration(self.duration.clone())
                .with_view_count(self.view_count.clone())
                .with_description(self.description.clone()),
        )
    }
}

fn default_true() -> bool {
    true
}

/// Recorded feed: pages revealed one by one as the renderer paginates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedFixture {
    #[serde(default = "default_true")]
    pub authenticated: bool,
    #[serde(default)]
    pub pages: Vec<Vec<FixtureItem>>,
    #[serde(default)]
    pub search_results: HashMap<String, Vec<FixtureItem>>,
    /// Item ids whose actions fail.
    #[serde(default)]
    pub failing_actions: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub id: String,
    pub action: Action,
}

#[derive(Debug, Default)]
struct Journal {
    actions: Vec<ActionRecord>,
    searches: Vec<String>,
    close_calls: usize,
}

/// Read side of a [`FixtureRenderer`], still usable after the renderer moved into a run.
#[derive(Debug, Clone, Default)]
pub struct FixtureProbe {
    journal: Arc<Mutex<Journal>>,
}

impl FixtureProbe {
    pub fn actions(&self) -> Vec<ActionRecord> {
        self.journal
            .lock()
            .map(|j| j.actions.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, action: Action) -> usize {
        self.actions().iter().filter(|r| r.action == action).count()
    }

    pub fn searches(&self) -> Vec<String> {
        self.journal
            .lock()
            .map(|j| j.searches.clone())
            .unwrap_or_default()
    }

    pub fn close_calls(&self) -> usize {
        self.journal.lock().map(|j| j.close_calls).unwrap_or_default()
    }

    fn record(&self, f: impl FnOnce(&mut Journal)) {
        if let Ok(mut journal) = self.journal.lock() {
            f(&mut journal);
        }
    }
}

/// In-process renderer replaying a [`FeedFixture`]. Each pagination reveals one
/// more page and the visible batch is every revealed page, so consecutive batches
/// overlap the way an infinite-scroll feed does.
pub struct FixtureRenderer {
    fixture: FeedFixture,
    items: HashMap<String, FixtureItem>,
    revealed_pages: usize,
    batches_listed: usize,
    auth_lost_after: Option<usize>,
    closed: bool,
    probe: FixtureProbe,
}

impl FixtureRenderer {
    pub fn new(fixture: FeedFixture) -> Self {
        let items = fixture
            .pages
            .iter()
            .flatten()
            .chain(fixture.search_results.values().flatten())
            .map(|item| (item.id.clone(), item.clone()))
            .collect();

        Self {
            revealed_pages: fixture.pages.len().min(1),
            fixture,
            items,
            batches_listed: 0,
            auth_lost_after: None,
            closed: false,
            probe: FixtureProbe::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        info!("Loaded feed fixture from {}", path.display());
        Self::from_json(&json)
    }

    /// Report the session as logged out once `batches` batches have been listed.
    pub fn with_auth_lost_after(mut self, batches: usize) -> Self {
        self.auth_lost_after = Some(batches);
        self
    }

    pub fn probe(&self) -> FixtureProbe {
        self.probe.clone()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(OptimizerError::Renderer("fixture session closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl FeedRenderer for FixtureRenderer {
    fn renderer_name(&self) -> String {
        format!("fixture ({} pages)", self.fixture.pages.len())
    }

    async fn list_visible_items(&mut self) -> Result<Vec<ItemHandle>> {
        self.ensure_open()?;
        self.batches_listed += 1;
        Ok(self
            .fixture
            .pages
            .iter()
            .take(self.revealed_pages)
            .flatten()
            .map(|item| ItemHandle::new(item.id.clone()))
            .collect())
    }

    async fn extract(&mut self, handle: &ItemHandle) -> Option<ItemMetadata> {
        self.items.get(&handle.id).and_then(FixtureItem::to_metadata)
    }

    async fn act(&mut self, handle: &ItemHandle, action: Action) -> Result<bool> {
        self.ensure_open()?;
        if self.fixture.failing_actions.contains(&handle.id) {
            debug!("Fixture refusing {} on {}", action, handle);
            return Ok(false);
        }
        let record = ActionRecord {
            id: handle.id.clone(),
            action,
        };
        self.probe.record(|j| j.actions.push(record));
        Ok(true)
    }

    async fn paginate(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.revealed_pages = (self.revealed_pages + 1).min(self.fixture.pages.len());
        Ok(())
    }

    async fn is_authenticated(&mut self) -> bool {
        let lost = self
            .auth_lost_after
            .is_some_and(|limit| self.batches_listed >= limit);
        self.fixture.authenticated && !lost && !self.closed
    }

    async fn search(&mut self, phrase: &str) -> Result<Vec<ItemHandle>> {
        self.ensure_open()?;
        let owned = phrase.to_string();
        self.probe.record(|j| j.searches.push(owned));

        let results = self
            .fixture
            .search_results
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(phrase.trim()))
            .map(|(_, items)| items.iter().map(|i| ItemHandle::new(i.id.clone())).collect())
            .unwrap_or_default();
        Ok(results)
    }

    async fn open_home(&mut self) -> Result<()> {
        self.ensure_open()
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.probe.record(|j| j.close_calls += 1);
        Ok(())
    }
}
