use crate::types::{Action, ItemHandle, ItemMetadata, Result};
use async_trait::async_trait;

/// Live feed the optimizer reads from and acts on (browser driver, API client, fixture).
///
/// Errors returned from `list_visible_items`, `paginate`, `search` and `open_home`
/// mean the session itself is gone and end the run. Anything item-level should be
/// absorbed by the adapter: `extract` returns `None` and `act` returns `Ok(false)`.
#[async_trait]
pub trait FeedRenderer: Send + Sync {
    /// Human-readable name for this renderer
    fn renderer_name(&self) -> String;

    /// Handles for every item currently rendered. Batches may overlap between calls.
    async fn list_visible_items(&mut self) -> Result<Vec<ItemHandle>>;

    /// Best-effort metadata for one handle; `None` when nothing usable was found.
    async fn extract(&mut self, handle: &ItemHandle) -> Option<ItemMetadata>;

    /// Execute an action against the live item. `Ok(false)` when the item could not
    /// be acted on; the run continues either way.
    async fn act(&mut self, handle: &ItemHandle, action: Action) -> Result<bool>;

    /// Reveal more items (scroll, next page).
    async fn paginate(&mut self) -> Result<()>;

    async fn is_authenticated(&mut self) -> bool;

    /// Run a search and return handles for the result list.
    async fn search(&mut self, phrase: &str) -> Result<Vec<ItemHandle>>;

    /// Navigate back to the personalized home feed.
    async fn open_home(&mut self) -> Result<()>;

    /// Release the session. Called exactly once per run.
    async fn close(&mut self) -> Result<()>;
}
