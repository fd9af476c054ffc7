use serde::{Deserialize, Serialize};
use std::fmt;

/// Author value used when the renderer cannot resolve a channel name.
pub const UNKNOWN_AUTHOR: &str = "Unknown Channel";

/// Titles shorter than this (after trimming) are not worth scoring.
pub const MIN_TITLE_CHARS: usize = 5;

/// Opaque reference to one rendered feed entry.
/// Only valid within the render session that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemHandle {
    pub id: String,
}

impl ItemHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Best-effort metadata extracted for one visible item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub id: String,
    pub title: String,
    pub author: String,
    pub duration: Option<String>,
    pub view_count: Option<String>,
    pub description: Option<String>,
}

impl ItemMetadata {
    /// Build metadata from extracted fields. A missing or blank author falls back
    /// to [`UNKNOWN_AUTHOR`] so the field is never empty.
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: Option<String>) -> Self {
        let author = author
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        Self {
            id: id.into(),
            title: title.into().trim().to_string(),
            author,
            duration: None,
            view_count: None,
            description: None,
        }
    }

    pub fn with_duration(mut self, duration: Option<String>) -> Self {
        self.duration = non_blank(duration);
        self
    }

    pub fn with_view_count(mut self, view_count: Option<String>) -> Self {
        self.view_count = non_blank(view_count);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = non_blank(description);
        self
    }

    /// Whether the title is long enough to be scored.
    pub fn has_scorable_title(&self) -> bool {
        self.title.trim().chars().count() >= MIN_TITLE_CHARS
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Feed-shaping command issued to the renderer after scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Like / upvote the item.
    Endorse,
    /// "Not interested" / don't recommend.
    Suppress,
    /// Leave the item alone.
    Neutral,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Endorse => "endorse",
            Action::Suppress => "suppress",
            Action::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Object style note:
// Renderer adapters own the selector chains and page navigation that produce these
// values. Everything downstream only sees ItemHandle, ItemMetadata and Action, so
// swapping the renderer never touches the scoring pipeline.
