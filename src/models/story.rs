use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A story discovered on a category index page, before its detail page has
/// been visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryCandidate {
    pub title: String,
    pub url: String,
    /// Lowercase tag strings. Semantically a set; stored in listing order.
    pub categories: Vec<String>,
}

/// A candidate combined with the synopsis fetched from its detail page.
/// Empty synopsis means the fetch failed or the page has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedStory {
    pub title: String,
    pub url: String,
    pub categories: Vec<String>,
    pub synopsis: String,
}

impl ScrapedStory {
    pub fn from_candidate(candidate: StoryCandidate, synopsis: String) -> Self {
        Self {
            title: candidate.title,
            url: candidate.url,
            categories: candidate.categories,
            synopsis,
        }
    }
}

/// One persisted story row, keyed by URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub url: String,
    pub title: String,
    pub synopsis: String,
    pub categories: Vec<String>,
    pub last_scraped_at: DateTime<Utc>,
}
