use std::time::Duration;

use tokio::time::sleep;

use crate::services::provider::RenderClient;

/// Selector for the synopsis block on a story's detail page.
const SYNOPSIS_SELECTOR: &str = "section.synopsis";

/// Fetches one story's synopsis at a time, pausing before each request to
/// stay under the render provider's rate limits. Fetches are strictly
/// sequential; there is no concurrent fan-out.
pub struct SynopsisFetcher<'a> {
    provider: &'a RenderClient,
    delay: Duration,
}

impl<'a> SynopsisFetcher<'a> {
    pub fn new(provider: &'a RenderClient, delay: Duration) -> Self {
        Self { provider, delay }
    }

    /// Wait out the delay, then fetch the synopsis for one story page.
    /// Any failure degrades to an empty synopsis so the rest of the
    /// category pass continues.
    pub async fn fetch(&self, url: &str) -> String {
        sleep(self.delay).await;

        match self.provider.scrape(url, &[SYNOPSIS_SELECTOR]).await {
            Ok(fragments) => fragments
                .first()
                .map(|fragment| fragment.text.trim().to_string())
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to fetch synopsis for {}: {}", url, e);
                String::new()
            }
        }
    }
}
