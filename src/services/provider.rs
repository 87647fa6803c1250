use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4/accounts";

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    elements: Vec<ElementSelector<'a>>,
}

#[derive(Debug, Serialize)]
struct ElementSelector<'a> {
    selector: &'a str,
}

// The provider's response shape is loose; everything is optional here and
// coerced into `Fragment` before it leaves this module.
#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    result: Option<Vec<ElementResult>>,
}

#[derive(Debug, Deserialize)]
struct ElementResult {
    #[serde(default)]
    results: Vec<RawFragment>,
}

#[derive(Debug, Deserialize)]
struct RawFragment {
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// One extracted element, in the fixed shape the rest of the pipeline
/// works with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub html: String,
    pub text: String,
}

/// Client for the Cloudflare Browser Rendering scrape endpoint: renders a
/// page and extracts the elements matching each selector.
pub struct RenderClient {
    client: Client,
    endpoint: String,
    api_token: String,
}

impl RenderClient {
    pub fn new(account_id: &str, api_token: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        let endpoint = format!("{}/{}/browser-rendering/scrape", CLOUDFLARE_API_URL, account_id);
        Self {
            client,
            endpoint,
            api_token,
        }
    }

    /// Render `url` and return every fragment matching the selectors, in
    /// order. A non-success status or an empty result set is a hard error;
    /// the caller decides whether that kills the pass or just one story.
    pub async fn scrape(&self, url: &str, selectors: &[&str]) -> Result<Vec<Fragment>> {
        let request = ScrapeRequest {
            url,
            elements: selectors
                .iter()
                .map(|selector| ElementSelector { selector })
                .collect(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "failed to scrape {}: HTTP {}: {}",
                url, status, error_text
            )));
        }

        let parsed: ScrapeResponse = response.json().await?;
        let element_results = match parsed.result {
            Some(results) if !results.is_empty() => results,
            _ => {
                return Err(AppError::Provider(format!(
                    "scrape returned no usable data for {}",
                    url
                )))
            }
        };

        let fragments = element_results
            .into_iter()
            .flat_map(|element| element.results)
            .map(|raw| Fragment {
                html: raw.html.unwrap_or_default(),
                text: raw.text.unwrap_or_default(),
            })
            .collect();

        Ok(fragments)
    }
}
