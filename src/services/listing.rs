use scraper::{Html, Selector};
use url::Url;

use crate::models::StoryCandidate;
use crate::services::provider::Fragment;

/// Selector sent to the provider for a category index page; each table row
/// is one story entry.
pub const INDEX_ROW_SELECTOR: &str = "tr";

// Links into author or tag listings appear in the same rows as stories and
// must not be treated as story pages.
const SKIPPED_PATH_SEGMENTS: [&str; 2] = ["/Authors/", "/Tags/"];

/// Parse index-page fragments into candidate stories. Malformed fragments
/// are logged and skipped; one bad row never aborts the rest of the page.
pub fn parse_listing(fragments: &[Fragment], base_url: &Url) -> Vec<StoryCandidate> {
    let anchor_selector = Selector::parse("a").unwrap();
    let cite_selector = Selector::parse("cite").unwrap();

    let mut candidates = Vec::new();
    for fragment in fragments {
        match parse_fragment(fragment, base_url, &anchor_selector, &cite_selector) {
            Some(candidate) => candidates.push(candidate),
            None => tracing::debug!("Skipping listing row without a usable story link"),
        }
    }
    candidates
}

fn parse_fragment(
    fragment: &Fragment,
    base_url: &Url,
    anchor_selector: &Selector,
    cite_selector: &Selector,
) -> Option<StoryCandidate> {
    let document = Html::parse_fragment(&fragment.html);
    let anchor = document.select(anchor_selector).next()?;

    // Prefer the <cite> sub-element for the title; fall back to the anchor text
    let title = anchor
        .select(cite_selector)
        .next()
        .map(|cite| cite.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| anchor.text().collect::<String>().trim().to_string());
    if title.is_empty() {
        return None;
    }

    let href = anchor.value().attr("href")?;
    let url = match base_url.join(href) {
        Ok(resolved) => resolved.to_string(),
        Err(e) => {
            tracing::warn!("Skipping story '{}' with unresolvable href {}: {}", title, href, e);
            return None;
        }
    };
    if SKIPPED_PATH_SEGMENTS.iter().any(|segment| url.contains(segment)) {
        return None;
    }

    // Index rows carry "title<TAB>tag tag tag" in their plain text
    let categories = fragment
        .text
        .split('\t')
        .nth(1)
        .map(|field| {
            field
                .split_whitespace()
                .map(|tag| tag.to_lowercase())
                .collect()
        })
        .unwrap_or_default();

    Some(StoryCandidate {
        title,
        url,
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/Categories/scifi").unwrap()
    }

    fn fragment(html: &str, text: &str) -> Fragment {
        Fragment {
            html: html.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn parses_title_url_and_categories() {
        let fragments = [fragment(
            r#"<tr><td><a href="/Stories/42"><cite>The Long Orbit</cite></a></td></tr>"#,
            "The Long Orbit\tSciFi SPACE drama",
        )];

        let candidates = parse_listing(&fragments, &base());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "The Long Orbit");
        assert_eq!(candidates[0].url, "https://example.com/Stories/42");
        assert_eq!(candidates[0].categories, vec!["scifi", "space", "drama"]);
    }

    #[test]
    fn falls_back_to_anchor_text_without_cite() {
        let fragments = [fragment(
            r#"<tr><td><a href="/Stories/7">Plain Title</a></td></tr>"#,
            "Plain Title",
        )];

        let candidates = parse_listing(&fragments, &base());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Plain Title");
        assert!(candidates[0].categories.is_empty());
    }

    #[test]
    fn bad_fragment_does_not_abort_the_rest() {
        let fragments = [
            fragment(r#"<tr><td><a href="/Stories/1">One</a></td></tr>"#, "One"),
            fragment(r#"<tr><td><a href="/Stories/2">Two</a></td></tr>"#, "Two"),
            fragment(r#"<tr><td>no anchor here</td></tr>"#, "nothing"),
            fragment(r#"<tr><td><a href="/Stories/4">Four</a></td></tr>"#, "Four"),
            fragment(r#"<tr><td><a href="/Stories/5">Five</a></td></tr>"#, "Five"),
        ];

        let candidates = parse_listing(&fragments, &base());
        assert_eq!(candidates.len(), 4);
    }

    #[test]
    fn skips_author_and_tag_listing_links() {
        let fragments = [
            fragment(r#"<tr><td><a href="/Authors/jdoe">J. Doe</a></td></tr>"#, "J. Doe"),
            fragment(r#"<tr><td><a href="/Tags/space">space</a></td></tr>"#, "space"),
            fragment(r#"<tr><td><a href="/Stories/9">Real Story</a></td></tr>"#, "Real Story"),
        ];

        let candidates = parse_listing(&fragments, &base());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Real Story");
    }

    #[test]
    fn skips_anchor_without_title() {
        let fragments = [fragment(r#"<tr><td><a href="/Stories/3"></a></td></tr>"#, "")];
        assert!(parse_listing(&fragments, &base()).is_empty());
    }

    #[test]
    fn resolves_relative_and_absolute_hrefs() {
        let fragments = [
            fragment(r#"<tr><a href="../Stories/1">Rel</a></tr>"#, "Rel"),
            fragment(
                r#"<tr><a href="https://other.example.com/Stories/2">Abs</a></tr>"#,
                "Abs",
            ),
        ];

        let candidates = parse_listing(&fragments, &base());
        assert_eq!(candidates[0].url, "https://example.com/Stories/1");
        assert_eq!(candidates[1].url, "https://other.example.com/Stories/2");
    }
}
