use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use scraper::{Html, Selector};

const USER_AGENT_STRING: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Minimum length for extracted text to count as an article body.
const MIN_BODY_CHARS: usize = 80;

/// Whole-page text picks up nav and menu strings, so the bar is higher.
const MIN_WHOLE_PAGE_CHARS: usize = 120;

/// Selectors that commonly wrap article bodies, tried in order.
const BODY_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=main]",
    ".articleBody",
    ".article",
    "#main",
];

/// Best-effort article body extraction. Never fails; any network or parse
/// problem yields an empty string so one flaky site cannot abort a batch.
#[async_trait]
pub trait FetchArticleBody: Send + Sync {
    async fn fetch(&self, url: &str) -> String;
}

pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    async fn download(&self, url: &str, timeout: Option<Duration>) -> Option<String> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));

        let mut request = self.client.get(url).headers(headers);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Failed to fetch {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Failed to fetch {}: {}", url, response.status());
            return None;
        }

        match response.text().await {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::debug!("Failed to read body of {}: {}", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl FetchArticleBody for ContentFetcher {
    async fn fetch(&self, url: &str) -> String {
        // Primary strategy: plain-text conversion of the whole page.
        if let Some(html) = self.download(url, None).await {
            if let Some(text) = extract_readable(&html) {
                return text;
            }
        }

        // Fallback strategy: re-fetch with a short timeout and walk the
        // usual article container selectors.
        if let Some(html) = self.download(url, Some(Duration::from_secs(10))).await {
            if let Some(text) = extract_with_selectors(&html) {
                return text;
            }
        }

        String::new()
    }
}

impl Default for ContentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert HTML to plain text with html2text and clean up whitespace.
fn extract_readable(html: &str) -> Option<String> {
    let text = match html2text::from_read(html.as_bytes(), 80) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!("Failed to convert HTML to text: {}", e);
            return None;
        }
    };

    let cleaned: String = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.chars().count() > MIN_BODY_CHARS {
        Some(cleaned)
    } else {
        tracing::debug!("Extracted content too short ({} chars)", cleaned.len());
        None
    }
}

/// Try the common article container selectors, then the whole page.
fn extract_with_selectors(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for sel in BODY_SELECTORS {
        let selector = match Selector::parse(sel) {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Some(element) = document.select(&selector).next() {
            let text = normalize(element.text());
            if text.chars().count() > MIN_BODY_CHARS {
                return Some(text);
            }
        }
    }

    // Last resort for sites none of the selectors match.
    let text = normalize(document.root_element().text());
    if text.chars().count() > MIN_WHOLE_PAGE_CHARS {
        Some(text)
    } else {
        None
    }
}

fn normalize<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(|p| p.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_PARAGRAPH: &str = "The Bank of Japan held its policy rate steady on Friday \
        while trimming its economic outlook, citing weaker exports and slowing factory output \
        across the country.";

    #[test]
    fn readable_extraction_accepts_long_text() {
        let html = format!("<html><body><p>{LONG_PARAGRAPH}</p></body></html>");
        let text = extract_readable(&html).unwrap();
        assert!(text.contains("Bank of Japan"));
    }

    #[test]
    fn readable_extraction_rejects_short_text() {
        let html = "<html><body><p>Too short.</p></body></html>";
        assert_eq!(extract_readable(html), None);
    }

    #[test]
    fn selector_fallback_finds_article_element() {
        let html = format!(
            "<html><body><nav>Menu</nav><article><p>{LONG_PARAGRAPH}</p></article></body></html>"
        );
        let text = extract_with_selectors(&html).unwrap();
        assert!(text.starts_with("The Bank of Japan"));
        assert!(!text.contains("Menu"));
    }

    #[test]
    fn selector_fallback_uses_whole_page_as_last_resort() {
        let html = format!("<html><body><div class=\"content\">{LONG_PARAGRAPH} {LONG_PARAGRAPH}</div></body></html>");
        let text = extract_with_selectors(&html).unwrap();
        assert!(text.contains("Bank of Japan"));
    }

    #[test]
    fn selector_fallback_gives_up_on_empty_page() {
        assert_eq!(extract_with_selectors("<html><body></body></html>"), None);
    }
}
