use scraper::{Html, Selector};

use crate::sources::{normalize_text, SourceError};

const SCHOLAR_URL: &str = "https://scholar.google.com/scholar";
const PROXY_URL: &str = "http://api.scraperapi.com/";

/// Abstract lookup for bibliography entries that carry none. Scholar blocks
/// direct scraping, so every request goes through a ScraperAPI proxy keyed by
/// the caller; the upstream is rate limited and callers get exactly one
/// attempt per title.
pub struct ScholarClient {
    client: reqwest::Client,
    api_key: String,
}

impl ScholarClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("bibgather/0.1")
                .build()
                .unwrap(),
            api_key,
        }
    }

    /// Search scholar for a title and return the first result's abstract
    /// snippet, whitespace-normalized.
    pub async fn search_abstract(&self, title: &str) -> Result<String, SourceError> {
        let target = reqwest::Url::parse_with_params(SCHOLAR_URL, [("q", title)])
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        let html = self
            .client
            .get(PROXY_URL)
            .query(&[("api_key", self.api_key.as_str()), ("url", target.as_str())])
            .send()
            .await?
            .text()
            .await?;
        first_result_snippet(&html)
            .map(|s| normalize_text(&s))
            .ok_or_else(|| SourceError::Parse(format!("no scholar result for '{}'", title)))
    }
}

fn first_result_snippet(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let snippet = Selector::parse(".gs_ri .gs_rs").ok()?;
    document
        .select(&snippet)
        .next()
        .map(|el| el.text().collect::<String>())
}
