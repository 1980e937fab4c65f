use super::{normalize_text, Paper, PaperSource, SourceError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

const BASE_URL: &str = "https://api.semanticscholar.org/graph/v1/paper/search";
const FIELDS: &str = "title,abstract,venue,year,authors,tldr,externalIds";

static FIRST_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+").unwrap());

pub struct SemanticScholarClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl SemanticScholarClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("bibgather/0.1")
                .build()
                .unwrap(),
            api_key,
        }
    }

    fn add_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("x-api-key", key),
            None => req,
        }
    }
}

#[derive(Deserialize)]
struct S2SearchResponse {
    data: Option<Vec<S2Paper>>,
}

#[derive(Deserialize)]
struct S2Paper {
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    venue: Option<String>,
    year: Option<u32>,
    authors: Option<Vec<S2Author>>,
    tldr: Option<S2Tldr>,
    #[serde(rename = "externalIds")]
    external_ids: Option<S2ExternalIds>,
}

#[derive(Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Deserialize)]
struct S2Tldr {
    text: Option<String>,
}

#[derive(Deserialize)]
struct S2ExternalIds {
    #[serde(rename = "DBLP")]
    dblp: Option<String>,
    #[serde(rename = "ArXiv")]
    arxiv: Option<String>,
}

#[async_trait]
impl PaperSource for SemanticScholarClient {
    fn name(&self) -> &str {
        "ss"
    }

    async fn collect(
        &self,
        keyword: &str,
        count: u32,
        want_short_summary: bool,
    ) -> Result<Vec<Paper>, SourceError> {
        let query = keyword.to_lowercase();
        let limit = count.min(100).to_string();
        let resp: S2SearchResponse = self
            .add_auth(self.client.get(BASE_URL).query(&[
                ("query", query.as_str()),
                ("limit", limit.as_str()),
                ("fields", FIELDS),
            ]))
            .send()
            .await?
            .json()
            .await?;
        Ok(resp
            .data
            .unwrap_or_default()
            .iter()
            .filter_map(|p| s2_to_paper(p, want_short_summary))
            .collect())
    }
}

/// Entries with a null abstract are dropped; every other missing field gets a
/// per-field fallback instead.
fn s2_to_paper(p: &S2Paper, want_short_summary: bool) -> Option<Paper> {
    let abstract_raw = p.abstract_text.as_deref()?;

    let title = p.title.clone().unwrap_or_default();
    let (authors, last_name) = author_info(p.authors.as_deref().unwrap_or_default());
    let year = p.year.map(|y| y.to_string()).unwrap_or_default();
    // Venues may contain &, e.g. "IEEE Power & Energy Society General Meeting"
    let journal = match p.venue.as_deref() {
        Some(v) if !v.is_empty() => v.replace('&', "\\&"),
        _ => "arXiv preprint".to_string(),
    };
    let abstract_text = match &p.tldr {
        Some(S2Tldr { text: Some(t) }) if want_short_summary => t.clone(),
        _ => normalize_text(abstract_raw),
    };

    Some(Paper {
        paper_id: derive_paper_id(&last_name, &year, &title),
        title,
        authors,
        year,
        link: external_link(p.external_ids.as_ref()),
        abstract_text,
        journal,
    })
}

/// Joined "A and B" author string plus the first author's last name; a paper
/// without authors gets the "ma" placeholder.
fn author_info(authors: &[S2Author]) -> (String, String) {
    let names: Vec<&str> = authors.iter().filter_map(|a| a.name.as_deref()).collect();
    let last_name = names
        .first()
        .and_then(|n| n.split_whitespace().last())
        .unwrap_or("ma")
        .to_string();
    (names.join(" and "), last_name)
}

/// lowercase(last_name + year + first word of the title); titles that do not
/// open with a word character fall back to their first four characters.
fn derive_paper_id(last_name: &str, year: &str, title: &str) -> String {
    let first_word = FIRST_WORD_RE
        .find(title)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| title.chars().take(4).collect());
    format!("{}{}{}", last_name, year, first_word).to_lowercase()
}

/// DBLP is preferred over arXiv; anything else yields an empty link.
fn external_link(ids: Option<&S2ExternalIds>) -> String {
    match ids {
        Some(S2ExternalIds { dblp: Some(id), .. }) => format!("dblp.org/rec/{}", id),
        Some(S2ExternalIds {
            arxiv: Some(id), ..
        }) => format!("arxiv.org/abs/{}", id),
        _ => String::new(),
    }
}
