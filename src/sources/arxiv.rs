use super::{normalize_text, Paper, PaperSource, SourceError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

const BASE_URL: &str = "http://export.arxiv.org/api/query";

/// Numeric arXiv identifier as it appears in abs links, e.g. "2301.00001".
static ARXIV_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+").unwrap());

pub struct ArxivClient {
    client: reqwest::Client,
}

impl ArxivClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("bibgather/0.1")
                .build()
                .unwrap(),
        }
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    fn name(&self) -> &str {
        "arxiv"
    }

    async fn collect(
        &self,
        keyword: &str,
        count: u32,
        _want_short_summary: bool,
    ) -> Result<Vec<Paper>, SourceError> {
        let url = format!(
            "{}?search_query=all:{}&start=0&max_results={}&sortBy=relevance&sortOrder=descending",
            BASE_URL,
            urlencoded(keyword),
            count
        );
        let body = self.client.get(&url).send().await?.text().await?;
        // Respect rate limit: 1 req / 3s
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        parse_atom_feed(&body)
    }
}

fn urlencoded(s: &str) -> String {
    s.replace(' ', "+").replace(':', "%3A").replace('/', "%2F")
}

fn parse_atom_feed(xml: &str) -> Result<Vec<Paper>, SourceError> {
    let mut reader = Reader::from_str(xml);
    let mut papers = Vec::new();

    let mut in_entry = false;
    let mut in_author = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut summary = String::new();
    let mut link = String::new();
    let mut published = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut author_name = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if tag == "entry" {
                    in_entry = true;
                    title.clear();
                    summary.clear();
                    link.clear();
                    published.clear();
                    authors.clear();
                } else if in_entry {
                    if tag == "author" {
                        in_author = true;
                        author_name.clear();
                    }
                    current_tag = tag;
                }
            }
            Ok(Event::Text(e)) if in_entry => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current_tag.as_str() {
                    "title" => title.push_str(&text),
                    "summary" => summary.push_str(&text),
                    "id" if link.is_empty() => link = text,
                    "published" => published.push_str(&text),
                    "name" if in_author => author_name.push_str(&text),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if tag == "entry" && in_entry {
                    in_entry = false;
                    if let Some(paper) = finish_entry(&title, &summary, &link, &published, &authors)
                    {
                        papers.push(paper);
                    }
                } else if tag == "author" && in_author {
                    in_author = false;
                    if !author_name.trim().is_empty() {
                        authors.push(author_name.trim().to_string());
                    }
                }
                if tag == current_tag {
                    current_tag.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Parse(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    Ok(papers)
}

/// Entries whose abs link carries no numeric identifier (old-style ids like
/// "cs/0603127v1") are skipped.
fn finish_entry(
    title: &str,
    summary: &str,
    link: &str,
    published: &str,
    authors: &[String],
) -> Option<Paper> {
    let arxiv_id = ARXIV_ID_RE.find(link)?.as_str().to_string();
    let year = published.split('-').next().unwrap_or_default().to_string();
    Some(Paper {
        paper_id: arxiv_id.clone(),
        title: normalize_text(title),
        authors: authors.join(" and "),
        year,
        link: link.to_string(),
        abstract_text: normalize_text(summary),
        journal: format!("arXiv preprint arXiv:{}", arxiv_id),
    })
}
