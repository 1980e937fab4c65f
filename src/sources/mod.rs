pub mod arxiv;
pub mod semantic_scholar;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Uniform bibliographic record, regardless of which source produced it.
///
/// `paper_id` doubles as the BibTeX citation key; within one collection it is
/// unique after deduplication, first-seen record winning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub paper_id: String,
    pub title: String,
    /// Formatted "A and B and C".
    pub authors: String,
    pub year: String,
    /// URL or DBLP/arXiv path; may be empty.
    pub link: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Venue name, or "arXiv preprint" when the source has none.
    pub journal: String,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A literature-search backend that turns one keyword query into papers.
#[async_trait]
pub trait PaperSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch up to `count` papers matching `keyword`, trusting the backend's
    /// relevance ordering. `want_short_summary` asks for an auto-generated
    /// short summary in place of the abstract where the backend has one.
    async fn collect(
        &self,
        keyword: &str,
        count: u32,
        want_short_summary: bool,
    ) -> Result<Vec<Paper>, SourceError>;
}

/// Collapse newlines (including literal `\n` escapes) and runs of spaces.
/// Keeps abstracts on one line for prompts and BibTeX fields.
pub fn normalize_text(text: &str) -> String {
    text.replace("\\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_newlines_and_spaces() {
        assert_eq!(
            normalize_text("Deep  learning\nmethods\\nfor   graphs"),
            "Deep learning methods for graphs"
        );
    }

    #[test]
    fn normalize_trims_ends() {
        assert_eq!(normalize_text("  padded abstract \n"), "padded abstract");
    }
}
