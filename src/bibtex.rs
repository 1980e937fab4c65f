use std::path::Path;

use thiserror::Error;

use crate::scholar::ScholarClient;
use crate::sources::{normalize_text, Paper, SourceError};

#[derive(Debug, Error)]
pub enum BibtexError {
    #[error("failed to read bibliography: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse bibliography: {0}")]
    Parse(String),
    #[error("abstract lookup failed: {0}")]
    Scholar(#[from] SourceError),
}

/// Load papers from a BibTeX file. Entries without a title are skipped.
/// Entries without an abstract get one scholar lookup when a client is
/// supplied (failures propagate, no retry) and an empty abstract otherwise.
pub async fn load_papers(
    path: &Path,
    scholar: Option<&ScholarClient>,
) -> Result<Vec<Paper>, BibtexError> {
    let content = std::fs::read_to_string(path)?;
    let bibliography =
        biblatex::Bibliography::parse(&content).map_err(|e| BibtexError::Parse(e.to_string()))?;

    let mut papers = Vec::new();
    for entry in bibliography.iter() {
        let title = match entry.title().ok().map(chunks_to_string) {
            Some(t) if !t.is_empty() => t,
            _ => continue,
        };
        let authors = entry
            .author()
            .unwrap_or_default()
            .iter()
            .map(format_person)
            .collect::<Vec<_>>()
            .join(" and ");
        let abstract_text = match field(entry, "abstract") {
            Some(a) => normalize_text(&a),
            None => match scholar {
                Some(client) => client.search_abstract(&title).await?,
                None => String::new(),
            },
        };
        papers.push(Paper {
            paper_id: entry.key.clone(),
            title,
            authors,
            year: field(entry, "year").unwrap_or_default(),
            link: String::new(),
            abstract_text,
            journal: field(entry, "journal").unwrap_or_default(),
        });
    }
    Ok(papers)
}

fn field(entry: &biblatex::Entry, name: &str) -> Option<String> {
    entry
        .get(name)
        .map(chunks_to_string)
        .filter(|v| !v.is_empty())
}

/// Flatten biblatex chunks into plain text.
fn chunks_to_string(chunks: &[biblatex::Spanned<biblatex::Chunk>]) -> String {
    chunks
        .iter()
        .map(|c| match &c.v {
            biblatex::Chunk::Normal(s) => s.as_str(),
            biblatex::Chunk::Verbatim(s) => s.as_str(),
            biblatex::Chunk::Math(s) => s.as_str(),
        })
        .collect::<Vec<_>>()
        .join("")
}

/// "Given Family" name order, matching what the search adapters produce.
fn format_person(p: &biblatex::Person) -> String {
    let mut parts = Vec::new();
    if !p.given_name.is_empty() {
        parts.push(p.given_name.as_str());
    }
    if !p.prefix.is_empty() {
        parts.push(p.prefix.as_str());
    }
    if !p.name.is_empty() {
        parts.push(p.name.as_str());
    }
    if !p.suffix.is_empty() {
        parts.push(p.suffix.as_str());
    }
    parts.join(" ")
}
