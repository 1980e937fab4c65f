use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::bibtex::{self, BibtexError};
use crate::scholar::ScholarClient;
use crate::sources::{Paper, PaperSource, SourceError};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("unsupported reference source '{0}', expected \"arxiv\" or \"ss\"")]
    UnsupportedMethod(String),
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Accumulates papers across bibliography loads and keyword queries, keyed by
/// `paper_id`: first-seen record wins, collection order is preserved.
pub struct References {
    sources: Vec<Arc<dyn PaperSource>>,
    papers: Vec<Paper>,
}

impl References {
    pub fn new(sources: Vec<Arc<dyn PaperSource>>) -> Self {
        Self {
            sources,
            papers: Vec::new(),
        }
    }

    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    /// Seed the collection from an existing BibTeX file.
    pub async fn load_bibtex(
        &mut self,
        path: &Path,
        scholar: Option<&ScholarClient>,
    ) -> Result<(), BibtexError> {
        let loaded = bibtex::load_papers(path, scholar).await?;
        self.papers.extend(loaded);
        self.dedup();
        Ok(())
    }

    /// Query one search backend for every `(keyword, count)` request in
    /// order. The method must name a configured source; an unknown method
    /// fails before anything is collected.
    pub async fn collect_papers(
        &mut self,
        requests: &[(String, u32)],
        method: &str,
        want_short_summary: bool,
    ) -> Result<(), CollectError> {
        let source = self
            .sources
            .iter()
            .find(|s| s.name() == method)
            .cloned()
            .ok_or_else(|| CollectError::UnsupportedMethod(method.to_string()))?;

        for (keyword, count) in requests {
            tracing::info!(keyword = %keyword, count, source = source.name(), "collecting");
            let found = source.collect(keyword, *count, want_short_summary).await?;
            self.papers.extend(found);
        }
        self.dedup();
        Ok(())
    }

    fn dedup(&mut self) {
        let mut seen = HashSet::new();
        self.papers.retain(|p| seen.insert(p.paper_id.clone()));
    }

    /// Render the collection to a BibTeX file, one `@article` stanza per
    /// paper in collection order. Returns the ordered id list so callers can
    /// validate generated citations against it.
    pub fn to_bibtex(&self, path: &Path) -> std::io::Result<Vec<String>> {
        let mut file = std::fs::File::create(path)?;
        let mut paper_ids = Vec::with_capacity(self.papers.len());
        for paper in &self.papers {
            writeln!(file, "@article{{{},", paper.paper_id)?;
            writeln!(file, "  title = {{{}}},", paper.title)?;
            writeln!(file, "  author = {{{}}},", paper.authors)?;
            writeln!(file, "  journal = {{{}}},", paper.journal)?;
            writeln!(file, "  year = {{{}}},", paper.year)?;
            writeln!(file, "  url = {{{}}}", paper.link)?;
            writeln!(file, "}}")?;
            writeln!(file)?;
            paper_ids.push(paper.paper_id.clone());
        }
        Ok(paper_ids)
    }

    /// Prompt mapping `paper_id -> abstract`, used to steer the generator
    /// toward entries it is allowed to cite.
    pub fn to_prompts(&self) -> HashMap<String, String> {
        self.papers
            .iter()
            .map(|p| (p.paper_id.clone(), p.abstract_text.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn paper(id: &str, title: &str) -> Paper {
        Paper {
            paper_id: id.to_string(),
            title: title.to_string(),
            authors: "Jane Mary Doe and Bob Roe".to_string(),
            year: "2020".to_string(),
            link: String::new(),
            abstract_text: format!("Abstract of {}.", title),
            journal: "Journal of Tests".to_string(),
        }
    }

    struct StubSource {
        name: &'static str,
        papers: Vec<Paper>,
    }

    #[async_trait]
    impl PaperSource for StubSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn collect(
            &self,
            _keyword: &str,
            count: u32,
            _want_short_summary: bool,
        ) -> Result<Vec<Paper>, SourceError> {
            Ok(self.papers.iter().take(count as usize).cloned().collect())
        }
    }

    fn stub_references(papers: Vec<Paper>) -> References {
        References::new(vec![Arc::new(StubSource {
            name: "arxiv",
            papers,
        })])
    }

    #[tokio::test]
    async fn dedup_keeps_first_occurrence_in_order() {
        let mut refs = stub_references(vec![
            paper("a", "First"),
            paper("b", "Second"),
            paper("a", "First again"),
        ]);
        refs.collect_papers(&[("graphs".into(), 3), ("nets".into(), 3)], "arxiv", false)
            .await
            .unwrap();

        let ids: Vec<_> = refs.papers().iter().map(|p| p.paper_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(refs.papers()[0].title, "First");
    }

    #[tokio::test]
    async fn unsupported_method_leaves_collection_untouched() {
        let mut refs = stub_references(vec![paper("a", "First")]);
        refs.collect_papers(&[("graphs".into(), 1)], "arxiv", false)
            .await
            .unwrap();

        let err = refs
            .collect_papers(&[("nets".into(), 1)], "google", false)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::UnsupportedMethod(_)));
        assert_eq!(refs.papers().len(), 1);
    }

    #[tokio::test]
    async fn prompts_cover_every_collected_id() {
        let mut refs = stub_references(vec![paper("a", "First"), paper("b", "Second")]);
        refs.collect_papers(&[("graphs".into(), 2)], "arxiv", false)
            .await
            .unwrap();

        let prompts = refs.to_prompts();
        assert_eq!(prompts.len(), refs.papers().len());
        for p in refs.papers() {
            assert_eq!(prompts.get(&p.paper_id), Some(&p.abstract_text));
        }
    }

    #[tokio::test]
    async fn bibtex_round_trips_through_the_loader() {
        let refs = References {
            sources: Vec::new(),
            papers: vec![paper("doe2020first", "First Paper"), paper("doe2020second", "Second Paper")],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.bib");
        let ids = refs.to_bibtex(&path).unwrap();
        assert_eq!(ids, ["doe2020first", "doe2020second"]);

        let loaded = bibtex::load_papers(&path, None).await.unwrap();
        assert_eq!(loaded.len(), refs.papers().len());
        for (written, read) in refs.papers().iter().zip(&loaded) {
            assert_eq!(written.paper_id, read.paper_id);
            assert_eq!(written.title, read.title);
            assert_eq!(written.year, read.year);
            assert_eq!(written.journal, read.journal);
        }
    }

    #[tokio::test]
    async fn to_bibtex_truncates_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.bib");

        let refs = References {
            sources: Vec::new(),
            papers: vec![paper("a", "First"), paper("b", "Second")],
        };
        refs.to_bibtex(&path).unwrap();

        let refs = References {
            sources: Vec::new(),
            papers: vec![paper("c", "Third")],
        };
        refs.to_bibtex(&path).unwrap();

        let loaded = bibtex::load_papers(&path, None).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].paper_id, "c");
    }
}
