use std::sync::Arc;

use crate::scholar::ScholarClient;
use crate::sources::{self, PaperSource};

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub semantic_scholar_api_key: Option<String>,
    pub scraperapi_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            semantic_scholar_api_key: std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
            scraperapi_key: std::env::var("SCRAPERAPI_KEY").ok(),
        }
    }

    /// Build the search backends `collect_papers` dispatches over.
    pub fn build_sources(&self) -> Vec<Arc<dyn PaperSource>> {
        vec![
            Arc::new(sources::arxiv::ArxivClient::new()),
            Arc::new(sources::semantic_scholar::SemanticScholarClient::new(
                self.semantic_scholar_api_key.clone(),
            )),
        ]
    }

    /// Build the scholar lookup used to fill abstracts missing from loaded
    /// bibliographies, if the proxy is configured.
    pub fn build_scholar(&self) -> Option<ScholarClient> {
        match &self.scraperapi_key {
            Some(key) => Some(ScholarClient::new(key.clone())),
            None => {
                tracing::warn!("abstract lookup disabled: SCRAPERAPI_KEY not set");
                None
            }
        }
    }
}
