use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod bibtex;
mod collector;
mod config;
mod scholar;
mod sources;

use collector::References;
use config::Config;

/// Collect related-work references for a paper draft and render them to a
/// BibTeX file plus a citation prompt set.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Keyword requests as "keyword=count", e.g. "graph neural networks=5"
    #[arg(required = true)]
    keywords: Vec<String>,
    /// Search backend: "arxiv" or "ss"
    #[arg(short, long, default_value = "arxiv")]
    method: String,
    /// Prefer short auto-summaries over full abstracts (Semantic Scholar only)
    #[arg(long)]
    tldr: bool,
    /// Existing BibTeX file to seed the collection from
    #[arg(short, long)]
    load: Option<PathBuf>,
    /// Output BibTeX path
    #[arg(short, long, default_value = "ref.bib")]
    bibtex: PathBuf,
    /// Write the paper_id -> abstract prompt mapping as JSON
    #[arg(short, long)]
    prompts: Option<PathBuf>,
}

/// Split a "keyword=count" request into its parts.
fn parse_request(raw: &str) -> anyhow::Result<(String, u32)> {
    let (keyword, count) = raw
        .rsplit_once('=')
        .with_context(|| format!("expected \"keyword=count\", got '{}'", raw))?;
    let keyword = keyword.trim();
    anyhow::ensure!(!keyword.is_empty(), "empty keyword in '{}'", raw);
    let count = count
        .trim()
        .parse()
        .with_context(|| format!("invalid count in '{}'", raw))?;
    Ok((keyword.to_string(), count))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let requests = args
        .keywords
        .iter()
        .map(|raw| parse_request(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let config = Config::from_env();
    let scholar = config.build_scholar();
    let mut references = References::new(config.build_sources());

    if let Some(path) = &args.load {
        references
            .load_bibtex(path, scholar.as_ref())
            .await
            .with_context(|| format!("failed to load {}", path.display()))?;
        tracing::info!(
            papers = references.papers().len(),
            "seeded collection from {}",
            path.display()
        );
    }

    references
        .collect_papers(&requests, &args.method, args.tldr)
        .await?;

    let paper_ids = references
        .to_bibtex(&args.bibtex)
        .with_context(|| format!("failed to write {}", args.bibtex.display()))?;
    tracing::info!(
        papers = paper_ids.len(),
        "references saved to {}",
        args.bibtex.display()
    );

    if let Some(path) = &args.prompts {
        let json = serde_json::to_string_pretty(&references.to_prompts())?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("citation prompts saved to {}", path.display());
    }

    Ok(())
}
