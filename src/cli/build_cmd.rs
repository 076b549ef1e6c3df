//! `lurebench build` — aggregate feeds, validate liveness, write the corpus.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::corpus::feeds::{default_legitimate_feed, default_phishing_feeds, Aggregator};
use crate::corpus::validator::{self, ValidatorConfig};
use crate::corpus::{write_corpus, LabeledUrl, UrlClass};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use crate::store::{ArtifactKind, ArtifactStore, Variant};

pub struct BuildOptions {
    pub phish_quota: usize,
    pub legit_quota: usize,
    pub concurrency: usize,
    pub timeout_ms: u64,
    pub min_html_len: usize,
}

/// Run the build command.
pub async fn run(data_dir: &Path, options: BuildOptions) -> Result<()> {
    let store = ArtifactStore::open(data_dir)?;

    let mut feeds = default_phishing_feeds();
    feeds.push(default_legitimate_feed());
    let candidates = Aggregator::new(options.timeout_ms).aggregate(&feeds).await;
    info!("aggregated {} candidate URLs", candidates.len());

    let phish: Vec<String> = candidates
        .iter()
        .filter(|c| c.class == UrlClass::Phishing)
        .map(|c| c.url.clone())
        .collect();
    let legit: Vec<String> = candidates
        .iter()
        .filter(|c| c.class == UrlClass::Legitimate)
        .map(|c| c.url.clone())
        .collect();

    let renderer: Arc<dyn Renderer> = Arc::new(
        ChromiumRenderer::new()
            .await
            .context("failed to launch Chromium (run with a local Chrome/Chromium installed)")?,
    );

    let mut rows = Vec::new();
    for (urls, quota, class) in [
        (phish, options.phish_quota, UrlClass::Phishing),
        (legit, options.legit_quota, UrlClass::Legitimate),
    ] {
        let config = ValidatorConfig {
            quota,
            concurrency: options.concurrency,
            timeout_ms: options.timeout_ms,
            min_html_len: options.min_html_len,
            show_progress: true,
        };
        println!("Validating {} candidates (quota {quota})...", urls.len());
        let accepted = validator::validate(Arc::clone(&renderer), urls, &config).await;
        for page in &accepted {
            store.put(&page.url, ArtifactKind::Html, Variant::Original, page.html.as_bytes())?;
        }
        rows.extend(accepted.into_iter().map(|page| LabeledUrl {
            url: page.url,
            class,
        }));
    }
    let _ = renderer.shutdown().await;

    let corpus = super::corpus_path(data_dir);
    write_corpus(&corpus, &rows)?;

    let phish_n = rows.iter().filter(|r| r.class == UrlClass::Phishing).count();
    println!(
        "Corpus written to {}: {} rows ({} phish, {} legit)",
        corpus.display(),
        rows.len(),
        phish_n,
        rows.len() - phish_n
    );
    Ok(())
}
