//! Technique 2: variant scoring and similarity-drop measurement.
//!
//! Renders each sampled URL, stores it as a distinct variant with its own
//! screenshot, scores it through the oracle, and records a scalar drop
//! from the similarity collaborator.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::corpus::LabeledUrl;
use crate::eval::{sample_corpus, EvalOptions, SimilarityScorer};
use crate::oracle::Oracle;
use crate::renderer::{RenderContext, Renderer};
use crate::store::{ArtifactKind, ArtifactStore, Variant};

/// Sampling seed; distinct from technique 1 so the techniques cover
/// different slices of the corpus.
const SAMPLE_SEED: u64 = 123;

/// One scored variant.
#[derive(Debug, Clone)]
pub struct T2Result {
    pub url: String,
    pub label: u8,
    pub probability: f64,
    pub prediction: u8,
    pub drop: f64,
}

/// Run technique 2 over a seeded sample of the corpus.
pub async fn run(
    renderer: Arc<dyn Renderer>,
    store: &ArtifactStore,
    oracle: &Oracle,
    scorer: &dyn SimilarityScorer,
    corpus: &[LabeledUrl],
    options: &EvalOptions,
) -> Result<Vec<T2Result>> {
    let sample = sample_corpus(corpus, options.n_samples, SAMPLE_SEED);
    info!("technique 2 running on {} URLs", sample.len());

    let mut context = renderer
        .new_context()
        .await
        .context("failed to open a render context")?;

    let mut results = Vec::new();
    for row in &sample {
        match score_one(context.as_mut(), store, oracle, scorer, row, options).await {
            Ok(result) => results.push(result),
            Err(e) => warn!("[t2] {} failed: {e:#}", row.url),
        }
    }
    let _ = context.close().await;

    if results.is_empty() {
        info!("technique 2 produced no results");
    }
    Ok(results)
}

async fn score_one(
    context: &mut dyn RenderContext,
    store: &ArtifactStore,
    oracle: &Oracle,
    scorer: &dyn SimilarityScorer,
    row: &LabeledUrl,
    options: &EvalOptions,
) -> Result<T2Result> {
    info!("[t2] {}", row.url);
    context.navigate(&row.url, options.timeout_ms).await?;
    if options.settle_ms > 0 {
        tokio::time::sleep(Duration::from_millis(options.settle_ms)).await;
    }
    let html = context.html().await?;

    let key = store.put(&row.url, ArtifactKind::Html, Variant::Technique2, html.as_bytes())?;
    let png = context.screenshot(true).await?;
    store.put(&row.url, ArtifactKind::Screenshot, Variant::Technique2, &png)?;

    let prediction =
        oracle.predict_file(&store.path_for(&key, ArtifactKind::Html, Variant::Technique2));
    let drop = scorer.similarity_drop(&html, &png);

    Ok(T2Result {
        url: row.url.clone(),
        label: row.class.as_target(),
        probability: prediction.probability,
        prediction: prediction.class(),
        drop,
    })
}

/// Mean similarity drop across the run. None on an empty run.
pub fn average_drop(results: &[T2Result]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    Some(results.iter().map(|r| r.drop).sum::<f64>() / results.len() as f64)
}

/// Write the run's output table.
pub fn write_results(path: &Path, results: &[T2Result]) -> Result<()> {
    let mut out = String::from("url,label,probability,prediction,drop\n");
    for r in results {
        out.push_str(&format!(
            "{},{},{:.6},{},{:.6}\n",
            crate::corpus::csv_field(&r.url),
            r.label,
            r.probability,
            r.prediction,
            r.drop
        ));
    }
    std::fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))
}
