//! Technique 1: perturbation robustness.
//!
//! For each sampled URL: render once, store the original HTML and a
//! screenshot, score it, then perturb the HTML, store the variant and
//! score that too. The before/after predictions show whether the
//! perturbation flips the classifier's decision.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::corpus::LabeledUrl;
use crate::eval::{metrics, sample_corpus, EvalOptions};
use crate::oracle::Oracle;
use crate::perturb;
use crate::renderer::{RenderContext, Renderer};
use crate::store::{ArtifactKind, ArtifactStore, Variant};

/// Sampling seed; fixed so repeated runs compare the same pages.
const SAMPLE_SEED: u64 = 42;

/// One evaluated URL: baseline and perturbed predictions.
#[derive(Debug, Clone)]
pub struct T1Result {
    pub url: String,
    pub label: u8,
    pub p_base: f64,
    pub y_base: u8,
    pub p_pert: f64,
    pub y_pert: u8,
}

/// Baseline vs perturbed F1 against ground truth.
#[derive(Debug, Clone, Copy)]
pub struct T1Metrics {
    pub baseline_f1: f64,
    pub perturbed_f1: f64,
}

/// Run technique 1 over a seeded sample of the corpus.
///
/// Per-URL failures are logged and skipped; only the inability to open a
/// render context at all aborts the run.
pub async fn run(
    renderer: Arc<dyn Renderer>,
    store: &ArtifactStore,
    oracle: &Oracle,
    corpus: &[LabeledUrl],
    options: &EvalOptions,
) -> Result<Vec<T1Result>> {
    let sample = sample_corpus(corpus, options.n_samples, SAMPLE_SEED);
    info!("technique 1 running on {} URLs", sample.len());

    let mut context = renderer
        .new_context()
        .await
        .context("failed to open a render context")?;

    let mut results = Vec::new();
    for row in &sample {
        match score_one(context.as_mut(), store, oracle, row, options).await {
            Ok(result) => results.push(result),
            Err(e) => warn!("[t1] {} failed: {e:#}", row.url),
        }
    }
    let _ = context.close().await;

    if results.is_empty() {
        info!("technique 1 produced no results");
    }
    Ok(results)
}

async fn score_one(
    context: &mut dyn RenderContext,
    store: &ArtifactStore,
    oracle: &Oracle,
    row: &LabeledUrl,
    options: &EvalOptions,
) -> Result<T1Result> {
    info!("[t1] fetching {}", row.url);
    context.navigate(&row.url, options.timeout_ms).await?;
    if options.settle_ms > 0 {
        tokio::time::sleep(Duration::from_millis(options.settle_ms)).await;
    }
    let html = context.html().await?;

    let key = store.put(&row.url, ArtifactKind::Html, Variant::Original, html.as_bytes())?;

    let png = context.screenshot(true).await?;
    store.put(&row.url, ArtifactKind::Screenshot, Variant::Technique1, &png)?;

    let base = oracle.predict_file(&store.path_for(&key, ArtifactKind::Html, Variant::Original));

    let perturbed = perturb::perturb(&html);
    store.put(&row.url, ArtifactKind::Html, Variant::Perturbed, perturbed.as_bytes())?;
    let pert = oracle.predict_file(&store.path_for(&key, ArtifactKind::Html, Variant::Perturbed));

    Ok(T1Result {
        url: row.url.clone(),
        label: row.class.as_target(),
        p_base: base.probability,
        y_base: base.class(),
        p_pert: pert.probability,
        y_pert: pert.class(),
    })
}

/// Aggregate F1 before and after perturbation. None on an empty run.
pub fn evaluate(results: &[T1Result]) -> Option<T1Metrics> {
    if results.is_empty() {
        return None;
    }
    let truth: Vec<u8> = results.iter().map(|r| r.label).collect();
    let base: Vec<u8> = results.iter().map(|r| r.y_base).collect();
    let pert: Vec<u8> = results.iter().map(|r| r.y_pert).collect();

    Some(T1Metrics {
        baseline_f1: metrics::f1_score(&truth, &base),
        perturbed_f1: metrics::f1_score(&truth, &pert),
    })
}

/// Write the run's output table.
pub fn write_results(path: &Path, results: &[T1Result]) -> Result<()> {
    let mut out = String::from("url,label,p_base,y_base,p_pert,y_pert\n");
    for r in results {
        out.push_str(&format!(
            "{},{},{:.6},{},{:.6},{}\n",
            crate::corpus::csv_field(&r.url),
            r.label,
            r.p_base,
            r.y_base,
            r.p_pert,
            r.y_pert
        ));
    }
    std::fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))
}
