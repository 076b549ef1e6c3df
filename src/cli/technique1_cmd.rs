//! `lurebench technique1` — perturbation robustness over a corpus sample.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::corpus::read_corpus;
use crate::eval::{technique1, EvalOptions};
use crate::oracle::Oracle;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use crate::store::ArtifactStore;

/// Run the technique1 command.
pub async fn run(data_dir: &Path, options: EvalOptions) -> Result<()> {
    let store = ArtifactStore::open(data_dir)?;
    let corpus = read_corpus(&super::corpus_path(data_dir))
        .context("no corpus found; run 'lurebench build' first")?;
    let oracle = Oracle::from_model_file(&super::model_path(data_dir));

    let renderer: Arc<dyn Renderer> = Arc::new(
        ChromiumRenderer::new()
            .await
            .context("failed to launch Chromium (run with a local Chrome/Chromium installed)")?,
    );
    let results = technique1::run(renderer.clone(), &store, &oracle, &corpus, &options).await;
    let _ = renderer.shutdown().await;
    let results = results?;

    let path = data_dir.join("technique1_results.csv");
    technique1::write_results(&path, &results)?;
    println!("Results written to {} ({} rows)", path.display(), results.len());

    match technique1::evaluate(&results) {
        Some(m) => {
            println!("  baseline F1:  {:.3}", m.baseline_f1);
            println!("  perturbed F1: {:.3}", m.perturbed_f1);
        }
        None => println!("  no pages scored; nothing to evaluate"),
    }
    if !oracle.has_model() {
        println!("  (no trained model: predictions were random baselines)");
    }
    Ok(())
}
