//! `lurebench train` — fit the classifier from stored HTML artifacts.

use std::path::Path;

use anyhow::{Context, Result};

use crate::corpus::read_corpus;
use crate::model::trainer;
use crate::store::ArtifactStore;

/// Run the train command.
pub fn run(data_dir: &Path) -> Result<()> {
    let store = ArtifactStore::open(data_dir)?;
    let corpus = read_corpus(&super::corpus_path(data_dir))
        .context("no corpus found; run 'lurebench build' first")?;

    let (model, report) = trainer::train(&store, &corpus)?;

    let path = super::model_path(data_dir);
    model.save(&path)?;

    println!("Model saved to {}", path.display());
    println!("  examples: {}", report.examples);
    println!("  training accuracy: {:.3}", report.accuracy);
    println!("  training F1:       {:.3}", report.f1);
    Ok(())
}
