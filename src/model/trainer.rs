//! Batch model training from stored HTML artifacts.
//!
//! Rediscovers training examples purely from the corpus file: for each
//! labeled URL the artifact key is recomputed and every stored HTML variant
//! found under that key contributes one example with the URL's label. No
//! index of stored files is kept anywhere else.

use tracing::{debug, info, warn};

use crate::corpus::LabeledUrl;
use crate::eval::metrics;
use crate::extraction;
use crate::model::forest::{ForestConfig, RandomForest};
use crate::model::vectorizer::TfIdfVectorizer;
use crate::model::{ModelError, TextModel, MODEL_FORMAT_VERSION};
use crate::store::{key_for, ArtifactKind, ArtifactStore, StoreError, Variant};

/// Minimum number of usable examples before a training run proceeds.
pub const MIN_EXAMPLES: usize = 20;

/// Minimum cleaned-text length for an artifact to count as an example.
pub const MIN_TEXT_LEN: usize = 80;

/// Vocabulary cap for the vectorizer.
pub const MAX_FEATURES: usize = 5000;

/// Training-set diagnostics. Not a held-out estimate — reported for
/// visibility only.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub examples: usize,
    pub accuracy: f64,
    pub f1: f64,
}

/// Fit a model from every stored HTML variant of the labeled corpus.
///
/// Aborts with [`ModelError::InsufficientTrainingData`] below
/// [`MIN_EXAMPLES`] usable examples; an existing model file is untouched in
/// that case.
pub fn train(
    store: &ArtifactStore,
    corpus: &[LabeledUrl],
) -> Result<(TextModel, TrainReport), ModelError> {
    let (texts, labels) = collect_examples(store, corpus);
    info!("collected {} usable training examples", texts.len());

    if texts.len() < MIN_EXAMPLES {
        return Err(ModelError::InsufficientTrainingData {
            found: texts.len(),
            required: MIN_EXAMPLES,
        });
    }

    let vectorizer = TfIdfVectorizer::fit(&texts, MAX_FEATURES);
    debug!("fitted vocabulary of {} terms", vectorizer.n_features());

    let samples: Vec<Vec<f32>> = texts.iter().map(|t| vectorizer.transform(t)).collect();
    let forest = RandomForest::fit(&samples, &labels, ForestConfig::default());

    let predictions: Vec<u8> = samples.iter().map(|x| forest.predict(x)).collect();
    let report = TrainReport {
        examples: texts.len(),
        accuracy: metrics::accuracy(&labels, &predictions),
        f1: metrics::f1_score(&labels, &predictions),
    };
    info!(
        "training-set accuracy {:.3}, F1 {:.3} (diagnostic only, not held out)",
        report.accuracy, report.f1
    );

    let model = TextModel {
        format_version: MODEL_FORMAT_VERSION,
        trained_at: chrono::Utc::now(),
        trained_on: report.examples,
        vectorizer,
        forest,
    };
    Ok((model, report))
}

/// Pair every stored HTML variant with its URL's label.
fn collect_examples(store: &ArtifactStore, corpus: &[LabeledUrl]) -> (Vec<String>, Vec<u8>) {
    let mut texts = Vec::new();
    let mut labels = Vec::new();

    for row in corpus {
        let key = key_for(&row.url);
        for variant in Variant::HTML_SCAN {
            let bytes = match store.get(&key, ArtifactKind::Html, variant) {
                Ok(bytes) => bytes,
                Err(StoreError::NotFound { .. }) => continue,
                Err(e) => {
                    warn!("skipping unreadable artifact for {}: {e}", row.url);
                    continue;
                }
            };

            let text = extraction::visible_text(&String::from_utf8_lossy(&bytes));
            if text.len() < MIN_TEXT_LEN {
                continue;
            }

            texts.push(text);
            labels.push(row.class.as_target());
        }
    }

    (texts, labels)
}
