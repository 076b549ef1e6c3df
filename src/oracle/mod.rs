//! Classifier oracle: always-answering phishing probability for stored
//! HTML artifacts.
//!
//! The oracle's contract is "always returns a usable probability". With a
//! model, prediction is a pure function of the artifact content. Without
//! one — or on any read/parse failure — it degrades to a uniform random
//! draw, and the result is tagged so callers can tell a trained prediction
//! from a guess when interpreting metrics.

use std::path::Path;

use rand::Rng;
use tracing::{debug, warn};

use crate::extraction;
use crate::model::{ModelError, TextModel};

/// Where a probability came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    /// Produced by the trained model.
    Model,
    /// Uniform random draw; no model was usable.
    RandomFallback,
}

/// A single oracle answer.
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    /// Positive-class (phishing) probability in [0, 1].
    pub probability: f64,
    pub source: PredictionSource,
}

impl Prediction {
    /// Hard class at the 0.5 threshold.
    pub fn class(&self) -> u8 {
        u8::from(self.probability >= 0.5)
    }
}

/// Scores stored HTML through an explicitly held model handle.
pub struct Oracle {
    model: Option<TextModel>,
}

impl Oracle {
    pub fn new(model: Option<TextModel>) -> Self {
        Self { model }
    }

    /// Load the model file once for this run. A missing or unreadable
    /// model is a valid state: the oracle runs in random-baseline mode
    /// and says so in the log.
    pub fn from_model_file(path: &Path) -> Self {
        match TextModel::load(path) {
            Ok(model) => {
                debug!(
                    "loaded model trained on {} examples at {}",
                    model.trained_on, model.trained_at
                );
                Self::new(Some(model))
            }
            Err(ModelError::NotFound(_)) => {
                warn!("model not found: using random predictions until a model is trained");
                Self::new(None)
            }
            Err(e) => {
                warn!("failed to load model ({e}): using random predictions");
                Self::new(None)
            }
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Score a stored HTML artifact by path.
    pub fn predict_file(&self, path: &Path) -> Prediction {
        if self.model.is_none() {
            return Self::random();
        }
        match std::fs::read_to_string(path) {
            Ok(html) => self.predict_html(&html),
            Err(e) => {
                warn!("could not read {}: {e}; falling back to random", path.display());
                Self::random()
            }
        }
    }

    /// Score raw HTML.
    pub fn predict_html(&self, html: &str) -> Prediction {
        let Some(model) = &self.model else {
            return Self::random();
        };

        let text = extraction::visible_text(html);
        if text.is_empty() {
            warn!("artifact has no visible text; falling back to random");
            return Self::random();
        }

        Prediction {
            probability: f64::from(model.predict_proba(&text)),
            source: PredictionSource::Model,
        }
    }

    fn random() -> Prediction {
        Prediction {
            probability: rand::thread_rng().gen::<f64>(),
            source: PredictionSource::RandomFallback,
        }
    }
}
