//! Text classification model: feature extraction, classifier, and the
//! serialized model artifact.
//!
//! Exactly one model file exists at a time; training replaces it wholesale.
//! Absence of the file is a valid state (the oracle falls back to random
//! predictions), but a present file with an incompatible format version
//! fails fast with a typed error instead of misbehaving at first use.

pub mod forest;
pub mod trainer;
pub mod vectorizer;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forest::RandomForest;
use vectorizer::TfIdfVectorizer;

/// Bumped whenever the serialized layout or the feature extraction
/// changes incompatibly.
pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("insufficient training data: {found} usable examples, need at least {required}")]
    InsufficientTrainingData { found: usize, required: usize },

    #[error("model file not found: {0}")]
    NotFound(PathBuf),

    #[error("incompatible model format version {found} (this build reads version {expected})")]
    IncompatibleVersion { found: u32, expected: u32 },

    #[error("malformed model file: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The single global model artifact: fitted vectorizer plus classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextModel {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    /// Number of examples the model was fitted on.
    pub trained_on: usize,
    pub vectorizer: TfIdfVectorizer,
    pub forest: RandomForest,
}

impl TextModel {
    /// Positive-class (phishing) probability for cleaned visible text.
    pub fn predict_proba(&self, text: &str) -> f32 {
        self.forest.predict_proba(&self.vectorizer.transform(text))
    }

    /// Serialize to `path`, replacing any prior model.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a model file.
    ///
    /// The format version is checked before the full structure is decoded,
    /// so an artifact written by a different build is rejected with
    /// [`ModelError::IncompatibleVersion`] rather than a decode error.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ModelError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };

        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        let found = value
            .get("format_version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        if found != MODEL_FORMAT_VERSION {
            return Err(ModelError::IncompatibleVersion {
                found,
                expected: MODEL_FORMAT_VERSION,
            });
        }

        let mut model: TextModel = serde_json::from_value(value)?;
        model.vectorizer.rebuild_index();
        Ok(model)
    }
}
