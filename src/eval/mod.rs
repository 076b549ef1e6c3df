//! Evaluation harness: drives the perturbation techniques over a sampled
//! corpus and aggregates before/after metrics.

pub mod metrics;
pub mod technique1;
pub mod technique2;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::corpus::LabeledUrl;

/// Options shared by both techniques.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// How many corpus rows to sample.
    pub n_samples: usize,
    /// Per-URL navigation timeout.
    pub timeout_ms: u64,
    /// Delay after navigation before reading page content, giving
    /// client-side rendering a chance to settle.
    pub settle_ms: u64,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            n_samples: 200,
            timeout_ms: 15_000,
            settle_ms: 4000,
        }
    }
}

/// Seeded sample of at most `n` corpus rows, so repeated runs score the
/// same pages.
pub fn sample_corpus(rows: &[LabeledUrl], n: usize, seed: u64) -> Vec<LabeledUrl> {
    let mut sampled = rows.to_vec();
    sampled.shuffle(&mut StdRng::seed_from_u64(seed));
    sampled.truncate(n);
    sampled
}

/// External collaborator that scores how far a variant drifted from the
/// original rendering.
pub trait SimilarityScorer: Send + Sync {
    /// Drop in similarity, in [0, 1]; 0 means visually identical.
    fn similarity_drop(&self, html: &str, screenshot: &[u8]) -> f64;
}

/// Stub scorer until a real visual similarity metric is wired in: a
/// bounded random drop, matching the contract's range.
pub struct RandomDropScorer;

impl SimilarityScorer for RandomDropScorer {
    fn similarity_drop(&self, _html: &str, _screenshot: &[u8]) -> f64 {
        rand::thread_rng().gen_range(0.0..0.2)
    }
}
