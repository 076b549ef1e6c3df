//! Random-forest classifier over dense feature vectors.
//!
//! Small CART-style trees with bootstrap sampling and per-split feature
//! subsampling. Training is seeded, so a fitted forest is reproducible and
//! prediction is a pure function of the input vector.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Training hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 12,
            min_leaf: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        /// Positive-class fraction of the training samples in this leaf.
        prob: f32,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    config: ForestConfig,
}

impl RandomForest {
    /// Fit a forest on `samples` (rows) and binary `labels` (0/1).
    pub fn fit(samples: &[Vec<f32>], labels: &[u8], config: ForestConfig) -> Self {
        assert_eq!(samples.len(), labels.len());
        assert!(!samples.is_empty(), "cannot fit on an empty training set");

        let n = samples.len();
        let mut rng = StdRng::seed_from_u64(config.seed);

        let trees = (0..config.n_trees)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(samples, labels, &bootstrap, &config, &mut rng)
            })
            .collect();

        Self { trees, config }
    }

    /// Positive-class probability, averaged over all trees.
    pub fn predict_proba(&self, x: &[f32]) -> f32 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f32 = self.trees.iter().map(|t| t.predict_proba(x)).sum();
        sum / self.trees.len() as f32
    }

    /// Hard 0/1 prediction at the 0.5 threshold.
    pub fn predict(&self, x: &[f32]) -> u8 {
        u8::from(self.predict_proba(x) >= 0.5)
    }
}

impl DecisionTree {
    fn fit(
        samples: &[Vec<f32>],
        labels: &[u8],
        indices: &[usize],
        config: &ForestConfig,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = samples[0].len();
        let mut nodes = Vec::new();
        build_node(samples, labels, indices, n_features, 0, config, rng, &mut nodes);
        Self { nodes }
    }

    fn predict_proba(&self, x: &[f32]) -> f32 {
        let mut at = 0usize;
        loop {
            match &self.nodes[at] {
                TreeNode::Leaf { prob } => return *prob,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = x.get(*feature).copied().unwrap_or(0.0);
                    at = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Recursively grow a node; returns its index in `nodes`.
#[allow(clippy::too_many_arguments)]
fn build_node(
    samples: &[Vec<f32>],
    labels: &[u8],
    indices: &[usize],
    n_features: usize,
    depth: usize,
    config: &ForestConfig,
    rng: &mut StdRng,
    nodes: &mut Vec<TreeNode>,
) -> usize {
    let positives = indices.iter().filter(|&&i| labels[i] == 1).count();
    let prob = positives as f32 / indices.len() as f32;

    let pure = positives == 0 || positives == indices.len();
    if pure || depth >= config.max_depth || indices.len() < 2 * config.min_leaf {
        nodes.push(TreeNode::Leaf { prob });
        return nodes.len() - 1;
    }

    let split = best_split(samples, labels, indices, n_features, config, rng);
    let Some((feature, threshold)) = split else {
        nodes.push(TreeNode::Leaf { prob });
        return nodes.len() - 1;
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| samples[i][feature] <= threshold);

    // Reserve the split slot before recursing so child indices are stable.
    let at = nodes.len();
    nodes.push(TreeNode::Leaf { prob });
    let left = build_node(samples, labels, &left_idx, n_features, depth + 1, config, rng, nodes);
    let right = build_node(samples, labels, &right_idx, n_features, depth + 1, config, rng, nodes);
    nodes[at] = TreeNode::Split {
        feature,
        threshold,
        left,
        right,
    };
    at
}

/// Search a random sqrt-sized feature subset for the gini-optimal split.
fn best_split(
    samples: &[Vec<f32>],
    labels: &[u8],
    indices: &[usize],
    n_features: usize,
    config: &ForestConfig,
    rng: &mut StdRng,
) -> Option<(usize, f32)> {
    let n_candidates = (n_features as f64).sqrt().ceil() as usize;
    let mut best: Option<(usize, f32, f32)> = None; // (feature, threshold, gini)

    for _ in 0..n_candidates {
        let feature = rng.gen_range(0..n_features);

        let mut values: Vec<f32> = indices.iter().map(|&i| samples[i][feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();
        if values.len() < 2 {
            continue;
        }

        // Midpoints between up to 8 evenly spaced value pairs.
        let step = (values.len() - 1).div_ceil(8).max(1);
        for pair in values.windows(2).step_by(step) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let gini = split_gini(samples, labels, indices, feature, threshold, config.min_leaf);
            if let Some(gini) = gini {
                if best.map_or(true, |(_, _, g)| gini < g) {
                    best = Some((feature, threshold, gini));
                }
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

/// Weighted gini impurity of a candidate split, or None when a side would
/// fall under the leaf minimum.
fn split_gini(
    samples: &[Vec<f32>],
    labels: &[u8],
    indices: &[usize],
    feature: usize,
    threshold: f32,
    min_leaf: usize,
) -> Option<f32> {
    let mut left = (0usize, 0usize); // (count, positives)
    let mut right = (0usize, 0usize);
    for &i in indices {
        let side = if samples[i][feature] <= threshold {
            &mut left
        } else {
            &mut right
        };
        side.0 += 1;
        side.1 += usize::from(labels[i] == 1);
    }

    if left.0 < min_leaf || right.0 < min_leaf {
        return None;
    }

    let gini = |(count, positives): (usize, usize)| -> f32 {
        let p = positives as f32 / count as f32;
        2.0 * p * (1.0 - p)
    };
    let total = indices.len() as f32;
    Some(left.0 as f32 / total * gini(left) + right.0 as f32 / total * gini(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two clearly separable clusters on one feature.
    fn separable() -> (Vec<Vec<f32>>, Vec<u8>) {
        let mut samples = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            samples.push(vec![0.1 + (i as f32) * 0.01, 0.5]);
            labels.push(0);
            samples.push(vec![0.8 + (i as f32) * 0.01, 0.5]);
            labels.push(1);
        }
        (samples, labels)
    }

    #[test]
    fn learns_a_separable_problem() {
        let (samples, labels) = separable();
        let forest = RandomForest::fit(&samples, &labels, ForestConfig::default());
        assert_eq!(forest.predict(&[0.15, 0.5]), 0);
        assert_eq!(forest.predict(&[0.9, 0.5]), 1);
    }

    #[test]
    fn prediction_is_deterministic() {
        let (samples, labels) = separable();
        let forest = RandomForest::fit(&samples, &labels, ForestConfig::default());
        let x = vec![0.4, 0.5];
        assert_eq!(forest.predict_proba(&x), forest.predict_proba(&x));
    }

    #[test]
    fn same_seed_same_forest() {
        let (samples, labels) = separable();
        let a = RandomForest::fit(&samples, &labels, ForestConfig::default());
        let b = RandomForest::fit(&samples, &labels, ForestConfig::default());
        assert_eq!(a.predict_proba(&[0.3, 0.5]), b.predict_proba(&[0.3, 0.5]));
    }

    #[test]
    fn probabilities_stay_in_unit_interval() {
        let (samples, labels) = separable();
        let forest = RandomForest::fit(&samples, &labels, ForestConfig::default());
        for x in &samples {
            let p = forest.predict_proba(x);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn serde_roundtrip_preserves_predictions() {
        let (samples, labels) = separable();
        let forest = RandomForest::fit(&samples, &labels, ForestConfig::default());
        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();
        assert_eq!(
            forest.predict_proba(&samples[0]),
            restored.predict_proba(&samples[0])
        );
    }
}
