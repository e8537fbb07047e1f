use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::errors::{BasisHedgeError, Result};

use super::{validate_prediction_rows, validate_training_set, Regressor};

/// Node of a fitted regression tree
#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        &**left
                    } else {
                        &**right
                    };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TreeParams {
    max_depth: usize,
    min_samples_split: usize,
    max_features: Option<usize>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

fn mean_of(indices: &[usize], y: &[f64]) -> f64 {
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

/// Variance-reduction search over one feature; returns the best threshold and
/// the summed squared error of the two children
fn best_threshold(indices: &[usize], x: &[Vec<f64>], y: &[f64], feature: usize) -> Option<(f64, f64)> {
    let mut order: Vec<usize> = indices.to_vec();
    order.sort_by(|&a, &b| {
        x[a][feature]
            .partial_cmp(&x[b][feature])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let n = order.len();
    let total_sum: f64 = order.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = order.iter().map(|&i| y[i] * y[i]).sum();

    let mut left_sum = 0.0;
    let mut left_sq = 0.0;
    let mut best: Option<(f64, f64)> = None;

    for split in 1..n {
        let prev = order[split - 1];
        left_sum += y[prev];
        left_sq += y[prev] * y[prev];

        let lo = x[prev][feature];
        let hi = x[order[split]][feature];
        if hi <= lo {
            continue;
        }

        let left_n = split as f64;
        let right_n = (n - split) as f64;
        let right_sum = total_sum - left_sum;
        let right_sq = total_sq - left_sq;
        let sse = (left_sq - left_sum * left_sum / left_n) + (right_sq - right_sum * right_sum / right_n);

        if best.map_or(true, |(_, current)| sse < current) {
            best = Some(((lo + hi) / 2.0, sse));
        }
    }

    best
}

fn build_node(
    indices: &[usize],
    x: &[Vec<f64>],
    y: &[f64],
    depth: usize,
    params: TreeParams,
    rng: &mut StdRng,
) -> Node {
    let leaf_value = mean_of(indices, y);
    if depth >= params.max_depth || indices.len() < params.min_samples_split.max(2) {
        return Node::Leaf(leaf_value);
    }

    let parent_sse: f64 = indices.iter().map(|&i| (y[i] - leaf_value).powi(2)).sum();
    if parent_sse <= f64::EPSILON {
        return Node::Leaf(leaf_value);
    }

    let width = x[indices[0]].len();
    let candidates: Vec<usize> = match params.max_features {
        Some(k) if k < width => index::sample(rng, width, k.max(1)).into_vec(),
        _ => (0..width).collect(),
    };

    let mut best: Option<SplitCandidate> = None;
    for feature in candidates {
        if let Some((threshold, score)) = best_threshold(indices, x, y, feature) {
            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }

    let Some(split) = best else {
        return Node::Leaf(leaf_value);
    };
    if split.score >= parent_sse {
        return Node::Leaf(leaf_value);
    }

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| x[i][split.feature] <= split.threshold);

    Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(build_node(&left, x, y, depth + 1, params, rng)),
        right: Box::new(build_node(&right, x, y, depth + 1, params, rng)),
    }
}

/// Bagged ensemble of CART regression trees.
///
/// Every tree is trained on a bootstrap resample of the training rows. All
/// randomness flows from one seeded generator, so a fixed seed and fixed input
/// reproduce identical predictions.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    seed: u64,
    n_trees: usize,
    params: TreeParams,
    trees: Vec<Node>,
    width: usize,
}

impl RandomForestRegressor {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            n_trees: 100,
            params: TreeParams {
                max_depth: 8,
                min_samples_split: 2,
                max_features: None,
            },
            trees: Vec::new(),
            width: 0,
        }
    }

    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees.max(1);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.params.max_depth = max_depth.max(1);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.params.min_samples_split = min_samples_split;
        self
    }

    /// Number of features considered at each split; `None` uses all of them
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.params.max_features = max_features;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    pub fn max_features(&self) -> Option<usize> {
        self.params.max_features
    }
}

impl Regressor for RandomForestRegressor {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        let width = validate_training_set(x, y)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = x.len();

        let mut trees = Vec::with_capacity(self.n_trees);
        for _ in 0..self.n_trees {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(build_node(&sample, x, y, 0, self.params, &mut rng));
        }

        debug!(trees = trees.len(), rows = n, features = width, seed = self.seed, "fitted random forest");
        self.trees = trees;
        self.width = width;
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(BasisHedgeError::validation("random forest is not fitted"));
        }
        validate_prediction_rows(x, self.width)?;
        let count = self.trees.len() as f64;
        Ok(x.iter()
            .map(|row| self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>() / count)
            .collect())
    }
}
