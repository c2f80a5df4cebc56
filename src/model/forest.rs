//! Isolation forest over a dense f64 matrix, with sklearn-style decision
//! values. Fitting is fully deterministic for a fixed seed.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Fit/score failures. These never escape the risk engine; they exist so the
/// catch around fitting is scoped to model failures and nothing else.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("population of {0} rows is too small to fit (need at least 2)")]
    PopulationTooSmall(usize),
    #[error("matrix has no feature columns")]
    NoFeatures,
    #[error("matrix contains non-finite values")]
    NonFinite,
    #[error("contamination {0} outside (0, 0.5]")]
    InvalidContamination(f64),
    #[error("tree count must be positive")]
    NoTrees,
}

#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    /// Number of trees
    pub trees: usize,
    /// Per-tree subsample ceiling (capped at the row count)
    pub sample_size: usize,
    /// Expected outlier fraction; pins the decision offset
    pub contamination: f64,
    /// RNG seed for subsampling and split selection
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            trees: 100,
            sample_size: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
    offset: f64,
}

impl IsolationForest {
    /// Fit on the matrix and pin the decision offset at the contamination
    /// percentile of the training scores (the float-contamination convention
    /// of sklearn's `IsolationForest.offset_`).
    pub fn fit(data: ArrayView2<'_, f64>, params: &ForestParams) -> Result<Self, ModelError> {
        let (rows, cols) = data.dim();
        if rows < 2 {
            return Err(ModelError::PopulationTooSmall(rows));
        }
        if cols == 0 {
            return Err(ModelError::NoFeatures);
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite);
        }
        if !(params.contamination > 0.0 && params.contamination <= 0.5) {
            return Err(ModelError::InvalidContamination(params.contamination));
        }
        if params.trees == 0 {
            return Err(ModelError::NoTrees);
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let sample_size = params.sample_size.clamp(2, rows);
        let max_depth = (sample_size as f64).log2().ceil() as usize;

        let mut trees = Vec::with_capacity(params.trees);
        for _ in 0..params.trees {
            let sample = rand::seq::index::sample(&mut rng, rows, sample_size).into_vec();
            trees.push(build_tree(data, &sample, 0, max_depth, &mut rng));
        }

        let mut forest = Self {
            trees,
            sample_size,
            offset: 0.0,
        };
        let train_scores: Vec<f64> = (0..rows)
            .map(|i| -forest.anomaly_score(data.row(i)))
            .collect();
        forest.offset = percentile(&train_scores, params.contamination * 100.0);
        Ok(forest)
    }

    /// Anomaly score in (0, 1]: ≈0.5 for inliers, → 1 for isolated points.
    pub fn anomaly_score(&self, x: ArrayView1<'_, f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|t| path_length(t, x, 0)).sum();
        let mean_path = total / self.trees.len() as f64;
        2f64.powf(-mean_path / average_path_length(self.sample_size))
    }

    /// sklearn-style decision value: positive for inliers, negative past the
    /// contamination boundary.
    pub fn decision_function(&self, x: ArrayView1<'_, f64>) -> f64 {
        -self.anomaly_score(x) - self.offset
    }

    /// Decision values for every row of the matrix.
    pub fn decision_batch(&self, data: ArrayView2<'_, f64>) -> Vec<f64> {
        (0..data.nrows())
            .map(|i| self.decision_function(data.row(i)))
            .collect()
    }
}

fn build_tree(
    data: ArrayView2<'_, f64>,
    idx: &[usize],
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    if idx.len() <= 1 || depth >= max_depth {
        return Node::Leaf { size: idx.len() };
    }

    // Only features with more than one distinct value in this node can split it.
    let mut candidates = Vec::new();
    for j in 0..data.ncols() {
        let first = data[[idx[0], j]];
        if idx.iter().any(|&i| data[[i, j]] != first) {
            candidates.push(j);
        }
    }
    if candidates.is_empty() {
        return Node::Leaf { size: idx.len() };
    }

    let feature = candidates[rng.gen_range(0..candidates.len())];
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &i in idx {
        let v = data[[i, feature]];
        lo = lo.min(v);
        hi = hi.max(v);
    }
    let threshold = rng.gen_range(lo..hi);
    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
        idx.iter().partition(|&&i| data[[i, feature]] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(data, &left_idx, depth + 1, max_depth, rng)),
        right: Box::new(build_tree(data, &right_idx, depth + 1, max_depth, rng)),
    }
}

fn path_length(node: &Node, x: ArrayView1<'_, f64>, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if x[*feature] < *threshold {
                path_length(left, x, depth + 1)
            } else {
                path_length(right, x, depth + 1)
            }
        }
    }
}

/// c(n): average unsuccessful-search path length in a BST of n nodes; the
/// normalization constant from Liu et al.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        n => {
            let m = (n - 1) as f64;
            2.0 * (m.ln() + EULER_GAMMA) - 2.0 * m / n as f64
        }
    }
}

/// Linear-interpolation percentile, matching numpy's default.
fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
