//! Random forest regression.
//!
//! Each tree is a CART regressor grown on a bootstrap sample, splitting on
//! whichever feature/threshold pair most reduces the squared error. Every
//! feature is considered at every split. Trees are stored as flat node
//! arenas and grown with an explicit work stack, so deep trees do not
//! recurse.

use std::sync::Arc;

use livability_score_models::progress::ProgressCallback;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// Hyper-parameters for [`RandomForest::fit`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees.
    pub n_trees: usize,
    /// Maximum depth of each tree; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// A node with fewer samples than this becomes a leaf.
    pub min_samples_split: usize,
    /// Seed for bootstrap sampling and the holdout split.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One fitted regression tree.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grows a tree on the rows of `x` selected by `sample`.
    fn fit(x: &[Vec<f64>], y: &[f64], sample: Vec<usize>, params: &ForestParams) -> Self {
        let mut nodes = vec![Node::Leaf(0.0)];
        let mut stack = vec![(0usize, sample, 0usize)];

        while let Some((slot, indices, depth)) = stack.pop() {
            let depth_exhausted = params.max_depth.is_some_and(|max| depth >= max);
            let split = if depth_exhausted || indices.len() < params.min_samples_split.max(2) {
                None
            } else {
                best_split(x, y, &indices)
            };

            let Some((feature, threshold)) = split else {
                nodes[slot] = Node::Leaf(mean_of(y, &indices));
                continue;
            };

            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
                indices.into_iter().partition(|&i| x[i][feature] <= threshold);

            let left = nodes.len();
            nodes.push(Node::Leaf(0.0));
            let right = nodes.len();
            nodes.push(Node::Leaf(0.0));
            nodes[slot] = Node::Split {
                feature,
                threshold,
                left,
                right,
            };

            stack.push((left, left_idx, depth + 1));
            stack.push((right, right_idx, depth + 1));
        }

        Self { nodes }
    }

    /// Predicts a single row.
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Number of nodes, leaves included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Bagged ensemble of regression trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fits a forest on feature rows `x` and targets `y`.
    ///
    /// Tree `i` draws its bootstrap sample from a generator seeded with
    /// `params.seed + i`, so fitting is reproducible.
    #[must_use]
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        params: &ForestParams,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Self {
        let n = x.len().min(y.len());
        progress.set_total(params.n_trees as u64);
        progress.set_message("Training price model".to_string());

        let trees = (0..params.n_trees)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let sample: Vec<usize> = if n == 0 {
                    Vec::new()
                } else {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                };
                let tree = RegressionTree::fit(x, y, sample, params);
                progress.inc(1);
                tree
            })
            .collect::<Vec<_>>();

        progress.finish(format!("Trained {} trees on {n} rows", trees.len()));
        Self { trees }
    }

    /// Mean prediction across all trees.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    /// The fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

/// Coefficient of determination of `predicted` against `actual`.
///
/// Returns `None` when `actual` has no variance.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let total: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if total <= 0.0 {
        return None;
    }
    let residual: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Some(1.0 - residual / total)
}

#[allow(clippy::cast_precision_loss)]
fn mean_of(y: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        0.0
    } else {
        indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
    }
}

/// Finds the `(feature, threshold)` split with the lowest summed squared
/// error, or `None` if no split separates the samples or improves on the
/// parent.
#[allow(clippy::cast_precision_loss)]
fn best_split(x: &[Vec<f64>], y: &[f64], indices: &[usize]) -> Option<(usize, f64)> {
    let n = indices.len() as f64;
    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n;
    if parent_sse <= f64::EPSILON * total_sq.abs().max(1.0) {
        return None;
    }

    let features = x.get(indices[0]).map_or(0, Vec::len);
    let mut best: Option<(usize, f64, f64)> = None;
    let mut order = indices.to_vec();

    for feature in 0..features {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for pos in 0..order.len() - 1 {
            let i = order[pos];
            left_sum += y[i];
            left_sq += y[i] * y[i];

            let here = x[i][feature];
            let next = x[order[pos + 1]][feature];
            if here >= next {
                continue;
            }

            let n_left = (pos + 1) as f64;
            let n_right = n - n_left;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left)
                + (right_sq - right_sum * right_sum / n_right);

            if best.is_none_or(|(_, _, best_sse)| sse < best_sse) {
                best = Some((feature, f64::midpoint(here, next), sse));
            }
        }
    }

    best.filter(|&(_, _, sse)| sse < parent_sse)
        .map(|(feature, threshold, _)| (feature, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use livability_score_models::progress::null_progress;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![f64::from(i), 1.0]).collect();
        let y: Vec<f64> = (0..40).map(|i| if i < 20 { 10.0 } else { 50.0 }).collect();
        (x, y)
    }

    #[test]
    fn single_tree_learns_step_function() {
        let (x, y) = step_data();
        let params = ForestParams::default();
        let tree = RegressionTree::fit(&x, &y, (0..x.len()).collect(), &params);
        assert!((tree.predict(&[3.0, 1.0]) - 10.0).abs() < 1e-9);
        assert!((tree.predict(&[35.0, 1.0]) - 50.0).abs() < 1e-9);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn forest_predicts_close_to_targets() {
        let (x, y) = step_data();
        let params = ForestParams {
            n_trees: 25,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&x, &y, &params, &null_progress());
        assert_eq!(forest.trees().len(), 25);
        assert!((forest.predict(&[2.0, 1.0]) - 10.0).abs() < 1.0);
        assert!((forest.predict(&[38.0, 1.0]) - 50.0).abs() < 1.0);
    }

    #[test]
    fn fitting_is_reproducible() {
        let (x, y) = step_data();
        let params = ForestParams {
            n_trees: 10,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(&x, &y, &params, &null_progress());
        let b = RandomForest::fit(&x, &y, &params, &null_progress());
        for probe in [0.0, 19.5, 20.0, 27.0] {
            assert!((a.predict(&[probe, 1.0]) - b.predict(&[probe, 1.0])).abs() < 1e-12);
        }
    }

    #[test]
    fn depth_limit_yields_stump_means() {
        let x: Vec<Vec<f64>> = (0..4).map(|i| vec![f64::from(i)]).collect();
        let y = vec![0.0, 10.0, 20.0, 30.0];
        let params = ForestParams {
            max_depth: Some(0),
            ..ForestParams::default()
        };
        let tree = RegressionTree::fit(&x, &y, (0..4).collect(), &params);
        assert!((tree.predict(&[0.0]) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn empty_forest_predicts_zero() {
        let params = ForestParams {
            n_trees: 0,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&[], &[], &params, &null_progress());
        assert!(forest.predict(&[1.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn r_squared_of_perfect_fit_is_one() {
        let actual = [1.0, 2.0, 3.0];
        assert!((r_squared(&actual, &actual).unwrap() - 1.0).abs() < 1e-12);
        assert!(r_squared(&[2.0, 2.0], &[1.0, 3.0]).is_none());
    }
}
