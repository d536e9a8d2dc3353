//! Decision tree classifier

use crate::error::{LabError, Result};
use ndarray::{Array1, Array2};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding class frequencies
    Leaf {
        proba: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Decision tree classifier, split on Gini impurity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum number of split levels below the root
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn at each node; all features when `None`
    pub max_features: Option<usize>,
    pub random_state: Option<u64>,
    n_features: usize,
    classes: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

struct BuildContext<'a> {
    x: &'a Array2<f64>,
    y_idx: &'a [usize],
    n_classes: usize,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
            classes: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let classes = unique_classes(y);
        self.fit_with_classes(x, y, classes)
    }

    /// Fit against a fixed class list, so that leaves stay aligned with a
    /// wider label set than the one present in `y` (bootstrap samples).
    pub fn fit_with_classes(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        classes: Vec<f64>,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(LabError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(LabError::Training("cannot fit a tree on zero samples".to_string()));
        }

        let y_idx = y
            .iter()
            .map(|v| class_position(&classes, *v))
            .collect::<Result<Vec<_>>>()?;

        self.n_features = n_features;
        self.classes = classes;

        let ctx = BuildContext {
            x,
            y_idx: &y_idx,
            n_classes: self.classes.len(),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        let indices: Vec<usize> = (0..n_samples).collect();
        let root = self.build_tree(&ctx, &indices, 0, &mut rng);
        self.root = Some(root);

        Ok(self)
    }

    fn build_tree(
        &self,
        ctx: &BuildContext<'_>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = class_counts(ctx, indices);

        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure;

        if should_stop {
            return leaf(&counts, n_samples);
        }

        let parent_impurity = gini(&counts, n_samples);
        let candidates = self.candidate_features(rng);

        match self.find_best_split(ctx, indices, &candidates, parent_impurity) {
            Some((feature, threshold, _)) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| ctx.x[[i, feature]] <= threshold);

                let left = Box::new(self.build_tree(ctx, &left_indices, depth + 1, rng));
                let right = Box::new(self.build_tree(ctx, &right_indices, depth + 1, rng));

                TreeNode::Split {
                    feature_idx: feature,
                    threshold,
                    left,
                    right,
                    n_samples,
                    impurity: parent_impurity,
                }
            }
            None => leaf(&counts, n_samples),
        }
    }

    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < self.n_features => {
                let mut picked = index::sample(rng, self.n_features, k.max(1)).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..self.n_features).collect(),
        }
    }

    /// Best (feature, threshold, gain) over the candidate features. Ties go
    /// to the lowest feature index.
    fn find_best_split(
        &self,
        ctx: &BuildContext<'_>,
        indices: &[usize],
        candidates: &[usize],
        parent_impurity: f64,
    ) -> Option<(usize, f64, f64)> {
        let n = indices.len();

        let feature_results: Vec<Option<(usize, f64, f64)>> = candidates
            .par_iter()
            .map(|&feature_idx| {
                let mut order: Vec<(f64, usize)> = indices
                    .iter()
                    .map(|&i| (ctx.x[[i, feature_idx]], ctx.y_idx[i]))
                    .collect();
                order.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut left = vec![0usize; ctx.n_classes];
                let mut right = vec![0usize; ctx.n_classes];
                for &(_, c) in &order {
                    right[c] += 1;
                }

                let mut best: Option<(f64, f64)> = None;
                for pos in 0..n.saturating_sub(1) {
                    let (value, class) = order[pos];
                    left[class] += 1;
                    right[class] -= 1;

                    let next = order[pos + 1].0;
                    if next <= value {
                        continue;
                    }
                    let n_left = pos + 1;
                    let n_right = n - n_left;
                    if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                        continue;
                    }

                    let weighted = (n_left as f64 * gini(&left, n_left)
                        + n_right as f64 * gini(&right, n_right))
                        / n as f64;
                    let gain = parent_impurity - weighted;
                    if gain > best.map_or(1e-12, |(g, _)| g) {
                        best = Some((gain, (value + next) / 2.0));
                    }
                }

                best.map(|(gain, threshold)| (feature_idx, threshold, gain))
            })
            .collect();

        feature_results
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<(usize, f64, f64)>, cand| match acc {
                Some(best) if best.2 >= cand.2 => Some(best),
                _ => Some(cand),
            })
    }

    /// Class probabilities, one column per entry of [`Self::classes`]
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let root = self.root.as_ref().ok_or(LabError::ModelNotFitted)?;
        check_width(x, self.n_features)?;

        let mut out = Array2::zeros((x.nrows(), self.classes.len()));
        for (i, sample) in x.rows().into_iter().enumerate() {
            let row = sample.to_vec();
            let proba = predict_sample(root, &row);
            for (j, &p) in proba.iter().enumerate() {
                out[[i, j]] = p;
            }
        }
        Ok(out)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(argmax_classes(&proba, &self.classes))
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Number of split levels; a single leaf has depth 0
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| (c as f64 / n).powi(2))
        .sum::<f64>()
}

fn leaf(counts: &[usize], n_samples: usize) -> TreeNode {
    let n = n_samples.max(1) as f64;
    TreeNode::Leaf {
        proba: counts.iter().map(|&c| c as f64 / n).collect(),
        n_samples,
    }
}

fn class_counts(ctx: &BuildContext<'_>, indices: &[usize]) -> Vec<usize> {
    let mut counts = vec![0usize; ctx.n_classes];
    for &i in indices {
        counts[ctx.y_idx[i]] += 1;
    }
    counts
}

fn predict_sample<'a>(node: &'a TreeNode, sample: &[f64]) -> &'a [f64] {
    match node {
        TreeNode::Leaf { proba, .. } => proba,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } => {
            if sample[*feature_idx] <= *threshold {
                predict_sample(left, sample)
            } else {
                predict_sample(right, sample)
            }
        }
    }
}

/// Sorted distinct labels of `y`
pub(crate) fn unique_classes(y: &Array1<f64>) -> Vec<f64> {
    let mut classes: Vec<f64> = y.iter().copied().collect();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();
    classes
}

pub(crate) fn class_position(classes: &[f64], value: f64) -> Result<usize> {
    classes
        .iter()
        .position(|&c| c == value)
        .ok_or_else(|| LabError::Training(format!("label {} is not a known class", value)))
}

/// Pick the class with the highest probability per row; the first class
/// wins ties.
pub(crate) fn argmax_classes(proba: &Array2<f64>, classes: &[f64]) -> Array1<f64> {
    proba
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            for (j, &p) in row.iter().enumerate() {
                if p > row[best] {
                    best = j;
                }
            }
            classes.get(best).copied().unwrap_or(0.0)
        })
        .collect()
}

pub(crate) fn check_width(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(LabError::Shape {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}
