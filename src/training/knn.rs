//! K-Nearest Neighbors classifier

use super::decision_tree::{argmax_classes, check_width, class_position, unique_classes};
use crate::error::{LabError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// KNN configuration. Neighbors are found by Euclidean distance and vote
/// with equal weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNConfig {
    pub n_neighbors: usize,
}

impl Default for KNNConfig {
    fn default() -> Self {
        Self { n_neighbors: 5 }
    }
}

/// K-Nearest Neighbors classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNClassifier {
    config: KNNConfig,
    x_train: Option<Array2<f64>>,
    /// Training labels as positions into `classes`
    y_train: Vec<usize>,
    classes: Vec<f64>,
}

impl KNNClassifier {
    pub fn new(config: KNNConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn with_k(k: usize) -> Self {
        Self::new(KNNConfig { n_neighbors: k })
    }

    /// Store the training data. `k` may not exceed the number of rows.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(LabError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        let k = self.config.n_neighbors;
        if k == 0 || k > x.nrows() {
            return Err(LabError::InvalidParameter {
                name: "n_neighbors".to_string(),
                value: k.to_string(),
                reason: format!("must be between 1 and the {} training rows", x.nrows()),
            });
        }

        self.classes = unique_classes(y);
        self.y_train = y
            .iter()
            .map(|&v| class_position(&self.classes, v))
            .collect::<Result<Vec<_>>>()?;
        self.x_train = Some(x.to_owned());

        Ok(())
    }

    /// Neighbor vote shares per class (parallelized over query rows)
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let x_train = self.x_train.as_ref().ok_or(LabError::ModelNotFitted)?;
        check_width(x, x_train.ncols())?;

        let n_classes = self.classes.len();
        let probs: Vec<Vec<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let point = x.row(i).to_vec();
                let neighbors = find_k_nearest(&point, x_train, &self.y_train, self.config.n_neighbors);
                vote_shares(&neighbors, n_classes)
            })
            .collect();

        let flat: Vec<f64> = probs.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((x.nrows(), n_classes), flat)?)
    }

    /// Majority vote; the lowest class wins ties.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(argmax_classes(&proba, &self.classes))
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn n_neighbors(&self) -> usize {
        self.config.n_neighbors
    }
}

/// Max-heap entry keeping the k closest rows; equal distances prefer the
/// earlier training row.
#[derive(PartialEq)]
struct Neighbor {
    dist: f64,
    row: usize,
    class: usize,
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then(self.row.cmp(&other.row))
    }
}

/// O(n log k) neighbor search
fn find_k_nearest(
    point: &[f64],
    x_train: &Array2<f64>,
    y_train: &[usize],
    k: usize,
) -> Vec<usize> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (row, sample) in x_train.rows().into_iter().enumerate() {
        let dist = euclidean(point, sample.iter().copied());
        let candidate = Neighbor {
            dist,
            row,
            class: y_train[row],
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().map_or(false, |top| candidate < *top) {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_iter().map(|n| n.class).collect()
}

fn euclidean(a: &[f64], b: impl Iterator<Item = f64>) -> f64 {
    a.iter()
        .zip(b)
        .map(|(ai, bi)| (ai - bi) * (ai - bi))
        .sum::<f64>()
        .sqrt()
}

fn vote_shares(neighbor_classes: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0.0; n_classes];
    for &class in neighbor_classes {
        counts[class] += 1.0;
    }
    let total = neighbor_classes.len() as f64;
    if total > 0.0 {
        counts.iter_mut().for_each(|c| *c /= total);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_classification_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.0],
            [0.5, 0.5],
            [1.0, 0.0],
            [0.0, 1.0],
            [5.0, 5.0],
            [5.5, 5.5],
            [6.0, 5.0],
            [5.0, 6.0],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_knn_classifier() {
        let (x, y) = create_classification_data();
        let mut knn = KNNClassifier::with_k(3);
        knn.fit(&x, &y).unwrap();

        let test = array![[0.2, 0.2], [5.2, 5.2]];
        let preds = knn.predict(&test).unwrap();
        assert_eq!(preds.to_vec(), vec![0.0, 1.0]);

        let proba = knn.predict_proba(&test).unwrap();
        assert_eq!(proba[[0, 0]], 1.0);
        assert_eq!(proba[[1, 1]], 1.0);
    }

    #[test]
    fn test_k_larger_than_training_set() {
        let (x, y) = create_classification_data();
        let mut knn = KNNClassifier::with_k(9);
        assert!(matches!(
            knn.fit(&x, &y),
            Err(LabError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_tie_goes_to_lowest_class() {
        let x = array![[0.0], [2.0]];
        let y = array![1.0, 0.0];
        let mut knn = KNNClassifier::with_k(2);
        knn.fit(&x, &y).unwrap();
        assert_eq!(knn.predict(&array![[1.0]]).unwrap()[0], 0.0);
    }

    #[test]
    fn test_euclidean_distance() {
        assert_eq!(euclidean(&[0.0, 0.0], [3.0, 4.0].into_iter()), 5.0);
    }

    #[test]
    fn test_vote_shares() {
        assert_eq!(vote_shares(&[0, 1, 1, 1], 2), vec![0.25, 0.75]);
    }
}
