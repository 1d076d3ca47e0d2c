use std::collections::HashMap;

use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::prelude::*;

use super::tree::{build_tree, TreeNode, TreeParams};
use super::{check_training_data, Classifier, ModelFamily};
use crate::error::TrainingError;

pub struct RandomForestFamily {
    name: String,
    n_trees: usize,
    max_depth: usize,
    min_leaf: usize,
    seed: u64,
}

impl RandomForestFamily {
    pub fn new(name: &str, n_trees: usize, max_depth: usize, min_leaf: usize, seed: u64) -> Self {
        Self { name: name.to_string(), n_trees, max_depth, min_leaf, seed }
    }
}

impl ModelFamily for RandomForestFamily {
    fn name(&self) -> &str {
        &self.name
    }

    fn instantiate(&self) -> Box<dyn Classifier> {
        Box::new(RandomForestClassifier::new(self.n_trees, self.max_depth, self.min_leaf, self.seed))
    }

    fn params(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("n_trees".to_string(), self.n_trees as f64),
            ("max_depth".to_string(), self.max_depth as f64),
            ("min_leaf".to_string(), self.min_leaf as f64),
        ])
    }
}

/// Forêt de Gini : bootstrap + sous-ensemble aléatoire de features à chaque nœud.
/// Seed fixe par instance : deux entraînements sur les mêmes données donnent la même forêt.
pub struct RandomForestClassifier {
    n_trees: usize,
    max_depth: usize,
    min_leaf: usize,
    seed: u64,
    forest: Vec<TreeNode>,
}

impl RandomForestClassifier {
    pub fn new(n_trees: usize, max_depth: usize, min_leaf: usize, seed: u64) -> Self {
        Self { n_trees, max_depth, min_leaf, seed, forest: Vec::new() }
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), TrainingError> {
        check_training_data(x, y)?;

        let rows: Vec<Vec<f64>> = x.outer_iter().map(|r| r.to_vec()).collect();
        let labels = y.to_vec();
        let n_samples = rows.len();
        let features_per_split = (x.ncols() as f64).sqrt().ceil() as usize;
        let params = TreeParams {
            max_depth: self.max_depth,
            min_leaf: self.min_leaf,
            features_per_split: Some(features_per_split),
            min_gain: 0.0,
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut forest = Vec::with_capacity(self.n_trees.max(1));

        for _ in 0..self.n_trees.max(1) {
            let indices: Vec<usize> = (0..n_samples).map(|_| rng.random_range(0..n_samples)).collect();
            let boot_features: Vec<&[f64]> = indices.iter().map(|&i| rows[i].as_slice()).collect();
            let boot_labels: Vec<f64> = indices.iter().map(|&i| labels[i]).collect();

            forest.push(build_tree(&boot_features, &boot_labels, &params, &mut rng));
        }

        self.forest = forest;
        Ok(())
    }

    fn predict_probability(&self, row: &[f64]) -> f64 {
        if self.forest.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.forest.iter().map(|tree| tree.predict(row)).sum();
        sum / self.forest.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_data::separable;

    #[test]
    fn test_forest_learns_separable_data() {
        let (x, y) = separable(60);
        let mut clf = RandomForestClassifier::new(20, 4, 1, 42);
        clf.fit(&x, &y).unwrap();

        assert!(clf.predict_probability(&[12.0, 3.0, 1.0]) > 0.5);
        assert!(clf.predict_probability(&[2.0, 3.0, 1.0]) < 0.5);
    }

    #[test]
    fn test_forest_deterministic() {
        let (x, y) = separable(40);
        let mut a = RandomForestClassifier::new(10, 3, 1, 7);
        let mut b = RandomForestClassifier::new(10, 3, 1, 7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        for v in 0..15 {
            let row = [v as f64, 2.0, 1.0];
            assert_eq!(a.predict_probability(&row), b.predict_probability(&row));
        }
    }

    #[test]
    fn test_forest_accepts_single_class() {
        let x = Array2::<f64>::ones((12, 3));
        let y = Array1::<f64>::zeros(12);
        let mut clf = RandomForestClassifier::new(5, 3, 1, 1);
        clf.fit(&x, &y).unwrap();
        assert_eq!(clf.predict_probability(&[1.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_forest_rejects_empty() {
        let x = Array2::<f64>::zeros((0, 3));
        let y = Array1::<f64>::zeros(0);
        let mut clf = RandomForestClassifier::new(5, 3, 1, 1);
        assert_eq!(clf.fit(&x, &y), Err(TrainingError::EmptyTrainingSet));
    }
}
