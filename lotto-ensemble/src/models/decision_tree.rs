use std::collections::HashMap;

use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::tree::{build_tree, TreeNode, TreeParams};
use super::{check_training_data, Classifier, ModelFamily};
use crate::error::TrainingError;

/// Arbre de décision unique sur toutes les features.
/// `pruned` : arrêt précoce (effectif minimal par feuille + gain minimal).
pub struct DecisionTreeFamily {
    name: String,
    max_depth: usize,
    min_leaf: usize,
    pruned: bool,
}

impl DecisionTreeFamily {
    pub fn new(name: &str, max_depth: usize, min_leaf: usize, pruned: bool) -> Self {
        Self { name: name.to_string(), max_depth, min_leaf, pruned }
    }

    fn tree_params(&self) -> TreeParams {
        if self.pruned {
            TreeParams {
                max_depth: self.max_depth,
                min_leaf: self.min_leaf,
                features_per_split: None,
                min_gain: 1e-4,
            }
        } else {
            TreeParams {
                max_depth: self.max_depth,
                min_leaf: 1,
                features_per_split: None,
                min_gain: 0.0,
            }
        }
    }
}

impl ModelFamily for DecisionTreeFamily {
    fn name(&self) -> &str {
        &self.name
    }

    fn instantiate(&self) -> Box<dyn Classifier> {
        Box::new(DecisionTreeClassifier { params: self.tree_params(), root: None })
    }

    fn params(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("max_depth".to_string(), self.max_depth as f64),
            ("min_leaf".to_string(), self.min_leaf as f64),
            ("pruned".to_string(), if self.pruned { 1.0 } else { 0.0 }),
        ])
    }
}

pub struct DecisionTreeClassifier {
    params: TreeParams,
    root: Option<TreeNode>,
}

impl Classifier for DecisionTreeClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), TrainingError> {
        check_training_data(x, y)?;

        let rows: Vec<Vec<f64>> = x.outer_iter().map(|r| r.to_vec()).collect();
        let refs: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let labels = y.to_vec();
        // Toutes les features sont évaluées : le générateur ne sert pas
        let mut rng = StdRng::seed_from_u64(0);

        self.root = Some(build_tree(&refs, &labels, &self.params, &mut rng));
        Ok(())
    }

    fn predict_probability(&self, row: &[f64]) -> f64 {
        self.root.as_ref().map(|node| node.predict(row)).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_data::separable;

    #[test]
    fn test_unpruned_tree_fits_training_data() {
        let (x, y) = separable(45);
        let family = DecisionTreeFamily::new("Tree_Unpruned", 32, 1, false);
        let mut clf = family.instantiate();
        clf.fit(&x, &y).unwrap();

        for (row, &label) in x.outer_iter().zip(y.iter()) {
            assert_eq!(clf.predict_probability(row.as_slice().unwrap()), label);
        }
    }

    #[test]
    fn test_pruned_tree_is_shallower() {
        let (x, y) = separable(45);
        let family = DecisionTreeFamily::new("Tree_Pruned", 6, 50, true);
        let mut clf = family.instantiate();
        clf.fit(&x, &y).unwrap();

        // min_leaf = 50 > 45 / 2 : une seule feuille au taux de base
        let p = clf.predict_probability(&[12.0, 0.0, 1.0]);
        assert!((p - 15.0 / 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_untrained_tree_predicts_zero() {
        let family = DecisionTreeFamily::new("T", 4, 1, false);
        let clf = family.instantiate();
        assert_eq!(clf.predict_probability(&[1.0, 2.0, 3.0]), 0.0);
    }
}
