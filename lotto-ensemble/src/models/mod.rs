pub mod decision_tree;
pub mod logistic;
pub mod random_forest;
pub mod tree;

use std::collections::HashMap;

use ndarray::{Array1, Array2};

use crate::error::TrainingError;

/// Classifieur binaire entraînable : apprend P(label = vrai | features).
pub trait Classifier: Send + Sync {
    /// `x` : une ligne par observation ; `y` : 1.0 (vrai) ou 0.0 (faux).
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), TrainingError>;
    /// Probabilité de l'étiquette positive, dans [0, 1].
    fn predict_probability(&self, row: &[f64]) -> f64;
}

/// Gabarit de classifieur : produit des instances vierges à entraîner.
pub trait ModelFamily: Send + Sync {
    fn name(&self) -> &str;
    fn instantiate(&self) -> Box<dyn Classifier>;
    fn params(&self) -> HashMap<String, f64>;
}

/// Contrôles communs avant apprentissage. Retourne le nombre de positifs.
pub fn check_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<usize, TrainingError> {
    if x.nrows() != y.len() {
        return Err(TrainingError::ShapeMismatch { rows: x.nrows(), labels: y.len() });
    }
    if y.is_empty() {
        return Err(TrainingError::EmptyTrainingSet);
    }
    Ok(y.iter().filter(|&&v| v > 0.5).count())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_training_data_shape() {
        let x = Array2::<f64>::zeros((3, 2));
        let y = Array1::<f64>::zeros(2);
        assert_eq!(
            check_training_data(&x, &y),
            Err(TrainingError::ShapeMismatch { rows: 3, labels: 2 })
        );
    }

    #[test]
    fn test_check_training_data_empty() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        assert_eq!(check_training_data(&x, &y), Err(TrainingError::EmptyTrainingSet));
    }

    #[test]
    fn test_check_training_data_positives() {
        let (x, y) = test_data::separable(9);
        assert_eq!(check_training_data(&x, &y), Ok(3));
    }
}
