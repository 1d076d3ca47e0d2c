use std::collections::HashMap;

use ndarray::{Array1, Array2, Axis};

use super::{check_training_data, Classifier, ModelFamily};
use crate::error::TrainingError;

pub struct LogisticFamily {
    name: String,
    learning_rate: f64,
    lambda: f64,
    epochs: usize,
}

impl LogisticFamily {
    pub fn new(name: &str, learning_rate: f64, lambda: f64, epochs: usize) -> Self {
        Self { name: name.to_string(), learning_rate, lambda, epochs }
    }
}

impl ModelFamily for LogisticFamily {
    fn name(&self) -> &str {
        &self.name
    }

    fn instantiate(&self) -> Box<dyn Classifier> {
        Box::new(LogisticClassifier::new(self.learning_rate, self.lambda, self.epochs))
    }

    fn params(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("learning_rate".to_string(), self.learning_rate),
            ("lambda".to_string(), self.lambda),
            ("epochs".to_string(), self.epochs as f64),
        ])
    }
}

/// Régression logistique L2, descente de gradient sur features normalisées (z-score).
pub struct LogisticClassifier {
    learning_rate: f64,
    lambda: f64,
    epochs: usize,
    means: Array1<f64>,
    stds: Array1<f64>,
    weights: Array1<f64>,
    bias: f64,
}

impl LogisticClassifier {
    pub fn new(learning_rate: f64, lambda: f64, epochs: usize) -> Self {
        Self {
            learning_rate,
            lambda,
            epochs,
            means: Array1::zeros(0),
            stds: Array1::zeros(0),
            weights: Array1::zeros(0),
            bias: 0.0,
        }
    }
}

impl Classifier for LogisticClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), TrainingError> {
        let positives = check_training_data(x, y)?;
        let n_samples = y.len();
        // Une seule classe : pas de frontière à apprendre
        if positives == 0 || positives == n_samples {
            return Err(TrainingError::DegenerateLabels { positives, total: n_samples });
        }

        let n_features = x.ncols();
        let means = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features));
        let stds: Array1<f64> = x
            .axis_iter(Axis(0))
            .fold(Array1::zeros(n_features), |acc, row| {
                let diff = &row - &means;
                acc + &diff.mapv(|v| v * v)
            }) / n_samples as f64;
        let stds = stds.mapv(|v| v.sqrt().max(1e-10));

        let mut x_norm = x.clone();
        for mut row in x_norm.rows_mut() {
            for j in 0..n_features {
                row[j] = (row[j] - means[j]) / stds[j];
            }
        }

        // Départ au taux de base : converge plus vite sur des classes déséquilibrées
        let base_rate = positives as f64 / n_samples as f64;
        let mut weights = Array1::<f64>::zeros(n_features);
        let mut bias = (base_rate / (1.0 - base_rate)).ln();

        for _ in 0..self.epochs {
            let logits = x_norm.dot(&weights) + bias;
            let preds = logits.mapv(sigmoid);
            let errors = &preds - y;

            let grad_w = x_norm.t().dot(&errors) / n_samples as f64
                + &weights * (self.lambda * 2.0);
            let grad_b = errors.sum() / n_samples as f64;

            weights = weights - &grad_w * self.learning_rate;
            bias -= grad_b * self.learning_rate;
        }

        self.means = means;
        self.stds = stds;
        self.weights = weights;
        self.bias = bias;
        Ok(())
    }

    fn predict_probability(&self, row: &[f64]) -> f64 {
        let logit: f64 = row
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .zip(self.weights.iter())
            .map(|((&v, (&m, &s)), &w)| (v - m) / s * w)
            .sum::<f64>()
            + self.bias;
        sigmoid(logit)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
