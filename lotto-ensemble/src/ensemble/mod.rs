use ndarray::{Array1, Array2};
use rayon::prelude::*;

use lotto_db::models::POOL_SIZE;
use crate::error::{EnsembleError, TrainingError};
use crate::features::{FeatureVector, TrainingDataset, FEATURE_COUNT, FEATURE_NAMES};
use crate::models::{Classifier, ModelFamily};

/// Les classifieurs par numéro d'une famille. Case `n - 1` vide : aucune donnée
/// d'entraînement pour `n`, pas de prédiction possible pour ce numéro.
pub struct TrainedEnsemble {
    family_name: String,
    classifiers: [Option<Box<dyn Classifier>>; POOL_SIZE],
    feature_schema: Vec<String>,
}

impl TrainedEnsemble {
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn feature_schema(&self) -> &[String] {
        &self.feature_schema
    }

    pub fn classifier(&self, number: u8) -> Option<&dyn Classifier> {
        let idx = (number as usize).checked_sub(1)?;
        self.classifiers.get(idx)?.as_deref()
    }

    pub fn trained_numbers(&self) -> Vec<u8> {
        (1..=POOL_SIZE as u8)
            .filter(|&n| self.classifier(n).is_some())
            .collect()
    }

    /// P(numéro tiré | features), ou None sans classifieur pour ce numéro.
    pub fn probability(&self, features: &FeatureVector) -> Option<f64> {
        let classifier = self.classifier(features.number)?;
        let p = classifier.predict_probability(&features.values());
        Some(if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 })
    }
}

impl std::fmt::Debug for TrainedEnsemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainedEnsemble")
            .field("family_name", &self.family_name)
            .field("trained_numbers", &self.trained_numbers().len())
            .field("feature_schema", &self.feature_schema)
            .finish()
    }
}

/// Entraîne un classifieur neuf de `family` pour chaque numéro ayant des lignes.
/// Les numéros sont indépendants et entraînés en parallèle. Le premier échec
/// (par numéro croissant) interrompt la famille.
pub fn train(dataset: &TrainingDataset, family: &dyn ModelFamily) -> Result<TrainedEnsemble, EnsembleError> {
    let groups = dataset.partition_by_number();
    log::info!("Entraînement {} : {} lignes", family.name(), dataset.len());

    let results: Vec<(u8, Result<Option<Box<dyn Classifier>>, TrainingError>)> = groups
        .par_iter()
        .enumerate()
        .map(|(idx, rows)| {
            let number = (idx + 1) as u8;
            if rows.is_empty() {
                return (number, Ok(None));
            }
            let (x, y) = to_matrix(rows);
            let mut classifier = family.instantiate();
            (number, classifier.fit(&x, &y).map(|_| Some(classifier)))
        })
        .collect();

    let mut classifiers: [Option<Box<dyn Classifier>>; POOL_SIZE] = std::array::from_fn(|_| None);
    for (number, result) in results {
        match result {
            Ok(Some(classifier)) => classifiers[number as usize - 1] = Some(classifier),
            Ok(None) => log::debug!("{} : numéro {} sans données, ignoré", family.name(), number),
            Err(source) => {
                return Err(EnsembleError::ClassifierTraining {
                    family: family.name().to_string(),
                    number,
                    source,
                });
            }
        }
    }

    Ok(TrainedEnsemble {
        family_name: family.name().to_string(),
        classifiers,
        feature_schema: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
    })
}

fn to_matrix(rows: &[&FeatureVector]) -> (Array2<f64>, Array1<f64>) {
    let mut x = Array2::<f64>::zeros((rows.len(), FEATURE_COUNT));
    let mut y = Array1::<f64>::zeros(rows.len());
    for (i, row) in rows.iter().enumerate() {
        for (j, v) in row.values().into_iter().enumerate() {
            x[[i, j]] = v;
        }
        y[i] = if row.label == Some(true) { 1.0 } else { 0.0 };
    }
    (x, y)
}
