use lotto_db::models::{DrawRecord, POOL_SIZE};

use super::compute::{window_features, CumulativeCounts};
use super::{FeatureVector, TrainingDataset};
use crate::config::WindowConfig;
use crate::error::EnsembleError;

/// Fenêtre glissante sur l'historique (ordre chronologique) : pour chaque tirage
/// d'indice `i >= mid`, une ligne étiquetée par numéro, calculée sur `history[..i]`.
/// Vide si l'historique ne dépasse pas la fenêtre moyenne.
pub fn build(history: &[DrawRecord], windows: &WindowConfig) -> TrainingDataset {
    if history.len() <= windows.mid {
        return TrainingDataset::new(Vec::new(), *windows);
    }

    let n_targets = history.len() - windows.mid;
    let mut rows = Vec::with_capacity(n_targets * POOL_SIZE);
    let mut counts = CumulativeCounts::from_history(&history[..windows.mid]);

    for i in windows.mid..history.len() {
        let target = &history[i];
        let past = &history[..i];

        for number in 1..=POOL_SIZE as u8 {
            let features = window_features(number, past, windows, counts.totals(number));
            rows.push(FeatureVector {
                label: Some(target.contains(number)),
                ..features
            });
        }

        // Le tirage cible n'entre dans les compteurs qu'après avoir été étiqueté
        counts.push(target);
    }

    TrainingDataset::new(rows, *windows)
}

/// Comme `build`, mais échoue avant tout entraînement si aucune ligne n'est produite.
pub fn build_checked(history: &[DrawRecord], windows: &WindowConfig) -> Result<TrainingDataset, EnsembleError> {
    let dataset = build(history, windows);
    if dataset.is_empty() {
        return Err(EnsembleError::InsufficientHistory {
            draws: history.len(),
            required: windows.mid + 1,
        });
    }
    log::debug!(
        "Jeu d'entraînement : {} lignes sur {} tirages cibles",
        dataset.len(),
        dataset.target_draws()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::compute::compute_labeled_features;
    use crate::features::make_test_history;

    #[test]
    fn test_row_count() {
        let history = make_test_history(60);
        let dataset = build(&history, &WindowConfig::default());
        assert_eq!(dataset.len(), POOL_SIZE * (60 - 25));
        assert_eq!(dataset.target_draws(), 35);
    }

    #[test]
    fn test_partition_by_number() {
        let history = make_test_history(40);
        let dataset = build(&history, &WindowConfig::default());
        let groups = dataset.partition_by_number();

        assert_eq!(groups.len(), POOL_SIZE);
        let total: usize = groups.iter().map(|g| g.len()).sum();
        assert_eq!(total, POOL_SIZE * (40 - 25));
        for (idx, group) in groups.iter().enumerate() {
            assert_eq!(group.len(), 40 - 25);
            assert!(group.iter().all(|row| row.number as usize == idx + 1));
        }
    }

    #[test]
    fn test_too_short_history_is_empty() {
        let history = make_test_history(25);
        assert!(build(&history, &WindowConfig::default()).is_empty());
        assert!(build(&[], &WindowConfig::default()).is_empty());
    }

    #[test]
    fn test_build_checked_fails_fast() {
        let history = make_test_history(20);
        let err = build_checked(&history, &WindowConfig::default()).unwrap_err();
        assert!(matches!(err, EnsembleError::InsufficientHistory { draws: 20, required: 26 }));
    }

    #[test]
    fn test_rows_match_feature_builder() {
        let history = make_test_history(45);
        let windows = WindowConfig::default();
        let dataset = build(&history, &windows);

        // Ordre d'émission stable : tirage cible puis numéro croissant
        for (k, row) in dataset.rows().iter().enumerate() {
            let i = windows.mid + k / POOL_SIZE;
            let number = (k % POOL_SIZE + 1) as u8;
            let expected = compute_labeled_features(number, &history[..i], &windows, &history[i]);
            assert_eq!(*row, expected);
        }
    }

    #[test]
    fn test_labels_match_targets() {
        let history = make_test_history(30);
        let dataset = build(&history, &WindowConfig::default());
        let positives = dataset.rows().iter().filter(|r| r.label == Some(true)).count();
        assert_eq!(positives, 6 * (30 - 25));
    }

    #[test]
    fn test_no_future_leakage() {
        // Modifier le dernier tirage ne change que ses propres étiquettes
        let history = make_test_history(40);
        let mut altered = history.clone();
        let last = altered.len() - 1;
        altered[last] = DrawRecord::new(40, "", [40, 41, 42, 43, 44, 45], 1).unwrap();

        let windows = WindowConfig::default();
        let a = build(&history, &windows);
        let b = build(&altered, &windows);
        for (ra, rb) in a.rows().iter().zip(b.rows()) {
            assert_eq!(ra.values(), rb.values());
        }
    }
}
