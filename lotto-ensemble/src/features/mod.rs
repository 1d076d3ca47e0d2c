pub mod assembler;
pub mod compute;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lotto_db::models::{DrawRecord, POOL_SIZE};
use crate::config::WindowConfig;

pub const FEATURE_NAMES: &[&str] = &[
    "recency",
    "freq_short",
    "freq_mid",
    "freq_total_main",
    "freq_total_bonus",
];

pub const FEATURE_COUNT: usize = 5;

/// Features d'un numéro à un instant donné, calculées uniquement sur les tirages
/// strictement antérieurs. `label` n'existe que pour les lignes d'entraînement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub number: u8,
    pub recency: u32,
    pub freq_short: u32,
    pub freq_mid: u32,
    pub freq_total_main: u32,
    pub freq_total_bonus: u32,
    pub label: Option<bool>,
}

impl FeatureVector {
    /// Colonnes dans l'ordre de FEATURE_NAMES.
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.recency as f64,
            self.freq_short as f64,
            self.freq_mid as f64,
            self.freq_total_main as f64,
            self.freq_total_bonus as f64,
        ]
    }
}

/// Features de prédiction, indexées par numéro.
pub type FeatureMap = BTreeMap<u8, FeatureVector>;

#[derive(Debug, Clone)]
pub struct TrainingDataset {
    rows: Vec<FeatureVector>,
    windows: WindowConfig,
}

impl TrainingDataset {
    pub fn new(rows: Vec<FeatureVector>, windows: WindowConfig) -> Self {
        Self { rows, windows }
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn windows(&self) -> WindowConfig {
        self.windows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Nombre de tirages cibles couverts (une ligne par numéro et par tirage).
    pub fn target_draws(&self) -> usize {
        self.rows.len() / POOL_SIZE
    }

    /// Découpe en 45 groupes disjoints ; le groupe `n - 1` contient les lignes du numéro `n`.
    pub fn partition_by_number(&self) -> Vec<Vec<&FeatureVector>> {
        let mut groups: Vec<Vec<&FeatureVector>> = vec![Vec::new(); POOL_SIZE];
        for row in &self.rows {
            if let Some(group) = (row.number as usize).checked_sub(1).and_then(|i| groups.get_mut(i)) {
                group.push(row);
            }
        }
        groups
    }
}

/// Features de prédiction pour le tirage suivant la fin de `history`.
pub fn current_features(history: &[DrawRecord], windows: &WindowConfig) -> FeatureMap {
    (1..=POOL_SIZE as u8)
        .map(|number| (number, compute::compute_features(number, history, windows)))
        .collect()
}

/// Historique synthétique déterministe (ordre chronologique).
/// Le tirage `i` contient 6 numéros consécutifs à partir de `6i mod 45` :
/// sur 15 tirages chaque numéro sort exactement deux fois.
pub fn make_test_history(n: usize) -> Vec<DrawRecord> {
    (0..n)
        .map(|i| {
            let base = (i * 6) % POOL_SIZE;
            let mut numbers = [0u8; 6];
            for (k, slot) in numbers.iter_mut().enumerate() {
                *slot = ((base + k) % POOL_SIZE + 1) as u8;
            }
            numbers.sort();
            let bonus = ((base + 6) % POOL_SIZE + 1) as u8;
            DrawRecord {
                draw_index: i as u32 + 1,
                date: format!("2024-{:02}-{:02}", (i / 28) % 12 + 1, (i % 28) + 1),
                numbers,
                bonus,
            }
        })
        .collect()
}
