use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::EnsembleError;
use crate::models::ModelFamily;
use crate::models::decision_tree::DecisionTreeFamily;
use crate::models::logistic::LogisticFamily;
use crate::models::random_forest::RandomForestFamily;

/// Fenêtres d'observation des features, en nombre de tirages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub short: usize,
    pub mid: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { short: 10, mid: 25 }
    }
}

/// Que faire quand l'échantillonnage pondéré s'arrête avant 6 numéros
/// (poids restant nul ou réservoir épuisé).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ShortSetPolicy {
    /// Retourner la grille incomplète telle quelle.
    #[default]
    ReturnShort,
    /// Compléter par des numéros non tirés choisis uniformément.
    PadUniform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FamilySpec {
    Logistic {
        name: String,
        learning_rate: f64,
        lambda: f64,
        epochs: usize,
    },
    RandomForest {
        name: String,
        n_trees: usize,
        max_depth: usize,
        min_leaf: usize,
        seed: u64,
    },
    DecisionTree {
        name: String,
        max_depth: usize,
        min_leaf: usize,
        pruned: bool,
    },
}

impl FamilySpec {
    pub fn name(&self) -> &str {
        match self {
            FamilySpec::Logistic { name, .. }
            | FamilySpec::RandomForest { name, .. }
            | FamilySpec::DecisionTree { name, .. } => name,
        }
    }

    pub fn build(&self) -> Box<dyn ModelFamily> {
        match self {
            FamilySpec::Logistic { name, learning_rate, lambda, epochs } => {
                Box::new(LogisticFamily::new(name, *learning_rate, *lambda, *epochs))
            }
            FamilySpec::RandomForest { name, n_trees, max_depth, min_leaf, seed } => {
                Box::new(RandomForestFamily::new(name, *n_trees, *max_depth, *min_leaf, *seed))
            }
            FamilySpec::DecisionTree { name, max_depth, min_leaf, pruned } => {
                Box::new(DecisionTreeFamily::new(name, *max_depth, *min_leaf, *pruned))
            }
        }
    }
}

/// Les cinq familles de référence.
pub fn default_families() -> Vec<FamilySpec> {
    vec![
        FamilySpec::Logistic {
            name: "Logistic".to_string(),
            learning_rate: 0.1,
            lambda: 0.001,
            epochs: 300,
        },
        FamilySpec::RandomForest {
            name: "RandomForest_100".to_string(),
            n_trees: 100,
            max_depth: 8,
            min_leaf: 1,
            seed: 42,
        },
        FamilySpec::RandomForest {
            name: "RandomForest_500".to_string(),
            n_trees: 500,
            max_depth: 8,
            min_leaf: 1,
            seed: 42,
        },
        FamilySpec::DecisionTree {
            name: "Tree_Pruned".to_string(),
            max_depth: 6,
            min_leaf: 10,
            pruned: true,
        },
        FamilySpec::DecisionTree {
            name: "Tree_Unpruned".to_string(),
            max_depth: 32,
            min_leaf: 1,
            pruned: false,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub windows: WindowConfig,
    pub trials_per_family: usize,
    pub sets_to_generate: usize,
    #[serde(default)]
    pub short_set_policy: ShortSetPolicy,
    /// Absent : seed du jour (YYYYMMDD).
    #[serde(default)]
    pub seed: Option<u64>,
    pub families: Vec<FamilySpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            windows: WindowConfig::default(),
            trials_per_family: 3,
            sets_to_generate: 5,
            short_set_policy: ShortSetPolicy::default(),
            seed: None,
            families: default_families(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), EnsembleError> {
        let invalid = |msg: String| Err(EnsembleError::InvalidConfig(msg));

        if self.windows.short == 0 {
            return invalid("la fenêtre courte doit être > 0".into());
        }
        if self.windows.short > self.windows.mid {
            return invalid(format!(
                "fenêtre courte ({}) plus grande que la fenêtre moyenne ({})",
                self.windows.short, self.windows.mid
            ));
        }
        if self.trials_per_family == 0 {
            return invalid("trials_per_family doit être >= 1".into());
        }
        if self.sets_to_generate == 0 {
            return invalid("sets_to_generate doit être >= 1".into());
        }
        if self.families.is_empty() {
            return invalid("aucune famille de modèles configurée".into());
        }
        let mut seen = HashSet::new();
        for family in &self.families {
            if !seen.insert(family.name()) {
                return invalid(format!("famille en double : {}", family.name()));
            }
        }
        Ok(())
    }

    pub fn build_families(&self) -> Vec<Box<dyn ModelFamily>> {
        self.families.iter().map(FamilySpec::build).collect()
    }

    /// Nombre minimal de tirages pour un cycle complet : le backtest retire le
    /// dernier tirage et il doit rester au moins une ligne d'entraînement.
    pub fn min_history(&self) -> usize {
        self.windows.mid + 2
    }

    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or_else(crate::sampler::date_seed)
    }
}

pub fn save_config(config: &PipelineConfig, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

pub fn load_config(path: &Path) -> anyhow::Result<PipelineConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let config: PipelineConfig = serde_json::from_str(&json)
        .with_context(|| format!("JSON invalide dans {:?}", path))?;
    config.validate()?;
    Ok(config)
}
