use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;

use lotto_db::models::{DrawRecord, Rank};
use crate::config::{ShortSetPolicy, WindowConfig};
use crate::ensemble::{self, TrainedEnsemble};
use crate::error::{EnsembleError, FamilyFailure};
use crate::features::{self, assembler};
use crate::models::ModelFamily;
use crate::sampler;

/// Résumé des essais d'une famille contre le tirage retenu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelScore {
    pub family_name: String,
    /// Meilleur rang obtenu, `Rank::None` si tous les essais ont perdu.
    pub best_rank: Rank,
    pub total_wins: usize,
}

impl ModelScore {
    pub fn from_ranks(family_name: &str, ranks: &[Rank]) -> Self {
        Self {
            family_name: family_name.to_string(),
            best_rank: ranks.iter().copied().min().unwrap_or(Rank::None),
            total_wins: ranks.iter().filter(|r| r.is_win()).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialResult {
    pub numbers: Vec<u8>,
    pub rank: Rank,
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilyBacktest {
    pub family_name: String,
    pub trials: Vec<TrialResult>,
    pub score: ModelScore,
}

#[derive(Debug)]
pub struct BacktestReport {
    /// Tirage retenu, exclu de l'entraînement.
    pub actual: DrawRecord,
    /// Familles entraînées, dans l'ordre de la configuration.
    pub families: Vec<FamilyBacktest>,
    pub failures: Vec<FamilyFailure>,
}

impl BacktestReport {
    pub fn scores(&self) -> Vec<ModelScore> {
        self.families.iter().map(|f| f.score.clone()).collect()
    }

    pub fn family(&self, name: &str) -> Option<&FamilyBacktest> {
        self.families.iter().find(|f| f.family_name == name)
    }
}

#[derive(Debug)]
pub struct BacktestOutcome {
    pub report: BacktestReport,
    pub trained: BTreeMap<String, Arc<TrainedEnsemble>>,
}

impl BacktestOutcome {
    pub fn scores(&self) -> Vec<ModelScore> {
        self.report.scores()
    }
}

/// Entraîne chaque famille sur l'historique privé de son dernier tirage, puis
/// joue `trials` grilles par famille contre ce tirage.
///
/// Une famille qui échoue est consignée dans `report.failures` sans bloquer les
/// autres. Erreur seulement si l'historique est trop court ou si aucune famille
/// n'a pu être entraînée.
pub fn evaluate<R: Rng + ?Sized>(
    history: &[DrawRecord],
    families: &[Box<dyn ModelFamily>],
    windows: &WindowConfig,
    trials: usize,
    policy: ShortSetPolicy,
    rng: &mut R,
) -> Result<BacktestOutcome, EnsembleError> {
    let Some((actual, past)) = history.split_last() else {
        return Err(EnsembleError::InsufficientHistory {
            draws: 0,
            required: windows.mid + 2,
        });
    };

    let dataset = assembler::build_checked(past, windows).map_err(|_| EnsembleError::InsufficientHistory {
        draws: history.len(),
        required: windows.mid + 2,
    })?;
    let current = features::current_features(past, windows);

    log::info!(
        "Backtest sur le tirage {} : {} familles, {} essais",
        actual.draw_index,
        families.len(),
        trials
    );

    // Familles indépendantes : entraînement parallèle, résultats dans l'ordre du roster
    let trained: Vec<Result<TrainedEnsemble, EnsembleError>> = families
        .par_iter()
        .map(|family| ensemble::train(&dataset, family.as_ref()))
        .collect();

    let mut report = BacktestReport {
        actual: actual.clone(),
        families: Vec::new(),
        failures: Vec::new(),
    };
    let mut ensembles = BTreeMap::new();

    for (family, result) in families.iter().zip(trained) {
        let trained_ensemble = match result {
            Ok(e) => e,
            Err(error) => {
                log::warn!("{} écartée du backtest : {}", family.name(), error);
                report.failures.push(FamilyFailure {
                    family: family.name().to_string(),
                    error,
                });
                continue;
            }
        };

        let sets = sampler::predict(&trained_ensemble, &current, trials, policy, rng);
        let trials: Vec<TrialResult> = sets
            .into_iter()
            .map(|numbers| {
                let rank = Rank::determine(&numbers, actual);
                TrialResult { numbers, rank }
            })
            .collect();
        let ranks: Vec<Rank> = trials.iter().map(|t| t.rank).collect();
        let score = ModelScore::from_ranks(family.name(), &ranks);
        log::debug!("{} : meilleur rang {}, {} gains", score.family_name, score.best_rank, score.total_wins);

        report.families.push(FamilyBacktest {
            family_name: family.name().to_string(),
            trials,
            score,
        });
        ensembles.insert(family.name().to_string(), Arc::new(trained_ensemble));
    }

    if report.families.is_empty() {
        return Err(EnsembleError::NoFamilyTrained {
            attempted: families.len(),
        });
    }

    Ok(BacktestOutcome {
        report,
        trained: ensembles,
    })
}
