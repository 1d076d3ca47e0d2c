use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use lotto_db::db;
use lotto_db::models::DrawRecord;
use crate::backtest::{self, BacktestReport, ModelScore};
use crate::champion::{self, SelectionPolicy};
use crate::config::{PipelineConfig, ShortSetPolicy};
use crate::ensemble::{self, TrainedEnsemble};
use crate::error::EnsembleError;
use crate::features::{self, assembler, FeatureMap};
use crate::models::ModelFamily;
use crate::sampler;

/// Fournit l'historique complet, trié par `draw_index` croissant.
pub trait HistorySource: Send + Sync {
    fn fetch_history(&self) -> Result<Vec<DrawRecord>, EnsembleError>;
}

impl HistorySource for Vec<DrawRecord> {
    fn fetch_history(&self) -> Result<Vec<DrawRecord>, EnsembleError> {
        Ok(self.clone())
    }
}

/// Historique lu dans la base SQLite de `lotto-db`.
pub struct SqliteHistory {
    path: PathBuf,
}

impl SqliteHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> anyhow::Result<Vec<DrawRecord>> {
        let conn = db::open_db(&self.path)?;
        db::migrate(&conn)?;
        db::fetch_history(&conn)
    }
}

impl HistorySource for SqliteHistory {
    fn fetch_history(&self) -> Result<Vec<DrawRecord>, EnsembleError> {
        self.read().map_err(|e| EnsembleError::History(format!("{e:#}")))
    }
}

/// État publié après un réentraînement réussi. Immuable : les lecteurs
/// partagent l'`Arc` sans verrou.
#[derive(Debug)]
pub struct PredictionSnapshot {
    pub last_draw_index: u32,
    pub history_len: usize,
    pub champion_rank: ModelScore,
    pub champion_wins: ModelScore,
    ensemble_rank: Arc<TrainedEnsemble>,
    ensemble_wins: Arc<TrainedEnsemble>,
    /// Features du prochain tirage, calculées sur tout l'historique.
    pub features: FeatureMap,
    pub backtest: BacktestReport,
    pub short_set_policy: ShortSetPolicy,
    pub trained_at: DateTime<Local>,
}

impl PredictionSnapshot {
    pub fn champion(&self, policy: SelectionPolicy) -> &ModelScore {
        match policy {
            SelectionPolicy::BestRankFirst => &self.champion_rank,
            SelectionPolicy::MostWinsFirst => &self.champion_wins,
        }
    }

    /// Ensemble du champion réentraîné sur l'historique complet.
    pub fn ensemble(&self, policy: SelectionPolicy) -> &TrainedEnsemble {
        match policy {
            SelectionPolicy::BestRankFirst => &self.ensemble_rank,
            SelectionPolicy::MostWinsFirst => &self.ensemble_wins,
        }
    }

    pub fn predict<R: Rng + ?Sized>(&self, policy: SelectionPolicy, sets: usize, rng: &mut R) -> Vec<Vec<u8>> {
        sampler::predict(self.ensemble(policy), &self.features, sets, self.short_set_policy, rng)
    }
}

/// Emplacement de l'état courant. `publish` remplace l'instantané d'un bloc ;
/// un lecteur voit l'ancien ou le nouveau, jamais un mélange.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<PredictionSnapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<PredictionSnapshot>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn publish(&self, snapshot: PredictionSnapshot) -> Arc<PredictionSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(Arc::clone(&snapshot));
        snapshot
    }
}

pub struct Retrainer<S: HistorySource> {
    source: S,
    config: PipelineConfig,
    families: Vec<Box<dyn ModelFamily>>,
    store: Arc<SnapshotStore>,
}

impl<S: HistorySource> Retrainer<S> {
    pub fn new(source: S, config: PipelineConfig) -> Result<Self, EnsembleError> {
        Self::with_store(source, config, Arc::new(SnapshotStore::new()))
    }

    pub fn with_store(source: S, config: PipelineConfig, store: Arc<SnapshotStore>) -> Result<Self, EnsembleError> {
        config.validate()?;
        let families = config.build_families();
        Ok(Self {
            source,
            config,
            families,
            store,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// Cycle complet, seed de la configuration (ou du jour). Rien n'est publié
    /// en cas d'erreur : l'instantané précédent reste courant.
    pub fn retrain(&self) -> Result<Arc<PredictionSnapshot>, EnsembleError> {
        let mut rng = StdRng::seed_from_u64(self.config.effective_seed());
        self.retrain_with(&mut rng)
    }

    pub fn retrain_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Arc<PredictionSnapshot>, EnsembleError> {
        let snapshot = self.build_snapshot(rng)?;
        log::info!(
            "Instantané publié : tirage {}, champions {} / {}",
            snapshot.last_draw_index,
            snapshot.champion_rank.family_name,
            snapshot.champion_wins.family_name
        );
        Ok(self.store.publish(snapshot))
    }

    fn build_snapshot<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PredictionSnapshot, EnsembleError> {
        let history = self.source.fetch_history()?;
        let required = self.config.min_history();
        let Some(last) = history.last() else {
            return Err(EnsembleError::InsufficientHistory { draws: 0, required });
        };
        if history.len() < required {
            return Err(EnsembleError::InsufficientHistory {
                draws: history.len(),
                required,
            });
        }
        let last_draw_index = last.draw_index;

        let outcome = backtest::evaluate(
            &history,
            &self.families,
            &self.config.windows,
            self.config.trials_per_family,
            self.config.short_set_policy,
            rng,
        )?;

        let scores = outcome.scores();
        let champion_rank = champion::select(&scores, SelectionPolicy::BestRankFirst)?.clone();
        let champion_wins = champion::select(&scores, SelectionPolicy::MostWinsFirst)?.clone();

        let future = self.train_champions(
            &history,
            &[champion_rank.family_name.as_str(), champion_wins.family_name.as_str()],
        )?;
        let ensemble_rank = take_ensemble(&future, &champion_rank.family_name)?;
        let ensemble_wins = take_ensemble(&future, &champion_wins.family_name)?;

        Ok(PredictionSnapshot {
            last_draw_index,
            history_len: history.len(),
            champion_rank,
            champion_wins,
            ensemble_rank,
            ensemble_wins,
            features: features::current_features(&history, &self.config.windows),
            backtest: outcome.report,
            short_set_policy: self.config.short_set_policy,
            trained_at: Local::now(),
        })
    }

    /// Réentraîne les champions sur tout l'historique, une seule fois par famille.
    fn train_champions(
        &self,
        history: &[DrawRecord],
        names: &[&str],
    ) -> Result<BTreeMap<String, Arc<TrainedEnsemble>>, EnsembleError> {
        let dataset = assembler::build_checked(history, &self.config.windows)?;

        let unique: BTreeSet<&str> = names.iter().copied().collect();
        let mut selected: Vec<&dyn ModelFamily> = Vec::with_capacity(unique.len());
        for name in unique {
            let family = self
                .families
                .iter()
                .find(|f| f.name() == name)
                .ok_or_else(|| EnsembleError::UnknownFamily(name.to_string()))?;
            selected.push(family.as_ref());
        }

        log::info!("Réentraînement sur {} tirages : {} famille(s)", history.len(), selected.len());

        let trained: Vec<Result<TrainedEnsemble, EnsembleError>> = selected
            .par_iter()
            .map(|family| ensemble::train(&dataset, *family))
            .collect();

        let mut out = BTreeMap::new();
        for result in trained {
            let e = result?;
            out.insert(e.family_name().to_string(), Arc::new(e));
        }
        Ok(out)
    }
}

fn take_ensemble(
    trained: &BTreeMap<String, Arc<TrainedEnsemble>>,
    name: &str,
) -> Result<Arc<TrainedEnsemble>, EnsembleError> {
    trained
        .get(name)
        .cloned()
        .ok_or_else(|| EnsembleError::UnknownFamily(name.to_string()))
}
