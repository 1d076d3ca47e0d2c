use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backtest::ModelScore;
use crate::error::EnsembleError;

/// Critère de départage des familles après backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Meilleur rang d'abord, puis le plus de gains.
    BestRankFirst,
    /// Le plus de gains d'abord, puis le meilleur rang.
    MostWinsFirst,
}

impl SelectionPolicy {
    pub const ALL: [SelectionPolicy; 2] = [SelectionPolicy::BestRankFirst, SelectionPolicy::MostWinsFirst];

    /// Ordre total : `Less` place `a` devant `b`. Égalité parfaite départagée par nom.
    pub fn compare(self, a: &ModelScore, b: &ModelScore) -> Ordering {
        let primary = match self {
            SelectionPolicy::BestRankFirst => a
                .best_rank
                .cmp(&b.best_rank)
                .then_with(|| b.total_wins.cmp(&a.total_wins)),
            SelectionPolicy::MostWinsFirst => b
                .total_wins
                .cmp(&a.total_wins)
                .then_with(|| a.best_rank.cmp(&b.best_rank)),
        };
        primary.then_with(|| a.family_name.cmp(&b.family_name))
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::BestRankFirst => write!(f, "meilleur rang"),
            SelectionPolicy::MostWinsFirst => write!(f, "plus de gains"),
        }
    }
}

pub fn select(scores: &[ModelScore], policy: SelectionPolicy) -> Result<&ModelScore, EnsembleError> {
    scores
        .iter()
        .min_by(|a, b| policy.compare(a, b))
        .ok_or(EnsembleError::NoCandidates)
}

/// Classement complet, champion en tête.
pub fn rank_all(scores: &[ModelScore], policy: SelectionPolicy) -> Vec<&ModelScore> {
    let mut ranked: Vec<&ModelScore> = scores.iter().collect();
    ranked.sort_by(|a, b| policy.compare(a, b));
    ranked
}
