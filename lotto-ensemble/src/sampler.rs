use chrono::Datelike;
use rand::prelude::*;

use lotto_db::models::{PICK_COUNT, POOL_SIZE};
use crate::config::ShortSetPolicy;
use crate::ensemble::TrainedEnsemble;
use crate::features::FeatureMap;

/// Génère un seed déterministe basé sur la date du jour (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

/// (numéro, probabilité) pour chaque numéro ayant à la fois un classifieur et
/// une ligne de features. Les autres ne sont pas candidats.
pub fn score_candidates(ensemble: &TrainedEnsemble, features: &FeatureMap) -> Vec<(u8, f64)> {
    features
        .iter()
        .filter_map(|(&number, fv)| ensemble.probability(fv).map(|p| (number, p)))
        .collect()
}

/// Les 6 meilleures probabilités, triées par numéro. Égalités : ordre des candidats.
pub fn deterministic_set(candidates: &[(u8, f64)]) -> Vec<u8> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let mut set: Vec<u8> = sorted.iter().take(PICK_COUNT).map(|&(n, _)| n).collect();
    set.sort();
    set
}

/// Tirage pondéré sans remise de 6 numéros. Si le poids restant tombe à zéro ou
/// si le pool s'épuise, la grille est courte et `policy` décide du complément.
pub fn weighted_set<R: Rng + ?Sized>(candidates: &[(u8, f64)], policy: ShortSetPolicy, rng: &mut R) -> Vec<u8> {
    let mut pool: Vec<(u8, f64)> = candidates.to_vec();
    let mut picks = Vec::with_capacity(PICK_COUNT);

    while picks.len() < PICK_COUNT && !pool.is_empty() {
        let total: f64 = pool.iter().map(|&(_, w)| w).sum();
        if total.is_nan() || total <= 0.0 {
            break;
        }
        let idx = pick_index(&pool, rng.random::<f64>() * total);
        let (number, _) = pool.remove(idx);
        picks.push(number);
    }

    complete(&mut picks, policy, rng);
    picks.sort();
    picks
}

/// Balaye le pool en soustrayant les poids jusqu'à ce que le reste soit <= 0.
/// Les poids nuls ne sont jamais retenus.
fn pick_index(pool: &[(u8, f64)], target: f64) -> usize {
    let mut remainder = target;
    let mut last_positive = 0;
    for (i, &(_, w)) in pool.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        last_positive = i;
        remainder -= w;
        if remainder <= 0.0 {
            return i;
        }
    }
    // Arrondi flottant : le reste peut rester légèrement positif
    last_positive
}

fn complete<R: Rng + ?Sized>(picks: &mut Vec<u8>, policy: ShortSetPolicy, rng: &mut R) {
    if picks.len() >= PICK_COUNT || policy == ShortSetPolicy::ReturnShort {
        return;
    }
    let mut unselected: Vec<u8> = (1..=POOL_SIZE as u8).filter(|n| !picks.contains(n)).collect();
    unselected.shuffle(rng);
    let missing = PICK_COUNT - picks.len();
    log::debug!("Grille courte : {} numéros complétés au hasard", missing);
    picks.extend(unselected.into_iter().take(missing));
}

/// Première grille déterministe (courte s'il y a moins de 6 candidats), puis
/// `sets_to_generate - 1` grilles tirées, complétées selon `policy`.
pub fn predict<R: Rng + ?Sized>(
    ensemble: &TrainedEnsemble,
    features: &FeatureMap,
    sets_to_generate: usize,
    policy: ShortSetPolicy,
    rng: &mut R,
) -> Vec<Vec<u8>> {
    let candidates = score_candidates(ensemble, features);
    predict_from_candidates(&candidates, sets_to_generate, policy, rng)
}

pub fn predict_from_candidates<R: Rng + ?Sized>(
    candidates: &[(u8, f64)],
    sets_to_generate: usize,
    policy: ShortSetPolicy,
    rng: &mut R,
) -> Vec<Vec<u8>> {
    let sets_to_generate = sets_to_generate.max(1);
    let mut sets = Vec::with_capacity(sets_to_generate);

    // Grille déterministe : jamais complétée, elle ne dépend pas du générateur
    sets.push(deterministic_set(candidates));

    for _ in 1..sets_to_generate {
        sets.push(weighted_set(candidates, policy, rng));
    }
    sets
}
