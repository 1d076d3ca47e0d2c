use lotto_db::models::{DrawRecord, POOL_SIZE};

use super::FeatureVector;
use crate::config::WindowConfig;

/// Features du numéro `number` au vu de `cumulative` (ordre chronologique, le
/// dernier élément est le tirage le plus récent). Les fenêtres courte et moyenne
/// sont les queues de l'historique. Fonction pure.
pub fn compute_features(number: u8, cumulative: &[DrawRecord], windows: &WindowConfig) -> FeatureVector {
    let totals = (main_count(number, cumulative), bonus_count(number, cumulative));
    window_features(number, cumulative, windows, totals)
}

/// Variante d'entraînement : `target` est le tirage à prédire, il ne doit pas
/// faire partie de `cumulative`.
pub fn compute_labeled_features(
    number: u8,
    cumulative: &[DrawRecord],
    windows: &WindowConfig,
    target: &DrawRecord,
) -> FeatureVector {
    FeatureVector {
        label: Some(target.contains(number)),
        ..compute_features(number, cumulative, windows)
    }
}

/// Compteurs cumulés (principal, bonus) tenus à jour tirage par tirage.
/// Doit toujours donner les mêmes totaux qu'un recomptage complet.
#[derive(Debug, Clone)]
pub struct CumulativeCounts {
    main: [u32; POOL_SIZE],
    bonus: [u32; POOL_SIZE],
    draws: usize,
}

impl Default for CumulativeCounts {
    fn default() -> Self {
        Self { main: [0; POOL_SIZE], bonus: [0; POOL_SIZE], draws: 0 }
    }
}

impl CumulativeCounts {
    pub fn from_history(history: &[DrawRecord]) -> Self {
        let mut counts = Self::default();
        for draw in history {
            counts.push(draw);
        }
        counts
    }

    pub fn push(&mut self, draw: &DrawRecord) {
        for &n in &draw.numbers {
            if let Some(slot) = (n as usize).checked_sub(1).and_then(|i| self.main.get_mut(i)) {
                *slot += 1;
            }
        }
        if let Some(slot) = (draw.bonus as usize).checked_sub(1).and_then(|i| self.bonus.get_mut(i)) {
            *slot += 1;
        }
        self.draws += 1;
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    /// (principal, bonus) ; (0, 0) hors de 1..=45.
    pub fn totals(&self, number: u8) -> (u32, u32) {
        let Some(idx) = (number as usize).checked_sub(1).filter(|&i| i < POOL_SIZE) else {
            return (0, 0);
        };
        (self.main[idx], self.bonus[idx])
    }
}

/// Calcul des features à partir de totaux déjà connus pour `cumulative`.
pub(crate) fn window_features(
    number: u8,
    cumulative: &[DrawRecord],
    windows: &WindowConfig,
    (freq_total_main, freq_total_bonus): (u32, u32),
) -> FeatureVector {
    let short = tail(cumulative, windows.short);
    let mid = tail(cumulative, windows.mid);

    FeatureVector {
        number,
        recency: recency(number, mid),
        freq_short: main_count(number, short),
        freq_mid: main_count(number, mid),
        freq_total_main,
        freq_total_bonus,
        label: None,
    }
}

fn tail(history: &[DrawRecord], window: usize) -> &[DrawRecord] {
    &history[history.len().saturating_sub(window)..]
}

/// Tirages écoulés depuis la dernière sortie (0 = tirage le plus récent).
/// Vaut la taille de la fenêtre si le numéro n'y figure pas.
fn recency(number: u8, window: &[DrawRecord]) -> u32 {
    window
        .iter()
        .rev()
        .position(|d| d.contains(number))
        .unwrap_or(window.len()) as u32
}

fn main_count(number: u8, draws: &[DrawRecord]) -> u32 {
    draws.iter().filter(|d| d.contains(number)).count() as u32
}

fn bonus_count(number: u8, draws: &[DrawRecord]) -> u32 {
    draws.iter().filter(|d| d.is_bonus(number)).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::make_test_history;

    fn draw(index: u32, numbers: [u8; 6], bonus: u8) -> DrawRecord {
        DrawRecord::new(index, "", numbers, bonus).unwrap()
    }

    /// 49 tirages : 1 sort à chaque fois, 2 jamais, 3 toujours en bonus,
    /// 4 une seule fois au tirage 45.
    fn scenario_history() -> Vec<DrawRecord> {
        (1..=49)
            .map(|i| {
                let numbers = if i == 45 { [1, 10, 11, 12, 13, 4] } else { [1, 10, 11, 12, 13, 14] };
                draw(i, numbers, 3)
            })
            .collect()
    }

    #[test]
    fn test_always_drawn_number() {
        let history = scenario_history();
        let fv = compute_features(1, &history, &WindowConfig::default());
        assert_eq!(fv.recency, 0);
        assert_eq!(fv.freq_short, 10);
        assert_eq!(fv.freq_mid, 25);
        assert_eq!(fv.freq_total_main, 49);
        assert_eq!(fv.freq_total_bonus, 0);
        assert_eq!(fv.label, None);
    }

    #[test]
    fn test_never_drawn_number() {
        let history = scenario_history();
        let fv = compute_features(2, &history, &WindowConfig::default());
        assert_eq!(fv.recency, 25);
        assert_eq!(fv.freq_short, 0);
        assert_eq!(fv.freq_mid, 0);
        assert_eq!(fv.freq_total_main, 0);
    }

    #[test]
    fn test_bonus_only_number() {
        let history = scenario_history();
        let fv = compute_features(3, &history, &WindowConfig::default());
        assert_eq!(fv.freq_total_main, 0);
        assert_eq!(fv.freq_total_bonus, 49);
    }

    #[test]
    fn test_recency_counts_back_from_latest() {
        // 49, 48, 47, 46 sans le 4, puis 45 avec
        let history = scenario_history();
        let fv = compute_features(4, &history, &WindowConfig::default());
        assert_eq!(fv.recency, 4);
        assert_eq!(fv.freq_short, 1);
        assert_eq!(fv.freq_total_main, 1);
    }

    #[test]
    fn test_short_history_sentinel() {
        let history = scenario_history();
        let fv = compute_features(2, &history[..7], &WindowConfig::default());
        assert_eq!(fv.recency, 7);
        let fv = compute_features(2, &[], &WindowConfig::default());
        assert_eq!(fv.recency, 0);
        assert_eq!(fv.freq_total_main, 0);
    }

    #[test]
    fn test_labeled_variant() {
        let history = scenario_history();
        let target = draw(50, [2, 10, 11, 12, 13, 14], 3);
        let windows = WindowConfig::default();

        let fv = compute_labeled_features(2, &history, &windows, &target);
        assert_eq!(fv.label, Some(true));
        assert_eq!(fv.recency, 25, "le tirage cible ne doit pas entrer dans les features");

        let fv = compute_labeled_features(1, &history, &windows, &target);
        assert_eq!(fv.label, Some(false));
    }

    #[test]
    fn test_window_bounds() {
        let history = make_test_history(80);
        let windows = WindowConfig::default();
        for end in 0..=history.len() {
            let past = &history[..end];
            let mid_len = past.len().min(windows.mid) as u32;
            for number in 1..=POOL_SIZE as u8 {
                let fv = compute_features(number, past, &windows);
                assert!(fv.recency <= mid_len);
                assert!(fv.freq_short as usize <= windows.short);
                assert!(fv.freq_mid as usize <= windows.mid);
                let in_mid = tail(past, windows.mid).iter().any(|d| d.contains(number));
                assert_eq!(fv.recency == mid_len, !in_mid, "numéro {} fin {}", number, end);
            }
        }
    }

    #[test]
    fn test_pure_function() {
        let history = make_test_history(50);
        let windows = WindowConfig::default();
        for number in 1..=POOL_SIZE as u8 {
            assert_eq!(
                compute_features(number, &history, &windows),
                compute_features(number, &history, &windows)
            );
        }
    }

    #[test]
    fn test_totals_out_of_pool() {
        let counts = CumulativeCounts::from_history(&make_test_history(20));
        assert_eq!(counts.totals(0), (0, 0));
        assert_eq!(counts.totals(46), (0, 0));
        assert_eq!(counts.totals(255), (0, 0));
        assert_ne!(counts.totals(1), (0, 0));
    }

    #[test]
    fn test_incremental_counts_match_recount() {
        let history = make_test_history(70);
        let windows = WindowConfig::default();
        let mut counts = CumulativeCounts::default();
        for end in 0..history.len() {
            let past = &history[..end];
            for number in 1..=POOL_SIZE as u8 {
                let incremental = window_features(number, past, &windows, counts.totals(number));
                assert_eq!(incremental, compute_features(number, past, &windows));
            }
            counts.push(&history[end]);
        }
        assert_eq!(counts.draws(), 70);
        let rebuilt = CumulativeCounts::from_history(&history);
        assert_eq!(rebuilt.totals(5), counts.totals(5));
    }
}
