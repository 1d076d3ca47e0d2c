use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use lotto_db::models::{format_numbers, DrawRecord, Rank};
use crate::backtest::{BacktestReport, ModelScore};
use crate::champion::{self, SelectionPolicy};
use crate::features::FeatureMap;
use crate::models::ModelFamily;

fn rank_color(rank: Rank) -> Color {
    match rank {
        Rank::First | Rank::Second => Color::Green,
        Rank::Third | Rank::Fourth => Color::Cyan,
        Rank::Fifth => Color::Yellow,
        Rank::None => Color::Reset,
    }
}

fn draw_str(draw: &DrawRecord) -> String {
    format!("{} + {:2}", format_numbers(&draw.numbers), draw.bonus)
}

pub fn display_backtest(report: &BacktestReport) {
    println!("\n== Backtest sur le tirage {} ({}) ==\n", report.actual.draw_index, report.actual.date);
    println!("Tirage réel : {}\n", draw_str(&report.actual));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Famille", "Essai", "Grille", "Rang"]);

    for family in &report.families {
        for (i, trial) in family.trials.iter().enumerate() {
            let name = if i == 0 { family.family_name.as_str() } else { "" };
            // Essai 1 : grille déterministe
            let label = if i == 0 { "1 (top 6)".to_string() } else { format!("{}", i + 1) };
            let hits: Vec<u8> = trial.numbers.iter().copied().filter(|&n| report.actual.contains(n)).collect();
            table.add_row(vec![
                Cell::new(name),
                Cell::new(label),
                Cell::new(format!("{}  ({} bon(s))", format_numbers(&trial.numbers), hits.len())),
                Cell::new(trial.rank.to_string()).fg(rank_color(trial.rank)),
            ]);
        }
    }
    println!("{table}");

    display_scores(&report.scores());

    if !report.failures.is_empty() {
        println!("\n── Familles écartées ──");
        for failure in &report.failures {
            println!("  {} : {}", failure.family, failure.error);
        }
    }
}

pub fn display_scores(scores: &[ModelScore]) {
    println!("\n── Scores ──");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Famille", "Meilleur rang", "Gains"]);

    for score in champion::rank_all(scores, SelectionPolicy::BestRankFirst) {
        table.add_row(vec![
            Cell::new(&score.family_name),
            Cell::new(score.best_rank.to_string()).fg(rank_color(score.best_rank)),
            Cell::new(score.total_wins),
        ]);
    }
    println!("{table}");
}

pub fn display_champions(by_rank: &ModelScore, by_wins: &ModelScore) {
    println!("\n── Champions ──");
    for (policy, score) in [(SelectionPolicy::BestRankFirst, by_rank), (SelectionPolicy::MostWinsFirst, by_wins)] {
        println!(
            "  {:<14} : {} ({}, {} gain(s))",
            policy.to_string(),
            score.family_name,
            score.best_rank,
            score.total_wins
        );
    }
}

pub fn display_predictions(policy: SelectionPolicy, champion: &ModelScore, sets: &[Vec<u8>]) {
    println!("\n== Grilles : champion {} ({}) ==\n", champion.family_name, policy);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Numéros", "Mode"]);

    for (i, set) in sets.iter().enumerate() {
        let mut numbers = format_numbers(set);
        if set.len() < 6 {
            numbers.push_str("  (incomplète)");
        }
        if i == 0 {
            table.add_row(vec![
                Cell::new(format!("{}", i + 1)).fg(Color::Green),
                Cell::new(&numbers).fg(Color::Green),
                Cell::new("déterministe").fg(Color::Green),
            ]);
        } else {
            table.add_row(vec![
                Cell::new(format!("{}", i + 1)),
                Cell::new(&numbers),
                Cell::new("tirage pondéré"),
            ]);
        }
    }
    println!("{table}");
}

pub fn display_features(features: &FeatureMap, n_draws: usize) {
    println!("\n== Features pour le prochain tirage ({} tirages) ==\n", n_draws);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Numéro", "Retard", "Fréq. courte", "Fréq. moyenne", "Total", "Bonus"]);

    for fv in features.values() {
        // Retard = taille de fenêtre : absent de la fenêtre moyenne
        let recency = if fv.freq_mid == 0 { Cell::new(fv.recency).fg(Color::Red) } else { Cell::new(fv.recency) };
        table.add_row(vec![
            Cell::new(format!("{:2}", fv.number)),
            recency,
            Cell::new(fv.freq_short),
            Cell::new(fv.freq_mid),
            Cell::new(fv.freq_total_main),
            Cell::new(fv.freq_total_bonus),
        ]);
    }
    println!("{table}");
}

pub fn display_families(families: &[Box<dyn ModelFamily>]) {
    println!("\n== Familles de modèles ==\n");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Famille", "Paramètres"]);

    for family in families {
        let mut params: Vec<(String, f64)> = family.params().into_iter().collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));
        let params_str = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![family.name(), params_str.as_str()]);
    }
    println!("{table}");
}
