use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL};

use lotto_db::models::{format_numbers, DrawRecord};
use crate::import::ImportResult;

pub fn display_draws(draws: &[DrawRecord]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Tirage", "Date", "Numéros", "Bonus"]);

    for draw in draws {
        table.add_row(vec![
            draw.draw_index.to_string(),
            draw.date.clone(),
            format_numbers(&draw.numbers),
            format!("{:2}", draw.bonus),
        ]);
    }

    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {} (RUST_LOG=warn pour le détail)", result.errors);
    }
}
