use anyhow::{Context, Result, bail};
use lotto_db::rusqlite::Connection;
use std::io::{BufRead, BufReader};
use std::path::Path;

use lotto_db::db::insert_draw;
use lotto_db::models::{DrawRecord, PICK_COUNT};

/// `draw_index;date;n1;n2;n3;n4;n5;n6;bonus`
fn parse_record(record: &csv::StringRecord) -> Result<DrawRecord> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let get_u8 = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
    };

    let raw_index = get(0)?;
    let draw_index: u32 = raw_index
        .parse()
        .with_context(|| format!("Numéro de tirage invalide: '{}'", raw_index))?;
    let date = parse_date(&get(1)?)?;

    let mut numbers = [0u8; PICK_COUNT];
    for (k, slot) in numbers.iter_mut().enumerate() {
        *slot = get_u8(2 + k)?;
    }
    let bonus = get_u8(2 + PICK_COUNT)?;

    DrawRecord::new(draw_index, date, numbers, bonus)
}

/// JJ/MM/AAAA ou AAAA-MM-JJ, rendu en AAAA-MM-JJ.
pub fn parse_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.contains('-') {
        let parts: Vec<&str> = raw.split('-').collect();
        if parts.len() == 3 && parts[0].len() == 4 {
            return Ok(raw.to_string());
        }
        bail!("Format de date invalide: '{}'", raw);
    }
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        bail!("Format de date invalide: '{}'", raw);
    }
    Ok(format!("{}-{}-{}", parts[2], parts[1], parts[0]))
}

/// `;` si la première ligne en contient, `,` sinon.
fn detect_delimiter(path: &Path) -> Result<u8> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let mut first = String::new();
    BufReader::new(file).read_line(&mut first)?;
    Ok(if first.contains(';') { b';' } else { b',' })
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(path)?)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        result.total_records += 1;
        match record_result {
            Ok(record) => {
                match parse_record(&record) {
                    Ok(draw) => {
                        match insert_draw(&tx, &draw) {
                            Ok(true) => result.inserted += 1,
                            Ok(false) => result.skipped += 1,
                            Err(e) => {
                                log::warn!("Erreur insertion tirage {}: {:#}", draw.draw_index, e);
                                result.errors += 1;
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("Erreur parsing ligne {}: {:#}", result.total_records, e);
                        result.errors += 1;
                    }
                }
            }
            Err(e) => {
                log::warn!("Erreur lecture ligne {}: {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}
