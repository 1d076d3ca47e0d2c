use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::models::DrawRecord;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    draw_index  INTEGER PRIMARY KEY,
    date        TEXT NOT NULL DEFAULT '',
    n1          INTEGER NOT NULL,
    n2          INTEGER NOT NULL,
    n3          INTEGER NOT NULL,
    n4          INTEGER NOT NULL,
    n5          INTEGER NOT NULL,
    n6          INTEGER NOT NULL,
    bonus       INTEGER NOT NULL
);
";

const SELECT_COLUMNS: &str = "SELECT draw_index, date, n1, n2, n3, n4, n5, n6, bonus FROM draws";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotto.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

/// Insère un tirage. Retourne false si le numéro de tirage existe déjà.
pub fn insert_draw(conn: &Connection, draw: &DrawRecord) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (draw_index, date, n1, n2, n3, n4, n5, n6, bonus)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            draw.draw_index,
            draw.date,
            draw.numbers[0],
            draw.numbers[1],
            draw.numbers[2],
            draw.numbers[3],
            draw.numbers[4],
            draw.numbers[5],
            draw.bonus,
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

/// Une ligne invalide (doublon, hors 1..=45, bonus parmi les principaux) est une erreur de lecture.
fn row_to_draw(row: &rusqlite::Row<'_>) -> rusqlite::Result<DrawRecord> {
    let numbers = [
        row.get::<_, u8>(2)?,
        row.get::<_, u8>(3)?,
        row.get::<_, u8>(4)?,
        row.get::<_, u8>(5)?,
        row.get::<_, u8>(6)?,
        row.get::<_, u8>(7)?,
    ];
    DrawRecord::new(row.get(0)?, row.get::<_, String>(1)?, numbers, row.get(8)?)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, e.into()))
}

/// Historique complet, du plus ancien au plus récent.
pub fn fetch_history(conn: &Connection) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY draw_index ASC"))?;
    let draws = stmt.query_map([], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()
        .context("Lecture de l'historique impossible")?;
    Ok(draws)
}

/// Les `limit` derniers tirages, le plus récent en premier.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY draw_index DESC LIMIT ?1"))?;
    let draws = stmt.query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

pub fn last_draw_index(conn: &Connection) -> Result<Option<u32>> {
    let last: Option<u32> = conn.query_row("SELECT MAX(draw_index) FROM draws", [], |row| row.get(0))?;
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(index: u32) -> DrawRecord {
        DrawRecord::new(index, format!("2024-01-{:02}", index % 28 + 1), [1, 2, 3, 4, 5, 6], 7).unwrap()
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_count() {
        let conn = memory_db();
        assert_eq!(count_draws(&conn).unwrap(), 0);

        insert_draw(&conn, &test_draw(1)).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();

        assert!(insert_draw(&conn, &test_draw(1)).unwrap());
        assert!(!insert_draw(&conn, &test_draw(1)).unwrap());
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_fetch_history_ascending() {
        let conn = memory_db();
        insert_draw(&conn, &test_draw(3)).unwrap();
        insert_draw(&conn, &test_draw(1)).unwrap();
        insert_draw(&conn, &test_draw(2)).unwrap();

        let history = fetch_history(&conn).unwrap();
        let indices: Vec<u32> = history.iter().map(|d| d.draw_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(history[0], test_draw(1));
    }

    #[test]
    fn test_fetch_last_draws_descending() {
        let conn = memory_db();
        for i in 1..=5 {
            insert_draw(&conn, &test_draw(i)).unwrap();
        }

        let draws = fetch_last_draws(&conn, 2).unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].draw_index, 5);
        assert_eq!(draws[1].draw_index, 4);
    }

    #[test]
    fn test_corrupt_row_rejected_on_read() {
        let conn = memory_db();
        insert_draw(&conn, &test_draw(1)).unwrap();
        // Écriture directe, sans passer par la validation
        conn.execute(
            "INSERT INTO draws VALUES (2, '2024-01-02', 3, 3, 10, 20, 30, 40, 7)",
            [],
        ).unwrap();

        assert!(fetch_history(&conn).is_err());
        assert!(fetch_last_draws(&conn, 1).is_err());
    }

    #[test]
    fn test_out_of_pool_row_rejected_on_read() {
        let conn = memory_db();
        conn.execute(
            "INSERT INTO draws VALUES (1, '2024-01-01', 1, 2, 3, 4, 5, 46, 7)",
            [],
        ).unwrap();
        assert!(fetch_history(&conn).is_err());

        conn.execute("DELETE FROM draws", []).unwrap();
        conn.execute(
            "INSERT INTO draws VALUES (1, '2024-01-01', 1, 2, 3, 4, 5, 6, 6)",
            [],
        ).unwrap();
        assert!(fetch_history(&conn).is_err());
    }

    #[test]
    fn test_last_draw_index() {
        let conn = memory_db();
        assert_eq!(last_draw_index(&conn).unwrap(), None);
        insert_draw(&conn, &test_draw(8)).unwrap();
        insert_draw(&conn, &test_draw(3)).unwrap();
        assert_eq!(last_draw_index(&conn).unwrap(), Some(8));
    }
}
