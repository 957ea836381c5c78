use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;

use crate::models::Draw;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    sequence_id   INTEGER PRIMARY KEY,
    date          TEXT NOT NULL,
    n1            INTEGER NOT NULL,
    n2            INTEGER NOT NULL,
    n3            INTEGER NOT NULL,
    n4            INTEGER NOT NULL,
    n5            INTEGER NOT NULL
);
";

const SELECT_DRAW: &str = "SELECT sequence_id, date, n1, n2, n3, n4, n5 FROM draws";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotto539.db");
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

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (sequence_id, date, n1, n2, n3, n4, n5)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            draw.sequence_id,
            draw.date,
            draw.numbers[0],
            draw.numbers[1],
            draw.numbers[2],
            draw.numbers[3],
            draw.numbers[4],
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

// Pas de validation ici : c'est `History::new` qui rejette un historique malformé.
fn row_to_draw(row: &Row<'_>) -> rusqlite::Result<Draw> {
    Ok(Draw {
        sequence_id: row.get(0)?,
        date: row.get(1)?,
        numbers: [
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
        ],
    })
}

/// Tout l'historique, du plus ancien au plus récent.
pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!("{SELECT_DRAW} ORDER BY sequence_id ASC"))?;
    let draws = stmt
        .query_map([], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()
        .context("Échec de la lecture des tirages")?;
    Ok(draws)
}

/// Les `limit` derniers tirages, le plus récent en premier.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!("{SELECT_DRAW} ORDER BY sequence_id DESC LIMIT ?1"))?;
    let draws = stmt
        .query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()
        .context("Échec de la lecture des tirages")?;
    Ok(draws)
}

pub fn last_draw(conn: &Connection) -> Result<Option<Draw>> {
    let draw = conn
        .query_row(&format!("{SELECT_DRAW} ORDER BY sequence_id DESC LIMIT 1"), [], row_to_draw)
        .optional()?;
    Ok(draw)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_draw(id: u32, day: u32, numbers: [u8; 5]) -> Draw {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        Draw::new(id, date, &numbers).unwrap()
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

        insert_draw(&conn, &test_draw(1, 1, [1, 2, 3, 4, 5])).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();

        let inserted = insert_draw(&conn, &test_draw(1, 1, [1, 2, 3, 4, 5])).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, &test_draw(1, 1, [6, 7, 8, 9, 10])).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_fetch_order() {
        let conn = memory_db();

        insert_draw(&conn, &test_draw(1, 1, [1, 2, 3, 4, 5])).unwrap();
        insert_draw(&conn, &test_draw(3, 5, [11, 12, 13, 14, 15])).unwrap();
        insert_draw(&conn, &test_draw(2, 3, [6, 7, 8, 9, 10])).unwrap();

        let all = fetch_all_draws(&conn).unwrap();
        let ids: Vec<u32> = all.iter().map(|d| d.sequence_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let last = fetch_last_draws(&conn, 2).unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].sequence_id, 3);
        assert_eq!(last[1].sequence_id, 2);
    }

    #[test]
    fn test_roundtrip_date_and_numbers() {
        let conn = memory_db();
        let draw = test_draw(7, 9, [39, 1, 20, 5, 11]);
        insert_draw(&conn, &draw).unwrap();

        let fetched = last_draw(&conn).unwrap().unwrap();
        assert_eq!(fetched, draw);
        assert_eq!(fetched.numbers, [1, 5, 11, 20, 39]);
    }

    #[test]
    fn test_last_draw_empty() {
        let conn = memory_db();
        assert!(last_draw(&conn).unwrap().is_none());
    }
}
