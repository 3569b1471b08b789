use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::models::RawDraw;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    period   TEXT PRIMARY KEY,
    date     TEXT NOT NULL,
    digit_1  INTEGER NOT NULL CHECK (digit_1 BETWEEN 0 AND 9),
    digit_2  INTEGER NOT NULL CHECK (digit_2 BETWEEN 0 AND 9),
    digit_3  INTEGER NOT NULL CHECK (digit_3 BETWEEN 0 AND 9)
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("fc3d.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Cannot open database {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Migration failed")?;
    Ok(())
}

/// Returns false when the period already exists.
pub fn insert_draw(conn: &Connection, draw: &RawDraw) -> Result<bool> {
    draw.validate()?;
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (period, date, digit_1, digit_2, digit_3)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            draw.period,
            draw.date,
            draw.digits[0],
            draw.digits[1],
            draw.digits[2],
        ],
    ).context("Insert failed")?;
    Ok(changed > 0)
}

fn row_to_draw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDraw> {
    Ok(RawDraw {
        period: row.get(0)?,
        date: row.get(1)?,
        digits: [
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
        ],
    })
}

/// Newest first.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<RawDraw>> {
    let mut stmt = conn.prepare(
        "SELECT period, date, digit_1, digit_2, digit_3
         FROM draws ORDER BY period DESC LIMIT ?1"
    )?;
    let draws = stmt.query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<RawDraw>> {
    let mut stmt = conn.prepare(
        "SELECT period, date, digit_1, digit_2, digit_3
         FROM draws ORDER BY period DESC"
    )?;
    let draws = stmt.query_map([], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    log::debug!("loaded {} draws", draws.len());
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

pub fn latest_period(conn: &Connection) -> Result<Option<String>> {
    let period = conn
        .query_row("SELECT MAX(period) FROM draws", [], |row| row.get::<_, Option<String>>(0))
        .optional()?
        .flatten();
    Ok(period)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(period: &str, digits: [u8; 3]) -> RawDraw {
        RawDraw::new(period, "2024-01-01", digits)
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

        insert_draw(&conn, &test_draw("2024001", [1, 2, 3])).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();

        let inserted = insert_draw(&conn, &test_draw("2024001", [1, 2, 3])).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, &test_draw("2024001", [4, 5, 6])).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_invalid_digit_rejected() {
        let conn = memory_db();
        assert!(insert_draw(&conn, &test_draw("2024001", [1, 12, 3])).is_err());
        assert_eq!(count_draws(&conn).unwrap(), 0);
    }

    #[test]
    fn test_fetch_order() {
        let conn = memory_db();

        insert_draw(&conn, &test_draw("2024001", [1, 1, 1])).unwrap();
        insert_draw(&conn, &test_draw("2024003", [3, 3, 3])).unwrap();
        insert_draw(&conn, &test_draw("2024002", [2, 2, 2])).unwrap();

        let draws = fetch_last_draws(&conn, 10).unwrap();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[0].period, "2024003");
        assert_eq!(draws[1].period, "2024002");
        assert_eq!(draws[2].period, "2024001");

        let limited = fetch_last_draws(&conn, 2).unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[1].digits, [2, 2, 2]);

        assert_eq!(fetch_all_draws(&conn).unwrap().len(), 3);
    }

    #[test]
    fn test_latest_period() {
        let conn = memory_db();
        assert_eq!(latest_period(&conn).unwrap(), None);
        insert_draw(&conn, &test_draw("2024007", [0, 0, 0])).unwrap();
        insert_draw(&conn, &test_draw("2024005", [0, 0, 0])).unwrap();
        assert_eq!(latest_period(&conn).unwrap().as_deref(), Some("2024007"));
    }

    #[test]
    fn test_open_db_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fc3d.db");
        let conn = open_db(&path).unwrap();
        migrate(&conn).unwrap();
        insert_draw(&conn, &test_draw("2024001", [9, 8, 7])).unwrap();
        drop(conn);

        let conn = open_db(&path).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }
}
