use rusqlite::Connection;

use crate::db::StoreResult;

pub fn run_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS app_meta (
            key   TEXT PRIMARY KEY,
            value TEXT
        );

        CREATE TABLE IF NOT EXISTS habbit_records (
            id            TEXT PRIMARY KEY,
            habbitId      TEXT NOT NULL,
            requiredValue REAL NOT NULL,
            requiredType  TEXT NOT NULL
                          CHECK(requiredType IN ('minutes','hours','times','liters')),
            actualValue   REAL NOT NULL,
            completedAt   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_records_habit_time
            ON habbit_records(habbitId, completedAt);
    ")?;

    log::debug!("Store schema initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('app_meta', 'habbit_records')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }
}
