use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS shop_delta (
    id INTEGER PRIMARY KEY,
    delta TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS shareholder_mapping (
    id INTEGER PRIMARY KEY,
    shop_id TEXT NOT NULL,
    ubo_number INTEGER NOT NULL,
    shareholder_code TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (shop_id, ubo_number)
);

CREATE TABLE IF NOT EXISTS doc_retry (
    id INTEGER PRIMARY KEY,
    doc_id TEXT NOT NULL UNIQUE,
    shop_id TEXT NOT NULL,
    times_failed INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_doc_retry_shop ON doc_retry (shop_id);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}
