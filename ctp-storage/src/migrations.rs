//! Schema versioning via a dedicated `ctp_schema_version` table (one row),
//! immune to any future retention/cleanup pass against the domain tables.

use rusqlite::Connection;
use tracing::info;

use ctp_core::errors::StorageError;

use crate::schema::SCHEMA_V1;

pub const CURRENT_VERSION: u32 = 1;

pub fn get_schema_version(conn: &Connection) -> Result<u32, StorageError> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='ctp_schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    match conn.query_row("SELECT version FROM ctp_schema_version LIMIT 1", [], |row| {
        row.get::<_, u32>(0)
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: u32) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS ctp_schema_version (version INTEGER NOT NULL);",
    )?;
    conn.execute("DELETE FROM ctp_schema_version", [])?;
    conn.execute(
        "INSERT INTO ctp_schema_version (version) VALUES (?1)",
        rusqlite::params![version],
    )?;
    Ok(())
}

/// Run all pending migrations, returning the version the database ends at.
/// Idempotent: calling this on an already-current database is a no-op.
pub fn migrate(conn: &Connection) -> Result<u32, StorageError> {
    let current = get_schema_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(current);
    }

    if current < 1 {
        info!("migrating ctp schema: 0 -> 1 (initial tables)");
        conn.execute_batch(SCHEMA_V1)?;
        set_schema_version(conn, 1)?;
    }

    // Future migrations append here, each gated on `current < N`.

    let final_version = get_schema_version(conn)?;
    info!(from = current, to = final_version, "schema migration complete");
    Ok(final_version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pragmas::configure_connection;

    fn fresh_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();
        conn
    }

    #[test]
    fn fresh_db_version_is_zero() {
        let conn = fresh_db();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn migrate_creates_all_tables() {
        let conn = fresh_db();
        assert_eq!(migrate(&conn).unwrap(), 1);
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        // 8 domain tables + ctp_schema_version
        assert_eq!(count, 9);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = fresh_db();
        let v1 = migrate(&conn).unwrap();
        let v2 = migrate(&conn).unwrap();
        assert_eq!(v1, v2);
    }
}
