//! Database connection manager backed by a pooled, unencrypted SQLite
//! database. TSIC's specification carries no requirement for at-rest
//! encryption, unlike the SQLCipher-backed store this module is grounded
//! on, so the pool is built directly on `r2d2_sqlite` instead.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::info;
use tsic_domain::{Result, TsicError};

use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Pooled connection handle returned by [`DbManager::get_connection`].
pub type PooledSqlite = PooledConnection<SqliteConnectionManager>;

/// Owns a connection pool against one SQLite database file.
pub struct DbManager {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl DbManager {
    /// Open (creating if absent) the database at `db_path`, with a pool of
    /// at most `pool_size` connections.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
        });

        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager).map_err(|err| {
            TsicError::StoreUnavailable { message: format!("failed to build sqlite pool: {err}") }
        })?;

        info!(db_path = %path.display(), pool_size, "sqlite pool initialised");

        Ok(Self { pool, path })
    }

    /// Acquire a pooled connection.
    pub fn get_connection(&self) -> Result<PooledSqlite> {
        self.pool.get().map_err(|err| TsicError::StoreUnavailable {
            message: format!("failed to acquire pooled connection: {err}"),
        })
    }

    /// Ensure the schema exists (idempotent).
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        create_schema(&conn)?;
        Ok(())
    }

    /// Return the configured database path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cheap connectivity check.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0))
            .map_err(|e| TsicError::from(InfraError::from(e)))?;
        Ok(())
    }
}

/// Convenience alias used by every repository: a shared, clonable handle.
pub type SharedDb = Arc<DbManager>;

fn create_schema(conn: &rusqlite::Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(|e| TsicError::from(InfraError::from(e)))?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, CAST(strftime('%s','now') AS INTEGER))",
        params![SCHEMA_VERSION],
    )
    .map_err(|e| TsicError::from(InfraError::from(e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn migrations_create_schema_version() {
        let dir = TempDir::new().expect("temp dir");
        let manager = DbManager::new(dir.path().join("test.db"), 4).expect("manager");
        manager.run_migrations().expect("migrations");

        let conn = manager.get_connection().expect("connection");
        let version: i32 =
            conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0)).expect("version row");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn health_check_succeeds_for_valid_database() {
        let dir = TempDir::new().expect("temp dir");
        let manager = DbManager::new(dir.path().join("test.db"), 4).expect("manager");
        manager.run_migrations().expect("migrations");
        manager.health_check().expect("health check");
    }
}
