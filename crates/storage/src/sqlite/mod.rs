use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqliteConnection, SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{CategoryRepository, PackRepository, Storage};

mod category_repo;
mod mapping;
mod migrate;
mod pack_repo;

/// Run on every pooled connection. Packs point at categories and questions
/// point at packs, so foreign keys must be on for the cascades and the
/// dangling-category check to work.
const CONNECTION_PRAGMAS: [&str; 2] = ["PRAGMA foreign_keys = ON;", "PRAGMA busy_timeout = 5000;"];

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Pack and category store on a `SQLite` pool. Cloning shares the pool.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

async fn apply_pragmas(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for pragma in CONNECTION_PRAGMAS {
        sqlx::query(pragma).execute(&mut *conn).await?;
    }
    Ok(())
}

impl SqliteRepository {
    /// Open a pool on `database_url` without touching the schema.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if no connection can be opened or a
    /// connection pragma is rejected.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .after_connect(|conn, _meta| Box::pin(apply_pragmas(conn)))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Connect and bring the quiz schema up to date.
    ///
    /// # Errors
    ///
    /// See [`SqliteRepository::connect`] and [`SqliteRepository::migrate`].
    pub async fn open(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the `categories`, `packs` and `questions` tables that are
    /// missing. Already applied versions in `schema_migrations` are skipped,
    /// so running this on every start is fine.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if a migration statement fails; the failed
    /// version is rolled back.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }

    /// Both repository handles over this one pool.
    #[must_use]
    pub fn into_storage(self) -> Storage {
        let categories: Arc<dyn CategoryRepository> = Arc::new(self.clone());
        let packs: Arc<dyn PackRepository> = Arc::new(self);
        Storage { packs, categories }
    }
}

impl Storage {
    /// Packs and categories persisted in the `SQLite` database at
    /// `database_url`, with the schema migrated.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or migrated.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        Ok(SqliteRepository::open(database_url).await?.into_storage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[tokio::test]
    async fn every_connection_enforces_foreign_keys() {
        let repo = SqliteRepository::connect("sqlite:file:memdb_pragmas?mode=memory&cache=shared")
            .await
            .expect("connect");
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys;")
            .fetch_one(repo.pool())
            .await
            .expect("read pragma");
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn open_is_repeatable() {
        let url = "sqlite:file:memdb_open_twice?mode=memory&cache=shared";
        let first = SqliteRepository::open(url).await.expect("first open");
        SqliteRepository::open(url).await.expect("second open");
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name IN ('categories', 'packs', 'questions')",
        )
        .fetch_one(first.pool())
        .await
        .expect("count tables");
        assert_eq!(tables, 3);
    }
}
