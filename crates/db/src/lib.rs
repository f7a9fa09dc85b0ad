//! SQLite connection factory and migration runner.
//!
//! Modules contribute plain SQL migrations; [`Database::apply_migrations`]
//! runs each one at most once, recording it in the `_migrations` table.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

pub mod error;

pub use error::{StoreError, StoreResult};

/// Migration definition for modules
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY (module, id)
    )
"#;

/// Shared handle to the catalog database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database at `url`, creating the file if needed.
    ///
    /// In-memory URLs are pinned to a single long-lived connection, otherwise
    /// every pooled connection would see its own empty database.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if is_in_memory(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        tracing::info!(target: "libris-db", %url, "database connected");
        Ok(Self { pool })
    }

    /// Private in-memory database, used by tests.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a write transaction.
    pub async fn begin(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Apply `(module, migration)` pairs in the given order, skipping the ones
    /// already recorded. Returns how many were applied.
    pub async fn apply_migrations(&self, migrations: &[(String, Migration)]) -> StoreResult<usize> {
        sqlx::query(MIGRATIONS_TABLE).execute(&self.pool).await?;

        let mut applied = 0;
        for (module, migration) in migrations {
            let already: Option<i64> =
                sqlx::query_scalar("SELECT 1 FROM _migrations WHERE module = ? AND id = ?")
                    .bind(module)
                    .bind(migration.id)
                    .fetch_optional(&self.pool)
                    .await?;
            if already.is_some() {
                tracing::debug!(target: "libris-db", %module, id = migration.id, "migration already applied");
                continue;
            }

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(migration.up)
                .execute(&mut *tx)
                .await
                .map_err(|source| StoreError::Migration {
                    module: module.clone(),
                    id: migration.id.to_string(),
                    source,
                })?;
            sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
                .bind(module)
                .bind(migration.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            tracing::info!(target: "libris-db", %module, id = migration.id, "migration applied");
            applied += 1;
        }

        Ok(applied)
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrations() -> Vec<(String, Migration)> {
        vec![
            (
                "shelf".to_string(),
                Migration {
                    id: "001_init",
                    up: r#"
                        CREATE TABLE shelf (
                            id   INTEGER PRIMARY KEY AUTOINCREMENT,
                            name TEXT NOT NULL
                        );
                        CREATE UNIQUE INDEX shelf_name_unique ON shelf (name);
                    "#,
                },
            ),
            (
                "shelf".to_string(),
                Migration {
                    id: "002_label",
                    up: "ALTER TABLE shelf ADD COLUMN label TEXT;",
                },
            ),
        ]
    }

    #[tokio::test]
    async fn migrations_are_applied_once() {
        let db = Database::in_memory().await.unwrap();

        assert_eq!(db.apply_migrations(&migrations()).await.unwrap(), 2);
        assert_eq!(db.apply_migrations(&migrations()).await.unwrap(), 0);
        db.ping().await.unwrap();
    }

    #[tokio::test]
    async fn unique_index_violation_is_classified() {
        let db = Database::in_memory().await.unwrap();
        db.apply_migrations(&migrations()).await.unwrap();

        sqlx::query("INSERT INTO shelf (name) VALUES ('fiction')")
            .execute(db.pool())
            .await
            .unwrap();
        let err: StoreError = sqlx::query("INSERT INTO shelf (name) VALUES ('fiction')")
            .execute(db.pool())
            .await
            .unwrap_err()
            .into();

        assert!(err.is_unique_violation(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn broken_migration_reports_module_and_id() {
        let db = Database::in_memory().await.unwrap();
        let broken = vec![(
            "shelf".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE;",
            },
        )];

        match db.apply_migrations(&broken).await {
            Err(StoreError::Migration { module, id, .. }) => {
                assert_eq!(module, "shelf");
                assert_eq!(id, "001_broken");
            }
            other => panic!("expected migration error, got {other:?}"),
        }
    }
}
