use sqlx::{migrate::MigrateDatabase, Pool, Sqlite, SqlitePool};
use std::path::PathBuf;
use tracing::info;

use crate::error::{GrantError, Result};

/// Configuration for the grant database.
#[derive(Debug, Clone)]
pub struct GrantDatabaseConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
}

impl Default for GrantDatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/portals_grants.db"),
            max_connections: 5,
        }
    }
}

/// Connection pool over the grant store. Migrations run at connect
/// time; the `(user_id, player_id)` uniqueness that upsert relies on
/// is declared here, at the store level.
#[derive(Debug, Clone)]
pub struct GrantDatabase {
    pool: Pool<Sqlite>,
}

impl GrantDatabase {
    pub async fn new(config: GrantDatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite:{}", config.database_path.display());

        if !Sqlite::database_exists(&db_url).await.unwrap_or(false) {
            info!(
                "Creating grant database at: {}",
                config.database_path.display()
            );
            Sqlite::create_database(&db_url).await.map_err(|e| {
                GrantError::Initialization(format!("Failed to create database: {}", e))
            })?;
        }

        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(
                sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(&config.database_path)
                    .create_if_missing(true),
            )
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        info!("Grant database initialized");

        Ok(db)
    }

    /// In-memory database, mainly for tests.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        info!("Running grant database migrations");

        // Local mirror of identity-provider users. Rows may be created
        // as placeholders (by phone) before the user ever logs in.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                external_id TEXT NOT NULL UNIQUE,
                phone_number TEXT NOT NULL UNIQUE,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS player_grants (
                user_id TEXT NOT NULL,
                player_id TEXT NOT NULL,
                player_name TEXT NOT NULL,
                access_level TEXT NOT NULL,
                granted_by TEXT NOT NULL,
                granted_at TIMESTAMP NOT NULL,
                expires_at TIMESTAMP,
                notes TEXT,
                PRIMARY KEY (user_id, player_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_player_grants_player ON player_grants(player_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_player_grants_expiry ON player_grants(expires_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_phone ON users(phone_number)")
            .execute(&self.pool)
            .await?;

        info!("Grant database migrations completed");

        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Liveness probe for the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
        info!("Grant database connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let config = GrantDatabaseConfig {
            database_path: temp_dir.path().join("test_grants.db"),
            max_connections: 5,
        };

        let db = GrantDatabase::new(config.clone()).await.unwrap();

        assert!(config.database_path.exists());
        db.ping().await.unwrap();

        for table in ["users", "player_grants"] {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
            )
            .bind(table)
            .fetch_one(db.pool())
            .await
            .unwrap();
            assert!(exists, "missing table: {}", table);
        }

        db.close().await;
    }

    #[tokio::test]
    async fn test_duplicate_grant_rows_rejected_by_schema() {
        let db = GrantDatabase::in_memory().await.unwrap();

        sqlx::query("INSERT INTO users (id, external_id, phone_number) VALUES ('u1', 'x1', '+1555')")
            .execute(db.pool())
            .await
            .unwrap();

        let insert = "INSERT INTO player_grants \
                      (user_id, player_id, player_name, access_level, granted_by, granted_at) \
                      VALUES ('u1', 'p1', 'Lobby', 'view', 'admin', CURRENT_TIMESTAMP)";

        sqlx::query(insert).execute(db.pool()).await.unwrap();
        assert!(sqlx::query(insert).execute(db.pool()).await.is_err());
    }
}
