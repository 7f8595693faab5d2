use std::collections::HashSet;

use sqlx::PgPool;
use tracing::{debug, info, warn};

use docflow_core::error::{DocflowError, Result};

/// Lock ID for the migration advisory lock (arbitrary but consistent).
const MIGRATION_LOCK_ID: i64 = 0x444F43464C4F57; // "DOCFLOW" in hex

/// A single migration.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique name/identifier (e.g., "0000_docflow_internal").
    pub name: String,
    /// SQL to execute.
    pub sql: String,
}

impl Migration {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// Migration runner handling both built-in and deployment migrations.
pub struct MigrationRunner {
    pool: PgPool,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations.
    ///
    /// Acquires an exclusive advisory lock first, so only one node runs
    /// migrations at a time.
    pub async fn run(&self, user_migrations: Vec<Migration>) -> Result<()> {
        self.acquire_lock().await?;

        let result = self.run_migrations_inner(user_migrations).await;

        // Always release the lock, even on error
        if let Err(e) = self.release_lock().await {
            warn!("Failed to release migration lock: {}", e);
        }

        result
    }

    async fn run_migrations_inner(&self, user_migrations: Vec<Migration>) -> Result<()> {
        self.ensure_migrations_table().await?;

        let applied = self.get_applied_migrations().await?;
        debug!("Already applied migrations: {:?}", applied);

        for migration in super::builtin::get_builtin_migrations() {
            if !applied.contains(&migration.name) {
                self.apply_migration(&migration).await?;
            }
        }

        for migration in user_migrations {
            if !applied.contains(&migration.name) {
                self.apply_migration(&migration).await?;
            }
        }

        Ok(())
    }

    async fn acquire_lock(&self) -> Result<()> {
        debug!("Acquiring migration lock...");
        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_ID)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DocflowError::Database(format!("Failed to acquire migration lock: {}", e))
            })?;
        Ok(())
    }

    async fn release_lock(&self) -> Result<()> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_ID)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DocflowError::Database(format!("Failed to release migration lock: {}", e))
            })?;
        Ok(())
    }

    async fn ensure_migrations_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS docflow_migrations (
                id SERIAL PRIMARY KEY,
                name VARCHAR(255) UNIQUE NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DocflowError::Database(format!("Failed to create migration table: {}", e)))?;

        Ok(())
    }

    async fn get_applied_migrations(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM docflow_migrations")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DocflowError::Database(format!("Failed to list migrations: {}", e)))?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<()> {
        info!(name = %migration.name, "Applying migration");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DocflowError::Database(e.to_string()))?;

        sqlx::raw_sql(&migration.sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DocflowError::Database(format!("Migration '{}' failed: {}", migration.name, e))
            })?;

        sqlx::query("INSERT INTO docflow_migrations (name) VALUES ($1)")
            .bind(&migration.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| DocflowError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| DocflowError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_new() {
        let migration = Migration::new("0001_add_index", "CREATE INDEX ...");
        assert_eq!(migration.name, "0001_add_index");
        assert!(!migration.sql.is_empty());
    }
}
