use log::{debug, info};
use sqlx::SqlitePool;

use crate::errors::{DbError, DbResult};

// Embed all migration SQL files at compile time
const MIGRATION_MEASUREMENTS: &str = include_str!("../migrations/20240801000000_measurements.sql");
const MIGRATION_EXPORT_LOGS: &str = include_str!("../migrations/20240801000001_export_logs.sql");

// List of migrations with their names and SQL content
const MIGRATIONS: &[(&str, &str)] = &[
    ("20240801000000_measurements.sql", MIGRATION_MEASUREMENTS),
    ("20240801000001_export_logs.sql", MIGRATION_EXPORT_LOGS),
];

/// Bring a SQLite export store up to the latest schema.
pub async fn initialize_database(pool: &SqlitePool) -> DbResult<()> {
    create_migrations_table(pool).await?;

    let last_migration = get_last_migration(pool).await?;
    match &last_migration {
        Some(name) => debug!("Last applied migration: {}", name),
        None => debug!("No migrations applied yet"),
    }

    apply_pending_migrations(pool, last_migration).await
}

/// Create migrations table if it doesn't exist
async fn create_migrations_table(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Migration(format!("Failed to create migrations table: {}", e)))?;

    Ok(())
}

/// Get the last applied migration
async fn get_last_migration(pool: &SqlitePool) -> DbResult<Option<String>> {
    let result = sqlx::query_scalar::<_, String>("SELECT name FROM migrations ORDER BY id DESC LIMIT 1")
        .fetch_optional(pool)
        .await
        .map_err(|e| DbError::Migration(format!("Failed to get last migration: {}", e)))?;

    Ok(result)
}

fn get_pending_migrations(last_migration: Option<String>) -> DbResult<Vec<(&'static str, &'static str)>> {
    let start = match last_migration {
        Some(last) => MIGRATIONS
            .iter()
            .position(|(name, _)| *name == last)
            .map(|index| index + 1)
            .ok_or_else(|| DbError::Migration(format!("Unknown migration recorded: {}", last)))?,
        None => 0,
    };
    Ok(MIGRATIONS[start..].to_vec())
}

/// Apply pending migrations in a single transaction
async fn apply_pending_migrations(pool: &SqlitePool, last_migration: Option<String>) -> DbResult<()> {
    let pending_migrations = get_pending_migrations(last_migration)?;
    if pending_migrations.is_empty() {
        debug!("No pending migrations to apply");
        return Ok(());
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DbError::Migration(format!("Failed to begin transaction: {}", e)))?;

    for (migration_name, migration_sql) in pending_migrations {
        info!("Applying migration: {}", migration_name);

        sqlx::query(migration_sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("Failed to apply migration {}: {}", migration_name, e)))?;

        sqlx::query("INSERT INTO migrations (name, applied_at) VALUES (?, ?)")
            .bind(migration_name)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("Failed to record migration {}: {}", migration_name, e)))?;
    }

    tx.commit()
        .await
        .map_err(|e| DbError::Migration(format!("Failed to commit migrations: {}", e)))?;

    Ok(())
}
