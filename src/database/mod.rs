//! Connection bootstrap. One connection is opened per run and handed to the
//! repository; nothing here is global.

use log::info;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

use crate::db_migration;
use crate::domains::export::repository::{
    ExportLogRepository, PgExportLogRepository, SqliteExportLogRepository,
};
use crate::errors::{DbError, DbResult};

/// Open the store named by `database_url` and wrap it in its repository.
pub async fn connect(database_url: &str) -> DbResult<Arc<dyn ExportLogRepository>> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        let pool = connect_postgres(database_url).await?;
        Ok(Arc::new(PgExportLogRepository::new(pool)))
    } else if database_url.starts_with("sqlite:") {
        let pool = connect_sqlite(database_url).await?;
        Ok(Arc::new(SqliteExportLogRepository::new(pool)))
    } else {
        Err(DbError::UnsupportedUrl(redact(database_url)))
    }
}

pub async fn connect_postgres(database_url: &str) -> DbResult<PgPool> {
    info!("Connecting to PostgreSQL export store");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Open (creating if needed) a SQLite store and apply its migrations.
///
/// The pool keeps exactly one connection alive for its whole lifetime so
/// that `sqlite::memory:` databases survive between queries.
pub async fn connect_sqlite(database_url: &str) -> DbResult<SqlitePool> {
    info!("Connecting to SQLite export store");
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    db_migration::initialize_database(&pool).await?;
    Ok(pool)
}

/// Strip credentials before a URL ends up in an error message.
fn redact(database_url: &str) -> String {
    match (database_url.find("://"), database_url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &database_url[..scheme_end], &database_url[at..])
        }
        _ => database_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_hides_credentials() {
        assert_eq!(redact("mysql://user:secret@db:3306/aq"), "mysql://***@db:3306/aq");
        assert_eq!(redact("mongodb://db/aq"), "mongodb://db/aq");
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        let result = connect("mysql://user:secret@db/aq").await;
        assert!(matches!(result, Err(DbError::UnsupportedUrl(url)) if !url.contains("secret")));
    }
}
