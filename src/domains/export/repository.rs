use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, SqlitePool};

use crate::errors::DbResult;

use super::types::{ExportJob, LocationDay, MeasurementRow};

/// Access to the measurement store and its export log.
///
/// No method retries; a failed call is reported to the caller as is.
#[async_trait]
pub trait ExportLogRepository: Send + Sync {
    /// Up to `limit` location/days that have not been exported yet.
    async fn list_pending(&self, limit: i64) -> DbResult<Vec<ExportJob>>;

    /// Every measurement of one location for one day. An empty result is not an error.
    async fn fetch_measurements(&self, job: &ExportJob) -> DbResult<Vec<MeasurementRow>>;

    /// Record the location/day as exported. Calling it again has no further effect.
    async fn mark_exported(&self, job: &ExportJob) -> DbResult<()>;

    /// Queue every location/day present in the measurement store again.
    /// Returns the number of queued location/days.
    async fn reset_queue(&self) -> DbResult<u64>;

    /// Location/days with their measurement counts, up to `limit` entries.
    async fn list_location_days(&self, limit: i64) -> DbResult<Vec<LocationDay>>;
}

// --- PostgreSQL ---

/// Store backed by the OpenAQ PostgreSQL schema and its export-log functions.
pub struct PgExportLogRepository {
    pool: PgPool,
}

impl PgExportLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExportLogRepository for PgExportLogRepository {
    async fn list_pending(&self, limit: i64) -> DbResult<Vec<ExportJob>> {
        let jobs = sqlx::query_as::<_, ExportJob>(
            "SELECT sensor_nodes_id::bigint AS sensor_nodes_id, day::date AS day
             FROM get_pending($1::int)",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn fetch_measurements(&self, job: &ExportJob) -> DbResult<Vec<MeasurementRow>> {
        // Timestamps mark the end of the averaging period, hence the one second shift.
        let rows = sqlx::query_as::<_, MeasurementRow>(
            "SELECT location::text AS location
             , datetime
             , lat::float8 AS lat
             , lon::float8 AS lon
             , measurand::text AS measurand
             , value::float8 AS value
             , country::text AS country
             , sensor_nodes_id::bigint AS sensor_nodes_id
             , sensor_systems_id::bigint AS sensor_systems_id
             FROM measurement_data_export
             WHERE sensor_nodes_id = $1
             AND (datetime - '1sec'::interval)::date = $2",
        )
        .bind(job.location_id)
        .bind(job.day)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn mark_exported(&self, job: &ExportJob) -> DbResult<()> {
        sqlx::query("SELECT update_export_log_exported($1, $2::int)")
            .bind(job.day)
            .bind(job.location_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reset_queue(&self) -> DbResult<u64> {
        let rows = sqlx::query("SELECT * FROM reset_export_logs()")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.len() as u64)
    }

    async fn list_location_days(&self, limit: i64) -> DbResult<Vec<LocationDay>> {
        let days = sqlx::query_as::<_, LocationDay>(
            "SELECT sn.sensor_nodes_id::bigint AS sensor_nodes_id
             , (m.datetime - '1sec'::interval)::date AS day
             , COUNT(m.value) AS measurements
             FROM measurements m
             JOIN sensors s ON (m.sensors_id = s.sensors_id)
             JOIN sensor_systems ss ON (s.sensor_systems_id = ss.sensor_systems_id)
             JOIN sensor_nodes sn ON (ss.sensor_nodes_id = sn.sensor_nodes_id)
             WHERE s.sensors_id NOT IN (SELECT sensors_id FROM stale_versions)
             GROUP BY sn.sensor_nodes_id, (m.datetime - '1sec'::interval)::date
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(days)
    }
}

// --- SQLite ---

/// Self-contained store using the tables from `migrations/`.
pub struct SqliteExportLogRepository {
    pool: SqlitePool,
}

impl SqliteExportLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ExportLogRepository for SqliteExportLogRepository {
    async fn list_pending(&self, limit: i64) -> DbResult<Vec<ExportJob>> {
        let jobs = sqlx::query_as::<_, ExportJob>(
            "SELECT m.sensor_nodes_id AS sensor_nodes_id
             , date(m.datetime, '-1 seconds') AS day
             FROM measurements m
             LEFT JOIN export_logs l
               ON l.sensor_nodes_id = m.sensor_nodes_id
              AND l.day = date(m.datetime, '-1 seconds')
             GROUP BY m.sensor_nodes_id, date(m.datetime, '-1 seconds')
             HAVING MAX(l.exported_on) IS NULL
             ORDER BY day, sensor_nodes_id
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn fetch_measurements(&self, job: &ExportJob) -> DbResult<Vec<MeasurementRow>> {
        let rows = sqlx::query_as::<_, MeasurementRow>(
            "SELECT location, datetime, lat, lon, measurand, value, country
             , sensor_nodes_id, sensor_systems_id
             FROM measurements
             WHERE sensor_nodes_id = ?
             AND date(datetime, '-1 seconds') = ?
             ORDER BY datetime, measurand",
        )
        .bind(job.location_id)
        .bind(job.day)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn mark_exported(&self, job: &ExportJob) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO export_logs (sensor_nodes_id, day, exported_on)
             VALUES (?, ?, ?)
             ON CONFLICT (sensor_nodes_id, day)
             DO UPDATE SET exported_on = COALESCE(export_logs.exported_on, excluded.exported_on)",
        )
        .bind(job.location_id)
        .bind(job.day)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reset_queue(&self) -> DbResult<u64> {
        let result = sqlx::query(
            "INSERT INTO export_logs (sensor_nodes_id, day, records, queued_on, exported_on)
             SELECT sensor_nodes_id, date(datetime, '-1 seconds'), COUNT(*), ?, NULL
             FROM measurements
             WHERE true
             GROUP BY sensor_nodes_id, date(datetime, '-1 seconds')
             ON CONFLICT (sensor_nodes_id, day)
             DO UPDATE SET records = excluded.records
             , queued_on = excluded.queued_on
             , exported_on = NULL",
        )
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_location_days(&self, limit: i64) -> DbResult<Vec<LocationDay>> {
        let days = sqlx::query_as::<_, LocationDay>(
            "SELECT sensor_nodes_id
             , date(datetime, '-1 seconds') AS day
             , COUNT(value) AS measurements
             FROM measurements
             GROUP BY sensor_nodes_id, date(datetime, '-1 seconds')
             ORDER BY day, sensor_nodes_id
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(days)
    }
}
