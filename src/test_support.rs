//! Shared fixtures for unit tests.

use chrono::{NaiveDate, TimeZone, Utc};
use log::{LevelFilter, Log, Metadata, Record};
use sqlx::SqlitePool;
use std::sync::{Mutex, Once};

use crate::database::connect_sqlite;
use crate::domains::export::repository::SqliteExportLogRepository;
use crate::domains::export::types::MeasurementRow;

/// Fresh in-memory store with migrations applied.
pub async fn sqlite_repository() -> SqliteExportLogRepository {
    let pool = connect_sqlite("sqlite::memory:").await.unwrap();
    SqliteExportLogRepository::new(pool)
}

pub fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

/// Insert `count` hourly pm25 readings for `node`, starting at 01:00 on `day`
/// so they all belong to that day.
pub async fn insert_measurements(pool: &SqlitePool, node: i64, day: &str, country: &str, count: usize) {
    for hour in 1..=count {
        sqlx::query(
            "INSERT INTO measurements
                (sensor_nodes_id, sensor_systems_id, location, datetime, lat, lon, measurand, value, country)
             VALUES (?, 10, ?, ?, 45.5, -122.6, 'pm25', ?, ?)",
        )
        .bind(node)
        .bind(format!("site-{}", node))
        .bind(format!("{}T{:02}:00:00+00:00", day, hour))
        .bind(hour as f64 * 1.5)
        .bind(country)
        .execute(pool)
        .await
        .unwrap();
    }
}

/// In-memory rows for location 1 on 2021-08-08, one per hour from 01:00.
pub fn sample_rows(count: usize, country: &str) -> Vec<MeasurementRow> {
    (1..=count)
        .map(|hour| MeasurementRow {
            location: "site-1".to_string(),
            datetime: Utc.with_ymd_and_hms(2021, 8, 8, hour as u32, 0, 0).unwrap(),
            lat: Some(45.5),
            lon: Some(-122.6),
            measurand: "pm25".to_string(),
            value: hour as f64 * 1.5,
            country: Some(country.to_string()),
            sensor_nodes_id: 1,
            sensor_systems_id: 10,
        })
        .collect()
}

/// Keeps every log line emitted by the crate during the test run.
struct CapturedLogs {
    lines: Mutex<Vec<String>>,
}

impl Log for CapturedLogs {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(format!("{} {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

static CAPTURED_LOGS: CapturedLogs = CapturedLogs {
    lines: Mutex::new(Vec::new()),
};
static INSTALL_LOGGER: Once = Once::new();

/// Route `log` records into memory. Safe to call from every test.
pub fn capture_logs() {
    INSTALL_LOGGER.call_once(|| {
        if log::set_logger(&CAPTURED_LOGS).is_ok() {
            log::set_max_level(LevelFilter::Debug);
        }
    });
}

/// Captured lines containing `needle`. Tests run in parallel, so filter on
/// something unique to the test.
pub fn logged_lines(needle: &str) -> Vec<String> {
    CAPTURED_LOGS
        .lines
        .lock()
        .unwrap()
        .iter()
        .filter(|line| line.contains(needle))
        .cloned()
        .collect()
}
