use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use tracing::info;
use uuid::Uuid;

use super::{LocationStore, StoreError};
use crate::models::location::LocationRecord;

/// SQLite-backed store; survives restarts.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    id: String,
    latitude: f64,
    longitude: f64,
    accuracy: Option<f64>,
    timestamp: DateTime<Utc>,
    user_agent: Option<String>,
    ip_address: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LocationRow> for LocationRecord {
    type Error = StoreError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            id: row.id.clone(),
            reason,
        };
        let id: Uuid = row
            .id
            .parse()
            .map_err(|e| corrupt(format!("invalid id: {e}")))?;
        let ip_address: IpAddr = row
            .ip_address
            .parse()
            .map_err(|e| corrupt(format!("invalid ip address: {e}")))?;

        Ok(LocationRecord {
            id,
            latitude: row.latitude,
            longitude: row.longitude,
            accuracy: row.accuracy,
            timestamp: row.timestamp,
            user_agent: row.user_agent,
            ip_address,
            created_at: row.created_at,
        })
    }
}

impl SqliteStore {
    /// Opens (or creates) the database file and applies pending migrations.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening location database at {}", path.display());
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        // A single connection serializes writers and keeps rowid order equal to append order.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl LocationStore for SqliteStore {
    async fn append(&self, record: LocationRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO locations
                (id, latitude, longitude, accuracy, timestamp, user_agent, ip_address, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.accuracy)
        .bind(record.timestamp)
        .bind(record.user_agent)
        .bind(record.ip_address.to_string())
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<LocationRecord>, StoreError> {
        let rows: Vec<LocationRow> = sqlx::query_as(
            "SELECT id, latitude, longitude, accuracy, timestamp, user_agent, ip_address, created_at
             FROM locations
             ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LocationRecord::try_from).collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
