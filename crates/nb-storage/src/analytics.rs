use anyhow::Result;
use nb_core::analytics::{AnalyticsRecord, AnalyticsSink};
use sqlx::SqlitePool;
use time::format_description::well_known::Rfc3339;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Persists analytics records to `analytics_events`.
///
/// `record` spawns the insert on the current tokio runtime and returns
/// immediately; insert failures are logged and dropped.
#[derive(Clone)]
pub struct SqliteAnalyticsSink {
    pool: SqlitePool,
}

impl SqliteAnalyticsSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, record: &AnalyticsRecord) -> Result<()> {
        insert(&self.pool, record).await
    }
}

impl AnalyticsSink for SqliteAnalyticsSink {
    fn record(&self, record: AnalyticsRecord) {
        let Ok(handle) = Handle::try_current() else {
            warn!(kind = record.kind(), "no async runtime, analytics record dropped");
            return;
        };

        let pool = self.pool.clone();
        handle.spawn(async move {
            match insert(&pool, &record).await {
                Ok(()) => debug!(kind = record.kind(), id = %record.id(), "analytics record stored"),
                Err(e) => warn!(kind = record.kind(), error = %e, "failed to store analytics record"),
            }
        });
    }
}

async fn insert(pool: &SqlitePool, record: &AnalyticsRecord) -> Result<()> {
    let payload = serde_json::to_string(record)?;
    let recorded_at = record.at().format(&Rfc3339)?;

    sqlx::query(
        "INSERT INTO analytics_events (id, kind, payload, recorded_at) VALUES (?, ?, ?, ?)",
    )
    .bind(record.id().to_string())
    .bind(record.kind())
    .bind(payload)
    .bind(recorded_at)
    .execute(pool)
    .await?;

    Ok(())
}
