use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::geo::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AnalyticsRecord {
    Comparison(ComparisonRecord),
    Booking(BookingRecord),
}

impl AnalyticsRecord {
    pub fn id(&self) -> Uuid {
        match self {
            AnalyticsRecord::Comparison(r) => r.id,
            AnalyticsRecord::Booking(r) => r.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsRecord::Comparison(_) => "comparison",
            AnalyticsRecord::Booking(_) => "booking",
        }
    }

    pub fn at(&self) -> OffsetDateTime {
        match self {
            AnalyticsRecord::Comparison(r) => r.at,
            AnalyticsRecord::Booking(r) => r.at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub id: Uuid,
    pub pickup: Coordinates,
    pub dropoff: Coordinates,
    pub event_id: Option<String>,
    pub providers_queried: usize,
    pub offers_found: usize,
    pub cheapest_price: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Uuid,
    pub provider: String,
    pub ride_type: String,
    pub price: Option<f64>,
    pub event_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

impl BookingRecord {
    pub fn new(provider: String, ride_type: String, price: Option<f64>, event_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider,
            ride_type,
            price,
            event_id,
            at: OffsetDateTime::now_utc(),
        }
    }
}

/// Destination for fire-and-forget analytics.
///
/// `record` must return promptly and must never fail the caller; sinks that do
/// I/O hand the work off and swallow their own errors.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, record: AnalyticsRecord);
}

/// Writes each record as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn record(&self, record: AnalyticsRecord) {
        let payload = serde_json::to_string(&record).unwrap_or_default();
        info!(kind = record.kind(), id = %record.id(), %payload, "analytics record");
    }
}

/// Keeps records in memory; used by tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AnalyticsRecord>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<AnalyticsRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl AnalyticsSink for MemorySink {
    fn record(&self, record: AnalyticsRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}
