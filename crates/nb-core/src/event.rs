use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use utoipa::ToSchema;

use crate::geo::Coordinates;

/// Default result cap for event searches.
pub const DEFAULT_EVENT_LIMIT: usize = 20;

/// Substrings that mark an event as food or drink related.
pub const CULINARY_TERMS: [&str; 25] = [
    "food",
    "wine",
    "cook",
    "chef",
    "cuisine",
    "tasting",
    "dinner",
    "lunch",
    "brunch",
    "breakfast",
    "restaurant",
    "culinary",
    "gastro",
    "feast",
    "festival",
    "market",
    "oyster",
    "crawfish",
    "gumbo",
    "jambalaya",
    "creole",
    "cajun",
    "beignet",
    "po boy",
    "muffuletta",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Ticketmaster,
    Eventbrite,
}

impl EventSource {
    pub fn id_prefix(self) -> &'static str {
        match self {
            EventSource::Ticketmaster => "tm",
            EventSource::Eventbrite => "eb",
        }
    }

    pub fn prefixed_id(self, raw_id: &str) -> String {
        format!("{}-{}", self.id_prefix(), raw_id)
    }
}

/// Which providers an event search should query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceSelector {
    #[default]
    All,
    Ticketmaster,
    Eventbrite,
}

impl SourceSelector {
    pub fn includes(self, source: EventSource) -> bool {
        match self {
            SourceSelector::All => true,
            SourceSelector::Ticketmaster => source == EventSource::Ticketmaster,
            SourceSelector::Eventbrite => source == EventSource::Eventbrite,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Venue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

/// Provider-independent event shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub id: String,
    pub source: EventSource,
    pub name: String,
    pub description: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub venue: Venue,
    pub images: Vec<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_free: Option<bool>,
    pub categories: Vec<String>,
}

impl NormalizedEvent {
    /// Parsed `start_date`, if it is a timestamp or a plain date.
    pub fn starts_at(&self) -> Option<OffsetDateTime> {
        parse_event_date(&self.start_date)
    }

    /// `lowercase(name) + "-" + date`, the identity used for deduplication.
    pub fn dedup_key(&self) -> String {
        let day = match self.starts_at() {
            Some(at) => at.date().to_string(),
            None => self.start_date.trim().to_string(),
        };
        format!("{}-{}", self.name.to_lowercase(), day)
    }

    pub fn is_culinary(&self) -> bool {
        let haystack = format!("{} {}", self.name, self.description).to_lowercase();
        CULINARY_TERMS.iter().any(|term| haystack.contains(term))
    }
}

/// Query accepted by the general event search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct EventFilters {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub source: SourceSelector,
    pub limit: Option<usize>,
}

impl EventFilters {
    pub fn effective_limit(&self) -> usize {
        effective_limit(self.limit, DEFAULT_EVENT_LIMIT)
    }
}

/// Query accepted by the culinary event search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CulinaryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub max_results: Option<usize>,
}

impl CulinaryQuery {
    pub fn effective_limit(&self) -> usize {
        effective_limit(self.max_results, DEFAULT_EVENT_LIMIT)
    }
}

fn effective_limit(requested: Option<usize>, default: usize) -> usize {
    requested.filter(|n| *n > 0).unwrap_or(default)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SourceCounts {
    pub ticketmaster: usize,
    pub eventbrite: usize,
}

impl SourceCounts {
    pub fn tally(events: &[NormalizedEvent]) -> Self {
        events.iter().fold(Self::default(), |mut acc, e| {
            match e.source {
                EventSource::Ticketmaster => acc.ticketmaster += 1,
                EventSource::Eventbrite => acc.eventbrite += 1,
            }
            acc
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AggregatedEvents {
    pub events: Vec<NormalizedEvent>,
    pub total: usize,
    pub sources: SourceCounts,
}

impl AggregatedEvents {
    pub fn from_events(events: Vec<NormalizedEvent>) -> Self {
        let sources = SourceCounts::tally(&events);
        Self {
            total: events.len(),
            events,
            sources,
        }
    }
}

/// Parse an RFC 3339 timestamp, a local `YYYY-MM-DDTHH:MM:SS` timestamp, or a
/// bare `YYYY-MM-DD` date. Offsetless values are read as UTC.
pub fn parse_event_date(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at.to_offset(UtcOffset::UTC));
    }
    if let Ok(at) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(at.assume_utc());
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight().assume_utc())
}

/// Drop events whose dedup key or id was already seen. First occurrence wins.
pub fn dedupe_events(events: Vec<NormalizedEvent>) -> Vec<NormalizedEvent> {
    let mut seen_keys = HashSet::new();
    let mut seen_ids = HashSet::new();

    events
        .into_iter()
        .filter(|e| {
            let key = e.dedup_key();
            if seen_keys.contains(&key) || seen_ids.contains(&e.id) {
                return false;
            }
            seen_keys.insert(key);
            seen_ids.insert(e.id.clone());
            true
        })
        .collect()
}

/// Stable ascending sort by start date; events without a parseable date go last.
pub fn sort_chronologically(events: &mut [NormalizedEvent]) {
    events.sort_by_cached_key(|e| {
        let at = e.starts_at();
        (at.is_none(), at)
    });
}
