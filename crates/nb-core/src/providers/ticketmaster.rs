//! Ticketmaster Discovery API v2.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{coordinates, lenient_f64, non_empty, null_as_default};
use crate::error::ProviderResult;
use crate::event::{EventFilters, EventSource, NormalizedEvent, PriceRange, Venue};
use crate::Normalize;

#[async_trait]
pub trait TicketmasterApi: Send + Sync {
    async fn search_events(&self, query: &TicketmasterQuery) -> ProviderResult<TmSearchResponse>;

    async fn event_by_id(&self, id: &str) -> ProviderResult<TmEvent>;
}

/// Search parameters, named after the Discovery API query fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketmasterQuery {
    pub keyword: Option<String>,
    pub classification_name: Option<String>,
    pub start_date_time: Option<String>,
    pub end_date_time: Option<String>,
    pub size: usize,
    pub city: String,
    pub state_code: String,
    pub sort: String,
}

impl Default for TicketmasterQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            classification_name: None,
            start_date_time: None,
            end_date_time: None,
            size: 20,
            city: "New Orleans".into(),
            state_code: "LA".into(),
            sort: "date,asc".into(),
        }
    }
}

impl TicketmasterQuery {
    pub fn from_filters(filters: &EventFilters, size: usize) -> Self {
        Self {
            keyword: filters.keyword.clone(),
            classification_name: filters.category.clone(),
            start_date_time: filters.start_date.clone(),
            end_date_time: filters.end_date.clone(),
            size,
            ..Default::default()
        }
    }

    pub fn keyword(keyword: &str, size: usize) -> Self {
        Self {
            keyword: Some(keyword.to_string()),
            size,
            ..Default::default()
        }
    }

    pub fn within(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.start_date_time = start;
        self.end_date_time = end;
        self
    }

    /// Query string pairs; unset filters are left out.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("city", self.city.clone()),
            ("stateCode", self.state_code.clone()),
            ("size", self.size.to_string()),
            ("sort", self.sort.clone()),
        ];
        let optional = [
            ("keyword", &self.keyword),
            ("classificationName", &self.classification_name),
            ("startDateTime", &self.start_date_time),
            ("endDateTime", &self.end_date_time),
        ];
        for (name, value) in optional {
            if let Some(v) = non_empty(value.clone()) {
                params.push((name, v));
            }
        }
        params
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmSearchResponse {
    #[serde(rename = "_embedded")]
    pub embedded: Option<TmSearchEmbedded>,
    pub page: Option<TmPage>,
}

impl TmSearchResponse {
    pub fn total(&self) -> u64 {
        self.page.as_ref().and_then(|p| p.total_elements).unwrap_or(0)
    }

    pub fn into_events(self) -> Vec<TmEvent> {
        self.embedded.map(|e| e.events).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmSearchEmbedded {
    #[serde(deserialize_with = "null_as_default")]
    pub events: Vec<TmEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TmPage {
    pub size: Option<u64>,
    pub total_elements: Option<u64>,
    pub total_pages: Option<u64>,
    pub number: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TmEvent {
    pub id: Option<String>,
    pub name: Option<String>,
    pub info: Option<String>,
    pub please_note: Option<String>,
    pub url: Option<String>,
    pub dates: Option<TmDates>,
    #[serde(deserialize_with = "null_as_default")]
    pub images: Vec<TmImage>,
    #[serde(deserialize_with = "null_as_default")]
    pub price_ranges: Vec<TmPriceRange>,
    #[serde(deserialize_with = "null_as_default")]
    pub classifications: Vec<TmClassification>,
    #[serde(rename = "_embedded")]
    pub embedded: Option<TmEventEmbedded>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmDates {
    pub start: Option<TmStart>,
    pub end: Option<TmStart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TmStart {
    pub local_date: Option<String>,
    pub local_time: Option<String>,
    pub date_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmImage {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmPriceRange {
    #[serde(deserialize_with = "lenient_f64")]
    pub min: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub max: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmClassification {
    pub segment: Option<TmNamed>,
    pub genre: Option<TmNamed>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmNamed {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmEventEmbedded {
    #[serde(deserialize_with = "null_as_default")]
    pub venues: Vec<TmVenue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmVenue {
    pub name: Option<String>,
    pub address: Option<TmAddress>,
    pub city: Option<TmNamed>,
    pub location: Option<TmLocation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmAddress {
    pub line1: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmLocation {
    #[serde(deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
}

impl Normalize for TmEvent {
    type Output = Option<NormalizedEvent>;

    /// `None` when the payload carries no id.
    fn normalize(self) -> Option<NormalizedEvent> {
        let id = non_empty(self.id)?;

        let start = self.dates.as_ref().and_then(|d| d.start.clone()).unwrap_or_default();
        let start_date = non_empty(start.date_time)
            .or_else(|| non_empty(start.local_date))
            .unwrap_or_default();
        let end_date = self
            .dates
            .and_then(|d| d.end)
            .and_then(|end| non_empty(end.date_time));

        let venue = self
            .embedded
            .and_then(|e| e.venues.into_iter().next())
            .map(|v| Venue {
                name: non_empty(v.name),
                address: v.address.and_then(|a| non_empty(a.line1)),
                city: v.city.and_then(|c| non_empty(c.name)),
                location: v.location.and_then(|l| coordinates(l.latitude, l.longitude)),
            })
            .unwrap_or_default();

        let price_range = self.price_ranges.into_iter().next().and_then(|p| {
            let min = p.min.or(p.max)?;
            Some(PriceRange {
                min,
                max: p.max.unwrap_or(min),
                currency: non_empty(p.currency).unwrap_or_else(|| "USD".into()),
            })
        });

        Some(NormalizedEvent {
            id: EventSource::Ticketmaster.prefixed_id(&id),
            source: EventSource::Ticketmaster,
            name: self.name.unwrap_or_default(),
            description: non_empty(self.info)
                .or_else(|| non_empty(self.please_note))
                .unwrap_or_default(),
            start_date,
            end_date,
            venue,
            images: self.images.into_iter().filter_map(|i| non_empty(i.url)).collect(),
            url: self.url.unwrap_or_default(),
            price_range,
            is_free: None,
            categories: self
                .classifications
                .into_iter()
                .filter_map(|c| c.segment.and_then(|s| non_empty(s.name)))
                .collect(),
        })
    }
}
