//! Eventbrite API v3.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{coordinates, lenient_f64, non_empty, null_as_default};
use crate::error::ProviderResult;
use crate::event::{EventFilters, EventSource, NormalizedEvent, PriceRange, Venue};
use crate::Normalize;

/// Eventbrite category id for "Food & Drink".
pub const FOOD_AND_DRINK_CATEGORY: &str = "110";

#[async_trait]
pub trait EventbriteApi: Send + Sync {
    async fn search_events(&self, query: &EventbriteQuery) -> ProviderResult<EbSearchResponse>;

    async fn event_by_id(&self, id: &str) -> ProviderResult<EbEvent>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventbriteQuery {
    pub q: Option<String>,
    pub categories: Vec<String>,
    pub range_start: Option<String>,
    pub range_end: Option<String>,
    pub page_size: usize,
    pub location_address: String,
    pub location_within: String,
}

impl Default for EventbriteQuery {
    fn default() -> Self {
        Self {
            q: None,
            categories: Vec::new(),
            range_start: None,
            range_end: None,
            page_size: 50,
            location_address: "New Orleans, LA".into(),
            location_within: "25mi".into(),
        }
    }
}

impl EventbriteQuery {
    pub fn from_filters(filters: &EventFilters, page_size: usize) -> Self {
        Self {
            q: filters.keyword.clone(),
            range_start: filters.start_date.clone(),
            range_end: filters.end_date.clone(),
            page_size,
            ..Default::default()
        }
    }

    pub fn keyword(q: &str) -> Self {
        Self {
            q: Some(q.to_string()),
            ..Default::default()
        }
    }

    pub fn category(id: &str) -> Self {
        Self {
            categories: vec![id.to_string()],
            ..Default::default()
        }
    }

    pub fn within(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.range_start = start;
        self.range_end = end;
        self
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("location.address", self.location_address.clone()),
            ("location.within", self.location_within.clone()),
            ("expand", "venue,ticket_availability".to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if let Some(q) = non_empty(self.q.clone()) {
            params.push(("q", q));
        }
        if let Some(start) = non_empty(self.range_start.clone()) {
            params.push(("start_date.range_start", start));
        }
        if let Some(end) = non_empty(self.range_end.clone()) {
            params.push(("start_date.range_end", end));
        }
        if !self.categories.is_empty() {
            params.push(("categories", self.categories.join(",")));
        }
        params
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbSearchResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub events: Vec<EbEvent>,
    pub pagination: Option<EbPagination>,
}

impl EbSearchResponse {
    pub fn total(&self) -> u64 {
        self.pagination.as_ref().and_then(|p| p.object_count).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbPagination {
    pub object_count: Option<u64>,
    pub page_number: Option<u64>,
    pub page_size: Option<u64>,
    pub page_count: Option<u64>,
    pub has_more_items: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbEvent {
    pub id: Option<String>,
    pub name: Option<EbText>,
    pub description: Option<EbText>,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub start: Option<EbDateTime>,
    pub end: Option<EbDateTime>,
    pub is_free: Option<bool>,
    pub logo: Option<EbLogo>,
    pub venue: Option<EbVenue>,
    pub category: Option<EbCategory>,
    pub ticket_availability: Option<EbTicketAvailability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbText {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbDateTime {
    pub timezone: Option<String>,
    pub local: Option<String>,
    pub utc: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbLogo {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbVenue {
    pub name: Option<String>,
    pub address: Option<EbAddress>,
    #[serde(deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbAddress {
    pub city: Option<String>,
    pub localized_address_display: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbCategory {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbTicketAvailability {
    pub minimum_ticket_price: Option<EbCost>,
    pub maximum_ticket_price: Option<EbCost>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbCost {
    pub currency: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub major_value: Option<f64>,
}

impl Normalize for EbEvent {
    type Output = Option<NormalizedEvent>;

    fn normalize(self) -> Option<NormalizedEvent> {
        let id = non_empty(self.id)?;

        let start = self.start.unwrap_or_default();
        let start_date = non_empty(start.utc).or_else(|| non_empty(start.local)).unwrap_or_default();

        let venue = self
            .venue
            .map(|v| {
                let address = v.address.unwrap_or_default();
                Venue {
                    name: non_empty(v.name),
                    address: non_empty(address.localized_address_display),
                    city: non_empty(address.city),
                    location: coordinates(v.latitude, v.longitude),
                }
            })
            .unwrap_or_default();

        let price_range = self.ticket_availability.and_then(|t| {
            let min = t.minimum_ticket_price?;
            let min_value = min.major_value?;
            let max_value = t
                .maximum_ticket_price
                .and_then(|m| m.major_value)
                .unwrap_or(min_value);
            Some(PriceRange {
                min: min_value,
                max: max_value,
                currency: non_empty(min.currency).unwrap_or_else(|| "USD".into()),
            })
        });

        Some(NormalizedEvent {
            id: EventSource::Eventbrite.prefixed_id(&id),
            source: EventSource::Eventbrite,
            name: self.name.and_then(|n| n.text).unwrap_or_default(),
            description: self
                .description
                .and_then(|d| non_empty(d.text))
                .or_else(|| non_empty(self.summary))
                .unwrap_or_default(),
            start_date,
            end_date: self.end.and_then(|e| non_empty(e.utc)),
            venue,
            images: self.logo.and_then(|l| non_empty(l.url)).into_iter().collect(),
            url: self.url.unwrap_or_default(),
            price_range,
            is_free: self.is_free,
            categories: self.category.and_then(|c| non_empty(c.name)).into_iter().collect(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geo::Coordinates;

    pub(crate) fn sample_event(id: &str, name: &str, utc: &str) -> EbEvent {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": { "text": name },
            "url": format!("https://www.eventbrite.com/e/{id}"),
            "start": { "utc": utc },
        }))
        .unwrap()
    }

    pub(crate) fn search_response(events: Vec<EbEvent>) -> EbSearchResponse {
        let count = events.len() as u64;
        EbSearchResponse {
            events,
            pagination: Some(EbPagination { object_count: Some(count), ..Default::default() }),
        }
    }

    #[test]
    fn test_normalize_full_payload() {
        let raw: EbEvent = serde_json::from_value(serde_json::json!({
            "id": "8812",
            "name": { "text": "Crawfish Cook-off", "html": "Crawfish Cook-off" },
            "description": { "text": "Backyard boil with local chefs" },
            "url": "https://www.eventbrite.com/e/8812",
            "start": { "timezone": "America/Chicago", "local": "2025-04-05T11:00:00", "utc": "2025-04-05T16:00:00Z" },
            "end": { "utc": "2025-04-05T22:00:00Z" },
            "is_free": false,
            "logo": { "url": "https://img.evbuc.com/logo.png" },
            "venue": {
                "name": "Bayou St. John",
                "address": { "city": "New Orleans", "localized_address_display": "1300 Moss St, New Orleans, LA" },
                "latitude": "29.9760",
                "longitude": "-90.0870"
            },
            "category": { "id": "110", "name": "Food & Drink" },
            "ticket_availability": {
                "minimum_ticket_price": { "currency": "USD", "major_value": "25.00", "value": 2500 },
                "maximum_ticket_price": { "currency": "USD", "major_value": "60.00", "value": 6000 }
            }
        }))
        .unwrap();

        let event = raw.normalize().unwrap();
        assert_eq!(event.id, "eb-8812");
        assert_eq!(event.name, "Crawfish Cook-off");
        assert_eq!(event.description, "Backyard boil with local chefs");
        assert_eq!(event.start_date, "2025-04-05T16:00:00Z");
        assert_eq!(event.venue.city.as_deref(), Some("New Orleans"));
        assert_eq!(event.venue.location, Some(Coordinates::new(29.976, -90.087)));
        assert_eq!(event.images, vec!["https://img.evbuc.com/logo.png".to_string()]);
        assert_eq!(event.is_free, Some(false));
        assert_eq!(event.categories, vec!["Food & Drink".to_string()]);
        assert_eq!(
            event.price_range,
            Some(PriceRange { min: 25.0, max: 60.0, currency: "USD".into() })
        );
    }

    #[test]
    fn test_normalize_falls_back_to_local_start_and_summary() {
        let raw: EbEvent = serde_json::from_value(serde_json::json!({
            "id": "1",
            "name": { "text": "Supper Club" },
            "summary": "Seven courses",
            "start": { "local": "2025-04-05T19:00:00" },
            "venue": { "name": "Somewhere", "latitude": null }
        }))
        .unwrap();

        let event = raw.normalize().unwrap();
        assert_eq!(event.start_date, "2025-04-05T19:00:00");
        assert_eq!(event.description, "Seven courses");
        assert!(event.venue.location.is_none());
        assert!(event.images.is_empty());
        assert!(event.categories.is_empty());
    }

    #[test]
    fn test_query_params() {
        let params = EventbriteQuery::category(FOOD_AND_DRINK_CATEGORY)
            .within(Some("2025-03-01T00:00:00Z".into()), None)
            .to_params();

        assert!(params.contains(&("categories", "110".into())));
        assert!(params.contains(&("start_date.range_start", "2025-03-01T00:00:00Z".into())));
        assert!(params.contains(&("location.address", "New Orleans, LA".into())));
        assert!(!params.iter().any(|(k, _)| *k == "q"));

        let filters = EventFilters { keyword: Some("brunch".into()), ..Default::default() };
        let params = EventbriteQuery::from_filters(&filters, 10).to_params();
        assert!(params.contains(&("q", "brunch".into())));
        assert!(params.contains(&("page_size", "10".into())));
    }
}
