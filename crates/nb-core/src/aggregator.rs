use futures_util::future::{join, join_all};
use std::sync::Arc;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::{LookupError, ProviderError};
use crate::event::{
    dedupe_events, sort_chronologically, AggregatedEvents, CulinaryQuery, EventFilters, EventSource,
    NormalizedEvent,
};
use crate::geo::Coordinates;
use crate::providers::eventbrite::{EventbriteApi, EventbriteQuery, FOOD_AND_DRINK_CATEGORY};
use crate::providers::ticketmaster::{TicketmasterApi, TicketmasterQuery};
use crate::Normalize;

/// Ticketmaster keywords searched for culinary events.
pub const TICKETMASTER_CULINARY_KEYWORDS: [&str; 5] = ["food", "wine", "cooking", "chef", "cuisine"];
/// Page size of each culinary keyword search on Ticketmaster.
pub const TICKETMASTER_CULINARY_PAGE: usize = 10;
/// Eventbrite keywords searched for culinary events.
pub const EVENTBRITE_CULINARY_KEYWORDS: [&str; 3] = ["food festival", "wine tasting", "cooking class"];

pub const NEARBY_RADIUS_MILES: f64 = 2.0;
pub const NEARBY_MAX_RESULTS: usize = 10;
pub const NEARBY_CANDIDATES: usize = 50;

/// Merges Ticketmaster and Eventbrite searches into one ranked list.
///
/// Every provider call is isolated: a failure is logged and contributes no
/// events. Ticketmaster results are always concatenated first, so they win
/// dedup collisions.
pub struct EventAggregator {
    ticketmaster: Arc<dyn TicketmasterApi>,
    eventbrite: Arc<dyn EventbriteApi>,
}

impl EventAggregator {
    pub fn new(ticketmaster: Arc<dyn TicketmasterApi>, eventbrite: Arc<dyn EventbriteApi>) -> Self {
        Self { ticketmaster, eventbrite }
    }

    /// Unfiltered search across the selected providers.
    pub async fn aggregate_events(&self, filters: &EventFilters) -> AggregatedEvents {
        let limit = filters.effective_limit();

        let tm = async {
            if filters.source.includes(EventSource::Ticketmaster) {
                self.search_ticketmaster(TicketmasterQuery::from_filters(filters, limit))
                    .await
            } else {
                Vec::new()
            }
        };
        let eb = async {
            if filters.source.includes(EventSource::Eventbrite) {
                self.search_eventbrite(EventbriteQuery::from_filters(filters, limit))
                    .await
            } else {
                Vec::new()
            }
        };

        let (tm, eb) = join(tm, eb).await;
        debug!(ticketmaster = tm.len(), eventbrite = eb.len(), "event search fan-out complete");

        AggregatedEvents::from_events(rank(tm.into_iter().chain(eb).collect(), false, limit))
    }

    /// Food and drink events from a fixed set of keyword and category searches.
    pub async fn culinary_events(&self, query: &CulinaryQuery) -> Vec<NormalizedEvent> {
        let window = (query.start_date.clone(), query.end_date.clone());

        let tm_searches = TICKETMASTER_CULINARY_KEYWORDS.iter().map(|kw| {
            let q = TicketmasterQuery::keyword(kw, TICKETMASTER_CULINARY_PAGE)
                .within(window.0.clone(), window.1.clone());
            self.search_ticketmaster(q)
        });

        let eb_queries = std::iter::once(EventbriteQuery::category(FOOD_AND_DRINK_CATEGORY))
            .chain(EVENTBRITE_CULINARY_KEYWORDS.iter().map(|kw| EventbriteQuery::keyword(kw)))
            .map(|q| q.within(window.0.clone(), window.1.clone()));
        let eb_searches = eb_queries.map(|q| self.search_eventbrite(q));

        let (tm, eb) = join(join_all(tm_searches), join_all(eb_searches)).await;

        let merged: Vec<NormalizedEvent> = tm.into_iter().chain(eb).flatten().collect();
        debug!(candidates = merged.len(), "culinary fan-out complete");

        rank(merged, true, query.effective_limit())
    }

    /// Culinary events within two miles of a venue, starting at `date` (default now).
    pub async fn events_near_venue(&self, venue: Coordinates, date: Option<String>) -> Vec<NormalizedEvent> {
        let start = date.or_else(now_timestamp);
        let query = CulinaryQuery {
            start_date: start,
            end_date: None,
            max_results: Some(NEARBY_CANDIDATES),
        };

        self.culinary_events(&query)
            .await
            .into_iter()
            .filter(|e| {
                e.venue
                    .location
                    .is_some_and(|at| venue.distance_miles(&at) <= NEARBY_RADIUS_MILES)
            })
            .take(NEARBY_MAX_RESULTS)
            .collect()
    }

    /// Detail lookup for a provider-prefixed id such as `tm-G5vYZ9`.
    pub async fn event_by_id(&self, id: &str) -> Result<NormalizedEvent, LookupError> {
        let (prefix, raw_id) = id
            .split_once('-')
            .filter(|(_, raw)| !raw.is_empty())
            .ok_or_else(|| LookupError::InvalidId(id.to_string()))?;

        let event = match prefix {
            "tm" => self.ticketmaster.event_by_id(raw_id).await?.normalize(),
            "eb" => self.eventbrite.event_by_id(raw_id).await?.normalize(),
            _ => return Err(LookupError::InvalidId(id.to_string())),
        };

        event.ok_or_else(|| ProviderError::Decode("event payload has no id".into()).into())
    }

    async fn search_ticketmaster(&self, query: TicketmasterQuery) -> Vec<NormalizedEvent> {
        match self.ticketmaster.search_events(&query).await {
            Ok(resp) => resp.into_events().into_iter().filter_map(Normalize::normalize).collect(),
            Err(e) => {
                warn!(provider = "ticketmaster", keyword = ?query.keyword, error = %e, "event search failed");
                Vec::new()
            }
        }
    }

    async fn search_eventbrite(&self, query: EventbriteQuery) -> Vec<NormalizedEvent> {
        match self.eventbrite.search_events(&query).await {
            Ok(resp) => resp.events.into_iter().filter_map(Normalize::normalize).collect(),
            Err(e) => {
                warn!(provider = "eventbrite", q = ?query.q, error = %e, "event search failed");
                Vec::new()
            }
        }
    }
}

/// Dedup, optional culinary filter, chronological sort, truncation.
fn rank(events: Vec<NormalizedEvent>, culinary_only: bool, limit: usize) -> Vec<NormalizedEvent> {
    let mut events: Vec<_> = dedupe_events(events)
        .into_iter()
        .filter(|e| !culinary_only || e.is_culinary())
        .collect();
    sort_chronologically(&mut events);
    events.truncate(limit);
    events
}

fn now_timestamp() -> Option<String> {
    OffsetDateTime::now_utc()
        .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderResult;
    use crate::providers::eventbrite::{self as eb, EbEvent, EbSearchResponse};
    use crate::providers::ticketmaster::{self as tm, TmEvent, TmSearchResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTicketmaster {
        events: Vec<TmEvent>,
        fail: bool,
        queries: Mutex<Vec<TicketmasterQuery>>,
    }

    #[async_trait]
    impl TicketmasterApi for FakeTicketmaster {
        async fn search_events(&self, query: &TicketmasterQuery) -> ProviderResult<TmSearchResponse> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(ProviderError::Http("connection refused".into()));
            }
            Ok(tm::tests::search_response(self.events.clone()))
        }

        async fn event_by_id(&self, id: &str) -> ProviderResult<TmEvent> {
            self.events
                .iter()
                .find(|e| e.id.as_deref() == Some(id))
                .cloned()
                .ok_or(ProviderError::Status { status: 404, body: "not found".into() })
        }
    }

    #[derive(Default)]
    struct FakeEventbrite {
        events: Vec<EbEvent>,
        fail: bool,
        queries: Mutex<Vec<EventbriteQuery>>,
    }

    #[async_trait]
    impl EventbriteApi for FakeEventbrite {
        async fn search_events(&self, query: &EventbriteQuery) -> ProviderResult<EbSearchResponse> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(ProviderError::Decode("expected value at line 1".into()));
            }
            Ok(eb::tests::search_response(self.events.clone()))
        }

        async fn event_by_id(&self, id: &str) -> ProviderResult<EbEvent> {
            self.events
                .iter()
                .find(|e| e.id.as_deref() == Some(id))
                .cloned()
                .ok_or(ProviderError::Status { status: 404, body: "not found".into() })
        }
    }

    fn aggregator(tm: FakeTicketmaster, eb: FakeEventbrite) -> (EventAggregator, Arc<FakeTicketmaster>, Arc<FakeEventbrite>) {
        let tm = Arc::new(tm);
        let eb = Arc::new(eb);
        (EventAggregator::new(tm.clone(), eb.clone()), tm, eb)
    }

    fn tm_events() -> Vec<TmEvent> {
        vec![
            tm::tests::sample_event("t1", "Saints Home Opener", "2025-03-20T00:00:00Z"),
            tm::tests::sample_event("t2", "Jazz Brunch", "2025-03-15T15:00:00Z"),
            tm::tests::sample_event("t3", "Crawfish Festival", "2025-03-22T17:00:00Z"),
        ]
    }

    fn eb_events() -> Vec<EbEvent> {
        vec![
            eb::tests::sample_event("e1", "JAZZ BRUNCH", "2025-03-15T16:00:00Z"),
            eb::tests::sample_event("e2", "Wine Tasting Night", "2025-03-18T23:00:00Z"),
            eb::tests::sample_event("e3", "Board Game Meetup", "2025-03-16T23:00:00Z"),
        ]
    }

    fn with_venue(mut event: EbEvent, lat: &str, lng: &str) -> EbEvent {
        event.venue = Some(
            serde_json::from_value(serde_json::json!({ "name": "venue", "latitude": lat, "longitude": lng }))
                .unwrap(),
        );
        event
    }

    #[tokio::test]
    async fn test_aggregate_merges_dedupes_and_sorts() {
        let (agg, _, _) = aggregator(
            FakeTicketmaster { events: tm_events(), ..Default::default() },
            FakeEventbrite { events: eb_events(), ..Default::default() },
        );

        let out = agg.aggregate_events(&EventFilters::default()).await;
        let ids: Vec<_> = out.events.iter().map(|e| e.id.as_str()).collect();

        assert_eq!(ids, vec!["tm-t2", "eb-e3", "eb-e2", "tm-t1", "tm-t3"]);
        assert_eq!(out.total, 5);
        assert_eq!(out.sources.ticketmaster, 3);
        assert_eq!(out.sources.eventbrite, 2);
    }

    #[tokio::test]
    async fn test_dedup_is_independent_of_provider_response_order() {
        let (agg, _, _) = aggregator(
            FakeTicketmaster { events: tm_events().into_iter().rev().collect(), ..Default::default() },
            FakeEventbrite { events: eb_events().into_iter().rev().collect(), ..Default::default() },
        );
        let (agg2, _, _) = aggregator(
            FakeTicketmaster { events: tm_events(), ..Default::default() },
            FakeEventbrite { events: eb_events(), ..Default::default() },
        );

        let a = agg.aggregate_events(&EventFilters::default()).await;
        let b = agg2.aggregate_events(&EventFilters::default()).await;
        assert_eq!(a, b);

        let mut keys: Vec<_> = a.events.iter().map(NormalizedEvent::dedup_key).collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), before);
    }

    #[tokio::test]
    async fn test_identical_events_on_same_date_collapse() {
        let (agg, _, _) = aggregator(
            FakeTicketmaster {
                events: vec![tm::tests::sample_event("t9", "Gumbo Cook-off", "2025-03-15T18:00:00Z")],
                ..Default::default()
            },
            FakeEventbrite {
                events: vec![eb::tests::sample_event("e9", "Gumbo Cook-off", "2025-03-15T20:00:00Z")],
                ..Default::default()
            },
        );

        let out = agg.aggregate_events(&EventFilters::default()).await;
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].id, "tm-t9");
    }

    #[tokio::test]
    async fn test_eventbrite_failure_keeps_ticketmaster_results() {
        let (agg, _, _) = aggregator(
            FakeTicketmaster { events: tm_events(), ..Default::default() },
            FakeEventbrite { events: eb_events(), fail: true, ..Default::default() },
        );

        let out = agg.aggregate_events(&EventFilters::default()).await;
        assert_eq!(out.events.len(), 3);
        assert_eq!(out.sources.ticketmaster, 3);
        assert_eq!(out.sources.eventbrite, 0);
    }

    #[tokio::test]
    async fn test_both_providers_failing_yields_empty() {
        let (agg, _, _) = aggregator(
            FakeTicketmaster { fail: true, ..Default::default() },
            FakeEventbrite { fail: true, ..Default::default() },
        );
        let out = agg.aggregate_events(&EventFilters::default()).await;
        assert_eq!(out.total, 0);
        assert!(out.events.is_empty());
    }

    #[tokio::test]
    async fn test_source_selector_limits_providers() {
        let (agg, tm, eb) = aggregator(
            FakeTicketmaster { events: tm_events(), ..Default::default() },
            FakeEventbrite { events: eb_events(), ..Default::default() },
        );

        let filters = EventFilters {
            source: crate::event::SourceSelector::Eventbrite,
            keyword: Some("jazz".into()),
            limit: Some(2),
            ..Default::default()
        };
        let out = agg.aggregate_events(&filters).await;

        assert!(tm.queries.lock().unwrap().is_empty());
        let eb_queries = eb.queries.lock().unwrap();
        assert_eq!(eb_queries.len(), 1);
        assert_eq!(eb_queries[0].q.as_deref(), Some("jazz"));
        assert_eq!(eb_queries[0].page_size, 2);

        assert_eq!(out.events.len(), 2);
        assert!(out.events.iter().all(|e| e.source == EventSource::Eventbrite));
    }

    #[tokio::test]
    async fn test_results_are_sorted_chronologically() {
        let (agg, _, _) = aggregator(
            FakeTicketmaster { events: tm_events(), ..Default::default() },
            FakeEventbrite { events: eb_events(), ..Default::default() },
        );

        let out = agg.culinary_events(&CulinaryQuery::default()).await;
        for pair in out.windows(2) {
            assert!(pair[0].starts_at() <= pair[1].starts_at());
        }
    }

    #[tokio::test]
    async fn test_culinary_filter_excludes_non_food_events() {
        let (agg, tm, eb) = aggregator(
            FakeTicketmaster { events: tm_events(), ..Default::default() },
            FakeEventbrite { events: eb_events(), ..Default::default() },
        );

        let culinary = agg.culinary_events(&CulinaryQuery::default()).await;
        let all = agg.aggregate_events(&EventFilters::default()).await;

        let culinary_ids: Vec<_> = culinary.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(culinary_ids, vec!["tm-t2", "eb-e2", "tm-t3"]);

        for excluded in ["tm-t1", "eb-e3"] {
            assert!(!culinary_ids.contains(&excluded));
            assert!(all.events.iter().any(|e| e.id == excluded));
        }

        let tm_keywords: Vec<_> = tm
            .queries
            .lock()
            .unwrap()
            .iter()
            .filter_map(|q| q.keyword.clone())
            .collect();
        for kw in TICKETMASTER_CULINARY_KEYWORDS {
            assert!(tm_keywords.iter().any(|k| k == kw));
        }
        let eb_queries = eb.queries.lock().unwrap();
        assert!(eb_queries.iter().any(|q| q.categories == vec![FOOD_AND_DRINK_CATEGORY.to_string()]));
        assert!(eb_queries.iter().any(|q| q.q.as_deref() == Some("cooking class")));
    }

    #[tokio::test]
    async fn test_events_near_venue_filters_by_radius() {
        let french_quarter = Coordinates::new(29.9584, -90.0644);
        let events = vec![
            with_venue(eb::tests::sample_event("near", "Oyster Night", "2030-03-15T23:00:00Z"), "29.9560", "-90.0670"),
            with_venue(eb::tests::sample_event("far", "Food Truck Rally", "2030-03-16T23:00:00Z"), "30.0200", "-90.1500"),
            eb::tests::sample_event("nowhere", "Chef Pop-up", "2030-03-17T23:00:00Z"),
        ];
        let (agg, tm, _) = aggregator(
            FakeTicketmaster::default(),
            FakeEventbrite { events, ..Default::default() },
        );

        let out = agg
            .events_near_venue(french_quarter, Some("2030-03-01T00:00:00Z".into()))
            .await;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "eb-near");
        assert!(tm
            .queries
            .lock()
            .unwrap()
            .iter()
            .all(|q| q.start_date_time.as_deref() == Some("2030-03-01T00:00:00Z")));
    }

    #[tokio::test]
    async fn test_events_near_venue_caps_results() {
        let french_quarter = Coordinates::new(29.9584, -90.0644);
        let events: Vec<_> = (0..12)
            .map(|i| {
                let id = format!("n{i}");
                let name = format!("Oyster Night {i}");
                let start = format!("2030-03-{:02}T23:00:00Z", i + 1);
                with_venue(eb::tests::sample_event(&id, &name, &start), "29.9560", "-90.0670")
            })
            .collect();
        let (agg, _, _) = aggregator(
            FakeTicketmaster::default(),
            FakeEventbrite { events, ..Default::default() },
        );

        let out = agg.events_near_venue(french_quarter, None).await;

        assert_eq!(out.len(), NEARBY_MAX_RESULTS);
        assert_eq!(out[0].id, "eb-n0");
        assert_eq!(out[9].id, "eb-n9");
    }

    #[tokio::test]
    async fn test_culinary_events_truncate_to_max_results() {
        let (agg, _, _) = aggregator(
            FakeTicketmaster { events: tm_events(), ..Default::default() },
            FakeEventbrite { events: eb_events(), ..Default::default() },
        );

        let query = CulinaryQuery { max_results: Some(2), ..Default::default() };
        let ids: Vec<_> = agg
            .culinary_events(&query)
            .await
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["tm-t2", "eb-e2"]);
    }

    #[tokio::test]
    async fn test_event_by_id_routes_on_prefix() {
        let (agg, _, _) = aggregator(
            FakeTicketmaster { events: tm_events(), ..Default::default() },
            FakeEventbrite { events: eb_events(), ..Default::default() },
        );

        let event = agg.event_by_id("eb-e2").await.unwrap();
        assert_eq!(event.name, "Wine Tasting Night");

        let event = agg.event_by_id("tm-t1").await.unwrap();
        assert_eq!(event.source, EventSource::Ticketmaster);

        assert!(matches!(agg.event_by_id("xx-1").await, Err(LookupError::InvalidId(_))));
        assert!(matches!(agg.event_by_id("tm-").await, Err(LookupError::InvalidId(_))));
        assert!(matches!(agg.event_by_id("tm-missing").await, Err(LookupError::Provider(_))));
    }
}
