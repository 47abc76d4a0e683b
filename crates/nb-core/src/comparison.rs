use futures_util::future::join_all;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analytics::{AnalyticsRecord, AnalyticsSink, BookingRecord, ComparisonRecord};
use crate::providers::{RideProvider, Trip};
use crate::ride::{apply_filters, apply_savings, sort_offers, ComparisonResult, NormalizedRideOffer, RideRequest};

/// Fans a trip out to every rideshare provider and ranks the merged quotes.
pub struct RideComparisonEngine {
    providers: Vec<Arc<dyn RideProvider>>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl RideComparisonEngine {
    pub fn new(providers: Vec<Arc<dyn RideProvider>>, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { providers, analytics }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn compare_rides(&self, request: &RideRequest) -> ComparisonResult {
        let trip = Trip {
            pickup: request.pickup,
            dropoff: request.dropoff,
            passengers: request.passengers(),
        };

        let offers = self.collect_quotes(&trip).await;
        let queried = offers.len();

        let mut rides = apply_filters(offers, trip.passengers, &request.filters);
        apply_savings(&mut rides);
        sort_offers(&mut rides, request.sort_by);

        let result = ComparisonResult::new(rides);
        self.analytics.record(AnalyticsRecord::Comparison(ComparisonRecord {
            id: Uuid::new_v4(),
            pickup: trip.pickup,
            dropoff: trip.dropoff,
            event_id: request.event_id.clone(),
            providers_queried: self.providers.len(),
            offers_found: queried,
            cheapest_price: result.cheapest_price(),
            at: OffsetDateTime::now_utc(),
        }));

        result
    }

    pub fn track_booking(&self, booking: BookingRecord) {
        self.analytics.record(AnalyticsRecord::Booking(booking));
    }

    async fn collect_quotes(&self, trip: &Trip) -> Vec<NormalizedRideOffer> {
        let fetches = self.providers.iter().map(|provider| async move {
            match provider.quotes(trip).await {
                Ok(offers) => {
                    debug!(provider = provider.name(), offers = offers.len(), "ride quotes received");
                    offers
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "ride quotes failed");
                    Vec::new()
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }
}
