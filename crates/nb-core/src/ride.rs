use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geo::Coordinates;

/// Capacity at which an offer counts as "large" even when untagged.
pub const LARGE_VEHICLE_CAPACITY: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RideFeature {
    Wheelchair,
    Luxury,
    Shared,
    Large,
    Comfort,
}

impl RideFeature {
    /// Tags implied by a provider product name, e.g. "UberXL" or "lyft_lux".
    pub fn from_product_name(name: &str) -> Vec<RideFeature> {
        const RULES: [(RideFeature, &[&str]); 5] = [
            (RideFeature::Shared, &["pool", "express", "shared", "line"]),
            (RideFeature::Large, &["xl", "suv"]),
            (RideFeature::Luxury, &["lux", "black"]),
            (RideFeature::Wheelchair, &["access", "wav"]),
            (RideFeature::Comfort, &["comfort", "premier"]),
        ];

        let name = name.to_lowercase();
        RULES
            .iter()
            .filter(|(_, needles)| needles.iter().any(|n| name.contains(n)))
            .map(|(feature, _)| *feature)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FareRange {
    pub low: f64,
    pub high: f64,
}

/// Provider-independent ride quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRideOffer {
    pub provider: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<FareRange>,
    pub currency: String,
    /// Minutes until pickup.
    pub eta: u32,
    pub capacity: u32,
    pub surge_multiplier: f64,
    pub features: Vec<RideFeature>,
    pub savings_percent: u32,
    pub booking_url: String,
    pub web_booking_url: String,
}

impl NormalizedRideOffer {
    pub fn has(&self, feature: RideFeature) -> bool {
        self.features.contains(&feature)
    }

    fn is_large(&self) -> bool {
        self.has(RideFeature::Large) || self.capacity >= LARGE_VEHICLE_CAPACITY
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RideFilters {
    pub wheelchair: bool,
    pub car_seat: bool,
    pub luxury: bool,
    pub shared: bool,
    pub large: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Price,
    Eta,
}

/// A validated comparison request.
#[derive(Debug, Clone, PartialEq)]
pub struct RideRequest {
    pub pickup: Coordinates,
    pub dropoff: Coordinates,
    pub passengers: u32,
    pub filters: RideFilters,
    pub sort_by: SortKey,
    pub event_id: Option<String>,
}

impl RideRequest {
    pub fn new(pickup: Coordinates, dropoff: Coordinates) -> Self {
        Self {
            pickup,
            dropoff,
            passengers: 1,
            filters: RideFilters::default(),
            sort_by: SortKey::default(),
            event_id: None,
        }
    }

    pub fn passengers(&self) -> u32 {
        self.passengers.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub rides: Vec<NormalizedRideOffer>,
    pub total_options: usize,
}

impl ComparisonResult {
    pub fn new(rides: Vec<NormalizedRideOffer>) -> Self {
        Self {
            total_options: rides.len(),
            rides,
        }
    }

    pub fn cheapest_price(&self) -> Option<f64> {
        self.rides.iter().map(|r| r.price).reduce(f64::min)
    }
}

/// Capacity filter followed by the requested feature filters.
pub fn apply_filters(
    offers: Vec<NormalizedRideOffer>,
    passengers: u32,
    filters: &RideFilters,
) -> Vec<NormalizedRideOffer> {
    offers
        .into_iter()
        .filter(|o| o.capacity >= passengers)
        .filter(|o| !filters.wheelchair || o.has(RideFeature::Wheelchair))
        .filter(|o| !filters.luxury || o.has(RideFeature::Luxury))
        .filter(|o| !filters.shared || o.has(RideFeature::Shared))
        .filter(|o| !filters.large || o.is_large())
        // No provider advertises child seats, so the filter can never be met.
        .filter(|_| !filters.car_seat)
        .collect()
}

/// Set `savings_percent` relative to the most expensive offer in `offers`.
pub fn apply_savings(offers: &mut [NormalizedRideOffer]) {
    let max_price = offers.iter().map(|o| o.price).fold(0.0_f64, f64::max);

    for offer in offers.iter_mut() {
        offer.savings_percent = if max_price > 0.0 {
            (((max_price - offer.price) / max_price) * 100.0)
                .round()
                .clamp(0.0, 100.0) as u32
        } else {
            0
        };
    }
}

/// Stable ascending sort on the chosen key.
pub fn sort_offers(offers: &mut [NormalizedRideOffer], key: SortKey) {
    match key {
        SortKey::Price => offers.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::Eta => offers.sort_by_key(|o| o.eta),
    }
}
