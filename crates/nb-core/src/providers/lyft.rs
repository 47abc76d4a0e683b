//! Lyft public API v1 estimates.

use async_trait::async_trait;
use futures_util::future::try_join3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{lenient_f64, link, non_empty, null_as_default, seconds_to_minutes, RideProvider, Trip};
use crate::error::ProviderResult;
use crate::geo::Coordinates;
use crate::ride::{FareRange, NormalizedRideOffer, RideFeature};
use crate::Normalize;

const DEFAULT_SEATS: u32 = 4;

#[async_trait]
pub trait LyftApi: Send + Sync {
    async fn ride_types(&self, at: Coordinates) -> ProviderResult<Vec<LyftRideType>>;

    async fn cost_estimates(
        &self,
        start: Coordinates,
        end: Coordinates,
    ) -> ProviderResult<Vec<LyftCostEstimate>>;

    async fn eta_estimates(&self, at: Coordinates) -> ProviderResult<Vec<LyftEtaEstimate>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LyftRideTypesResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub ride_types: Vec<LyftRideType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LyftRideType {
    #[serde(deserialize_with = "null_as_default")]
    pub ride_type: String,
    pub display_name: Option<String>,
    pub seats: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LyftCostResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub cost_estimates: Vec<LyftCostEstimate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LyftCostEstimate {
    #[serde(deserialize_with = "null_as_default")]
    pub ride_type: String,
    pub display_name: Option<String>,
    pub currency: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub estimated_cost_cents_min: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub estimated_cost_cents_max: Option<f64>,
    /// Reported as e.g. `"25%"`.
    #[serde(deserialize_with = "lenient_f64")]
    pub primetime_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LyftEtaResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub eta_estimates: Vec<LyftEtaEstimate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LyftEtaEstimate {
    #[serde(deserialize_with = "null_as_default")]
    pub ride_type: String,
    pub display_name: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub eta_seconds: Option<f64>,
}

/// The three estimate calls for one trip, joined on `ride_type`.
#[derive(Debug, Clone)]
pub struct LyftEstimates {
    pub trip: Trip,
    pub ride_types: Vec<LyftRideType>,
    pub costs: Vec<LyftCostEstimate>,
    pub etas: Vec<LyftEtaEstimate>,
}

impl Normalize for LyftEstimates {
    type Output = Vec<NormalizedRideOffer>;

    /// Quoted price is the upper cost bound.
    fn normalize(self) -> Vec<NormalizedRideOffer> {
        let Trip { pickup, dropoff, .. } = self.trip;
        let web_booking_url = format!(
            "https://www.lyft.com/ride?origin={},{}&destination={},{}",
            pickup.latitude, pickup.longitude, dropoff.latitude, dropoff.longitude
        );

        self.costs
            .into_iter()
            .filter_map(|cost| {
                let high = cost.estimated_cost_cents_max.or(cost.estimated_cost_cents_min)? / 100.0;
                let low = cost.estimated_cost_cents_min.map(|c| c / 100.0).unwrap_or(high);
                let seats = self
                    .ride_types
                    .iter()
                    .find(|rt| rt.ride_type == cost.ride_type)
                    .and_then(|rt| rt.seats);
                let seconds = self
                    .etas
                    .iter()
                    .find(|e| e.ride_type == cost.ride_type)
                    .and_then(|e| e.eta_seconds)
                    .unwrap_or(0.0);
                let surge = cost
                    .primetime_percentage
                    .map(|pct| 1.0 + pct / 100.0)
                    .unwrap_or(1.0)
                    .max(1.0);

                Some(NormalizedRideOffer {
                    provider: "lyft".into(),
                    name: non_empty(cost.display_name).unwrap_or_else(|| "Lyft".into()),
                    features: RideFeature::from_product_name(&cost.ride_type),
                    price: high,
                    price_range: Some(FareRange { low, high }),
                    currency: non_empty(cost.currency).unwrap_or_else(|| "USD".into()),
                    eta: seconds_to_minutes(seconds),
                    capacity: seats.unwrap_or(DEFAULT_SEATS),
                    surge_multiplier: surge,
                    savings_percent: 0,
                    booking_url: link(
                        "lyft://ridetype",
                        &[
                            ("pickup[latitude]", pickup.latitude.to_string()),
                            ("pickup[longitude]", pickup.longitude.to_string()),
                            ("destination[latitude]", dropoff.latitude.to_string()),
                            ("destination[longitude]", dropoff.longitude.to_string()),
                            ("ride_type", cost.ride_type.clone()),
                        ],
                    ),
                    web_booking_url: web_booking_url.clone(),
                    kind: cost.ride_type,
                })
            })
            .collect()
    }
}

pub struct LyftRides {
    api: Arc<dyn LyftApi>,
}

impl LyftRides {
    pub fn new(api: Arc<dyn LyftApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RideProvider for LyftRides {
    fn name(&self) -> &'static str {
        "lyft"
    }

    async fn quotes(&self, trip: &Trip) -> ProviderResult<Vec<NormalizedRideOffer>> {
        let (ride_types, costs, etas) = try_join3(
            self.api.ride_types(trip.pickup),
            self.api.cost_estimates(trip.pickup, trip.dropoff),
            self.api.eta_estimates(trip.pickup),
        )
        .await?;

        Ok(LyftEstimates { trip: *trip, ride_types, costs, etas }.normalize())
    }
}
