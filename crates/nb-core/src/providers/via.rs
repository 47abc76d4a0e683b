//! Via ride estimate endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{lenient_f64, link, RideProvider, Trip};
use crate::error::ProviderResult;
use crate::ride::{NormalizedRideOffer, RideFeature};
use crate::Normalize;

const DEFAULT_MAX_PASSENGERS: u32 = 6;

#[async_trait]
pub trait ViaApi: Send + Sync {
    async fn estimate(&self, request: &ViaEstimateRequest) -> ProviderResult<ViaEstimateResponse>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViaLocation {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViaEstimateRequest {
    pub pickup_location: ViaLocation,
    pub dropoff_location: ViaLocation,
    pub passengers: u32,
}

impl From<&Trip> for ViaEstimateRequest {
    fn from(trip: &Trip) -> Self {
        Self {
            pickup_location: ViaLocation { lat: trip.pickup.latitude, lng: trip.pickup.longitude },
            dropoff_location: ViaLocation { lat: trip.dropoff.latitude, lng: trip.dropoff.longitude },
            passengers: trip.passengers,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViaEstimateResponse {
    pub estimate: Option<ViaEstimate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViaEstimate {
    #[serde(deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub eta_minutes: Option<f64>,
    pub max_passengers: Option<u32>,
}

/// A Via estimate paired with the trip it was requested for.
#[derive(Debug, Clone)]
pub struct ViaQuote {
    pub trip: Trip,
    pub response: ViaEstimateResponse,
}

impl Normalize for ViaQuote {
    type Output = Vec<NormalizedRideOffer>;

    fn normalize(self) -> Vec<NormalizedRideOffer> {
        let Some(estimate) = self.response.estimate else {
            return Vec::new();
        };
        let Some(price) = estimate.price else {
            return Vec::new();
        };

        let Trip { pickup, dropoff, .. } = self.trip;
        let url = link(
            "https://ridewithvia.com/link",
            &[
                ("pickup", format!("{},{}", pickup.latitude, pickup.longitude)),
                ("dropoff", format!("{},{}", dropoff.latitude, dropoff.longitude)),
            ],
        );

        vec![NormalizedRideOffer {
            provider: "via".into(),
            name: "Via Shared".into(),
            kind: "shared".into(),
            price,
            price_range: None,
            currency: "USD".into(),
            eta: estimate.eta_minutes.map(|m| m.round().max(0.0) as u32).unwrap_or(0),
            capacity: estimate.max_passengers.unwrap_or(DEFAULT_MAX_PASSENGERS),
            surge_multiplier: 1.0,
            features: vec![RideFeature::Shared],
            savings_percent: 0,
            booking_url: url.clone(),
            web_booking_url: url,
        }]
    }
}

pub struct ViaRides {
    api: Arc<dyn ViaApi>,
}

impl ViaRides {
    pub fn new(api: Arc<dyn ViaApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RideProvider for ViaRides {
    fn name(&self) -> &'static str {
        "via"
    }

    async fn quotes(&self, trip: &Trip) -> ProviderResult<Vec<NormalizedRideOffer>> {
        let response = self.api.estimate(&ViaEstimateRequest::from(trip)).await?;
        Ok(ViaQuote { trip: *trip, response }.normalize())
    }
}
