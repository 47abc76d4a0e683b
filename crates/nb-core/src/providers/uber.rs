//! Uber Riders API v1.2 estimates.

use async_trait::async_trait;
use futures_util::future::try_join3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{lenient_f64, link, non_empty, null_as_default, seconds_to_minutes, RideProvider, Trip};
use crate::error::ProviderResult;
use crate::geo::Coordinates;
use crate::ride::{FareRange, NormalizedRideOffer, RideFeature};
use crate::Normalize;

const DEFAULT_CAPACITY: u32 = 4;

#[async_trait]
pub trait UberApi: Send + Sync {
    async fn products(&self, at: Coordinates) -> ProviderResult<Vec<UberProduct>>;

    async fn price_estimates(
        &self,
        start: Coordinates,
        end: Coordinates,
    ) -> ProviderResult<Vec<UberPriceEstimate>>;

    async fn time_estimates(&self, start: Coordinates) -> ProviderResult<Vec<UberTimeEstimate>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UberProductsResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub products: Vec<UberProduct>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UberProduct {
    #[serde(deserialize_with = "null_as_default")]
    pub product_id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UberPricesResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub prices: Vec<UberPriceEstimate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UberPriceEstimate {
    #[serde(deserialize_with = "null_as_default")]
    pub product_id: String,
    pub display_name: Option<String>,
    pub currency_code: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub low_estimate: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub high_estimate: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub surge_multiplier: Option<f64>,
    pub estimate: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UberTimesResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub times: Vec<UberTimeEstimate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UberTimeEstimate {
    #[serde(deserialize_with = "null_as_default")]
    pub product_id: String,
    pub display_name: Option<String>,
    /// Seconds until pickup.
    #[serde(deserialize_with = "lenient_f64")]
    pub estimate: Option<f64>,
}

/// The three estimate calls for one trip, joined on `product_id`.
#[derive(Debug, Clone)]
pub struct UberEstimates {
    pub trip: Trip,
    pub products: Vec<UberProduct>,
    pub prices: Vec<UberPriceEstimate>,
    pub times: Vec<UberTimeEstimate>,
}

impl Normalize for UberEstimates {
    type Output = Vec<NormalizedRideOffer>;

    /// One offer per price estimate; estimates without a fare are skipped.
    fn normalize(self) -> Vec<NormalizedRideOffer> {
        let Trip { pickup, dropoff, .. } = self.trip;
        let web_booking_url = link(
            "https://m.uber.com/ul/",
            &[
                ("action", "setPickup".into()),
                ("pickup[latitude]", pickup.latitude.to_string()),
                ("pickup[longitude]", pickup.longitude.to_string()),
                ("dropoff[latitude]", dropoff.latitude.to_string()),
                ("dropoff[longitude]", dropoff.longitude.to_string()),
            ],
        );

        self.prices
            .into_iter()
            .filter_map(|price| {
                let (low, high) = match (price.low_estimate, price.high_estimate) {
                    (Some(low), Some(high)) => (low, high),
                    (Some(one), None) | (None, Some(one)) => (one, one),
                    (None, None) => return None,
                };
                let product = self.products.iter().find(|p| p.product_id == price.product_id);
                let seconds = self
                    .times
                    .iter()
                    .find(|t| t.product_id == price.product_id)
                    .and_then(|t| t.estimate)
                    .unwrap_or(0.0);
                let name = non_empty(price.display_name)
                    .or_else(|| product.and_then(|p| non_empty(p.display_name.clone())))
                    .unwrap_or_else(|| "Uber".into());

                Some(NormalizedRideOffer {
                    provider: "uber".into(),
                    features: RideFeature::from_product_name(&name),
                    name: name.clone(),
                    kind: name,
                    price: (low + high) / 2.0,
                    price_range: Some(FareRange { low, high }),
                    currency: non_empty(price.currency_code).unwrap_or_else(|| "USD".into()),
                    eta: seconds_to_minutes(seconds),
                    capacity: product.and_then(|p| p.capacity).unwrap_or(DEFAULT_CAPACITY),
                    surge_multiplier: price.surge_multiplier.unwrap_or(1.0).max(1.0),
                    savings_percent: 0,
                    booking_url: link(
                        "uber://",
                        &[
                            ("action", "setPickup".into()),
                            ("pickup[latitude]", pickup.latitude.to_string()),
                            ("pickup[longitude]", pickup.longitude.to_string()),
                            ("dropoff[latitude]", dropoff.latitude.to_string()),
                            ("dropoff[longitude]", dropoff.longitude.to_string()),
                            ("product_id", price.product_id.clone()),
                        ],
                    ),
                    web_booking_url: web_booking_url.clone(),
                })
            })
            .collect()
    }
}

/// Uber quote flow: products, prices and pickup times fetched together.
pub struct UberRides {
    api: Arc<dyn UberApi>,
}

impl UberRides {
    pub fn new(api: Arc<dyn UberApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RideProvider for UberRides {
    fn name(&self) -> &'static str {
        "uber"
    }

    async fn quotes(&self, trip: &Trip) -> ProviderResult<Vec<NormalizedRideOffer>> {
        let (products, prices, times) = try_join3(
            self.api.products(trip.pickup),
            self.api.price_estimates(trip.pickup, trip.dropoff),
            self.api.time_estimates(trip.pickup),
        )
        .await?;

        Ok(UberEstimates { trip: *trip, products, prices, times }.normalize())
    }
}
