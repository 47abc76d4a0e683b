//! Fixed quote feed for development and offline demos.

use async_trait::async_trait;

use super::{RideProvider, Trip};
use crate::error::ProviderResult;
use crate::ride::{NormalizedRideOffer, RideFeature};

#[derive(Debug, Default, Clone, Copy)]
pub struct DemoRides;

struct DemoQuote {
    provider: &'static str,
    name: &'static str,
    kind: &'static str,
    price: f64,
    eta: u32,
    capacity: u32,
    surge: f64,
    features: &'static [RideFeature],
    url: &'static str,
}

const QUOTES: [DemoQuote; 8] = [
    DemoQuote { provider: "uber", name: "Uber", kind: "UberX", price: 18.50, eta: 4, capacity: 4, surge: 1.0, features: &[], url: "https://m.uber.com" },
    DemoQuote { provider: "uber", name: "Uber", kind: "Uber Comfort", price: 24.00, eta: 6, capacity: 4, surge: 1.0, features: &[RideFeature::Luxury], url: "https://m.uber.com" },
    DemoQuote { provider: "uber", name: "Uber", kind: "UberXL", price: 32.00, eta: 8, capacity: 6, surge: 1.0, features: &[RideFeature::Large], url: "https://m.uber.com" },
    DemoQuote { provider: "lyft", name: "Lyft", kind: "Lyft", price: 17.25, eta: 3, capacity: 4, surge: 1.0, features: &[], url: "https://www.lyft.com" },
    DemoQuote { provider: "lyft", name: "Lyft", kind: "Lyft XL", price: 29.50, eta: 7, capacity: 6, surge: 1.0, features: &[RideFeature::Large], url: "https://www.lyft.com" },
    DemoQuote { provider: "lyft", name: "Lyft", kind: "Lyft Lux", price: 45.00, eta: 12, capacity: 4, surge: 1.2, features: &[RideFeature::Luxury], url: "https://www.lyft.com" },
    DemoQuote { provider: "via", name: "Via", kind: "Shared Ride", price: 8.50, eta: 10, capacity: 2, surge: 1.0, features: &[RideFeature::Shared], url: "https://ridewithvia.com" },
    DemoQuote { provider: "curb", name: "Curb", kind: "Taxi", price: 22.00, eta: 5, capacity: 4, surge: 1.0, features: &[RideFeature::Wheelchair], url: "https://gocurb.com" },
];

#[async_trait]
impl RideProvider for DemoRides {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn quotes(&self, _trip: &Trip) -> ProviderResult<Vec<NormalizedRideOffer>> {
        Ok(QUOTES
            .iter()
            .map(|q| NormalizedRideOffer {
                provider: q.provider.into(),
                name: q.name.into(),
                kind: q.kind.into(),
                price: q.price,
                price_range: None,
                currency: "USD".into(),
                eta: q.eta,
                capacity: q.capacity,
                surge_multiplier: q.surge,
                features: q.features.to_vec(),
                savings_percent: 0,
                booking_url: q.url.into(),
                web_booking_url: q.url.into(),
            })
            .collect())
    }
}
