pub mod aggregator;
pub mod analytics;
pub mod comparison;
pub mod error;
pub mod event;
pub mod geo;
pub mod providers;
pub mod ride;

pub use aggregator::EventAggregator;
pub use analytics::{AnalyticsRecord, AnalyticsSink};
pub use comparison::RideComparisonEngine;
pub use error::{LookupError, ProviderError, ProviderResult};
pub use event::{AggregatedEvents, EventFilters, NormalizedEvent};
pub use geo::Coordinates;
pub use ride::{ComparisonResult, NormalizedRideOffer, RideRequest};

/// Conversion from a provider-native payload into the shared schema.
pub trait Normalize {
    type Output;

    fn normalize(self) -> Self::Output;
}
