//! Provider-native payloads, the client traits that fetch them, and one
//! normalizer per provider.

pub mod demo;
pub mod eventbrite;
pub mod lyft;
pub mod ticketmaster;
pub mod uber;
pub mod via;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::form_urlencoded;

use crate::error::ProviderResult;
use crate::geo::Coordinates;
use crate::ride::NormalizedRideOffer;

/// One trip to be quoted by every rideshare provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trip {
    pub pickup: Coordinates,
    pub dropoff: Coordinates,
    pub passengers: u32,
}

/// A rideshare provider's complete quote flow for one trip.
#[async_trait]
pub trait RideProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn quotes(&self, trip: &Trip) -> ProviderResult<Vec<NormalizedRideOffer>>;
}

/// Accepts a JSON number or a numeric string (optionally suffixed with `%`).
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()))
}

/// Reads an explicit JSON `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

pub(crate) fn coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
        _ => None,
    }
}

/// `scheme_and_path` followed by a form-encoded query string.
pub(crate) fn link(scheme_and_path: &str, params: &[(&str, String)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{scheme_and_path}?{query}")
}

/// Whole minutes from seconds, rounded half up.
pub(crate) fn seconds_to_minutes(seconds: f64) -> u32 {
    (seconds / 60.0).round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_f64")]
        value: Option<f64>,
    }

    fn probe(json: &str) -> Option<f64> {
        serde_json::from_str::<Probe>(json).unwrap().value
    }

    #[test]
    fn test_lenient_f64() {
        assert_eq!(probe(r#"{"value": 29.95}"#), Some(29.95));
        assert_eq!(probe(r#"{"value": "-90.07"}"#), Some(-90.07));
        assert_eq!(probe(r#"{"value": "25%"}"#), Some(25.0));
        assert_eq!(probe(r#"{"value": "n/a"}"#), None);
        assert_eq!(probe(r#"{"value": null}"#), None);
        assert_eq!(probe(r#"{}"#), None);
    }

    #[derive(Deserialize)]
    struct Listing {
        #[serde(default, deserialize_with = "null_as_default")]
        ids: Vec<String>,
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
    }

    #[test]
    fn test_null_as_default() {
        let listing: Listing = serde_json::from_str(r#"{"ids": null, "name": null}"#).unwrap();
        assert!(listing.ids.is_empty());
        assert!(listing.name.is_empty());

        let listing: Listing = serde_json::from_str(r#"{"ids": ["a"]}"#).unwrap();
        assert_eq!(listing.ids, vec!["a"]);
    }

    #[test]
    fn test_link_encodes_query() {
        let url = link("lyft://ridetype", &[("ride_type", "lyft xl".into()), ("pickup[latitude]", "29.9".into())]);
        assert_eq!(url, "lyft://ridetype?ride_type=lyft+xl&pickup%5Blatitude%5D=29.9");
    }
}
