use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::FutureExt;
use nb_core::analytics::BookingRecord;
use nb_core::ride::{RideFilters, SortKey};
use nb_core::{Coordinates, NormalizedRideOffer, RideComparisonEngine, RideRequest};
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::error::panic_message;
use crate::routes::events::valid_coordinates;

#[derive(Clone)]
pub struct RideshareState {
    engine: Arc<RideComparisonEngine>,
}

pub fn rideshare_router(engine: Arc<RideComparisonEngine>) -> Router {
    Router::new()
        .route("/api/rideshare/compare", post(compare))
        .route("/api/rideshare/track-booking", post(track_booking))
        .with_state(RideshareState { engine })
}

/// A location as sent by the client; both fields are checked before use.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LocationInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationInput {
    fn resolve(&self) -> Option<Coordinates> {
        valid_coordinates(self.latitude?, self.longitude?)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompareBody {
    pub pickup: Option<LocationInput>,
    pub dropoff: Option<LocationInput>,
    pub passengers: Option<u32>,
    #[serde(default)]
    pub filters: RideFilters,
    #[serde(default)]
    pub sort_by: SortKey,
    pub event_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub success: bool,
    pub rides: Vec<NormalizedRideOffer>,
    pub total_options: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackBookingBody {
    pub provider: String,
    pub ride_type: String,
    pub price: Option<f64>,
    pub event_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackBookingResponse {
    pub success: bool,
}

/// `{success: false, message}` envelope used by the rideshare endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FailureBody {
    pub success: bool,
    pub message: String,
}

#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = FailureBody { success: false, message: self.message };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Failure {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl CompareBody {
    fn into_request(self) -> Result<RideRequest, Failure> {
        let (Some(pickup), Some(dropoff)) = (
            self.pickup.as_ref().and_then(LocationInput::resolve),
            self.dropoff.as_ref().and_then(LocationInput::resolve),
        ) else {
            return Err(Failure::bad_request("Pickup and dropoff coordinates required"));
        };

        let mut request = RideRequest::new(pickup, dropoff);
        request.passengers = self.passengers.unwrap_or(1);
        request.filters = self.filters;
        request.sort_by = self.sort_by;
        request.event_id = self.event_id;
        Ok(request)
    }
}

#[utoipa::path(
    post,
    path = "/api/rideshare/compare",
    request_body = CompareBody,
    responses(
        (status = 200, description = "Ranked ride offers", body = CompareResponse),
        (status = 400, description = "Missing coordinates or malformed body", body = FailureBody),
        (status = 500, description = "Unexpected failure", body = FailureBody)
    )
)]
pub async fn compare(
    State(state): State<RideshareState>,
    body: Result<Json<CompareBody>, JsonRejection>,
) -> Result<Json<CompareResponse>, Failure> {
    let Json(body) = body?;
    let request = body.into_request()?;

    let result = AssertUnwindSafe(state.engine.compare_rides(&request))
        .catch_unwind()
        .await
        .map_err(|payload| {
            error!(panic = %panic_message(payload.as_ref()), "ride comparison panicked");
            Failure::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to compare rides")
        })?;

    Ok(Json(CompareResponse {
        success: true,
        rides: result.rides,
        total_options: result.total_options,
    }))
}

#[utoipa::path(
    post,
    path = "/api/rideshare/track-booking",
    request_body = TrackBookingBody,
    responses(
        (status = 200, description = "Booking recorded", body = TrackBookingResponse),
        (status = 400, description = "Malformed body", body = FailureBody)
    )
)]
pub async fn track_booking(
    State(state): State<RideshareState>,
    body: Result<Json<TrackBookingBody>, JsonRejection>,
) -> Result<Json<TrackBookingResponse>, Failure> {
    let Json(body) = body?;
    info!(provider = %body.provider, ride_type = %body.ride_type, "booking click-through");

    state.engine.track_booking(BookingRecord::new(
        body.provider,
        body.ride_type,
        body.price,
        body.event_id,
    ));
    Ok(Json(TrackBookingResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use nb_core::analytics::{AnalyticsRecord, MemorySink};
    use nb_core::providers::demo::DemoRides;
    use nb_core::providers::{RideProvider, Trip};
    use nb_core::{ProviderError, ProviderResult};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct Unreachable;

    #[async_trait]
    impl RideProvider for Unreachable {
        fn name(&self) -> &'static str {
            "unreachable"
        }

        async fn quotes(&self, _trip: &Trip) -> ProviderResult<Vec<NormalizedRideOffer>> {
            Err(ProviderError::Http("connection refused".into()))
        }
    }

    struct Exploding;

    #[async_trait]
    impl RideProvider for Exploding {
        fn name(&self) -> &'static str {
            "exploding"
        }

        async fn quotes(&self, _trip: &Trip) -> ProviderResult<Vec<NormalizedRideOffer>> {
            panic!("quote parser blew up")
        }
    }

    fn app(providers: Vec<Arc<dyn RideProvider>>) -> (Router, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let engine = RideComparisonEngine::new(providers, sink.clone());
        (rideshare_router(Arc::new(engine)), sink)
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn trip(extra: Value) -> String {
        let mut body = json!({
            "pickup": { "latitude": 29.9584, "longitude": -90.0644 },
            "dropoff": { "latitude": 29.9289, "longitude": -90.0836 }
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        body.to_string()
    }

    #[tokio::test]
    async fn test_compare_sorts_demo_quotes_by_price() {
        let (app, sink) = app(vec![Arc::new(DemoRides)]);
        let (status, body) = post_json(app, "/api/rideshare/compare", &trip(json!({}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["totalOptions"], 8);
        assert_eq!(body["rides"][0]["price"], 8.5);
        assert_eq!(body["rides"][7]["savingsPercent"], 0);
        assert_eq!(sink.records().len(), 1);
    }

    #[tokio::test]
    async fn test_compare_wheelchair_filter() {
        let (app, _) = app(vec![Arc::new(DemoRides)]);
        let body = trip(json!({ "filters": { "wheelchair": true } }));
        let (status, body) = post_json(app, "/api/rideshare/compare", &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalOptions"], 1);
        assert_eq!(body["rides"][0]["provider"], "curb");
    }

    #[tokio::test]
    async fn test_compare_capacity_for_large_party() {
        let (app, _) = app(vec![Arc::new(DemoRides)]);
        let body = trip(json!({ "passengers": 5, "sortBy": "eta" }));
        let (_, body) = post_json(app, "/api/rideshare/compare", &body).await;

        let rides = body["rides"].as_array().unwrap();
        assert_eq!(rides.len(), 2);
        assert!(rides.iter().all(|r| r["capacity"].as_u64().unwrap() >= 5));
    }

    #[tokio::test]
    async fn test_compare_all_providers_down() {
        let (app, _) = app(vec![Arc::new(Unreachable), Arc::new(Unreachable)]);
        let (status, body) = post_json(app, "/api/rideshare/compare", &trip(json!({}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "rides": [], "totalOptions": 0 }));
    }

    #[tokio::test]
    async fn test_compare_missing_coordinates() {
        let (app, sink) = app(vec![Arc::new(DemoRides)]);
        let body = json!({ "pickup": { "latitude": 29.95 } }).to_string();
        let (status, body) = post_json(app, "/api/rideshare/compare", &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Pickup and dropoff coordinates required");
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_compare_malformed_body() {
        let (app, _) = app(vec![Arc::new(DemoRides)]);
        let (status, body) = post_json(app, "/api/rideshare/compare", "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_compare_panic_is_500() {
        let (app, _) = app(vec![Arc::new(Exploding)]);
        let (status, body) = post_json(app, "/api/rideshare/compare", &trip(json!({}))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_track_booking_records() {
        let (app, sink) = app(vec![Arc::new(DemoRides)]);
        let body = json!({ "provider": "lyft", "rideType": "Lyft XL", "price": 29.5, "eventId": "tm-cb1" });
        let (status, body) = post_json(app, "/api/rideshare/track-booking", &body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert!(matches!(&records[0], AnalyticsRecord::Booking(b) if b.ride_type == "Lyft XL"));
    }
}
