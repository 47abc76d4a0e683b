use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use nb_core::event::{CulinaryQuery, NormalizedEvent};
use nb_core::{AggregatedEvents, Coordinates, EventAggregator, EventFilters};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, ErrorBody};

#[derive(Clone)]
pub struct EventsState {
    aggregator: Arc<EventAggregator>,
}

pub fn events_router(aggregator: Arc<EventAggregator>) -> Router {
    Router::new()
        .route("/api/events", get(list_events))
        .route("/api/events/culinary", get(culinary_events))
        .route("/api/events/nearby", get(nearby_events))
        .route("/api/events/{id}", get(event_by_id))
        .with_state(EventsState { aggregator })
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CulinaryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyParams {
    pub lat: f64,
    pub lng: f64,
    /// Earliest start; defaults to now.
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NearbyEvents {
    pub events: Vec<NormalizedEvent>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventDetail {
    pub event: NormalizedEvent,
}

#[utoipa::path(
    get,
    path = "/api/events",
    responses(
        (status = 200, description = "Merged, deduplicated events", body = AggregatedEvents),
        (status = 400, description = "Invalid query", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ErrorBody)
    )
)]
pub async fn list_events(
    State(state): State<EventsState>,
    query: Result<Query<EventFilters>, QueryRejection>,
) -> Result<Json<AggregatedEvents>, AppError> {
    let Query(filters) = query?;
    Ok(Json(state.aggregator.aggregate_events(&filters).await))
}

#[utoipa::path(
    get,
    path = "/api/events/culinary",
    params(CulinaryParams),
    responses(
        (status = 200, description = "Food and drink events", body = AggregatedEvents),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
pub async fn culinary_events(
    State(state): State<EventsState>,
    query: Result<Query<CulinaryParams>, QueryRejection>,
) -> Result<Json<AggregatedEvents>, AppError> {
    let Query(params) = query?;
    let query = CulinaryQuery {
        start_date: params.start_date,
        end_date: params.end_date,
        max_results: params.limit,
    };
    let events = state.aggregator.culinary_events(&query).await;
    Ok(Json(AggregatedEvents::from_events(events)))
}

#[utoipa::path(
    get,
    path = "/api/events/nearby",
    params(NearbyParams),
    responses(
        (status = 200, description = "Culinary events within two miles", body = NearbyEvents),
        (status = 400, description = "Missing or invalid coordinates", body = ErrorBody)
    )
)]
pub async fn nearby_events(
    State(state): State<EventsState>,
    query: Result<Query<NearbyParams>, QueryRejection>,
) -> Result<Json<NearbyEvents>, AppError> {
    let Query(params) = query?;
    let venue = valid_coordinates(params.lat, params.lng)
        .ok_or_else(|| AppError::bad_request("lat and lng must be valid coordinates"))?;

    let events = state.aggregator.events_near_venue(venue, params.date).await;
    Ok(Json(NearbyEvents { total: events.len(), events }))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = String, Path, description = "Provider-prefixed id, e.g. tm-G5vYZ9")),
    responses(
        (status = 200, description = "Event detail", body = EventDetail),
        (status = 400, description = "Unknown id prefix", body = ErrorBody),
        (status = 502, description = "Provider lookup failed", body = ErrorBody)
    )
)]
pub async fn event_by_id(
    State(state): State<EventsState>,
    Path(id): Path<String>,
) -> Result<Json<EventDetail>, AppError> {
    let event = state.aggregator.event_by_id(&id).await?;
    Ok(Json(EventDetail { event }))
}

pub(crate) fn valid_coordinates(latitude: f64, longitude: f64) -> Option<Coordinates> {
    let ok = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    ok.then(|| Coordinates::new(latitude, longitude))
}
