mod error;
mod middleware;
mod routes;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use http::{header, HeaderValue, Method};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

use nb_adapters::ProviderClientConfig;
use nb_config::{Config, ProviderConfig};
use nb_core::analytics::TracingSink;
use nb_core::providers::demo::DemoRides;
use nb_core::providers::lyft::LyftRides;
use nb_core::providers::uber::UberRides;
use nb_core::providers::via::ViaRides;
use nb_core::providers::RideProvider;
use nb_core::{AnalyticsSink, EventAggregator, RideComparisonEngine};
use nb_storage::{migrate, new_pool, SqliteAnalyticsSink};

use middleware::cors::CorsPolicy;

#[derive(Clone)]
struct AppState {
    pool: sqlx::SqlitePool,
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "OK")
    )
)]
async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[utoipa::path(
    get,
    path = "/api/v1/ping",
    responses(
        (status = 200, description = "Ping with DB check"),
        (status = 500, description = "Database error")
    )
)]
async fn ping(State(state): State<AppState>) -> Result<Json<serde_json::Value>, StatusCode> {
    let result: Result<i64, _> = sqlx::query_scalar("SELECT 1").fetch_one(&state.pool).await;

    match result {
        Ok(_) => Ok(Json(json!({"ok": true, "db": "up"}))),
        Err(e) => {
            warn!(error = %e, "database ping failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        healthz,
        ping,
        routes::events::list_events,
        routes::events::culinary_events,
        routes::events::nearby_events,
        routes::events::event_by_id,
        routes::rideshare::compare,
        routes::rideshare::track_booking,
    ),
    components(schemas(error::ErrorBody, routes::rideshare::FailureBody)),
    tags(
        (name = "nb-api", description = "NolaBites event and rideshare API")
    )
)]
struct ApiDoc;

fn build_cors_layer(config: &Config) -> CorsLayer {
    let policy = CorsPolicy::new(config.public_url.as_deref(), &config.allowed_origins);

    let origin_pred =
        AllowOrigin::predicate(move |origin: &HeaderValue, _req| policy.allows(origin));

    CorsLayer::new()
        .allow_origin(origin_pred)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600))
        .allow_credentials(false)
}

fn client_config(base_url: &str, credential: &Option<String>, timeout_ms: u64) -> ProviderClientConfig {
    ProviderClientConfig::new(base_url, credential.clone(), timeout_ms)
}

fn build_aggregator(p: &ProviderConfig) -> anyhow::Result<EventAggregator> {
    let ticketmaster = nb_adapters::ticketmaster(&client_config(
        &p.ticketmaster_base_url,
        &p.ticketmaster_api_key,
        p.timeout_ms,
    ))?;
    let eventbrite = nb_adapters::eventbrite(&client_config(
        &p.eventbrite_base_url,
        &p.eventbrite_token,
        p.timeout_ms,
    ))?;

    for (name, key) in [("ticketmaster", &p.ticketmaster_api_key), ("eventbrite", &p.eventbrite_token)] {
        if key.is_none() {
            warn!(provider = name, "event provider has no credential; searches will return nothing");
        }
    }

    Ok(EventAggregator::new(ticketmaster, eventbrite))
}

/// Live providers with a credential, plus the demo feed when enabled.
fn ride_providers(config: &Config) -> anyhow::Result<Vec<Arc<dyn RideProvider>>> {
    let p = &config.providers;
    let mut providers: Vec<Arc<dyn RideProvider>> = Vec::new();

    if p.uber_server_token.is_some() {
        let api = nb_adapters::uber(&client_config(&p.uber_base_url, &p.uber_server_token, p.timeout_ms))?;
        providers.push(Arc::new(UberRides::new(api)));
    }
    if p.lyft_server_token.is_some() {
        let api = nb_adapters::lyft(&client_config(&p.lyft_base_url, &p.lyft_server_token, p.timeout_ms))?;
        providers.push(Arc::new(LyftRides::new(api)));
    }
    if p.via_api_key.is_some() {
        let api = nb_adapters::via(&client_config(&p.via_base_url, &p.via_api_key, p.timeout_ms))?;
        providers.push(Arc::new(ViaRides::new(api)));
    }
    if config.rideshare_demo {
        providers.push(Arc::new(DemoRides));
    }

    let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
    if names.is_empty() {
        warn!("no rideshare providers configured; comparisons will be empty");
    } else {
        info!(providers = ?names, "rideshare providers enabled");
    }

    Ok(providers)
}

fn build_app(state: AppState, aggregator: EventAggregator, engine: RideComparisonEngine, cors: CorsLayer) -> Router {
    let api = ApiDoc::openapi();

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/ping", get(ping))
        .route("/openapi.json", get(|| async move { Json(api) }))
        .with_state(state)
        .merge(routes::events::events_router(Arc::new(aggregator)))
        .merge(routes::rideshare::rideshare_router(Arc::new(engine)))
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Tracing (JSON logs)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .init();

    let config = Config::load()?;
    info!("Starting nb-api on {}", config.bind_addr);

    let pool = new_pool(&config.db_url).await?;
    migrate(&pool).await?;

    let sink: Arc<dyn AnalyticsSink> = if config.analytics_persist {
        Arc::new(SqliteAnalyticsSink::new(pool.clone()))
    } else {
        Arc::new(TracingSink)
    };

    let aggregator = build_aggregator(&config.providers)?;
    let engine = RideComparisonEngine::new(ride_providers(&config)?, sink);
    let cors = build_cors_layer(&config);

    let app = build_app(AppState { pool }, aggregator, engine, cors);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
