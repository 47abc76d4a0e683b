use anyhow::Result;
use async_trait::async_trait;
use nb_core::error::ProviderResult;
use nb_core::providers::ticketmaster::{TicketmasterApi, TicketmasterQuery, TmEvent, TmSearchResponse};
use reqwest::header::HeaderMap;

use crate::client::{Auth, JsonClient, ProviderClientConfig};

/// Discovery API client; the key travels as the `apikey` query parameter.
pub struct TicketmasterClient {
    inner: JsonClient,
}

impl TicketmasterClient {
    pub fn new(config: &ProviderClientConfig) -> Result<Self> {
        let inner = JsonClient::new("ticketmaster", config, Auth::Query("apikey"), HeaderMap::new())?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl TicketmasterApi for TicketmasterClient {
    async fn search_events(&self, query: &TicketmasterQuery) -> ProviderResult<TmSearchResponse> {
        self.inner.get("/events.json", &query.to_params()).await
    }

    async fn event_by_id(&self, id: &str) -> ProviderResult<TmEvent> {
        self.inner.get(&format!("/events/{id}.json"), &[]).await
    }
}
