use anyhow::Result;
use async_trait::async_trait;
use nb_core::error::ProviderResult;
use nb_core::providers::eventbrite::{EbEvent, EbSearchResponse, EventbriteApi, EventbriteQuery};
use reqwest::header::HeaderMap;

use crate::client::{Auth, JsonClient, ProviderClientConfig};

pub struct EventbriteClient {
    inner: JsonClient,
}

impl EventbriteClient {
    pub fn new(config: &ProviderClientConfig) -> Result<Self> {
        let inner = JsonClient::new("eventbrite", config, Auth::Bearer, HeaderMap::new())?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl EventbriteApi for EventbriteClient {
    async fn search_events(&self, query: &EventbriteQuery) -> ProviderResult<EbSearchResponse> {
        self.inner.get("/events/search/", &query.to_params()).await
    }

    async fn event_by_id(&self, id: &str) -> ProviderResult<EbEvent> {
        let expand = [("expand", "venue,ticket_availability,category".to_string())];
        self.inner.get(&format!("/events/{id}/"), &expand).await
    }
}
