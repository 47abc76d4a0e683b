use anyhow::Result;
use async_trait::async_trait;
use nb_core::error::ProviderResult;
use nb_core::providers::via::{ViaApi, ViaEstimateRequest, ViaEstimateResponse};
use reqwest::header::HeaderMap;

use crate::client::{Auth, JsonClient, ProviderClientConfig};

pub struct ViaClient {
    inner: JsonClient,
}

impl ViaClient {
    pub fn new(config: &ProviderClientConfig) -> Result<Self> {
        let inner = JsonClient::new("via", config, Auth::Bearer, HeaderMap::new())?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl ViaApi for ViaClient {
    async fn estimate(&self, request: &ViaEstimateRequest) -> ProviderResult<ViaEstimateResponse> {
        self.inner.post("/rides/estimate", request).await
    }
}
