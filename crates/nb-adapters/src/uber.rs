use anyhow::Result;
use async_trait::async_trait;
use nb_core::error::ProviderResult;
use nb_core::geo::Coordinates;
use nb_core::providers::uber::{
    UberApi, UberPriceEstimate, UberPricesResponse, UberProduct, UberProductsResponse,
    UberTimeEstimate, UberTimesResponse,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};

use crate::client::{Auth, JsonClient, ProviderClientConfig};

/// Riders API client using a server token (`Authorization: Token ...`).
pub struct UberClient {
    inner: JsonClient,
}

impl UberClient {
    pub fn new(config: &ProviderClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en_US"));
        let inner = JsonClient::new("uber", config, Auth::Token, headers)?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl UberApi for UberClient {
    async fn products(&self, at: Coordinates) -> ProviderResult<Vec<UberProduct>> {
        let query = [
            ("latitude", at.latitude.to_string()),
            ("longitude", at.longitude.to_string()),
        ];
        let response: UberProductsResponse = self.inner.get("/products", &query).await?;
        Ok(response.products)
    }

    async fn price_estimates(
        &self,
        start: Coordinates,
        end: Coordinates,
    ) -> ProviderResult<Vec<UberPriceEstimate>> {
        let query = [
            ("start_latitude", start.latitude.to_string()),
            ("start_longitude", start.longitude.to_string()),
            ("end_latitude", end.latitude.to_string()),
            ("end_longitude", end.longitude.to_string()),
        ];
        let response: UberPricesResponse = self.inner.get("/estimates/price", &query).await?;
        Ok(response.prices)
    }

    async fn time_estimates(&self, start: Coordinates) -> ProviderResult<Vec<UberTimeEstimate>> {
        let query = [
            ("start_latitude", start.latitude.to_string()),
            ("start_longitude", start.longitude.to_string()),
        ];
        let response: UberTimesResponse = self.inner.get("/estimates/time", &query).await?;
        Ok(response.times)
    }
}
