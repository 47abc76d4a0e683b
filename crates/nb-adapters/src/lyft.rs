use anyhow::Result;
use async_trait::async_trait;
use nb_core::error::ProviderResult;
use nb_core::geo::Coordinates;
use nb_core::providers::lyft::{
    LyftApi, LyftCostEstimate, LyftCostResponse, LyftEtaEstimate, LyftEtaResponse, LyftRideType,
    LyftRideTypesResponse,
};
use reqwest::header::HeaderMap;

use crate::client::{Auth, JsonClient, ProviderClientConfig};

pub struct LyftClient {
    inner: JsonClient,
}

impl LyftClient {
    pub fn new(config: &ProviderClientConfig) -> Result<Self> {
        let inner = JsonClient::new("lyft", config, Auth::Bearer, HeaderMap::new())?;
        Ok(Self { inner })
    }
}

fn at(point: Coordinates) -> [(&'static str, String); 2] {
    [("lat", point.latitude.to_string()), ("lng", point.longitude.to_string())]
}

#[async_trait]
impl LyftApi for LyftClient {
    async fn ride_types(&self, point: Coordinates) -> ProviderResult<Vec<LyftRideType>> {
        let response: LyftRideTypesResponse = self.inner.get("/ridetypes", &at(point)).await?;
        Ok(response.ride_types)
    }

    async fn cost_estimates(
        &self,
        start: Coordinates,
        end: Coordinates,
    ) -> ProviderResult<Vec<LyftCostEstimate>> {
        let query = [
            ("start_lat", start.latitude.to_string()),
            ("start_lng", start.longitude.to_string()),
            ("end_lat", end.latitude.to_string()),
            ("end_lng", end.longitude.to_string()),
        ];
        let response: LyftCostResponse = self.inner.get("/cost", &query).await?;
        Ok(response.cost_estimates)
    }

    async fn eta_estimates(&self, point: Coordinates) -> ProviderResult<Vec<LyftEtaEstimate>> {
        let response: LyftEtaResponse = self.inner.get("/eta", &at(point)).await?;
        Ok(response.eta_estimates)
    }
}
