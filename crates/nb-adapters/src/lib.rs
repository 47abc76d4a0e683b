//! HTTP clients for the event and rideshare providers.
//!
//! Each client implements the matching provider trait from `nb_core` and does
//! nothing beyond transport: payloads come back in the provider's own schema
//! and are normalized by the core.

mod client;
pub mod eventbrite;
pub mod lyft;
pub mod ticketmaster;
pub mod uber;
pub mod via;

pub use client::ProviderClientConfig;
pub use eventbrite::EventbriteClient;
pub use lyft::LyftClient;
pub use ticketmaster::TicketmasterClient;
pub use uber::UberClient;
pub use via::ViaClient;

use anyhow::Result;
use nb_core::providers::eventbrite::EventbriteApi;
use nb_core::providers::lyft::LyftApi;
use nb_core::providers::ticketmaster::TicketmasterApi;
use nb_core::providers::uber::UberApi;
use nb_core::providers::via::ViaApi;
use std::sync::Arc;

/// Smart constructors for the trait objects the core consumes.
pub fn ticketmaster(config: &ProviderClientConfig) -> Result<Arc<dyn TicketmasterApi>> {
    Ok(Arc::new(TicketmasterClient::new(config)?))
}

pub fn eventbrite(config: &ProviderClientConfig) -> Result<Arc<dyn EventbriteApi>> {
    Ok(Arc::new(EventbriteClient::new(config)?))
}

pub fn uber(config: &ProviderClientConfig) -> Result<Arc<dyn UberApi>> {
    Ok(Arc::new(UberClient::new(config)?))
}

pub fn lyft(config: &ProviderClientConfig) -> Result<Arc<dyn LyftApi>> {
    Ok(Arc::new(LyftClient::new(config)?))
}

pub fn via(config: &ProviderClientConfig) -> Result<Arc<dyn ViaApi>> {
    Ok(Arc::new(ViaClient::new(config)?))
}
