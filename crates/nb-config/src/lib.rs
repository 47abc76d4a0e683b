use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub db_url: String,
    pub public_url: Option<String>,
    pub allowed_origins: Vec<String>,
    pub providers: ProviderConfig,
    /// Serve the fixed demo quote feed alongside live rideshare providers.
    pub rideshare_demo: bool,
    /// Persist analytics records to the database instead of only logging them.
    pub analytics_persist: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub ticketmaster_api_key: Option<String>,
    pub eventbrite_token: Option<String>,
    pub uber_server_token: Option<String>,
    pub lyft_server_token: Option<String>,
    pub via_api_key: Option<String>,
    pub ticketmaster_base_url: String,
    pub eventbrite_base_url: String,
    pub uber_base_url: String,
    pub lyft_base_url: String,
    pub via_base_url: String,
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            ticketmaster_api_key: None,
            eventbrite_token: None,
            uber_server_token: None,
            lyft_server_token: None,
            via_api_key: None,
            ticketmaster_base_url: "https://app.ticketmaster.com/discovery/v2".into(),
            eventbrite_base_url: "https://www.eventbriteapi.com/v3".into(),
            uber_base_url: "https://api.uber.com/v1.2".into(),
            lyft_base_url: "https://api.lyft.com/v1".into(),
            via_base_url: "https://api.ridewithvia.com/v1".into(),
            timeout_ms: 10_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            db_url: "sqlite://nb.db".into(),
            public_url: None,
            allowed_origins: Vec::new(),
            providers: ProviderConfig::default(),
            rideshare_demo: false,
            analytics_persist: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; empty values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut cfg = Self::default();
        if let Some(v) = get("NB_BIND_ADDR") {
            cfg.bind_addr = v;
        }
        if let Some(v) = get("DATABASE_URL") {
            cfg.db_url = v;
        }
        cfg.public_url = get("NB_PUBLIC_URL");
        if let Some(v) = get("NB_ALLOWED_ORIGINS") {
            cfg.allowed_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = get("NB_RIDESHARE_DEMO") {
            cfg.rideshare_demo = parse_flag("NB_RIDESHARE_DEMO", &v)?;
        }
        if let Some(v) = get("NB_ANALYTICS_PERSIST") {
            cfg.analytics_persist = parse_flag("NB_ANALYTICS_PERSIST", &v)?;
        }

        let p = &mut cfg.providers;
        p.ticketmaster_api_key = get("TICKETMASTER_API_KEY");
        p.eventbrite_token = get("EVENTBRITE_TOKEN");
        p.uber_server_token = get("UBER_SERVER_TOKEN");
        p.lyft_server_token = get("LYFT_SERVER_TOKEN");
        p.via_api_key = get("VIA_API_KEY");
        if let Some(v) = get("NB_TICKETMASTER_BASE_URL") {
            p.ticketmaster_base_url = v;
        }
        if let Some(v) = get("NB_EVENTBRITE_BASE_URL") {
            p.eventbrite_base_url = v;
        }
        if let Some(v) = get("NB_UBER_BASE_URL") {
            p.uber_base_url = v;
        }
        if let Some(v) = get("NB_LYFT_BASE_URL") {
            p.lyft_base_url = v;
        }
        if let Some(v) = get("NB_VIA_BASE_URL") {
            p.via_base_url = v;
        }
        if let Some(v) = get("NB_PROVIDER_TIMEOUT_MS") {
            p.timeout_ms = parse("NB_PROVIDER_TIMEOUT_MS", &v)?;
        }

        Ok(cfg)
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid {key}: {value}"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("invalid {key}: {value}"),
    }
}
