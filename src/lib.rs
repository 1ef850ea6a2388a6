// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod align;
pub mod api;
pub mod config;
pub mod dates;
pub mod error;
pub mod metrics;
pub mod stats;
pub mod trends;
pub mod weather;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tracing::info;

pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::error::{ApiError, ApiResult};

use crate::stats::{BlsUnemployment, CdcLifeExpectancy};
use crate::trends::GoogleTrends;
use crate::weather::{SeeIp, WeatherApi};

const USER_AGENT: &str = concat!("trends-weather-api/", env!("CARGO_PKG_VERSION"));

/// Outbound client shared by the non-trends sources.
pub fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(4).min(timeout))
        .timeout(timeout)
        .build()
        .context("building http client")
}

impl AppState {
    /// Wire the live upstream sources.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let http = http_client(cfg.http_timeout)?;
        let trends = GoogleTrends::new(&cfg.trends_hl, cfg.trends_tz, cfg.http_timeout)?;

        Ok(Self {
            trends: Arc::new(trends),
            weather: Arc::new(WeatherApi::new(http.clone())),
            locator: Arc::new(SeeIp::new(http.clone())),
            life_expectancy: Arc::new(CdcLifeExpectancy::new(http.clone())),
            unemployment: Arc::new(BlsUnemployment::new(http)),
            weather_api_key: cfg.weather_api_key.as_deref().map(Arc::from),
            today: dates::utc_today,
        })
    }
}

/// Build the full application router from the process environment.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::from_env();
    let state = AppState::from_config(&cfg)?;
    info!(timeout_secs = cfg.http_timeout.as_secs(), "router ready");
    Ok(router(state))
}
