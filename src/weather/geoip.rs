// src/weather/geoip.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

const SEEIP_URL: &str = "https://ip.seeip.org/jsonip?";

/// Finds a location string the weather provider understands.
#[async_trait]
pub trait IpLocator: Send + Sync {
    async fn locate(&self) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// Uses the server's public IP as the weather query.
pub struct SeeIp {
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct JsonIp {
    ip: String,
}

impl SeeIp {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl IpLocator for SeeIp {
    async fn locate(&self) -> Result<String> {
        let resp: JsonIp = self
            .http
            .get(SEEIP_URL)
            .send()
            .await
            .context("seeip get()")?
            .error_for_status()
            .context("seeip status")?
            .json()
            .await
            .context("seeip json")?;
        let ip = resp.ip.trim().to_string();
        if ip.is_empty() {
            return Err(anyhow!("seeip returned an empty ip"));
        }
        Ok(ip)
    }

    fn name(&self) -> &'static str {
        "seeip"
    }
}
