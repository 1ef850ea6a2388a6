// src/weather/mod.rs
//! Daily weather history for the trailing week.
//!
//! Each day is fetched on its own; a failed day becomes
//! [`WeatherEntry::Unavailable`] instead of failing the week.

pub mod geoip;
pub mod weatherapi;

use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use metrics::{counter, histogram};
use serde::{Serialize, Serializer};

use crate::dates::trailing_days;
use crate::error::{ApiError, ApiResult, WEATHER_KEY_MISSING};

pub use geoip::{IpLocator, SeeIp};
pub use weatherapi::WeatherApi;

/// Placeholder shown wherever a day has no weather.
pub const NO_WEATHER: &str = "no weather data available";

/// Days covered by a weather report, ending today.
pub const WEATHER_DAYS: u64 = 7;

/// Daily summary as reported upstream. Values are kept verbatim as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeatherDay {
    #[serde(rename = "weather")]
    pub condition: String,
    pub maxtemp_c: String,
    pub maxtemp_f: String,
    pub mintemp_c: String,
    pub mintemp_f: String,
    pub avgtemp_c: String,
    pub avgtemp_f: String,
    pub maxwind_kph: String,
    pub maxwind_mph: String,
    pub totalprecip_mm: String,
    pub totalprecip_in: String,
    pub avgvis_km: String,
    pub avgvis_miles: String,
    pub avghumidity: String,
    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
    pub moon_phase: String,
    pub moon_illumination: String,
}

/// A day's weather, or the explicit marker that it could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherEntry {
    Available(WeatherDay),
    Unavailable,
}

impl WeatherEntry {
    pub fn is_available(&self) -> bool {
        matches!(self, WeatherEntry::Available(_))
    }
}

impl Serialize for WeatherEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            WeatherEntry::Available(day) => day.serialize(serializer),
            WeatherEntry::Unavailable => serializer.serialize_str(NO_WEATHER),
        }
    }
}

pub type WeatherMap = BTreeMap<NaiveDate, WeatherEntry>;

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// History for a single calendar day at `location`.
    async fn day_history(&self, api_key: &str, location: &str, date: NaiveDate) -> Result<WeatherDay>;
    fn name(&self) -> &'static str;
}

pub struct WeatherFetcher<'a> {
    source: &'a dyn WeatherSource,
    api_key: &'a str,
}

impl<'a> WeatherFetcher<'a> {
    /// Fails before any request is made if the key is missing or blank.
    pub fn new(source: &'a dyn WeatherSource, api_key: Option<&'a str>) -> ApiResult<Self> {
        match api_key.map(str::trim) {
            Some(key) if !key.is_empty() => Ok(Self {
                source,
                api_key: key,
            }),
            _ => Err(ApiError::configuration(WEATHER_KEY_MISSING)),
        }
    }

    /// One entry per day of `[today-6, today]`.
    pub async fn fetch(&self, location: &str, today: NaiveDate) -> WeatherMap {
        let t0 = Instant::now();
        let mut out = WeatherMap::new();

        for date in trailing_days(today, WEATHER_DAYS) {
            let entry = match self.source.day_history(self.api_key, location, date).await {
                Ok(day) => WeatherEntry::Available(day),
                Err(e) => {
                    tracing::warn!(error = ?e, %date, upstream = self.source.name(), "weather day unavailable");
                    counter!("weather_days_unavailable_total").increment(1);
                    WeatherEntry::Unavailable
                }
            };
            out.insert(date, entry);
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("upstream_request_ms", "upstream" => self.source.name()).record(ms);
        out
    }
}

/// Full `/weather` flow: check the key, locate the caller, fetch the week.
pub async fn weather_report(
    source: &dyn WeatherSource,
    locator: &dyn IpLocator,
    api_key: Option<&str>,
    today: NaiveDate,
) -> ApiResult<WeatherMap> {
    let fetcher = WeatherFetcher::new(source, api_key)?;
    let location = locator.locate().await.map_err(|e| {
        ApiError::upstream(
            locator.name(),
            "Could not determine your location. Please try again in a few seconds.",
            &e,
        )
    })?;
    Ok(fetcher.fetch(&location, today).await)
}
