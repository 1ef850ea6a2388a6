// src/weather/weatherapi.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use quick_xml::de::from_str;
use serde::Deserialize;

use super::{WeatherDay, WeatherSource};

const HISTORY_URL: &str = "http://api.weatherapi.com/v1/history.xml";

/// weatherapi.com history endpoint (XML flavour).
pub struct WeatherApi {
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct HistoryXml {
    forecast: ForecastXml,
}

#[derive(Debug, Deserialize)]
struct ForecastXml {
    #[serde(default)]
    forecastday: Vec<ForecastDayXml>,
}

#[derive(Debug, Deserialize)]
struct ForecastDayXml {
    day: DayXml,
    astro: AstroXml,
}

#[derive(Debug, Deserialize)]
struct DayXml {
    maxtemp_c: String,
    maxtemp_f: String,
    mintemp_c: String,
    mintemp_f: String,
    avgtemp_c: String,
    avgtemp_f: String,
    maxwind_mph: String,
    maxwind_kph: String,
    totalprecip_mm: String,
    totalprecip_in: String,
    avgvis_km: String,
    avgvis_miles: String,
    avghumidity: String,
    condition: ConditionXml,
}

#[derive(Debug, Deserialize)]
struct ConditionXml {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AstroXml {
    sunrise: String,
    sunset: String,
    moonrise: String,
    moonset: String,
    moon_phase: String,
    moon_illumination: String,
}

impl WeatherApi {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl WeatherSource for WeatherApi {
    async fn day_history(&self, api_key: &str, location: &str, date: NaiveDate) -> Result<WeatherDay> {
        let dt = date.format("%Y-%m-%d").to_string();
        let body = self
            .http
            .get(HISTORY_URL)
            .query(&[("key", api_key), ("q", location), ("dt", dt.as_str())])
            .send()
            .await
            .context("weatherapi get()")?
            .error_for_status()
            .context("weatherapi status")?
            .text()
            .await
            .context("weatherapi .text()")?;
        parse_history_xml(&body).with_context(|| format!("weatherapi history for {dt}"))
    }

    fn name(&self) -> &'static str {
        "weatherapi"
    }
}

/// Parse the first `forecastday` of a history document.
pub fn parse_history_xml(xml: &str) -> Result<WeatherDay> {
    let doc: HistoryXml = from_str(xml).context("parsing weatherapi history xml")?;
    let fd = doc
        .forecast
        .forecastday
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("history xml has no forecastday"))?;

    let t = |s: String| s.trim().to_string();
    Ok(WeatherDay {
        condition: t(fd.day.condition.text),
        maxtemp_c: t(fd.day.maxtemp_c),
        maxtemp_f: t(fd.day.maxtemp_f),
        mintemp_c: t(fd.day.mintemp_c),
        mintemp_f: t(fd.day.mintemp_f),
        avgtemp_c: t(fd.day.avgtemp_c),
        avgtemp_f: t(fd.day.avgtemp_f),
        maxwind_kph: t(fd.day.maxwind_kph),
        maxwind_mph: t(fd.day.maxwind_mph),
        totalprecip_mm: t(fd.day.totalprecip_mm),
        totalprecip_in: t(fd.day.totalprecip_in),
        avgvis_km: t(fd.day.avgvis_km),
        avgvis_miles: t(fd.day.avgvis_miles),
        avghumidity: t(fd.day.avghumidity),
        sunrise: t(fd.astro.sunrise),
        sunset: t(fd.astro.sunset),
        moonrise: t(fd.astro.moonrise),
        moonset: t(fd.astro.moonset),
        moon_phase: t(fd.astro.moon_phase),
        moon_illumination: t(fd.astro.moon_illumination),
    })
}
