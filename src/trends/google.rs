// src/trends/google.rs
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Timeframe, TrendSample, TrendsSource};

const HOME_URL: &str = "https://trends.google.com/?geo=US";
const EXPLORE_URL: &str = "https://trends.google.com/trends/api/explore";
const MULTILINE_URL: &str = "https://trends.google.com/trends/api/widgetdata/multiline";

/// Google Trends "interest over time" via the explore + widget endpoints.
pub struct GoogleTrends {
    http: reqwest::Client,
    hl: String,
    tz: i32,
}

#[derive(Debug, Deserialize)]
struct ExploreResp {
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    id: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    request: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MultilineResp {
    default: MultilineDefault,
}

#[derive(Debug, Deserialize)]
struct MultilineDefault {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    time: String,
    #[serde(default)]
    value: Vec<i64>,
}

impl GoogleTrends {
    pub fn new(hl: &str, tz: i32, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("trends-weather-api/0.1")
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(4).min(timeout))
            .timeout(timeout)
            .build()
            .context("building google trends http client")?;
        Ok(Self {
            http,
            hl: hl.to_string(),
            tz,
        })
    }

    /// Best effort: a session cookie makes the explore endpoint far less
    /// likely to answer 429.
    async fn prime_cookies(&self) {
        if let Err(e) = self.http.get(HOME_URL).send().await {
            tracing::debug!(error = ?e, "trends cookie priming failed");
        }
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} status"))?;
        resp.text().await.context("reading trends body")
    }
}

#[async_trait]
impl TrendsSource for GoogleTrends {
    async fn interest_over_time(&self, phrase: &str, timeframe: Timeframe) -> Result<Vec<TrendSample>> {
        self.prime_cookies().await;

        let req = json!({
            "comparisonItem": [{ "keyword": phrase, "time": timeframe.as_param(), "geo": "" }],
            "category": 0,
            "property": "",
        });
        let explore = self
            .get_text(
                EXPLORE_URL,
                &[
                    ("hl", self.hl.clone()),
                    ("tz", self.tz.to_string()),
                    ("req", req.to_string()),
                ],
            )
            .await?;
        let (widget_req, token) = parse_timeseries_widget(&explore)?;

        let body = self
            .get_text(
                MULTILINE_URL,
                &[
                    ("req", widget_req),
                    ("token", token),
                    ("tz", self.tz.to_string()),
                ],
            )
            .await?;
        parse_timeline(&body)
    }

    fn name(&self) -> &'static str {
        "google-trends"
    }
}

/// Responses start with an anti-JSON-hijacking prefix like `)]}'`.
fn strip_json_prefix(body: &str) -> Result<&str> {
    body.find('{')
        .map(|i| &body[i..])
        .ok_or_else(|| anyhow!("trends response has no JSON object"))
}

/// Extract the `(request json, token)` of the TIMESERIES widget.
pub fn parse_timeseries_widget(body: &str) -> Result<(String, String)> {
    let resp: ExploreResp =
        serde_json::from_str(strip_json_prefix(body)?).context("parsing explore json")?;
    let widget = resp
        .widgets
        .into_iter()
        .find(|w| w.id == "TIMESERIES")
        .ok_or_else(|| anyhow!("explore response has no TIMESERIES widget"))?;
    let token = widget
        .token
        .ok_or_else(|| anyhow!("TIMESERIES widget has no token"))?;
    let request = widget
        .request
        .ok_or_else(|| anyhow!("TIMESERIES widget has no request"))?;
    Ok((request.to_string(), token))
}

/// Parse `default.timelineData` into samples (UTC timestamps, first keyword).
pub fn parse_timeline(body: &str) -> Result<Vec<TrendSample>> {
    let resp: MultilineResp =
        serde_json::from_str(strip_json_prefix(body)?).context("parsing multiline json")?;

    resp.default
        .timeline_data
        .into_iter()
        .map(|p| {
            let secs: i64 = p
                .time
                .parse()
                .with_context(|| format!("bad timeline timestamp '{}'", p.time))?;
            let at = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| anyhow!("timestamp out of range: {secs}"))?
                .naive_utc();
            let value = *p
                .value
                .first()
                .ok_or_else(|| anyhow!("timeline point without value"))?;
            Ok(TrendSample { at, value })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explore_prefix_is_stripped_and_widget_found() {
        let body = r#")]}'
{"widgets":[{"id":"GEO_MAP","token":"x"},{"id":"TIMESERIES","token":"APP6_tok","request":{"time":"now 7-d","resolution":"HOUR"}}]}"#;
        let (req, token) = parse_timeseries_widget(body).unwrap();
        assert_eq!(token, "APP6_tok");
        assert!(req.contains("\"resolution\":\"HOUR\""));
    }

    #[test]
    fn explore_without_timeseries_is_an_error() {
        let body = r#")]}'{"widgets":[{"id":"RELATED_QUERIES","token":"t"}]}"#;
        assert!(parse_timeseries_widget(body).is_err());
        assert!(parse_timeseries_widget("<html>rate limited</html>").is_err());
    }

    #[test]
    fn timeline_points_become_utc_samples() {
        let body = r#")]}',
{"default":{"timelineData":[
 {"time":"1704067200","formattedTime":"Jan 1, 2024","value":[42],"hasData":[true]},
 {"time":"1704153600","formattedTime":"Jan 2, 2024","value":[17],"hasData":[true]}
]}}"#;
        let samples = parse_timeline(body).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].at.date().to_string(), "2024-01-01");
        assert_eq!(samples[0].value, 42);
        assert_eq!(samples[1].at.date().to_string(), "2024-01-02");
    }

    #[test]
    fn timeline_with_garbage_timestamp_fails() {
        let body = r#"{"default":{"timelineData":[{"time":"soon","value":[1]}]}}"#;
        assert!(parse_timeline(body).is_err());
    }
}
