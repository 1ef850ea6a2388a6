// src/trends/mod.rs
//! Interest-over-time for a search phrase.
//!
//! A [`TrendsSource`] only knows how to download raw samples for one
//! timeframe. [`TrendsFetcher`] issues the primary (window) and supplementary
//! (last 7 days) requests and merges them into a daily series.

pub mod google;

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use metrics::histogram;
use serde::Serialize;

use crate::dates::DateWindow;
use crate::error::{ApiError, ApiResult, TRENDS_UNAVAILABLE};

pub use google::GoogleTrends;

/// One raw upstream sample. Resolution depends on the requested timeframe
/// (hourly for the last 7 days, daily or weekly for explicit ranges).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendSample {
    pub at: NaiveDateTime,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Range(DateWindow),
    LastSevenDays,
}

impl Timeframe {
    /// Value of the upstream `time` field.
    pub fn as_param(&self) -> String {
        match self {
            Timeframe::Range(w) => format!(
                "{} {}",
                w.start().format("%Y-%m-%d"),
                w.end().format("%Y-%m-%d")
            ),
            Timeframe::LastSevenDays => "now 7-d".to_string(),
        }
    }
}

#[async_trait]
pub trait TrendsSource: Send + Sync {
    async fn interest_over_time(&self, phrase: &str, timeframe: Timeframe) -> Result<Vec<TrendSample>>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub interest: i64,
}

/// Merge the primary series with the daily-averaged supplementary series.
///
/// Supplementary samples are grouped per calendar day and averaged; the first
/// day is dropped because upstream only covers part of it. Days missing from
/// the primary series are appended, then everything is sorted by date.
pub fn merge_series(primary: &[TrendSample], supplementary: &[TrendSample]) -> Vec<TrendPoint> {
    let mut out: Vec<TrendPoint> = primary
        .iter()
        .map(|s| TrendPoint {
            date: s.at.date(),
            interest: s.value,
        })
        .collect();

    let primary_dates: HashSet<NaiveDate> = out.iter().map(|p| p.date).collect();

    for (date, interest) in daily_averages(supplementary).into_iter().skip(1) {
        if !primary_dates.contains(&date) {
            out.push(TrendPoint { date, interest });
        }
    }

    out.sort_by_key(|p| p.date);
    out.dedup_by_key(|p| p.date);
    out
}

/// Mean value per calendar day, ascending by day. Means are truncated to
/// integers.
fn daily_averages(samples: &[TrendSample]) -> BTreeMap<NaiveDate, i64> {
    let mut acc: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for s in samples {
        let e = acc.entry(s.at.date()).or_insert((0, 0));
        e.0 += s.value;
        e.1 += 1;
    }
    acc.into_iter()
        .map(|(date, (sum, n))| (date, (sum as f64 / n as f64).trunc() as i64))
        .collect()
}

/// Primary + supplementary fetch over one [`TrendsSource`].
pub struct TrendsFetcher<'a> {
    source: &'a dyn TrendsSource,
}

impl<'a> TrendsFetcher<'a> {
    pub fn new(source: &'a dyn TrendsSource) -> Self {
        Self { source }
    }

    /// Any upstream failure fails the whole fetch; there is no partial output.
    /// Latency is recorded for failed fetches too.
    pub async fn fetch(&self, phrase: &str, window: DateWindow) -> ApiResult<Vec<TrendPoint>> {
        let t0 = Instant::now();
        let upstream = self.source.name();

        let res = self.fetch_merged(phrase, window).await;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("upstream_request_ms", "upstream" => upstream).record(ms);

        res.map_err(|e| ApiError::upstream(upstream, TRENDS_UNAVAILABLE, &e))
    }

    async fn fetch_merged(&self, phrase: &str, window: DateWindow) -> Result<Vec<TrendPoint>> {
        let primary = self
            .source
            .interest_over_time(phrase, Timeframe::Range(window))
            .await
            .context("primary trends series")?;

        let recent = self
            .source
            .interest_over_time(phrase, Timeframe::LastSevenDays)
            .await
            .context("last 7 days trends series")?;

        let merged = merge_series(&primary, &recent);
        tracing::debug!(
            upstream = self.source.name(),
            primary = primary.len(),
            recent = recent.len(),
            merged = merged.len(),
            "trends merged"
        );
        Ok(merged)
    }
}
