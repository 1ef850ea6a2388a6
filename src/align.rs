//! # Series alignment
//! Joins a positional trends series and a date-keyed weather map into one row
//! per calendar day. Pure and total: missing data on either side only blanks
//! that field of that row.
//!
//! Trends are matched by day offset (row `i` takes `trend_points[i]`),
//! weather by date key.

use chrono::NaiveDate;
use serde::Serialize;

use crate::trends::TrendPoint;
use crate::weather::{WeatherEntry, WeatherMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendsWeatherRecord {
    pub date: NaiveDate,
    pub interest: Option<i64>,
    pub weather: WeatherEntry,
}

/// One record per day of `[start, today]`, ascending.
pub fn align(
    start: NaiveDate,
    today: NaiveDate,
    trend_points: &[TrendPoint],
    weather: &WeatherMap,
) -> Vec<TrendsWeatherRecord> {
    start
        .iter_days()
        .take_while(|d| *d <= today)
        .enumerate()
        .map(|(i, date)| TrendsWeatherRecord {
            date,
            interest: trend_points.get(i).map(|p| p.interest),
            weather: weather
                .get(&date)
                .cloned()
                .unwrap_or(WeatherEntry::Unavailable),
        })
        .collect()
}

/// Rows whose positional trend point carries a different date than the row.
/// Non-empty means the upstream series was not daily (or had gaps) and the
/// interest column is shifted.
pub fn positional_mismatches(records: &[TrendsWeatherRecord], trend_points: &[TrendPoint]) -> Vec<(NaiveDate, NaiveDate)> {
    records
        .iter()
        .zip(trend_points)
        .filter(|(r, p)| r.date != p.date)
        .map(|(r, p)| (r.date, p.date))
        .collect()
}
