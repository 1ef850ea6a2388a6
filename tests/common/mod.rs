// tests/common/mod.rs
//
// In-process stand-ins for the upstream sources, so the router can be driven
// without network access. Each stub can be told to fail.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveTime};
use axum::Router;

use trends_weather_api::stats::life_expectancy::{LifeExpectancyRow, LifeExpectancySource};
use trends_weather_api::stats::unemployment::{parse_state_rates, StateRate, UnemploymentSource};
use trends_weather_api::trends::{Timeframe, TrendSample, TrendsSource};
use trends_weather_api::weather::{IpLocator, WeatherDay, WeatherSource};
use trends_weather_api::{router, AppState};

pub const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 20).expect("valid date")
}

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid ISO date")
}

/// One sample per day of the requested range, valued 10, 20, 30, ...
///
/// By default the "last 7 days" call returns a single partial day, which the
/// merge discards, so the output is exactly the primary series.
///
/// With `lag_days > 0` the primary series stops `lag_days` before the range
/// end (like a freshly published series), and the "last 7 days" call returns
/// hourly samples for one leading partial day plus each lagging day:
/// 40 and 50 on the first one (mean 45), 61 and 62 on the next (mean 61.5).
pub struct StubTrends {
    pub fail: bool,
    pub lag_days: u64,
    pub calls: AtomicUsize,
}

impl StubTrends {
    pub fn ok() -> Self {
        Self::lagging(0)
    }

    pub fn lagging(lag_days: u64) -> Self {
        Self {
            fail: false,
            lag_days,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            lag_days: 0,
            calls: AtomicUsize::new(0),
        }
    }
}

const LAGGING_HOURLY: [[i64; 2]; 2] = [[40, 50], [61, 62]];

#[async_trait]
impl TrendsSource for StubTrends {
    async fn interest_over_time(&self, _phrase: &str, timeframe: Timeframe) -> Result<Vec<TrendSample>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("429 Too Many Requests");
        }
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).expect("midnight");
        let today = fixed_today();
        match timeframe {
            Timeframe::Range(w) => {
                let last = w.end() - Days::new(self.lag_days);
                Ok(w.start()
                    .iter_days()
                    .take_while(|day| *day <= last)
                    .enumerate()
                    .map(|(i, day)| TrendSample {
                        at: day.and_time(midnight),
                        value: 10 * (i as i64 + 1),
                    })
                    .collect())
            }
            Timeframe::LastSevenDays if self.lag_days == 0 => Ok((0..3)
                .map(|h| TrendSample {
                    at: (today - Days::new(1)).and_hms_opt(h, 0, 0).expect("hour"),
                    value: 1,
                })
                .collect()),
            Timeframe::LastSevenDays => {
                let first_lagging = today - Days::new(self.lag_days - 1);
                // leading partial day, always dropped by the merge
                let mut out = vec![TrendSample {
                    at: (first_lagging - Days::new(1)).and_hms_opt(23, 0, 0).expect("hour"),
                    value: 99,
                }];
                for (day, values) in first_lagging.iter_days().zip(LAGGING_HOURLY.iter()) {
                    for (h, v) in values.iter().enumerate() {
                        out.push(TrendSample {
                            at: day.and_hms_opt(h as u32, 0, 0).expect("hour"),
                            value: *v,
                        });
                    }
                }
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        "stub-trends"
    }
}

/// "Sunny" for every day except the listed ones.
pub struct StubWeather {
    pub failing_days: Vec<NaiveDate>,
    pub calls: AtomicUsize,
}

impl StubWeather {
    pub fn ok() -> Self {
        Self::failing_on(Vec::new())
    }

    pub fn failing_on(days: Vec<NaiveDate>) -> Self {
        Self {
            failing_days: days,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WeatherSource for StubWeather {
    async fn day_history(&self, api_key: &str, location: &str, date: NaiveDate) -> Result<WeatherDay> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(api_key, "test-key");
        assert_eq!(location, "203.0.113.7");
        if self.failing_days.contains(&date) {
            bail!("timeout for {date}");
        }
        Ok(WeatherDay {
            condition: "Sunny".into(),
            maxtemp_c: "25.0".into(),
            ..WeatherDay::default()
        })
    }

    fn name(&self) -> &'static str {
        "stub-weather"
    }
}

pub struct StubLocator {
    pub fail: bool,
}

#[async_trait]
impl IpLocator for StubLocator {
    async fn locate(&self) -> Result<String> {
        if self.fail {
            bail!("dns error");
        }
        Ok("203.0.113.7".into())
    }

    fn name(&self) -> &'static str {
        "stub-locator"
    }
}

pub struct StubCdc {
    pub fail: bool,
}

#[async_trait]
impl LifeExpectancySource for StubCdc {
    async fn rows_for_year(&self, year: u16) -> Result<Vec<LifeExpectancyRow>> {
        if self.fail {
            bail!("connection reset");
        }
        let row = |race: &str, sex: &str, v: Option<&str>| LifeExpectancyRow {
            race: race.into(),
            sex: sex.into(),
            average_life_expectancy: v.map(String::from),
        };
        Ok(match year {
            2015 => vec![
                row("All Races", "Both Sexes", Some("78.7")),
                row("Black", "Female", Some("78.1")),
                row("White", "Male", Some("76.6")),
            ],
            1900 => vec![row("Black", "Male", None)],
            _ => Vec::new(),
        })
    }

    fn name(&self) -> &'static str {
        "stub-cdc"
    }
}

/// Serves the BLS fixture page.
pub struct StubBls {
    pub fail: bool,
}

#[async_trait]
impl UnemploymentSource for StubBls {
    async fn state_rates(&self) -> Result<Vec<StateRate>> {
        if self.fail {
            bail!("503 Service Unavailable");
        }
        let html = std::fs::read_to_string("tests/fixtures/bls_lauhsthl.html")?;
        parse_state_rates(&html)
    }

    fn name(&self) -> &'static str {
        "stub-bls"
    }
}

/// All stubs healthy, weather key configured, clock pinned to [`fixed_today`].
pub fn healthy_state() -> AppState {
    AppState {
        trends: Arc::new(StubTrends::ok()),
        weather: Arc::new(StubWeather::ok()),
        locator: Arc::new(StubLocator { fail: false }),
        life_expectancy: Arc::new(StubCdc { fail: false }),
        unemployment: Arc::new(StubBls { fail: false }),
        weather_api_key: Some(Arc::from("test-key")),
        today: fixed_today,
    }
}

pub fn test_router(state: AppState) -> Router {
    router(state)
}
