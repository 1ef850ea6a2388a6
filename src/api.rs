// src/api.rs
//! HTTP surface: routing, parameter validation and response shaping.
//!
//! Handlers stay thin. Upstream access goes through the source traits held in
//! [`AppState`], so the router can be driven in-process with stub sources.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use chrono::{Days, NaiveDate};
use metrics::counter;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::align::{align, positional_mismatches, TrendsWeatherRecord};
use crate::dates::{self, parse_date_param};
use crate::error::{ApiError, ApiResult};
use crate::metrics::Metrics;
use crate::stats::life_expectancy::{self, parse_year, LifeExpectancySource, Race, Sex};
use crate::stats::unemployment::{self, UnemploymentSource};
use crate::trends::{TrendPoint, TrendsFetcher, TrendsSource};
use crate::weather::{weather_report, IpLocator, WeatherMap, WeatherSource, WEATHER_DAYS};

#[derive(Clone)]
pub struct AppState {
    pub trends: Arc<dyn TrendsSource>,
    pub weather: Arc<dyn WeatherSource>,
    pub locator: Arc<dyn IpLocator>,
    pub life_expectancy: Arc<dyn LifeExpectancySource>,
    pub unemployment: Arc<dyn UnemploymentSource>,
    pub weather_api_key: Option<Arc<str>>,
    /// Clock for "today"; swapped in tests.
    pub today: fn() -> NaiveDate,
}

pub fn router(state: AppState) -> Router {
    let metrics = Metrics::init();

    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "OK" }))
        .route("/life_expectancy/{sex}/{race}/{year}", get(life_expectancy))
        .route("/unemployment/{state}", get(unemployment))
        .route("/trends", get(trends))
        .route("/weather", get(weather))
        .route("/trends_weather", get(trends_weather))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
        .merge(metrics.router())
}

async fn root() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}

async fn life_expectancy(
    State(state): State<AppState>,
    path: Result<Path<(String, String, String)>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path((sex, race, year)) = path?;
    let sex: Sex = sex.parse()?;
    let race: Race = race.parse()?;
    let year = parse_year(&year)?;

    let source = state.life_expectancy.as_ref();
    let rows = source.rows_for_year(year).await.map_err(|e| {
        ApiError::upstream(
            source.name(),
            "The CDC data service is not responding. Please try again in a few seconds.",
            &e,
        )
    })?;

    let value = life_expectancy::lookup(&rows, sex, race);
    tracing::debug!(year, sex = sex.label(), race = race.label(), ?value, "life expectancy");
    Ok(Json(json!({ "average_life_expectancy": value })))
}

async fn unemployment(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(raw_state) = path?;
    let name = unemployment::normalize_state(&raw_state);

    let source = state.unemployment.as_ref();
    let rates = source.state_rates().await.map_err(|e| {
        ApiError::upstream(
            source.name(),
            "The labor statistics page is not responding. Please try again in a few seconds.",
            &e,
        )
    })?;

    let rate = unemployment::find_rate(&rates, &name)?;
    Ok(Json(json!({ "rate": rate })))
}

#[derive(Debug, Deserialize)]
struct TrendsQuery {
    phrase: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn trends(
    State(state): State<AppState>,
    query: Result<Query<TrendsQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(q) = query?;
    let phrase = q
        .phrase
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::invalid_input("phrase is required."))?;

    let start = parse_date_param("start_date", q.start_date.as_deref())?;
    let end = parse_date_param("end_date", q.end_date.as_deref())?;
    let window = dates::resolve(start, end, (state.today)())?;

    let points = TrendsFetcher::new(state.trends.as_ref())
        .fetch(phrase, window)
        .await?;
    let interest: Vec<i64> = points.iter().map(|p| p.interest).collect();
    Ok(Json(json!({ "interest": interest })))
}

async fn weather(State(state): State<AppState>) -> ApiResult<Json<WeatherMap>> {
    let map = weather_report(
        state.weather.as_ref(),
        state.locator.as_ref(),
        state.weather_api_key.as_deref(),
        (state.today)(),
    )
    .await?;
    Ok(Json(map))
}

#[derive(Debug, Deserialize)]
struct TrendsWeatherQuery {
    phrase: Option<String>,
}

const PHRASE_MIN_CHARS: usize = 3;
const PHRASE_MAX_CHARS: usize = 50;

/// 3..=50 characters, starting with an ASCII letter, digit or space.
pub fn validate_composed_phrase(raw: Option<&str>) -> ApiResult<&str> {
    let phrase = raw.ok_or_else(|| ApiError::invalid_input("phrase is required."))?;
    let len = phrase.chars().count();
    if !(PHRASE_MIN_CHARS..=PHRASE_MAX_CHARS).contains(&len) {
        return Err(ApiError::invalid_input(format!(
            "phrase must be between {PHRASE_MIN_CHARS} and {PHRASE_MAX_CHARS} characters long."
        )));
    }
    if !phrase
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == ' ')
    {
        return Err(ApiError::invalid_input(
            "phrase must start with a letter, a digit or a space.",
        ));
    }
    Ok(phrase)
}

/// Trends and weather for the trailing week, joined by date. Either side
/// failing only blanks its column.
async fn trends_weather(
    State(state): State<AppState>,
    query: Result<Query<TrendsWeatherQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TrendsWeatherRecord>>> {
    let Query(q) = query?;
    let phrase = validate_composed_phrase(q.phrase.as_deref())?;

    let today = (state.today)();
    let start = today
        .checked_sub_days(Days::new(WEATHER_DAYS - 1))
        .unwrap_or(today);
    let window = dates::resolve(Some(start), Some(today), today)?;

    let trends_fut = async {
        TrendsFetcher::new(state.trends.as_ref())
            .fetch(phrase, window)
            .await
    };
    let weather_fut = weather_report(
        state.weather.as_ref(),
        state.locator.as_ref(),
        state.weather_api_key.as_deref(),
        today,
    );
    let (trend_res, weather_res) = tokio::join!(trends_fut, weather_fut);

    let trend_points: Vec<TrendPoint> = match trend_res {
        Ok(points) => points,
        Err(e) => {
            tracing::warn!(error = %e, "trends side unavailable, interest left null");
            counter!("trends_weather_degraded_total", "side" => "trends").increment(1);
            Vec::new()
        }
    };
    let weather_map = match weather_res {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = %e, "weather side unavailable, using placeholder");
            counter!("trends_weather_degraded_total", "side" => "weather").increment(1);
            WeatherMap::new()
        }
    };

    if trend_points.len() > WEATHER_DAYS as usize {
        tracing::warn!(
            points = trend_points.len(),
            "trend series longer than the week, extra points dropped"
        );
    }

    let records = align(start, today, &trend_points, &weather_map);

    let shifted = positional_mismatches(&records, &trend_points);
    if !shifted.is_empty() {
        tracing::warn!(
            count = shifted.len(),
            first_row = %shifted[0].0,
            first_point = %shifted[0].1,
            "trend points do not line up with row dates"
        );
    }

    Ok(Json(records))
}
