// src/stats/life_expectancy.rs
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ApiError;

const CDC_URL: &str = "https://data.cdc.gov/resource/w9j2-ggv5.json";

pub const MIN_YEAR: u16 = 1900;
pub const MAX_YEAR: u16 = 2017;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Race {
    Black,
    White,
    All,
}

impl Sex {
    /// Label used by the CDC dataset.
    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Both => "Both Sexes",
        }
    }
}

impl Race {
    pub fn label(self) -> &'static str {
        match self {
            Race::Black => "Black",
            Race::White => "White",
            Race::All => "All Races",
        }
    }
}

impl FromStr for Sex {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            "both" => Ok(Sex::Both),
            _ => Err(ApiError::invalid_input(
                "Only the values \"female\", \"male\" or \"both\" are valid for sex.",
            )),
        }
    }
}

impl FromStr for Race {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "black" => Ok(Race::Black),
            "white" => Ok(Race::White),
            "all" => Ok(Race::All),
            _ => Err(ApiError::invalid_input(
                "Only the values \"black\", \"white\" or \"all\" are valid for race.",
            )),
        }
    }
}

/// Validate a path year against the dataset coverage.
pub fn parse_year(s: &str) -> Result<u16, ApiError> {
    s.parse::<u16>()
        .ok()
        .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
        .ok_or_else(|| {
            ApiError::invalid_input(format!(
                "Only a number between {MIN_YEAR} and {MAX_YEAR} is valid for year."
            ))
        })
}

/// One row of the CDC "death rates and life expectancy at birth" dataset.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LifeExpectancyRow {
    pub race: String,
    pub sex: String,
    #[serde(default)]
    pub average_life_expectancy: Option<String>,
}

#[async_trait]
pub trait LifeExpectancySource: Send + Sync {
    async fn rows_for_year(&self, year: u16) -> Result<Vec<LifeExpectancyRow>>;
    fn name(&self) -> &'static str;
}

pub struct CdcLifeExpectancy {
    http: reqwest::Client,
}

impl CdcLifeExpectancy {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl LifeExpectancySource for CdcLifeExpectancy {
    async fn rows_for_year(&self, year: u16) -> Result<Vec<LifeExpectancyRow>> {
        self.http
            .get(CDC_URL)
            .query(&[("year", year)])
            .send()
            .await
            .context("cdc get()")?
            .error_for_status()
            .context("cdc status")?
            .json()
            .await
            .context("cdc json")
    }

    fn name(&self) -> &'static str {
        "cdc"
    }
}

/// Average life expectancy for the matching row, if any row matches and its
/// value parses.
pub fn lookup(rows: &[LifeExpectancyRow], sex: Sex, race: Race) -> Option<f64> {
    rows.iter()
        .find(|r| r.race == race.label() && r.sex == sex.label())
        .and_then(|r| r.average_life_expectancy.as_deref())
        .and_then(|v| v.trim().parse::<f64>().ok())
}
