// src/stats/mod.rs
//! Single-value statistics lookups (CDC life expectancy, BLS unemployment).

pub mod life_expectancy;
pub mod unemployment;

pub use life_expectancy::{CdcLifeExpectancy, LifeExpectancySource, Race, Sex};
pub use unemployment::{BlsUnemployment, StateRate, UnemploymentSource};
