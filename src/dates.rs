//! # Date windows
//! Resolves optional `start_date`/`end_date` query inputs into a concrete,
//! validated window. Pure: "today" is always passed in by the caller.

use chrono::{Days, NaiveDate, Utc};

use crate::error::{ApiError, ApiResult};

/// Default window width when neither bound is given (today - 13 .. today).
pub const DEFAULT_WINDOW_DAYS: u64 = 13;

/// First day the trends service has data for.
pub fn earliest_data_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2004, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Current calendar date (UTC).
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `[start, end]`, both inclusive. Only constructed through [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Fill in missing bounds and validate the result.
///
/// - both given: used as-is
/// - only `end`: start is 2004-01-01
/// - only `start`: end is today
/// - neither: the trailing 13 days ending today
pub fn resolve(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> ApiResult<DateWindow> {
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        (None, Some(e)) => (earliest_data_date(), e),
        (Some(s), None) => (s, today),
        (None, None) => (
            today
                .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS))
                .unwrap_or(today),
            today,
        ),
    };

    if end < earliest_data_date() {
        return Err(ApiError::invalid_range(
            "Data is available from 2004-01-01. Please check the end_date.",
        ));
    }
    if start > today {
        return Err(ApiError::invalid_range(
            "start_date must be before of the current date.",
        ));
    }
    if start > end {
        return Err(ApiError::invalid_range(
            "Please, introduce a valid date range. start_date must be before end_date. \
If you specify a start_date but not an end_date, trends from start_date to the current day \
will be displayed. If instead you specify an end_date and not a start_date, the data available \
up to the end_date will be displayed. Also, start_date must be before the current date.",
        ));
    }

    Ok(DateWindow { start, end })
}

/// Parse an ISO `YYYY-MM-DD` query value. Blank means "not provided".
pub fn parse_date_param(name: &str, raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ApiError::invalid_input(format!(
                    "{name} must be a valid date in ISO 8601 format: YYYY-MM-DD (got '{s}')."
                ))
            }),
    }
}

/// The `len` consecutive days ending at `today`, ascending.
pub fn trailing_days(today: NaiveDate, len: u64) -> Vec<NaiveDate> {
    let Some(first) = today.checked_sub_days(Days::new(len.saturating_sub(1))) else {
        return Vec::new();
    };
    first.iter_days().take(len as usize).collect()
}
