//! Error kinds surfaced by the HTTP layer.
//!
//! Providers work with `anyhow::Result` and attach context; handlers convert
//! those into an [`ApiError`] at the boundary, which decides the status code
//! and the `{"detail": ...}` body.

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde_json::json;
use thiserror::Error;

pub const TRENDS_UNAVAILABLE: &str = "Google not responding. Please try again in a few seconds. \
If the error persists, contact an administrator.";

pub const WEATHER_KEY_MISSING: &str = "You need to set up an API KEY from weatherapi.com. \
Go to the documentation if you have any questions.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed phrase/date/path parameter.
    #[error("{message}")]
    InvalidInput { message: String },

    /// Well-formed value that the upstream listing does not contain
    /// (e.g. an unknown state name).
    #[error("{message}")]
    NotListed { message: String },

    /// Date window violates ordering/bounds rules.
    #[error("{message}")]
    InvalidRange { message: String },

    /// Third-party source unreachable or returned an unexpected shape.
    #[error("{upstream}: {message}")]
    UpstreamUnavailable {
        upstream: &'static str,
        message: String,
    },

    /// Required secret (weather API key) is not configured.
    #[error("{message}")]
    Configuration { message: String },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_listed<S: Into<String>>(message: S) -> Self {
        Self::NotListed {
            message: message.into(),
        }
    }

    pub fn invalid_range<S: Into<String>>(message: S) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap a provider failure. The cause is logged here and not exposed to
    /// the client; the client only sees `message`.
    pub fn upstream<S: Into<String>>(upstream: &'static str, message: S, cause: &anyhow::Error) -> Self {
        tracing::warn!(error = ?cause, upstream, "upstream unavailable");
        counter!("upstream_errors_total", "upstream" => upstream).increment(1);
        Self::UpstreamUnavailable {
            upstream,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput { .. } | ApiError::InvalidRange { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::NotListed { .. }
            | ApiError::UpstreamUnavailable { .. }
            | ApiError::Configuration { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to API clients.
    pub fn detail(&self) -> &str {
        match self {
            ApiError::InvalidInput { message }
            | ApiError::NotListed { message }
            | ApiError::InvalidRange { message }
            | ApiError::UpstreamUnavailable { message, .. }
            | ApiError::Configuration { message } => message,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_input(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid_input(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_kinds_map_to_422() {
        assert_eq!(
            ApiError::invalid_input("bad phrase").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::invalid_range("bad window").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn upstream_and_config_map_to_400() {
        let cause = anyhow::anyhow!("connection refused");
        let err = ApiError::upstream("google-trends", TRENDS_UNAVAILABLE, &cause);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.detail(), TRENDS_UNAVAILABLE);
        assert!(err.to_string().starts_with("google-trends:"));

        assert_eq!(
            ApiError::not_listed("no such state").status(),
            StatusCode::BAD_REQUEST
        );

        let cfg = ApiError::configuration(WEATHER_KEY_MISSING);
        assert_eq!(cfg.status(), StatusCode::BAD_REQUEST);
        assert!(cfg.detail().contains("weatherapi.com"));
    }
}
