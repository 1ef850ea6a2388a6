// src/config/mod.rs
//! Runtime configuration read from the process environment.
//!
//! `.env` is loaded by the binary before this runs (no-op in production).

pub mod secret;

use std::time::Duration;

pub use secret::{resolve_secret, secret_from_env};

pub const ENV_WEATHER_API_KEY: &str = "WEATHER_API_KEY";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
pub const ENV_TRENDS_HL: &str = "TRENDS_HL";
pub const ENV_TRENDS_TZ: &str = "TRENDS_TZ";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_TRENDS_HL: &str = "en-US";
pub const DEFAULT_TRENDS_TZ: i32 = 360;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// weatherapi.com key; `None` means weather endpoints answer with a setup hint.
    pub weather_api_key: Option<String>,
    /// Total timeout applied to every outbound request.
    pub http_timeout: Duration,
    pub trends_hl: String,
    /// Timezone offset in minutes, as the trends service expects it.
    pub trends_tz: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            trends_hl: DEFAULT_TRENDS_HL.to_string(),
            trends_tz: DEFAULT_TRENDS_TZ,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let weather_api_key = secret_from_env(ENV_WEATHER_API_KEY);
        let http_timeout = Duration::from_secs(parse_timeout_env(
            std::env::var(ENV_HTTP_TIMEOUT_SECS).ok(),
        ));
        let trends_hl = std::env::var(ENV_TRENDS_HL)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_TRENDS_HL.to_string());
        let trends_tz = std::env::var(ENV_TRENDS_TZ)
            .ok()
            .and_then(|s| s.trim().parse::<i32>().ok())
            .unwrap_or(DEFAULT_TRENDS_TZ);

        tracing::info!(
            weather_key_set = weather_api_key.is_some(),
            timeout_secs = http_timeout.as_secs(),
            %trends_hl,
            trends_tz,
            "config loaded"
        );

        Self {
            weather_api_key,
            http_timeout,
            trends_hl,
            trends_tz,
        }
    }
}

// parse optional timeout env and clamp to <1..=60>
fn parse_timeout_env(raw: Option<String>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .map(|v| v.clamp(1, 60))
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn timeout_defaults_and_clamps() {
        assert_eq!(parse_timeout_env(None), 5);
        assert_eq!(parse_timeout_env(Some("abc".into())), 5);
        assert_eq!(parse_timeout_env(Some(" 8 ".into())), 8);
        assert_eq!(parse_timeout_env(Some("0".into())), 1);
        assert_eq!(parse_timeout_env(Some("600".into())), 60);
    }

    #[serial_test::serial]
    #[test]
    fn from_env_resolves_key_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("key.txt");
        std::fs::write(&p, "file-key\n").unwrap();

        env::set_var(ENV_WEATHER_API_KEY, p.display().to_string());
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.weather_api_key.as_deref(), Some("file-key"));

        env::set_var(ENV_WEATHER_API_KEY, "   ");
        let cfg = AppConfig::from_env();
        assert!(cfg.weather_api_key.is_none());

        env::remove_var(ENV_WEATHER_API_KEY);
    }
}
