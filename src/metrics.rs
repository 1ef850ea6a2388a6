// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// Prometheus exposition for the process-wide recorder.
#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder on first use; later calls share the
    /// same handle. Routers built more than once per process (tests) are fine.
    pub fn init() -> Self {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE
            .get_or_init(|| {
                let handle = match PrometheusBuilder::new().install_recorder() {
                    Ok(h) => h,
                    Err(e) => {
                        // someone else owns the global recorder; expose an empty registry
                        tracing::warn!(error = ?e, "prometheus recorder already installed");
                        PrometheusBuilder::new().build_recorder().handle()
                    }
                };
                describe_all();
                handle
            })
            .clone();
        Self { handle }
    }

    /// `/metrics` in the Prometheus text format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe_all() {
    describe_counter!(
        "upstream_errors_total",
        "Upstream requests that failed or returned an unexpected shape."
    );
    describe_counter!(
        "weather_days_unavailable_total",
        "Weather days replaced by the unavailable marker."
    );
    describe_counter!(
        "trends_weather_degraded_total",
        "Composed responses served with one side missing."
    );
    describe_histogram!(
        "upstream_request_ms",
        "Wall time of a logical upstream fetch in milliseconds."
    );
}
