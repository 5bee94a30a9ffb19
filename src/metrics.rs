// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Keycloak operator.
//!
//! Every metric carries the prefix `sso_firestoned_io_` (prometheus-safe version
//! of "sso.firestoned.io") and lives in the registry owned by [`Metrics`], which
//! the controller shares through its `Context`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation** - pass outcomes and durations
//! - **Resource writes** - writes per resource kind and strategy
//! - **Schema preparation** - schema job outcomes
//! - **Errors** - failed passes by status reason
//!
//! # Example
//!
//! ```rust
//! use keycloak_operator::metrics::Metrics;
//! use std::time::Duration;
//!
//! let metrics = Metrics::new().unwrap();
//! metrics.record_reconciliation_success(Duration::from_secs(1));
//! assert!(metrics.gather().unwrap().contains("sso_firestoned_io_reconciliations_total"));
//! ```

use crate::constants::{METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "sso_firestoned_io";

/// Operator metrics and the registry they are exposed from.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    /// Labels: `status` (`success`, `error`)
    reconciliations_total: CounterVec,

    reconciliation_duration_seconds: Histogram,

    /// Labels: `kind`, `operation` (`create_if_absent`, `create_or_replace`, `create_or_patch`, `delete`)
    resource_writes_total: CounterVec,

    /// Labels: `outcome` (`succeeded`, `reused`, `failed`, `timed_out`)
    schema_jobs_total: CounterVec,

    /// Labels: `reason` (status condition reason)
    errors_total: CounterVec,
}

impl Metrics {
    /// Create every metric and register it in a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric cannot be created or registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let reconciliations_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_reconciliations_total"),
                "Total number of KeycloakServer reconciliation passes by outcome",
            ),
            &["status"],
        )?;
        let reconciliation_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
                "Duration of KeycloakServer reconciliation passes in seconds",
            )
            .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 600.0]),
        )?;
        let resource_writes_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_resource_writes_total"),
                "Total number of derived resource writes by kind and strategy",
            ),
            &["kind", "operation"],
        )?;
        let schema_jobs_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_schema_jobs_total"),
                "Total number of schema preparation runs by outcome",
            ),
            &["outcome"],
        )?;
        let errors_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_errors_total"),
                "Total number of failed reconciliation passes by reason",
            ),
            &["reason"],
        )?;

        registry.register(Box::new(reconciliations_total.clone()))?;
        registry.register(Box::new(reconciliation_duration_seconds.clone()))?;
        registry.register(Box::new(resource_writes_total.clone()))?;
        registry.register(Box::new(schema_jobs_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;

        Ok(Self {
            registry,
            reconciliations_total,
            reconciliation_duration_seconds,
            resource_writes_total,
            schema_jobs_total,
            errors_total,
        })
    }

    pub fn record_reconciliation_success(&self, duration: Duration) {
        self.reconciliations_total
            .with_label_values(&["success"])
            .inc();
        self.reconciliation_duration_seconds
            .observe(duration.as_secs_f64());
    }

    pub fn record_reconciliation_error(&self, duration: Duration, reason: &str) {
        self.reconciliations_total.with_label_values(&["error"]).inc();
        self.reconciliation_duration_seconds
            .observe(duration.as_secs_f64());
        self.errors_total.with_label_values(&[reason]).inc();
    }

    pub fn record_resource_write(&self, kind: &str, operation: &str) {
        self.resource_writes_total
            .with_label_values(&[kind, operation])
            .inc();
    }

    pub fn record_schema_job(&self, outcome: &str) {
        self.schema_jobs_total.with_label_values(&[outcome]).inc();
    }

    /// Encode every metric in Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
    }
}

/// Router exposing the registry at [`METRICS_SERVER_PATH`].
pub fn metrics_router(metrics: Metrics) -> Router {
    Router::new()
        .route(METRICS_SERVER_PATH, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<Metrics>) -> impl IntoResponse {
    match metrics.gather() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Serve the metrics endpoint until the listener fails.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server stops.
pub async fn serve_metrics(metrics: Metrics, port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind((METRICS_SERVER_BIND_ADDRESS, port)).await?;
    info!(
        "Serving metrics on {}:{}{}",
        METRICS_SERVER_BIND_ADDRESS, port, METRICS_SERVER_PATH
    );
    axum::serve(listener, metrics_router(metrics)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reconciliation_success() {
        let metrics = Metrics::new().unwrap();
        metrics.record_reconciliation_success(Duration::from_millis(500));

        assert!(metrics.reconciliations_total.with_label_values(&["success"]).get() > 0.0);
        assert_eq!(metrics.reconciliation_duration_seconds.get_sample_count(), 1);
    }

    #[test]
    fn test_record_reconciliation_error() {
        let metrics = Metrics::new().unwrap();
        metrics.record_reconciliation_error(Duration::from_millis(250), "SchemaJobFailed");

        assert!(metrics.reconciliations_total.with_label_values(&["error"]).get() > 0.0);
        assert!(metrics.errors_total.with_label_values(&["SchemaJobFailed"]).get() > 0.0);
    }

    #[test]
    fn test_gather_metrics() {
        let metrics = Metrics::new().unwrap();
        metrics.record_resource_write("Secret", "create_if_absent");
        metrics.record_schema_job("succeeded");

        let text = metrics.gather().unwrap();
        assert!(text.contains("sso_firestoned_io_resource_writes_total"));
        assert!(text.contains("kind=\"Secret\""));
        assert!(text.contains("sso_firestoned_io_schema_jobs_total"));
    }

    #[test]
    fn test_registries_are_independent() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.record_schema_job("failed");

        assert!(second.gather().unwrap().find("outcome=\"failed\"").is_none());
    }

    #[tokio::test]
    async fn test_metrics_handler_returns_registry() {
        let metrics = Metrics::new().unwrap();
        metrics.record_schema_job("reused");

        let response = metrics_handler(State(metrics)).await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_serve_metrics_fails_on_taken_port() {
        let held = TcpListener::bind((METRICS_SERVER_BIND_ADDRESS, 0)).await.unwrap();
        let port = held.local_addr().unwrap().port();

        let result = serve_metrics(Metrics::new().unwrap(), port).await;

        assert!(result.is_err());
    }
}
