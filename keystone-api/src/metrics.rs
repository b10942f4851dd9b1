use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::time::{Duration, Instant};

use crate::state::AppState;

/// Service metrics, registered on a registry owned by this struct so that
/// tests can build as many routers as they like.
pub struct Metrics {
    registry: Registry,
    pub http_requests: IntCounterVec,
    pub http_duration: HistogramVec,
    pub http_in_flight: IntGauge,
    pub auth_attempts: IntCounterVec,
    pub orders: IntCounterVec,
    pub db_queries: IntCounterVec,
    pub db_duration: HistogramVec,
    pub db_connections: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("keystone".to_string()), None)?;

        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        let http_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency in seconds")
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["method", "path", "status"],
        )?;
        let http_in_flight = IntGauge::new("http_requests_in_flight", "HTTP requests being served")?;
        let auth_attempts = IntCounterVec::new(
            Opts::new("auth_attempts_total", "Registration and login attempts"),
            &["kind", "outcome"],
        )?;
        let orders = IntCounterVec::new(
            Opts::new("orders_total", "Order workflow outcomes"),
            &["operation", "outcome"],
        )?;

        let db_queries = IntCounterVec::new(
            Opts::new("database_queries_total", "User store queries"),
            &["operation", "status", "table"],
        )?;
        let db_duration = HistogramVec::new(
            HistogramOpts::new("database_query_duration_seconds", "User store query latency in seconds")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["operation", "table"],
        )?;
        let db_connections = IntGauge::new(
            "database_connections_active",
            "Pool connections currently checked out",
        )?;

        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(http_duration.clone()))?;
        registry.register(Box::new(http_in_flight.clone()))?;
        registry.register(Box::new(auth_attempts.clone()))?;
        registry.register(Box::new(orders.clone()))?;
        registry.register(Box::new(db_queries.clone()))?;
        registry.register(Box::new(db_duration.clone()))?;
        registry.register(Box::new(db_connections.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            http_duration,
            http_in_flight,
            auth_attempts,
            orders,
            db_queries,
            db_duration,
            db_connections,
        })
    }

    pub fn record_auth(&self, kind: &str, success: bool) {
        self.auth_attempts
            .with_label_values(&[kind, outcome(success)])
            .inc();
    }

    pub fn record_order(&self, operation: &str, success: bool) {
        self.orders
            .with_label_values(&[operation, outcome(success)])
            .inc();
    }

    pub fn record_db_query(&self, operation: &str, table: &str, elapsed: Duration, success: bool) {
        self.db_queries
            .with_label_values(&[operation, outcome(success), table])
            .inc();
        self.db_duration
            .with_label_values(&[operation, table])
            .observe(elapsed.as_secs_f64());
    }

    pub fn set_db_connections(&self, active: u32) {
        self.db_connections.set(i64::from(active));
    }

    /// Prometheus text exposition of everything registered.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

pub async fn track_http(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    // Route templates, not raw paths, keep label cardinality bounded.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    state.metrics.http_in_flight.inc();
    let response = next.run(req).await;
    state.metrics.http_in_flight.dec();

    let status = response.status().as_u16().to_string();
    let labels = [method.as_str(), path.as_str(), status.as_str()];
    state.metrics.http_requests.with_label_values(&labels).inc();
    state
        .metrics
        .http_duration
        .with_label_values(&labels)
        .observe(start.elapsed().as_secs_f64());

    response
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
