//! Request counters and the `/metrics` scrape endpoint.
//!
//! Every request that produces a response is counted once, after the inner
//! stack returned it, labeled by method, path and the status code sent.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus_client::{
    encoding::{text::encode, EncodeLabelSet},
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

use crate::{Error, Result};

pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    pub path: String,
    pub status_code: String,
}

impl RequestLabels {
    pub fn new(method: &Method, path: &str, status: StatusCode) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_owned(),
            status_code: status.as_u16().to_string(),
        }
    }
}

/// Process-wide registry. Lives as long as the app, never persisted.
#[derive(Debug)]
pub struct Metrics {
    registry: Registry,
    http_requests: Family<RequestLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        // exposed as http_requests_total
        let http_requests = Family::<RequestLabels, Counter>::default();
        registry.register("http_requests", "Total number of http requests", http_requests.clone());

        Self {
            registry,
            http_requests,
        }
    }

    pub fn record(&self, method: &Method, path: &str, status: StatusCode) {
        self.http_requests
            .get_or_create(&RequestLabels::new(method, path, status))
            .inc();
    }

    /// Current count for one label set. Reading never creates the series.
    pub fn requests(&self, method: &Method, path: &str, status: StatusCode) -> u64 {
        self.http_requests
            .get(&RequestLabels::new(method, path, status))
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    pub fn render(&self) -> std::result::Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

pub async fn track_requests(State(metrics): State<Arc<Metrics>>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    metrics.record(&method, &path, response.status());
    response
}

pub async fn scrape(State(metrics): State<Arc<Metrics>>) -> Result<impl IntoResponse> {
    let body = metrics
        .render()
        .map_err(|e| Error::Unexpected(format!("failed to encode metrics: {e}")))?;

    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body))
}
