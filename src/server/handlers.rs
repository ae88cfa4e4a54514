//! HTTP handlers for the update, value and listing endpoints.
//!
//! Each handler is a function of the shared repository and the request path.
//! Rejections never touch storage.

use super::{error::ApiError, SharedRepository};
use crate::core::{format_counter, format_gauge, MetricKind, MetricsListing};
use axum::{
    extract::{Path, State},
    response::Html,
};
use std::fmt::Write;
use tracing::{info, warn};

/// `POST /update/{type}/{name}/{value}`
pub async fn update_metric(
    State(repo): State<SharedRepository>,
    Path((kind, name, value)): Path<(String, String, String)>,
) -> Result<&'static str, ApiError> {
    let kind = kind.parse::<MetricKind>().map_err(|e| {
        warn!("Invalid metric type: {}", e.0);
        reject("bad_type");
        ApiError::from(e)
    })?;

    match kind {
        MetricKind::Gauge => {
            let parsed = value.parse::<f64>().map_err(|e| {
                warn!("Failed to parse gauge value {:?}: {}", value, e);
                reject("bad_value");
                ApiError::BadRequest(format!("invalid gauge value: {}", value))
            })?;
            repo.update_gauge(&name, parsed).await?;
        }
        MetricKind::Counter => {
            let parsed = value.parse::<i64>().map_err(|e| {
                warn!("Failed to parse counter value {:?}: {}", value, e);
                reject("bad_value");
                ApiError::BadRequest(format!("invalid counter value: {}", value))
            })?;
            repo.update_counter(&name, parsed).await?;
        }
    }

    metrics::counter!("metric_updates_total", "kind" => kind.as_str()).increment(1);
    info!("Metric updated successfully: {} {} {}", kind, name, value);
    Ok("200 OK")
}

/// `GET /value/{type}/{name}`
pub async fn get_value(
    State(repo): State<SharedRepository>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<String, ApiError> {
    let kind = kind.parse::<MetricKind>().map_err(|e| {
        warn!("Invalid metric type: {}", e.0);
        ApiError::from(e)
    })?;

    let value = match kind {
        MetricKind::Gauge => repo.get_gauge(&name).await?.map(format_gauge),
        MetricKind::Counter => repo.get_counter(&name).await?.map(format_counter),
    };

    match value {
        Some(value) => {
            metrics::counter!("metric_reads_total", "kind" => kind.as_str()).increment(1);
            info!("Returned metric value: {} {} = {}", kind, name, value);
            Ok(value)
        }
        None => {
            info!("Metric not found: {} {}", kind, name);
            Err(ApiError::NotFound)
        }
    }
}

/// `GET /`
pub async fn list_metrics(State(repo): State<SharedRepository>) -> Result<Html<String>, ApiError> {
    let listing = repo.list_metrics().await?;
    info!(
        gauges = listing.gauges.len(),
        counters = listing.counters.len(),
        "Listed all metrics"
    );
    Ok(Html(render_listing(&listing)))
}

/// Renders every metric as an HTML unordered list.
pub fn render_listing(listing: &MetricsListing) -> String {
    let mut page = String::from("<html><body><h1>Metrics</h1><ul>");
    for (name, value) in &listing.gauges {
        let _ = write!(
            page,
            "<li>Gauge: {} = {}</li>",
            escape_html(name),
            format_gauge(*value)
        );
    }
    for (name, value) in &listing.counters {
        let _ = write!(
            page,
            "<li>Counter: {} = {}</li>",
            escape_html(name),
            format_counter(*value)
        );
    }
    page.push_str("</ul></body></html>");
    page
}

/// Fallback for known paths reached with the wrong method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn reject(reason: &'static str) {
    metrics::counter!("metric_update_rejections_total", "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_listing() {
        let page = render_listing(&MetricsListing::default());
        assert_eq!(page, "<html><body><h1>Metrics</h1><ul></ul></body></html>");
    }

    #[test]
    fn test_render_lists_gauges_before_counters() {
        let mut listing = MetricsListing::default();
        listing.gauges.insert("X".to_string(), 1.5);
        listing.counters.insert("Y".to_string(), 3);

        let page = render_listing(&listing);
        let gauge_at = page.find("<li>Gauge: X = 1.5</li>").unwrap();
        let counter_at = page.find("<li>Counter: Y = 3</li>").unwrap();
        assert!(gauge_at < counter_at);
    }

    #[test]
    fn test_render_escapes_names() {
        let mut listing = MetricsListing::default();
        listing.gauges.insert("<b>&".to_string(), 2.0);

        let page = render_listing(&listing);
        assert!(page.contains("<li>Gauge: &lt;b&gt;&amp; = 2</li>"));
    }
}
