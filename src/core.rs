//! Core domain types and service traits for pcmetrics
//!
//! This module defines the metric kinds understood by both the agent and the
//! server, the value formatting they share on the wire, and the repository
//! contract the HTTP handlers depend on.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The two kinds of metric the system understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Last-write-wins floating point value.
    Gauge,
    /// Additive integer total.
    Counter,
}

impl MetricKind {
    /// The lowercase name used in URL paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a URL segment does not name a known metric kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown metric type: {0}")]
pub struct UnknownMetricKind(pub String);

impl FromStr for MetricKind {
    type Err = UnknownMetricKind;

    /// Matching is case-sensitive: only `gauge` and `counter` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge" => Ok(MetricKind::Gauge),
            "counter" => Ok(MetricKind::Counter),
            other => Err(UnknownMetricKind(other.to_string())),
        }
    }
}

/// Decimal exponents outside `[EXP_MIN, EXP_MAX)` switch to exponent form.
const EXP_MIN: i32 = -4;
const EXP_MAX: i32 = 21;

/// Formats a gauge value for the wire and for display.
///
/// The digits are the shortest ones that parse back to the same `f64`, so
/// `123.456` stays `123.456` and `1.0` becomes `1`. Very large or very small
/// magnitudes use exponent form with a signed, two-digit minimum exponent:
/// `1e+21`, `1.5e-07`.
pub fn format_gauge(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    // `{:e}` yields the shortest round-trip mantissa, e.g. "1.5e-7".
    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };

    if (EXP_MIN..EXP_MAX).contains(&exponent) {
        value.to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
    }
}

/// Formats a counter value as plain decimal.
pub fn format_counter(value: i64) -> String {
    value.to_string()
}

/// A full copy of the repository contents, ordered by metric name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsListing {
    pub gauges: BTreeMap<String, f64>,
    pub counters: BTreeMap<String, i64>,
}

#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage lock poisoned")]
    Poisoned,
}

// =============================================================================
// Service Traits
// =============================================================================

/// The set of capabilities the HTTP handlers need from a metric store.
///
/// The in-memory backend never fails; the error channel exists so that other
/// backends can be substituted without touching the handlers.
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Replaces the stored value of a gauge.
    async fn update_gauge(&self, name: &str, value: f64) -> Result<(), StorageError>;

    /// Adds `delta` to a counter, starting from zero if it does not exist.
    async fn update_counter(&self, name: &str, delta: i64) -> Result<(), StorageError>;

    /// Looks up a gauge. `Ok(None)` means the name was never written.
    async fn get_gauge(&self, name: &str) -> Result<Option<f64>, StorageError>;

    /// Looks up a counter. `Ok(None)` means the name was never written.
    async fn get_counter(&self, name: &str) -> Result<Option<i64>, StorageError>;

    /// Returns a snapshot of every gauge and counter.
    async fn list_metrics(&self) -> Result<MetricsListing, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kind_parses_exact_names() {
        assert_eq!("gauge".parse::<MetricKind>(), Ok(MetricKind::Gauge));
        assert_eq!("counter".parse::<MetricKind>(), Ok(MetricKind::Counter));
    }

    #[test]
    fn test_metric_kind_is_case_sensitive() {
        assert!("Gauge".parse::<MetricKind>().is_err());
        assert!("COUNTER".parse::<MetricKind>().is_err());
        assert!("histogram".parse::<MetricKind>().is_err());
        assert!("".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_gauge_formatting_is_compact() {
        assert_eq!(format_gauge(123.456), "123.456");
        assert_eq!(format_gauge(1.5), "1.5");
        assert_eq!(format_gauge(1.0), "1");
        assert_eq!(format_gauge(-0.25), "-0.25");
        assert_eq!(format_gauge(0.0), "0");
    }

    #[test]
    fn test_gauge_formatting_switches_to_exponent_at_extremes() {
        assert_eq!(format_gauge(1e21), "1e+21");
        assert_eq!(format_gauge(1e20), "100000000000000000000");
        assert_eq!(format_gauge(1e-7), "1e-07");
        assert_eq!(format_gauge(0.0001), "0.0001");
        assert_eq!(format_gauge(0.00001), "1e-05");
        assert_eq!(format_gauge(-2.5e300), "-2.5e+300");
        assert_eq!(format_gauge(1.5e-300), "1.5e-300");
    }

    #[test]
    fn test_gauge_formatting_round_trips() {
        for value in [1e21, 1e-7, 123.456, 1.0, 6.02214076e23, -3.3e-12] {
            assert_eq!(format_gauge(value).parse::<f64>().unwrap(), value);
        }
    }

    #[test]
    fn test_gauge_formatting_of_non_finite_values() {
        assert_eq!(format_gauge(f64::NAN), "NaN");
        assert_eq!(format_gauge(f64::INFINITY), "+Inf");
        assert_eq!(format_gauge(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn test_counter_formatting() {
        assert_eq!(format_counter(0), "0");
        assert_eq!(format_counter(-42), "-42");
        assert_eq!(format_counter(i64::MAX), "9223372036854775807");
    }
}
